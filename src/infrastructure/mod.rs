pub mod adapters;
pub mod config;

pub use adapters::{InMemoryOrderRepository, MpesaAdapter, MySqlOrderRepository};
pub use config::{MpesaConfig, ServerConfig};
