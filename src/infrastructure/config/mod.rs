pub mod mpesa_config;
pub mod server_config;

pub use mpesa_config::MpesaConfig;
pub use server_config::ServerConfig;
