pub mod mpesa_port;
pub mod order_repository_port;

pub use mpesa_port::MpesaPort;
pub use order_repository_port::OrderRepositoryPort;
