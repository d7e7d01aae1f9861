pub mod in_memory_order_repository;
pub mod mpesa_adapter;
pub mod mysql_order_repository;

pub use in_memory_order_repository::InMemoryOrderRepository;
pub use mpesa_adapter::MpesaAdapter;
pub use mysql_order_repository::MySqlOrderRepository;
