pub mod callback_receiver;
pub mod charge_initiator;
pub mod dto;
pub mod order_service;

pub use callback_receiver::CallbackReceiver;
pub use charge_initiator::ChargeInitiator;
pub use dto::*;
pub use order_service::OrderService;
