pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::{Order, PaymentOutcome, Settlement};
pub use errors::{DomainError, DomainResult};
pub use value_objects::{Money, Msisdn, OrderStatus, PaymentStatus};
