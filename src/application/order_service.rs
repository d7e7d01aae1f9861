use crate::application::dto::CreateOrderRequest;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Money, Msisdn, Order};
use crate::ports::OrderRepositoryPort;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Booking side of the order store
pub struct OrderService<R: OrderRepositoryPort> {
    repository: Arc<R>,
}

impl<R: OrderRepositoryPort> OrderService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a pending order awaiting payment
    pub async fn create_order(&self, request: CreateOrderRequest) -> DomainResult<Order> {
        let reference = match request.reference {
            Some(reference) => reference.trim().to_string(),
            None => generate_reference(),
        };

        let order = Order::new(
            reference,
            Msisdn::parse(&request.customer_phone)?,
            Money::from_shillings(request.total_cost)?,
        )?;

        if self
            .repository
            .find_by_reference(&order.reference)
            .await?
            .is_some()
        {
            return Err(DomainError::Validation(format!(
                "Order reference already exists: {}",
                order.reference
            )));
        }

        self.repository.save(&order).await?;
        info!(
            "Order {} booked for {} ({})",
            order.reference, order.customer_phone, order.total_cost
        );

        Ok(order)
    }

    pub async fn get_order(&self, reference: &str) -> DomainResult<Order> {
        self.repository
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(reference.to_string()))
    }
}

/// `SWY` followed by eight uppercase hex digits
fn generate_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("SWY{}", id[..8].to_uppercase())
}
