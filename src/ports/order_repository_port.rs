use crate::domain::errors::DomainResult;
use crate::domain::{Money, Msisdn, Order, PaymentOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Order store port
#[async_trait]
pub trait OrderRepositoryPort: Send + Sync {
    /// Insert a new order
    async fn save(&self, order: &Order) -> DomainResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Order>>;

    async fn find_by_reference(&self, reference: &str) -> DomainResult<Option<Order>>;

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> DomainResult<Option<Order>>;

    async fn find_by_transaction_id(&self, transaction_id: &str) -> DomainResult<Option<Order>>;

    /// Earliest-created pending order with this phone and total cost
    async fn find_pending_match(
        &self,
        phone: &Msisdn,
        total_cost: Money,
    ) -> DomainResult<Option<Order>>;

    /// Record the CheckoutRequestID on an order. Returns false if no order has the reference.
    async fn attach_checkout_request(
        &self,
        reference: &str,
        checkout_request_id: &str,
    ) -> DomainResult<bool>;

    /// Move an order out of pending, only if it is still pending.
    /// Returns false when the order was already settled.
    async fn settle_if_pending(
        &self,
        id: Uuid,
        outcome: &PaymentOutcome,
        at: DateTime<Utc>,
    ) -> DomainResult<bool>;
}
