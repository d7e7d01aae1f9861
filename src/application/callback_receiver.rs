use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Money, Msisdn, Order, PaymentOutcome, Settlement};
use crate::ports::mpesa_port::parse_callback;
use crate::ports::OrderRepositoryPort;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies provider callbacks to the order store
pub struct CallbackReceiver<R: OrderRepositoryPort> {
    repository: Arc<R>,
}

impl<R: OrderRepositoryPort> CallbackReceiver<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Handle one callback delivery. Safe to call repeatedly for the same event.
    pub async fn receive(&self, raw: &str) -> DomainResult<Settlement> {
        // 1. Parse the envelope
        let outcome = parse_callback(raw)?;
        info!(
            "M-Pesa callback: checkout_request_id={} result_code={} ({})",
            outcome.checkout_request_id, outcome.result_code, outcome.result_description
        );

        // 2. Find the order
        let order = self.locate(&outcome).await?.ok_or_else(|| {
            warn!(
                "Unmatched M-Pesa callback, needs manual reconciliation: checkout_request_id={} receipt={} phone={} amount={}",
                outcome.checkout_request_id, outcome.transaction_id, outcome.phone, outcome.amount
            );
            DomainError::OrderNotFound(format!(
                "no pending order for checkout request {:?}",
                outcome.checkout_request_id
            ))
        })?;

        // A paid amount must cover exactly this order
        if outcome.amount != 0 && outcome.amount != order.total_cost.to_shillings() {
            warn!(
                "Callback amount {} does not match order {} total {}, needs manual reconciliation: receipt={}",
                outcome.amount, order.reference, order.total_cost, outcome.transaction_id
            );
            return Err(DomainError::OrderNotFound(format!(
                "no order for checkout request {:?} with amount {}",
                outcome.checkout_request_id, outcome.amount
            )));
        }

        if !order.awaiting_payment() {
            warn!(
                "Duplicate callback for order {} already {}",
                order.reference, order.payment_status
            );
            return Ok(Settlement::AlreadySettled {
                order_id: order.id,
                payment_status: order.payment_status,
            });
        }

        // 3. Transition, only if still pending
        if self
            .repository
            .settle_if_pending(order.id, &outcome, Utc::now())
            .await?
        {
            info!(
                "Order {} payment {}",
                order.reference,
                outcome.payment_status()
            );
            return Ok(Settlement::Applied {
                order_id: order.id,
                payment_status: outcome.payment_status(),
            });
        }

        // Another delivery settled it between the lookup and the write.
        let current = self
            .repository
            .find_by_id(order.id)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound(order.id.to_string()))?;
        warn!(
            "Order {} settled concurrently as {}",
            current.reference, current.payment_status
        );
        Ok(Settlement::AlreadySettled {
            order_id: current.id,
            payment_status: current.payment_status,
        })
    }

    async fn locate(&self, outcome: &PaymentOutcome) -> DomainResult<Option<Order>> {
        if !outcome.checkout_request_id.is_empty() {
            if let Some(order) = self
                .repository
                .find_by_checkout_request_id(&outcome.checkout_request_id)
                .await?
            {
                debug!("Matched order {} by checkout request", order.reference);
                return Ok(Some(order));
            }
        }

        // A receipt already on file means this event was applied before
        if let Some(receipt) = outcome.receipt() {
            if let Some(order) = self.repository.find_by_transaction_id(receipt).await? {
                debug!("Matched order {} by receipt {}", order.reference, receipt);
                return Ok(Some(order));
            }
        }

        if let (Ok(phone), Ok(amount)) = (
            Msisdn::parse(&outcome.phone),
            Money::from_shillings(outcome.amount),
        ) {
            if let Some(order) = self.repository.find_pending_match(&phone, amount).await? {
                debug!("Matched order {} by phone and amount", order.reference);
                self.correlate(&order, outcome).await?;
                return Ok(Some(order));
            }
        }

        Ok(None)
    }

    /// Pin a fallback match to the callback's checkout id so redeliveries land on it
    async fn correlate(&self, order: &Order, outcome: &PaymentOutcome) -> DomainResult<()> {
        if outcome.checkout_request_id.is_empty() || order.checkout_request_id.is_some() {
            return Ok(());
        }
        if !self
            .repository
            .attach_checkout_request(&order.reference, &outcome.checkout_request_id)
            .await?
        {
            warn!("Order {} vanished before correlation", order.reference);
        }
        Ok(())
    }
}
