use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Money, Msisdn, Order, PaymentOutcome};
use crate::ports::order_repository_port::OrderRepositoryPort;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Order store kept in process memory, in insertion order
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_first<P>(&self, predicate: P) -> Option<Order>
    where
        P: Fn(&Order) -> bool,
    {
        self.orders
            .read()
            .await
            .iter()
            .find(|o| predicate(*o))
            .cloned()
    }
}

#[async_trait]
impl OrderRepositoryPort for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> DomainResult<()> {
        let mut orders = self.orders.write().await;
        if orders
            .iter()
            .any(|o| o.id == order.id || o.reference == order.reference)
        {
            return Err(DomainError::Persistence(format!(
                "duplicate order: {}",
                order.reference
            )));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Order>> {
        Ok(self.find_first(|o| o.id == id).await)
    }

    async fn find_by_reference(&self, reference: &str) -> DomainResult<Option<Order>> {
        Ok(self.find_first(|o| o.reference == reference).await)
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> DomainResult<Option<Order>> {
        Ok(self
            .find_first(|o| o.checkout_request_id.as_deref() == Some(checkout_request_id))
            .await)
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> DomainResult<Option<Order>> {
        Ok(self
            .find_first(|o| o.provider_transaction_id.as_deref() == Some(transaction_id))
            .await)
    }

    async fn find_pending_match(
        &self,
        phone: &Msisdn,
        total_cost: Money,
    ) -> DomainResult<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| o.awaiting_payment() && &o.customer_phone == phone && o.total_cost == total_cost)
            .min_by_key(|o| (o.created_at, o.id))
            .cloned())
    }

    async fn attach_checkout_request(
        &self,
        reference: &str,
        checkout_request_id: &str,
    ) -> DomainResult<bool> {
        let mut orders = self.orders.write().await;
        match orders.iter_mut().find(|o| o.reference == reference) {
            Some(order) => {
                order.checkout_request_id = Some(checkout_request_id.to_string());
                order.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn settle_if_pending(
        &self,
        id: Uuid,
        outcome: &PaymentOutcome,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| DomainError::OrderNotFound(id.to_string()))?;

        Ok(matches!(
            order.settle(outcome, at),
            crate::domain::Settlement::Applied { .. }
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PaymentStatus;

    fn order(reference: &str, phone: &str, cost: i64) -> Order {
        Order::new(
            reference.to_string(),
            Msisdn::parse(phone).unwrap(),
            Money::from_shillings(cost).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_reference() {
        let repo = InMemoryOrderRepository::new();
        repo.save(&order("SWY1", "254712345678", 500)).await.unwrap();

        let err = repo.save(&order("SWY1", "254712345678", 500)).await;

        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_pending_match_prefers_earliest() {
        let repo = InMemoryOrderRepository::new();
        let first = order("SWY1", "254712345678", 500);
        let mut second = order("SWY2", "254712345678", 500);
        second.created_at = first.created_at + chrono::Duration::seconds(5);
        // Insert out of creation order
        repo.save(&second).await.unwrap();
        repo.save(&first).await.unwrap();
        repo.save(&order("SWY3", "254712345678", 700)).await.unwrap();

        let phone = Msisdn::parse("254712345678").unwrap();
        let found = repo
            .find_pending_match(&phone, Money::from_shillings(500).unwrap())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.reference, "SWY1");
    }

    #[tokio::test]
    async fn test_settle_if_pending_happens_once() {
        let repo = InMemoryOrderRepository::new();
        let stored = order("SWY1", "254712345678", 500);
        repo.save(&stored).await.unwrap();
        let failure = PaymentOutcome {
            result_code: 1,
            ..Default::default()
        };
        let success = PaymentOutcome {
            result_code: 0,
            transaction_id: "QAB123".to_string(),
            ..Default::default()
        };

        assert!(repo.settle_if_pending(stored.id, &failure, Utc::now()).await.unwrap());
        assert!(!repo.settle_if_pending(stored.id, &success, Utc::now()).await.unwrap());

        let reloaded = repo.find_by_id(stored.id).await.unwrap().unwrap();
        assert_eq!(reloaded.payment_status, PaymentStatus::Failed);
        assert!(reloaded.provider_transaction_id.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_settles_have_one_winner() {
        let repo = std::sync::Arc::new(InMemoryOrderRepository::new());
        let stored = order("SWY1", "254712345678", 500);
        repo.save(&stored).await.unwrap();
        let success = PaymentOutcome {
            result_code: 0,
            transaction_id: "QAB123".to_string(),
            ..Default::default()
        };
        let failure = PaymentOutcome {
            result_code: 1032,
            ..Default::default()
        };

        let (paid, cancelled) = {
            let (a, b) = (repo.clone(), repo.clone());
            let id = stored.id;
            tokio::join!(
                tokio::spawn(async move { a.settle_if_pending(id, &success, Utc::now()).await }),
                tokio::spawn(async move { b.settle_if_pending(id, &failure, Utc::now()).await })
            )
        };
        let paid = paid.unwrap().unwrap();
        let cancelled = cancelled.unwrap().unwrap();

        assert!(paid ^ cancelled);
        let reloaded = repo.find_by_id(stored.id).await.unwrap().unwrap();
        if paid {
            assert_eq!(reloaded.payment_status, PaymentStatus::Completed);
            assert_eq!(reloaded.provider_transaction_id.as_deref(), Some("QAB123"));
        } else {
            assert_eq!(reloaded.payment_status, PaymentStatus::Failed);
            assert!(reloaded.provider_transaction_id.is_none());
        }
    }

    #[tokio::test]
    async fn test_attach_checkout_request() {
        let repo = InMemoryOrderRepository::new();
        repo.save(&order("SWY1", "254712345678", 500)).await.unwrap();

        assert!(repo.attach_checkout_request("SWY1", "ws_CO_1").await.unwrap());
        assert!(!repo.attach_checkout_request("SWY9", "ws_CO_2").await.unwrap());

        let found = repo.find_by_checkout_request_id("ws_CO_1").await.unwrap();
        assert_eq!(found.map(|o| o.reference), Some("SWY1".to_string()));
    }
}
