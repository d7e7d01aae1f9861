use crate::domain::errors::DomainResult;
use crate::domain::{Money, Msisdn, Order, PaymentOutcome, PaymentStatus};
use crate::ports::order_repository_port::OrderRepositoryPort;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const SELECT_ORDER: &str = r#"
    SELECT id, reference, customer_phone, total_cost,
           payment_status, status, provider_transaction_id,
           checkout_request_id, created_at, updated_at
    FROM orders
"#;

/// MySQL order store
#[derive(Clone)]
pub struct MySqlOrderRepository {
    pool: Arc<Pool<MySql>>,
}

impl MySqlOrderRepository {
    pub fn new(pool: Arc<Pool<MySql>>) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> DomainResult<Option<Order>> {
        let query = format!("{} WHERE {} = ? LIMIT 1", SELECT_ORDER, clause);

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(value)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(OrderRow::into_order).transpose()
    }
}

#[async_trait]
impl OrderRepositoryPort for MySqlOrderRepository {
    async fn save(&self, order: &Order) -> DomainResult<()> {
        let query = r#"
            INSERT INTO orders (
                id, reference, customer_phone, total_cost,
                payment_status, status, provider_transaction_id,
                checkout_request_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(order.id)
            .bind(&order.reference)
            .bind(order.customer_phone.as_str())
            .bind(order.total_cost.to_shillings())
            .bind(order.payment_status.as_str())
            .bind(order.status.as_str())
            .bind(&order.provider_transaction_id)
            .bind(&order.checkout_request_id)
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(self.pool.as_ref())
            .await?;

        debug!("Order saved: {}", order.id);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Order>> {
        let query = format!("{} WHERE id = ?", SELECT_ORDER);

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn find_by_reference(&self, reference: &str) -> DomainResult<Option<Order>> {
        self.fetch_one_where("reference", reference).await
    }

    async fn find_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> DomainResult<Option<Order>> {
        self.fetch_one_where("checkout_request_id", checkout_request_id)
            .await
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> DomainResult<Option<Order>> {
        self.fetch_one_where("provider_transaction_id", transaction_id)
            .await
    }

    async fn find_pending_match(
        &self,
        phone: &Msisdn,
        total_cost: Money,
    ) -> DomainResult<Option<Order>> {
        let query = format!(
            "{} WHERE customer_phone = ? AND total_cost = ? AND payment_status = ? \
             ORDER BY created_at ASC, id ASC LIMIT 1",
            SELECT_ORDER
        );

        let row = sqlx::query_as::<_, OrderRow>(&query)
            .bind(phone.as_str())
            .bind(total_cost.to_shillings())
            .bind(PaymentStatus::Pending.as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn attach_checkout_request(
        &self,
        reference: &str,
        checkout_request_id: &str,
    ) -> DomainResult<bool> {
        let query = r#"
            UPDATE orders
            SET checkout_request_id = ?, updated_at = ?
            WHERE reference = ?
        "#;

        let rows_affected = sqlx::query(query)
            .bind(checkout_request_id)
            .bind(Utc::now())
            .bind(reference)
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn settle_if_pending(
        &self,
        id: Uuid,
        outcome: &PaymentOutcome,
        at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        // The payment_status predicate makes the transition happen at most once.
        let query = r#"
            UPDATE orders
            SET payment_status = ?, status = ?, provider_transaction_id = ?, updated_at = ?
            WHERE id = ? AND payment_status = ?
        "#;

        let rows_affected = sqlx::query(query)
            .bind(outcome.payment_status().as_str())
            .bind(outcome.order_status().as_str())
            .bind(outcome.receipt())
            .bind(at)
            .bind(id)
            .bind(PaymentStatus::Pending.as_str())
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

        debug!("Settle order {}: rows_affected={}", id, rows_affected);
        Ok(rows_affected == 1)
    }
}

/// Database row
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    reference: String,
    customer_phone: String,
    total_cost: i64,
    payment_status: String,
    status: String,
    provider_transaction_id: Option<String>,
    checkout_request_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> DomainResult<Order> {
        Ok(Order {
            id: self.id,
            reference: self.reference,
            customer_phone: Msisdn::from_stored(self.customer_phone),
            total_cost: Money::from_stored(self.total_cost),
            payment_status: self.payment_status.parse()?,
            status: self.status.parse()?,
            provider_transaction_id: self.provider_transaction_id,
            checkout_request_id: self.checkout_request_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
