use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Money, Msisdn, OrderStatus, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery order as seen by the payment flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Internal identity
    pub id: Uuid,

    /// Provider-visible order reference (AccountReference)
    pub reference: String,

    /// Payer phone
    pub customer_phone: Msisdn,

    /// Amount charged for the delivery
    pub total_cost: Money,

    pub payment_status: PaymentStatus,

    pub status: OrderStatus,

    /// M-Pesa receipt number, set when the callback carries one
    pub provider_transaction_id: Option<String>,

    /// CheckoutRequestID returned by the STK push acknowledgement
    pub checkout_request_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new pending order
    pub fn new(reference: String, customer_phone: Msisdn, total_cost: Money) -> DomainResult<Self> {
        validate_reference(&reference)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            reference,
            customer_phone,
            total_cost,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            provider_transaction_id: None,
            checkout_request_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether a callback may still settle this order
    pub fn awaiting_payment(&self) -> bool {
        !self.payment_status.is_terminal()
    }

    /// Apply a provider outcome. Settled orders are left untouched.
    pub fn settle(&mut self, outcome: &PaymentOutcome, at: DateTime<Utc>) -> Settlement {
        if !self.awaiting_payment() {
            return Settlement::AlreadySettled {
                order_id: self.id,
                payment_status: self.payment_status,
            };
        }

        self.payment_status = outcome.payment_status();
        self.status = outcome.order_status();
        self.provider_transaction_id = outcome.receipt().map(str::to_string);
        self.updated_at = at;

        Settlement::Applied {
            order_id: self.id,
            payment_status: self.payment_status,
        }
    }
}

/// Order references are opaque but bounded
pub fn validate_reference(reference: &str) -> DomainResult<()> {
    if reference.trim().is_empty() || reference.len() > 64 {
        return Err(DomainError::Validation(
            "Order reference must be 1-64 characters".to_string(),
        ));
    }
    Ok(())
}

/// Result of an STK push as reported by the provider callback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentOutcome {
    /// 0 is success, anything else is failure
    pub result_code: i64,
    pub result_description: String,
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    /// MpesaReceiptNumber, empty when absent
    pub transaction_id: String,
    /// PhoneNumber, empty when absent
    pub phone: String,
    /// Amount, 0 when absent
    pub amount: i64,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    pub fn payment_status(&self) -> PaymentStatus {
        if self.is_success() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        }
    }

    pub fn order_status(&self) -> OrderStatus {
        if self.is_success() {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Cancelled
        }
    }

    /// Receipt number, if the provider sent one
    pub fn receipt(&self) -> Option<&str> {
        Some(self.transaction_id.as_str()).filter(|id| !id.is_empty())
    }
}

/// What a callback did to the order store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The order moved out of pending
    Applied {
        order_id: Uuid,
        payment_status: PaymentStatus,
    },
    /// The order had already left pending; nothing was written
    AlreadySettled {
        order_id: Uuid,
        payment_status: PaymentStatus,
    },
}

impl Settlement {
    pub fn order_id(&self) -> Uuid {
        match self {
            Settlement::Applied { order_id, .. } | Settlement::AlreadySettled { order_id, .. } => {
                *order_id
            }
        }
    }
}
