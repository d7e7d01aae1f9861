use crate::domain::Order;
use crate::ports::mpesa_port::StkPushAcknowledgement;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// STK push request from the booking client
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentRequest {
    /// Payer phone, any accepted MSISDN form
    pub phone: String,

    /// Whole shillings
    pub amount: i64,

    /// Order reference, forwarded as AccountReference
    pub order_id: String,
}

/// Normalized provider acknowledgement. Acceptance only, not payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAcknowledgement {
    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub response_code: String,
    pub response_description: String,
    pub customer_message: String,
}

impl From<StkPushAcknowledgement> for PaymentAcknowledgement {
    fn from(ack: StkPushAcknowledgement) -> Self {
        Self {
            merchant_request_id: ack.merchant_request_id,
            checkout_request_id: ack.checkout_request_id,
            response_code: ack.response_code,
            response_description: ack.response_description,
            customer_message: ack.customer_message,
        }
    }
}

/// Booking request creating a pending order
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_phone: String,

    /// Whole shillings
    pub total_cost: i64,

    /// Generated when omitted
    #[serde(default)]
    pub reference: Option<String>,
}

/// Order view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub reference: String,
    pub customer_phone: String,
    pub total_cost: i64,
    pub payment_status: String,
    pub status: String,
    pub provider_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            reference: order.reference,
            customer_phone: order.customer_phone.to_string(),
            total_cost: order.total_cost.to_shillings(),
            payment_status: order.payment_status.to_string(),
            status: order.status.to_string(),
            provider_transaction_id: order.provider_transaction_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub retryable: bool,
}

impl ErrorResponse {
    pub fn new(error: String, message: String, retryable: bool) -> Self {
        Self {
            error,
            message,
            retryable,
        }
    }
}
