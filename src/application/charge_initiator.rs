use crate::application::dto::{InitiatePaymentRequest, PaymentAcknowledgement};
use crate::domain::entities::validate_reference;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Money, Msisdn};
use crate::infrastructure::config::MpesaConfig;
use crate::ports::mpesa_port::StkPushRequest;
use crate::ports::{MpesaPort, OrderRepositoryPort};
use base64::Engine;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Validated charge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub phone: Msisdn,
    pub amount: Money,
    pub order_reference: String,
}

impl TryFrom<InitiatePaymentRequest> for ChargeRequest {
    type Error = DomainError;

    fn try_from(request: InitiatePaymentRequest) -> DomainResult<Self> {
        validate_reference(&request.order_id)?;
        Ok(Self {
            phone: Msisdn::parse(&request.phone)?,
            amount: Money::from_shillings(request.amount)?,
            order_reference: request.order_id,
        })
    }
}

/// `YYYYMMDDHHMMSS`
pub fn stk_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// base64(shortcode ‖ passkey ‖ timestamp)
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}

/// Build the signed push request for a charge
pub fn build_stk_push(config: &MpesaConfig, charge: &ChargeRequest, at: DateTime<Utc>) -> StkPushRequest {
    let timestamp = stk_timestamp(at);
    let phone = charge.phone.to_string();

    StkPushRequest {
        business_short_code: config.shortcode.clone(),
        password: stk_password(&config.shortcode, &config.passkey, &timestamp),
        timestamp,
        transaction_type: config.transaction_type.clone(),
        amount: charge.amount.to_shillings(),
        party_a: phone.clone(),
        party_b: config.shortcode.clone(),
        phone_number: phone,
        call_back_url: config.callback_url.clone(),
        account_reference: charge.order_reference.clone(),
        transaction_desc: format!("Payment for order {}", charge.order_reference),
    }
}

/// Submits STK push requests
pub struct ChargeInitiator<P: MpesaPort, R: OrderRepositoryPort> {
    mpesa: Arc<P>,
    repository: Arc<R>,
    config: Arc<MpesaConfig>,
}

impl<P: MpesaPort, R: OrderRepositoryPort> ChargeInitiator<P, R> {
    pub fn new(mpesa: Arc<P>, repository: Arc<R>, config: Arc<MpesaConfig>) -> Self {
        Self {
            mpesa,
            repository,
            config,
        }
    }

    /// Request a charge on the payer's phone
    pub async fn initiate(
        &self,
        request: InitiatePaymentRequest,
    ) -> DomainResult<PaymentAcknowledgement> {
        self.initiate_at(request, Utc::now()).await
    }

    pub async fn initiate_at(
        &self,
        request: InitiatePaymentRequest,
        at: DateTime<Utc>,
    ) -> DomainResult<PaymentAcknowledgement> {
        // 1. Validate before touching the network
        let charge = ChargeRequest::try_from(request)?;
        info!(
            "Initiating STK push for order {} ({})",
            charge.order_reference, charge.amount
        );

        // 2. A booked order fixes who pays and how much
        if let Some(order) = self
            .repository
            .find_by_reference(&charge.order_reference)
            .await?
        {
            if order.total_cost != charge.amount || order.customer_phone != charge.phone {
                warn!(
                    "Charge for order {} does not match the booking ({} from {})",
                    order.reference, order.total_cost, order.customer_phone
                );
                return Err(DomainError::Validation(format!(
                    "Charge does not match order {}",
                    order.reference
                )));
            }
        }

        // 3. Fresh credential per call
        let credential = self.mpesa.fetch_access_token().await?;

        // 4. Sign and submit
        let push = build_stk_push(&self.config, &charge, at);
        debug!("STK push timestamp: {}", push.timestamp);
        let acknowledgement = self.mpesa.submit_stk_push(&credential, &push).await?;

        if !acknowledgement.is_accepted() {
            error!(
                "STK push not accepted for order {}: {} {}",
                charge.order_reference,
                acknowledgement.response_code,
                acknowledgement.response_description
            );
            return Err(DomainError::ProviderRejected(format!(
                "ResponseCode {}: {}",
                acknowledgement.response_code, acknowledgement.response_description
            )));
        }

        // 5. Remember the checkout id so the callback can find this order
        if !acknowledgement.checkout_request_id.is_empty() {
            match self
                .repository
                .attach_checkout_request(&charge.order_reference, &acknowledgement.checkout_request_id)
                .await
            {
                Ok(true) => debug!(
                    "Order {} correlated with {}",
                    charge.order_reference, acknowledgement.checkout_request_id
                ),
                Ok(false) => warn!(
                    "No stored order {}; callback will fall back to phone and amount matching",
                    charge.order_reference
                ),
                // The push is already on the payer's phone, so this cannot fail the request.
                Err(e) => error!(
                    "Failed to record checkout id for order {}: {}",
                    charge.order_reference, e
                ),
            }
        }

        info!(
            "STK push accepted for order {}: {}",
            charge.order_reference, acknowledgement.checkout_request_id
        );
        Ok(acknowledgement.into())
    }
}
