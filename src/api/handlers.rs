use crate::application::{
    CallbackReceiver, ChargeInitiator, CreateOrderRequest, ErrorResponse, InitiatePaymentRequest,
    OrderResponse, OrderService,
};
use crate::domain::errors::DomainError;
use crate::domain::Settlement;
use crate::ports::{MpesaPort, OrderRepositoryPort};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, info, warn};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Application state
pub struct AppState<P: MpesaPort, R: OrderRepositoryPort> {
    pub charge_initiator: Arc<ChargeInitiator<P, R>>,
    pub callback_receiver: Arc<CallbackReceiver<R>>,
    pub order_service: Arc<OrderService<R>>,
}

impl<P: MpesaPort, R: OrderRepositoryPort> Clone for AppState<P, R> {
    fn clone(&self) -> Self {
        Self {
            charge_initiator: self.charge_initiator.clone(),
            callback_receiver: self.callback_receiver.clone(),
            order_service: self.order_service.clone(),
        }
    }
}

/// Map the error taxonomy onto HTTP
pub fn status_for(e: &DomainError) -> StatusCode {
    match e {
        DomainError::Validation(_)
        | DomainError::Credential(_)
        | DomainError::ProviderUnavailable(_)
        | DomainError::ProviderRejected(_)
        | DomainError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        DomainError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Persistence(_)
        | DomainError::Database(_)
        | DomainError::Serialization(_)
        | DomainError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: DomainError) -> ApiError {
    (
        status_for(&e),
        Json(ErrorResponse::new(
            e.code().to_string(),
            e.to_string(),
            e.is_retryable(),
        )),
    )
}

/// Bodies are parsed by hand so bad JSON is a 400, not axum's 422
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        warn!("Rejected request body: {}", e);
        error_response(DomainError::Validation(format!("Invalid request body: {}", e)))
    })
}

/// Submit an STK push
pub async fn initiate_payment<P: MpesaPort, R: OrderRepositoryPort>(
    State(state): State<AppState<P, R>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let request: InitiatePaymentRequest = parse_body(&body)?;
    info!("Received STK push request for order {}", request.order_id);

    state
        .charge_initiator
        .initiate(request)
        .await
        .map(|ack| (StatusCode::OK, Json(ack)))
        .map_err(|e| {
            error!("STK push error: {}", e);
            error_response(e)
        })
}

/// M-Pesa result callback
pub async fn mpesa_callback<P: MpesaPort, R: OrderRepositoryPort>(
    State(state): State<AppState<P, R>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    info!("Received M-Pesa callback");

    state
        .callback_receiver
        .receive(&body)
        .await
        .map(|settlement| {
            match settlement {
                Settlement::Applied { .. } => {
                    info!("Callback applied to order {}", settlement.order_id())
                }
                Settlement::AlreadySettled { .. } => info!(
                    "Callback acknowledged without change for order {}",
                    settlement.order_id()
                ),
            }
            (StatusCode::OK, "OK")
        })
        .map_err(|e| {
            match &e {
                DomainError::OrderNotFound(_) => warn!("Callback not matched: {}", e),
                _ => error!("Callback handling error: {}", e),
            }
            error_response(e)
        })
}

/// Book a pending order
pub async fn create_order<P: MpesaPort, R: OrderRepositoryPort>(
    State(state): State<AppState<P, R>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let request: CreateOrderRequest = parse_body(&body)?;

    state
        .order_service
        .create_order(request)
        .await
        .map(|order| (StatusCode::CREATED, Json(OrderResponse::from(order))))
        .map_err(|e| {
            error!("Order creation error: {}", e);
            error_response(e)
        })
}

/// Look up an order by reference
pub async fn get_order<P: MpesaPort, R: OrderRepositoryPort>(
    State(state): State<AppState<P, R>>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .order_service
        .get_order(&reference)
        .await
        .map(|order| (StatusCode::OK, Json(OrderResponse::from(order))))
        .map_err(error_response)
}

/// Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
