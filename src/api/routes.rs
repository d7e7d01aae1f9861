use super::handlers::*;
use crate::ports::{MpesaPort, OrderRepositoryPort};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router<P, R>(state: AppState<P, R>) -> Router
where
    P: MpesaPort + 'static,
    R: OrderRepositoryPort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/payments/stk-push", post(initiate_payment::<P, R>))
        .route("/api/webhooks/mpesa", post(mpesa_callback::<P, R>))
        .route("/api/orders", post(create_order::<P, R>))
        .route("/api/orders/:reference", get(get_order::<P, R>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
