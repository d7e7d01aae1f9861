use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use swaiy_payments::api::{self, AppState};
use swaiy_payments::application::{CallbackReceiver, ChargeInitiator, OrderService};
use swaiy_payments::infrastructure::{MpesaAdapter, MpesaConfig, MySqlOrderRepository, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    dotenvy::dotenv().ok();

    info!("Starting payment service...");

    // Configuration is read once; a missing value stops startup here
    let server_config = ServerConfig::from_env()?;
    let mpesa_config = Arc::new(MpesaConfig::from_env()?);
    info!("M-Pesa configuration loaded: {:?}", mpesa_config);

    info!("Connecting to database...");
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .connect(&server_config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database connected and migrated");

    let mpesa = Arc::new(MpesaAdapter::new(mpesa_config.clone())?);
    let repository = Arc::new(MySqlOrderRepository::new(Arc::new(pool)));

    let app_state = AppState {
        charge_initiator: Arc::new(ChargeInitiator::new(
            mpesa,
            repository.clone(),
            mpesa_config,
        )),
        callback_receiver: Arc::new(CallbackReceiver::new(repository.clone())),
        order_service: Arc::new(OrderService::new(repository)),
    };

    let app = api::create_router(app_state);

    let addr = server_config.bind_address();
    info!("Server listening on {}", addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  POST /api/orders - Book an order");
    info!("  GET  /api/orders/:reference - Query an order");
    info!("  POST /api/payments/stk-push - Initiate M-Pesa payment");
    info!("  POST /api/webhooks/mpesa - M-Pesa result callback");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
