#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swaiy_payments::api::{create_router, AppState};
use swaiy_payments::application::{CallbackReceiver, ChargeInitiator, OrderService};
use swaiy_payments::domain::{DomainError, DomainResult};
use swaiy_payments::infrastructure::{InMemoryOrderRepository, MpesaConfig};
use swaiy_payments::ports::mpesa_port::{ProviderCredential, StkPushAcknowledgement, StkPushRequest};
use swaiy_payments::ports::MpesaPort;
use tower::ServiceExt;

/// Scripted Daraja stand-in
#[derive(Default)]
pub struct FakeMpesa {
    pub token_error: Mutex<Option<DomainError>>,
    pub pushes: Mutex<Vec<StkPushRequest>>,
}

impl FakeMpesa {
    pub fn failing_token(error: DomainError) -> Self {
        Self {
            token_error: Mutex::new(Some(error)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl MpesaPort for FakeMpesa {
    async fn fetch_access_token(&self) -> DomainResult<ProviderCredential> {
        if let Some(error) = self.token_error.lock().unwrap().take() {
            return Err(error);
        }
        Ok(ProviderCredential {
            access_token: "sandbox-token".to_string(),
            expires_in: Some("3599".to_string()),
        })
    }

    async fn submit_stk_push(
        &self,
        _credential: &ProviderCredential,
        request: &StkPushRequest,
    ) -> DomainResult<StkPushAcknowledgement> {
        let mut pushes = self.pushes.lock().unwrap();
        pushes.push(request.clone());
        Ok(StkPushAcknowledgement {
            merchant_request_id: format!("29115-{}", pushes.len()),
            checkout_request_id: format!("ws_CO_{}", pushes.len()),
            response_code: "0".to_string(),
            response_description: "Success. Request accepted for processing".to_string(),
            customer_message: "Success. Request accepted for processing".to_string(),
        })
    }
}

pub fn test_config() -> Arc<MpesaConfig> {
    Arc::new(MpesaConfig {
        consumer_key: "key".to_string(),
        consumer_secret: "secret".to_string(),
        shortcode: "174379".to_string(),
        passkey: "passkey".to_string(),
        callback_url: "https://swaiy.example/api/webhooks/mpesa".to_string(),
        base_url: "https://sandbox.safaricom.co.ke".to_string(),
        transaction_type: "CustomerPayBillOnline".to_string(),
        request_timeout: Duration::from_secs(5),
    })
}

pub struct TestApp {
    pub router: Router,
    pub repository: Arc<InMemoryOrderRepository>,
    pub mpesa: Arc<FakeMpesa>,
}

pub fn build_app(mpesa: FakeMpesa) -> TestApp {
    let mpesa = Arc::new(mpesa);
    let repository = Arc::new(InMemoryOrderRepository::new());
    let state = AppState {
        charge_initiator: Arc::new(ChargeInitiator::new(
            mpesa.clone(),
            repository.clone(),
            test_config(),
        )),
        callback_receiver: Arc::new(CallbackReceiver::new(repository.clone())),
        order_service: Arc::new(OrderService::new(repository.clone())),
    };

    TestApp {
        router: create_router(state),
        repository,
        mpesa,
    }
}

impl TestApp {
    pub async fn send(&self, method: &str, uri: &str, body: Option<String>) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, String) {
        self.send("POST", uri, Some(body.to_string())).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send("GET", uri, None).await
    }
}
