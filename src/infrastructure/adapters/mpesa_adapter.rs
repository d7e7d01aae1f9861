use crate::domain::errors::{DomainError, DomainResult};
use crate::infrastructure::config::mpesa_config::MpesaConfig;
use crate::ports::mpesa_port::*;
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tracing::{debug, error, instrument};

const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";

/// Daraja API client
#[derive(Clone)]
pub struct MpesaAdapter {
    config: Arc<MpesaConfig>,
    client: Client,
}

impl MpesaAdapter {
    pub fn new(config: Arc<MpesaConfig>) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DomainError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Basic auth value for the token endpoint
    fn basic_credentials(&self) -> String {
        let pair = format!("{}:{}", self.config.consumer_key, self.config.consumer_secret);
        base64::engine::general_purpose::STANDARD.encode(pair)
    }
}

/// Transport failures are retryable, everything else is a protocol error
fn transport_error(stage: &str, e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::ProviderUnavailable(format!("{} timed out", stage))
    } else if e.is_connect() || e.is_request() {
        DomainError::ProviderUnavailable(format!("{} failed: {}", stage, e))
    } else {
        DomainError::ProviderRejected(format!("{}: unreadable response: {}", stage, e))
    }
}

#[async_trait]
impl MpesaPort for MpesaAdapter {
    #[instrument(name = "mpesa_fetch_access_token", skip(self))]
    async fn fetch_access_token(&self) -> DomainResult<ProviderCredential> {
        let url = format!("{}{}", self.config.base_url, TOKEN_PATH);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Basic {}", self.basic_credentials()))
            .send()
            .await
            .map_err(|e| transport_error("token request", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("M-Pesa token endpoint returned {}: {}", status, error_text);
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    DomainError::Credential(format!("token endpoint returned {}", status))
                }
                s if s.is_server_error() => {
                    DomainError::ProviderUnavailable(format!("token endpoint returned {}", s))
                }
                s => DomainError::Credential(format!("token endpoint returned {}: {}", s, error_text)),
            });
        }

        let credential: ProviderCredential = response
            .json()
            .await
            .map_err(|e| DomainError::Credential(format!("unreadable token response: {}", e)))?;

        if credential.access_token.is_empty() {
            return Err(DomainError::Credential("empty access token".to_string()));
        }

        debug!("Access token acquired, expires_in={:?}", credential.expires_in);
        Ok(credential)
    }

    #[instrument(
        name = "mpesa_submit_stk_push",
        skip(self, credential, request),
        fields(account_reference = %request.account_reference)
    )]
    async fn submit_stk_push(
        &self,
        credential: &ProviderCredential,
        request: &StkPushRequest,
    ) -> DomainResult<StkPushAcknowledgement> {
        let url = format!("{}{}", self.config.base_url, STK_PUSH_PATH);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credential.access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("STK push", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("M-Pesa STK push returned {}: {}", status, error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED => {
                    DomainError::Credential("access token rejected".to_string())
                }
                s if s.is_server_error() => {
                    DomainError::ProviderUnavailable(format!("STK push returned {}", s))
                }
                s => DomainError::ProviderRejected(format!("API returned {}: {}", s, error_text)),
            });
        }

        let acknowledgement: StkPushAcknowledgement = response
            .json()
            .await
            .map_err(|e| transport_error("STK push", e))?;
        debug!(
            "STK push acknowledged: checkout_request_id={}",
            acknowledgement.checkout_request_id
        );

        Ok(acknowledgement)
    }
}
