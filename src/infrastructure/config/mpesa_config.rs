use crate::domain::errors::{DomainError, DomainResult};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
pub const DEFAULT_TRANSACTION_TYPE: &str = "CustomerPayBillOnline";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// M-Pesa Daraja configuration
#[derive(Clone)]
pub struct MpesaConfig {
    /// Consumer key of the Daraja app
    pub consumer_key: String,

    /// Consumer secret of the Daraja app
    pub consumer_secret: String,

    /// Paybill / till shortcode
    pub shortcode: String,

    /// Lipa Na M-Pesa Online passkey
    pub passkey: String,

    /// URL the provider posts results to
    pub callback_url: String,

    /// API base URL
    pub base_url: String,

    pub transaction_type: String,

    /// Bound on each provider call
    pub request_timeout: Duration,
}

impl MpesaConfig {
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DomainError::Configuration(format!("{} must be set", key)))
        };

        let timeout_secs = match lookup("MPESA_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    DomainError::Configuration(format!(
                        "MPESA_TIMEOUT_SECS must be a positive integer, got {:?}",
                        raw
                    ))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            consumer_key: required("MPESA_CONSUMER_KEY")?,
            consumer_secret: required("MPESA_CONSUMER_SECRET")?,
            shortcode: required("MPESA_SHORTCODE")?,
            passkey: required("MPESA_PASSKEY")?,
            callback_url: required("MPESA_CALLBACK_URL")?,
            base_url: lookup("MPESA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            transaction_type: lookup("MPESA_TRANSACTION_TYPE")
                .unwrap_or_else(|| DEFAULT_TRANSACTION_TYPE.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// Secrets stay out of logs.
impl fmt::Debug for MpesaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MpesaConfig")
            .field("consumer_key", &"***")
            .field("consumer_secret", &"***")
            .field("shortcode", &self.shortcode)
            .field("passkey", &"***")
            .field("callback_url", &self.callback_url)
            .field("base_url", &self.base_url)
            .field("transaction_type", &self.transaction_type)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
