use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::PaymentOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Bearer credential from the OAuth endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCredential {
    pub access_token: String,
    /// Lifetime in seconds, as a string on the wire
    #[serde(default)]
    pub expires_in: Option<String>,
}

/// Lipa Na M-Pesa Online (STK push) request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkPushRequest {
    pub business_short_code: String,
    pub password: String,
    pub timestamp: String,
    pub transaction_type: String,
    pub amount: i64,
    /// Payer
    pub party_a: String,
    /// Receiving shortcode
    pub party_b: String,
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub call_back_url: String,
    pub account_reference: String,
    pub transaction_desc: String,
}

/// Raw acknowledgement returned by the STK push endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StkPushAcknowledgement {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode", default)]
    pub response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: String,
}

impl StkPushAcknowledgement {
    /// "0" means the push was accepted for processing
    pub fn is_accepted(&self) -> bool {
        self.response_code == "0"
    }
}

/// Asynchronous result envelope posted to the callback URL
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: Option<CallbackBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: Option<StkCallback>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata")]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackMetadata {
    /// Null and missing both mean no items
    #[serde(rename = "Item", default)]
    pub items: Option<Vec<CallbackItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackItem {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: serde_json::Value,
}

/// Parse a raw callback body into an outcome
pub fn parse_callback(raw: &str) -> DomainResult<PaymentOutcome> {
    let envelope: CallbackEnvelope = serde_json::from_str(raw)
        .map_err(|e| DomainError::MalformedPayload(format!("invalid callback body: {}", e)))?;

    let callback = envelope
        .body
        .and_then(|body| body.stk_callback)
        .ok_or_else(|| DomainError::MalformedPayload("missing Body.stkCallback".to_string()))?;

    let mut outcome = PaymentOutcome {
        result_code: callback.result_code,
        result_description: callback.result_desc,
        merchant_request_id: callback.merchant_request_id,
        checkout_request_id: callback.checkout_request_id,
        ..Default::default()
    };

    let items = callback
        .callback_metadata
        .and_then(|metadata| metadata.items)
        .unwrap_or_default();

    for item in items {
        match item.name.as_deref().unwrap_or_default() {
            "MpesaReceiptNumber" => outcome.transaction_id = value_as_string(&item.value),
            "PhoneNumber" => outcome.phone = value_as_string(&item.value),
            "Amount" => outcome.amount = value_as_amount(&item.value),
            _ => {}
        }
    }

    Ok(outcome)
}

fn value_as_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn value_as_amount(value: &serde_json::Value) -> i64 {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|v| v.round() as i64))
            .unwrap_or_default(),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|v| v.round() as i64)
            .unwrap_or_default(),
        _ => 0,
    }
}

/// M-Pesa Daraja API port
#[async_trait]
pub trait MpesaPort: Send + Sync {
    /// Exchange the consumer key/secret for a bearer token
    async fn fetch_access_token(&self) -> DomainResult<ProviderCredential>;

    /// Submit a push-payment request
    async fn submit_stk_push(
        &self,
        credential: &ProviderCredential,
        request: &StkPushRequest,
    ) -> DomainResult<StkPushAcknowledgement>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_successful_callback() {
        let raw = r#"{
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            { "Name": "Amount", "Value": 500.00 },
                            { "Name": "MpesaReceiptNumber", "Value": "QAB123" },
                            { "Name": "Balance" },
                            { "Name": "TransactionDate", "Value": 20191219102115 },
                            { "Name": "PhoneNumber", "Value": 254712345678 }
                        ]
                    }
                }
            }
        }"#;

        let outcome = parse_callback(raw).unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.checkout_request_id, "ws_CO_191220191020363925");
        assert_eq!(outcome.merchant_request_id, "29115-34620561-1");
        assert_eq!(outcome.transaction_id, "QAB123");
        assert_eq!(outcome.phone, "254712345678");
        assert_eq!(outcome.amount, 500);
    }

    #[test]
    fn test_missing_metadata_leaves_defaults() {
        let raw = r#"{"Body":{"stkCallback":{"ResultCode":1,"ResultDesc":"Insufficient funds"}}}"#;

        let outcome = parse_callback(raw).unwrap();

        assert!(!outcome.is_success());
        assert_eq!(outcome.result_description, "Insufficient funds");
        assert_eq!(outcome.transaction_id, "");
        assert_eq!(outcome.phone, "");
        assert_eq!(outcome.amount, 0);
        assert_eq!(outcome.receipt(), None);
    }

    #[test]
    fn test_unknown_items_are_ignored() {
        let raw = r#"{"Body":{"stkCallback":{"ResultCode":0,"ResultDesc":"ok",
            "CallbackMetadata":{"Item":[{"Name":"Foo","Value":"bar"},{"Name":"Amount","Value":"250"}]}}}}"#;

        let outcome = parse_callback(raw).unwrap();

        assert_eq!(outcome.amount, 250);
        assert_eq!(outcome.transaction_id, "");
    }

    #[test]
    fn test_null_metadata_items_leave_defaults() {
        for raw in [
            r#"{"Body":{"stkCallback":{"ResultCode":1032,"ResultDesc":"Cancelled","CallbackMetadata":{"Item":null}}}}"#,
            r#"{"Body":{"stkCallback":{"ResultCode":1032,"ResultDesc":"Cancelled","CallbackMetadata":null}}}"#,
            r#"{"Body":{"stkCallback":{"ResultCode":1032,"ResultDesc":"Cancelled","CallbackMetadata":{}}}}"#,
        ] {
            let outcome = parse_callback(raw).unwrap();
            assert_eq!(outcome.result_code, 1032, "{}", raw);
            assert_eq!(outcome.transaction_id, "");
            assert_eq!(outcome.amount, 0);
        }
    }

    #[test]
    fn test_nameless_items_are_skipped() {
        let raw = r#"{"Body":{"stkCallback":{"ResultCode":0,"ResultDesc":"ok",
            "CallbackMetadata":{"Item":[{"Value":"orphan"},{"Name":null,"Value":1},{"Name":"MpesaReceiptNumber","Value":"QAB123"}]}}}}"#;

        let outcome = parse_callback(raw).unwrap();

        assert_eq!(outcome.transaction_id, "QAB123");
        assert_eq!(outcome.amount, 0);
    }

    #[test]
    fn test_missing_envelope_is_malformed() {
        for raw in [
            r#"{}"#,
            r#"{"Body":{}}"#,
            r#"{"Body":{"somethingElse":{}}}"#,
            r#"not json"#,
            r#"{"Body":{"stkCallback":{"ResultDesc":"no code"}}}"#,
        ] {
            assert!(
                matches!(parse_callback(raw), Err(DomainError::MalformedPayload(_))),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_stk_push_request_wire_names() {
        let request = StkPushRequest {
            business_short_code: "174379".to_string(),
            password: "pw".to_string(),
            timestamp: "20240101120000".to_string(),
            transaction_type: "CustomerPayBillOnline".to_string(),
            amount: 500,
            party_a: "254712345678".to_string(),
            party_b: "174379".to_string(),
            phone_number: "254712345678".to_string(),
            call_back_url: "https://example.test/cb".to_string(),
            account_reference: "SWY1".to_string(),
            transaction_desc: "Payment for order SWY1".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["BusinessShortCode"], "174379");
        assert_eq!(json["CallBackURL"], "https://example.test/cb");
        assert_eq!(json["PartyA"], "254712345678");
        assert_eq!(json["PartyB"], "174379");
        assert_eq!(json["Amount"], 500);
        assert_eq!(json["AccountReference"], "SWY1");
    }
}
