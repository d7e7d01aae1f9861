use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment dimension of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting the provider callback
    Pending,
    /// Provider reported success (terminal)
    Completed,
    /// Provider reported failure (terminal)
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(DomainError::Persistence(format!(
                "unknown payment status: {}",
                other
            ))),
        }
    }
}

/// Fulfilment dimension of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
    InTransit,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "in_transit" => Ok(OrderStatus::InTransit),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(DomainError::Persistence(format!(
                "unknown order status: {}",
                other
            ))),
        }
    }
}

/// Amount in whole Kenyan shillings (M-Pesa accepts no fractional amounts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    shillings: i64,
}

impl Money {
    /// Create a positive amount
    pub fn from_shillings(shillings: i64) -> DomainResult<Self> {
        if shillings <= 0 {
            return Err(DomainError::Validation(format!(
                "Amount must be a positive number of shillings, got {}",
                shillings
            )));
        }
        Ok(Self { shillings })
    }

    /// Wrap a stored value without validation
    pub(crate) fn from_stored(shillings: i64) -> Self {
        Self { shillings }
    }

    pub fn to_shillings(&self) -> i64 {
        self.shillings
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KES {}", self.shillings)
    }
}

/// Kenyan subscriber number in 12-digit international form (2547XXXXXXXX)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Msisdn(String);

impl Msisdn {
    /// Normalize `2547…`, `+2547…`, `07…` and `01…` inputs
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let digits: String = raw
            .trim()
            .trim_start_matches('+')
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect();

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::Validation(format!(
                "Phone number must contain only digits: {}",
                raw
            )));
        }

        let international = match digits.strip_prefix('0') {
            Some(local) if local.len() == 9 => format!("254{}", local),
            _ => digits,
        };

        let valid = international.len() == 12
            && international.starts_with("254")
            && matches!(international.as_bytes()[3], b'1' | b'7');
        if !valid {
            return Err(DomainError::Validation(format!(
                "Phone number is not a valid Kenyan MSISDN: {}",
                raw
            )));
        }

        Ok(Self(international))
    }

    /// Wrap a stored value without validation
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Msisdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msisdn_normalization() {
        for raw in ["254712345678", "+254712345678", "0712345678", "+254 712 345 678", "0712-345-678"] {
            assert_eq!(Msisdn::parse(raw).unwrap().as_str(), "254712345678", "{}", raw);
        }
        assert_eq!(Msisdn::parse("0110000000").unwrap().as_str(), "254110000000");
    }

    #[test]
    fn test_msisdn_rejects_garbage() {
        assert!(Msisdn::parse("").is_err());
        assert!(Msisdn::parse("07123").is_err());
        assert!(Msisdn::parse("255712345678").is_err());
        assert!(Msisdn::parse("2547123456ab").is_err());
        assert!(Msisdn::parse("254212345678").is_err());
    }

    #[test]
    fn test_money() {
        let money = Money::from_shillings(500).unwrap();
        assert_eq!(money.to_shillings(), 500);
        assert_eq!(format!("{}", money), "KES 500");
        assert!(Money::from_shillings(0).is_err());
        assert!(Money::from_shillings(-1).is_err());
    }

    #[test]
    fn test_status_round_trip_through_storage_names() {
        assert_eq!("completed".parse::<PaymentStatus>().unwrap(), PaymentStatus::Completed);
        assert_eq!("in_transit".parse::<OrderStatus>().unwrap(), OrderStatus::InTransit);
        assert!("paid".parse::<PaymentStatus>().is_err());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!(!PaymentStatus::Pending.is_terminal());
    }
}
