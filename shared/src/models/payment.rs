//! Payment method and status enums

use serde::{Deserialize, Serialize};

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Online payment through the HitPay gateway
    Hitpay,
    BankTransfer,
    Cash,
}

impl PaymentMethod {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "hitpay" => Some(Self::Hitpay),
            "bank_transfer" => Some(Self::BankTransfer),
            "cash" => Some(Self::Cash),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Hitpay => "hitpay",
            Self::BankTransfer => "bank_transfer",
            Self::Cash => "cash",
        }
    }

    /// Settled manually and confirmed by staff
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::BankTransfer | Self::Cash)
    }

    /// Provider label stored alongside online payments
    pub fn provider(&self) -> Option<&'static str> {
        match self {
            Self::Hitpay => Some("hitpay"),
            _ => None,
        }
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Created,
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Map a gateway-reported status onto the internal status.
    ///
    /// Unknown strings yield `None`; callers keep the current status.
    pub fn from_gateway(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "succeeded" | "completed" => Some(Self::Paid),
            "pending" => Some(Self::Created),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_db_roundtrip() {
        for m in [
            PaymentMethod::Hitpay,
            PaymentMethod::BankTransfer,
            PaymentMethod::Cash,
        ] {
            assert_eq!(PaymentMethod::from_db(m.as_db()), Some(m));
        }
        assert_eq!(PaymentMethod::from_db("stripe"), None);
        assert!(PaymentMethod::Cash.is_offline());
        assert!(!PaymentMethod::Hitpay.is_offline());
        assert_eq!(PaymentMethod::Hitpay.provider(), Some("hitpay"));
    }

    #[test]
    fn test_gateway_status_mapping() {
        assert_eq!(
            PaymentStatus::from_gateway("succeeded"),
            Some(PaymentStatus::Paid)
        );
        assert_eq!(
            PaymentStatus::from_gateway("COMPLETED"),
            Some(PaymentStatus::Paid)
        );
        assert_eq!(
            PaymentStatus::from_gateway("pending"),
            Some(PaymentStatus::Created)
        );
        assert_eq!(
            PaymentStatus::from_gateway("failed"),
            Some(PaymentStatus::Failed)
        );
        assert_eq!(
            PaymentStatus::from_gateway("cancelled"),
            Some(PaymentStatus::Cancelled)
        );
        assert_eq!(PaymentStatus::from_gateway("refunded"), None);
        assert_eq!(PaymentStatus::from_gateway(""), None);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::BankTransfer).unwrap();
        assert_eq!(json, "\"bank_transfer\"");
        let s: PaymentStatus = serde_json::from_str("\"paid\"").unwrap();
        assert_eq!(s, PaymentStatus::Paid);
    }
}
