use serde::{Deserialize, Serialize};

/// Lifecycle status of one purchase attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    /// No amount entered.
    #[default]
    Idle,
    /// Waiting for the relay to return a payment link.
    CreatingOrder,
    /// Payment page is loading inside the embedded view.
    LoadingPayment,
    /// Payment page is ready for the buyer.
    Ready,
    /// Payment was committed and is being processed.
    Processing,
    Success,
    Error,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CreatingOrder => "creating-order",
            Self::LoadingPayment => "loading-payment",
            Self::Ready => "ready",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::LoadingPayment).unwrap(),
            "\"loading-payment\""
        );
        assert_eq!(PaymentStatus::CreatingOrder.to_string(), "creating-order");
        assert_eq!(PaymentStatus::default(), PaymentStatus::Idle);
    }
}
