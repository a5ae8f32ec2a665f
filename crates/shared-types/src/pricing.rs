// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Price suggestion types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Plausibility annotation comparing the asking price with the suggested range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum FraudFlag {
    /// Asking price is within a plausible distance of the range
    Normal,
    /// Asking price exceeds one and a half times the upper bound
    SuspiciousHigh,
    /// Asking price is below half of the lower bound
    SuspiciousLow,
}

impl FraudFlag {
    /// Check if the flag marks the listing as suspicious
    pub fn is_suspicious(self) -> bool {
        !matches!(self, Self::Normal)
    }

    /// Label used for metrics
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::SuspiciousHigh => "suspicious_high",
            Self::SuspiciousLow => "suspicious_low",
        }
    }
}

/// Suggested fair price range for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceSuggestion {
    /// Lower bound of the fair price range
    #[schema(example = 21432.0)]
    pub min_price: f64,
    /// Upper bound of the fair price range, never below `min_price`
    #[schema(example = 23688.0)]
    pub max_price: f64,
    /// Explanation of how the range was obtained
    pub reason: String,
    /// Plausibility of the asking price against the range
    pub fraud_flag: FraudFlag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraud_flag_wire_names() {
        assert_eq!(
            serde_json::to_string(&FraudFlag::SuspiciousHigh).unwrap(),
            "\"SuspiciousHigh\""
        );
        assert_eq!(
            serde_json::from_str::<FraudFlag>("\"Normal\"").unwrap(),
            FraudFlag::Normal
        );
    }

    #[test]
    fn only_normal_is_unsuspicious() {
        assert!(!FraudFlag::Normal.is_suspicious());
        assert!(FraudFlag::SuspiciousLow.is_suspicious());
        assert!(FraudFlag::SuspiciousHigh.is_suspicious());
    }
}
