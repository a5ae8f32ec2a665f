// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Chat moderation status types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Moderation verdict for a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ModerationStatus {
    /// Message can be delivered
    Safe,
    /// Message contains insults or harassment
    Abusive,
    /// Message is promotional or unsolicited
    Spam,
    /// Message shares a phone number
    PhoneNumber,
}

impl ModerationStatus {
    /// Label used for metrics
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Safe => "safe",
            ModerationStatus::Abusive => "abusive",
            ModerationStatus::Spam => "spam",
            ModerationStatus::PhoneNumber => "phone_number",
        }
    }
}

/// Outcome of moderating a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModerationResult {
    /// Verdict
    pub status: ModerationStatus,
    /// Explanation of the verdict
    #[schema(example = "Message contains a phone number.")]
    pub reason: String,
}

impl ModerationResult {
    /// Create a result from a status and reason
    pub fn new(status: ModerationStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_labels() {
        assert_eq!(ModerationStatus::Safe.as_str(), "safe");
        assert_eq!(ModerationStatus::PhoneNumber.as_str(), "phone_number");
    }

    #[test]
    fn serde_serialization() {
        let serialized = serde_json::to_string(&ModerationStatus::PhoneNumber).unwrap();
        assert_eq!(serialized, "\"PhoneNumber\"");

        let result = ModerationResult::new(ModerationStatus::Safe, "ok");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, serde_json::json!({"status": "Safe", "reason": "ok"}));
    }

    #[test]
    fn serde_deserialization() {
        let deserialized: ModerationStatus = serde_json::from_str("\"Abusive\"").unwrap();
        assert_eq!(deserialized, ModerationStatus::Abusive);

        assert!(serde_json::from_str::<ModerationStatus>("\"Unknown\"").is_err());
    }
}
