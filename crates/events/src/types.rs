//! Wire records streamed to clients

use attendance_core::ScrapeOutcome;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One streamed record. The shape of the JSON object identifies the kind:
/// `{"message"}` for progress, `{"result"}` for a normal terminal record and
/// `{"fault"}` when the attempt failed unexpectedly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(untagged)]
pub enum WireMessage {
    Progress { message: String },
    Result { result: ResultPayload },
    Fault { fault: FaultPayload },
}

/// Payload of a `result` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(untagged)]
pub enum ResultPayload {
    Success {
        name: String,
        total_percentage: String,
    },
    /// The portal rejected the registration number
    Rejected { error: String },
}

/// Payload of a `fault` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FaultPayload {
    pub message: String,
}

impl WireMessage {
    pub fn progress(message: impl Into<String>) -> Self {
        Self::Progress {
            message: message.into(),
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault {
            fault: FaultPayload {
                message: message.into(),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Result { .. } => "result",
            Self::Fault { .. } => "fault",
        }
    }

    /// Result and fault records end the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<&ScrapeOutcome> for WireMessage {
    fn from(outcome: &ScrapeOutcome) -> Self {
        match outcome {
            ScrapeOutcome::Success {
                student_name,
                total_percentage,
            } => Self::Result {
                result: ResultPayload::Success {
                    name: student_name.clone(),
                    total_percentage: total_percentage.clone(),
                },
            },
            ScrapeOutcome::Rejected { reason } => Self::Result {
                result: ResultPayload::Rejected {
                    error: reason.clone(),
                },
            },
            ScrapeOutcome::Faulted { message } => Self::fault(message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_progress_shape() {
        let value = serde_json::to_value(WireMessage::progress("Launching browser...")).unwrap();
        assert_eq!(value, json!({ "message": "Launching browser..." }));
    }

    #[test]
    fn test_success_shape() {
        let msg = WireMessage::from(&ScrapeOutcome::success("WELCOME JOHN DOE", "87%"));
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "result": { "name": "WELCOME JOHN DOE", "total_percentage": "87%" } })
        );
        assert!(msg.is_terminal());
    }

    #[test]
    fn test_rejected_shape() {
        let msg = WireMessage::from(&ScrapeOutcome::Rejected {
            reason: "Invalid Registration Number".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "result": { "error": "Invalid Registration Number" } })
        );
    }

    #[test]
    fn test_fault_is_distinguished_from_result() {
        let msg = WireMessage::from(&ScrapeOutcome::Faulted {
            message: "Scraping failed for 2021001: boom".to_string(),
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["fault"]["message"], "Scraping failed for 2021001: boom");
        assert_eq!(msg.kind(), "fault");
    }

    #[test]
    fn test_deserialize_each_kind() {
        let progress: WireMessage = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(progress, WireMessage::progress("hi"));

        let rejected: WireMessage = serde_json::from_str(r#"{"result":{"error":"nope"}}"#).unwrap();
        assert!(matches!(
            rejected,
            WireMessage::Result {
                result: ResultPayload::Rejected { .. }
            }
        ));

        let fault: WireMessage = serde_json::from_str(r#"{"fault":{"message":"x"}}"#).unwrap();
        assert_eq!(fault, WireMessage::fault("x"));
    }
}
