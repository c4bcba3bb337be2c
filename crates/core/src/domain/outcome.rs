// Invocation Outcome Domain Model

use serde::{Deserialize, Serialize};

/// Normalized result of one dispatched operation
///
/// `error_message` is present if and only if `succeeded` is false; the
/// constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    succeeded: bool,
    output: String,
    diagnostic: String,
    error_message: Option<String>,
}

impl Outcome {
    pub fn success(output: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
            diagnostic: diagnostic.into(),
            error_message: None,
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self::failure_with_streams(error_message, String::new(), String::new())
    }

    pub fn failure_with_streams(
        error_message: impl Into<String>,
        output: impl Into<String>,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
            diagnostic: diagnostic.into(),
            error_message: Some(error_message.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Wire shape returned to callers: `{success, data?, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Outcome> for CommandResponse {
    fn from(outcome: Outcome) -> Self {
        if outcome.succeeded {
            CommandResponse {
                success: true,
                data: Some(outcome.output),
                error: None,
            }
        } else {
            CommandResponse {
                success: false,
                data: None,
                error: outcome.error_message,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_iff_failed() {
        let ok = Outcome::success("out", "warn");
        assert!(ok.succeeded());
        assert!(ok.error_message().is_none());

        let failed = Outcome::failure("boom");
        assert!(!failed.succeeded());
        assert_eq!(failed.error_message(), Some("boom"));
    }

    #[test]
    fn test_response_wire_shape() {
        let json = serde_json::to_value(CommandResponse::from(Outcome::failure("bad"))).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "bad"}));

        let json = serde_json::to_value(CommandResponse::from(Outcome::success("", ""))).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": ""}));
    }
}
