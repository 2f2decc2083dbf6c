//! Per-step results for multi-step provisioning flows.
//!
//! Best-effort steps never abort a flow; their result is reported back to the
//! caller as a list of [`StepOutcome`]s next to the primary resource.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Completed {
        #[serde(skip_serializing_if = "Option::is_none")]
        sid: Option<String>,
    },
    Failed {
        message: String,
    },
    Skipped {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl StepOutcome {
    pub fn completed(step: impl Into<String>, sid: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            outcome: Outcome::Completed {
                sid: Some(sid.into()),
            },
        }
    }

    pub fn failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            outcome: Outcome::Failed {
                message: message.into(),
            },
        }
    }

    pub fn skipped(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            outcome: Outcome::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_flat() {
        let value = serde_json::to_value(StepOutcome::failed("assign_item", "boom")).unwrap();
        assert_eq!(
            value,
            json!({"step": "assign_item", "outcome": "failed", "message": "boom"})
        );
    }
}
