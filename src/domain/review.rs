use serde::{Deserialize, Serialize};

/// Reason recorded when a reviewer rejects without giving one.
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

/// Outcome chosen by the business when reviewing submitted work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject { reason: Option<String> },
}

impl ReviewDecision {
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            reason: Some(reason.into()),
        }
    }

    /// Parses the `approve` / `reject` action names used by outer layers.
    pub fn from_action(action: &str, reason: Option<String>) -> Option<Self> {
        match action.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject { reason }),
            _ => None,
        }
    }

    pub fn is_approval(&self) -> bool {
        matches!(self, Self::Approve)
    }

    /// The reason to store on a rejected entity, with blanks defaulted.
    pub fn rejection_reason(&self) -> Option<String> {
        match self {
            Self::Approve => None,
            Self::Reject { reason } => Some(
                reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(DEFAULT_REJECTION_REASON)
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_reason_defaults() {
        assert_eq!(
            ReviewDecision::Reject { reason: None }.rejection_reason(),
            Some(DEFAULT_REJECTION_REASON.to_string())
        );
        assert_eq!(
            ReviewDecision::reject("   ").rejection_reason(),
            Some(DEFAULT_REJECTION_REASON.to_string())
        );
        assert_eq!(
            ReviewDecision::reject("needs revision").rejection_reason(),
            Some("needs revision".to_string())
        );
        assert_eq!(ReviewDecision::Approve.rejection_reason(), None);
    }

    #[test]
    fn test_from_action() {
        assert_eq!(
            ReviewDecision::from_action("APPROVE", None),
            Some(ReviewDecision::Approve)
        );
        assert_eq!(
            ReviewDecision::from_action("reject", Some("x".into())),
            Some(ReviewDecision::reject("x"))
        );
        assert_eq!(ReviewDecision::from_action("escalate", None), None);
    }
}
