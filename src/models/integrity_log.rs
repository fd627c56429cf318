use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable, append-only observation reported by the proctoring monitor.
/// Rows are never updated or deleted except by cascade with the attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IntegrityLogEntry {
    pub id: Uuid,
    pub attempt_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: String,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Wire-stable event types. The serialized strings are part of the API and
/// of persisted rows; do not rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityEventType {
    WindowBlur,
    TabHidden,
    RightClickAttempt,
    CopyAttempt,
    PasteAttempt,
    ForbiddenKeyPress,
    PrintAttempt,
    SuspiciousAnswerPattern,
    AutomaticTermination,
}

impl IntegrityEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrityEventType::WindowBlur => "window_blur",
            IntegrityEventType::TabHidden => "tab_hidden",
            IntegrityEventType::RightClickAttempt => "right_click_attempt",
            IntegrityEventType::CopyAttempt => "copy_attempt",
            IntegrityEventType::PasteAttempt => "paste_attempt",
            IntegrityEventType::ForbiddenKeyPress => "forbidden_key_press",
            IntegrityEventType::PrintAttempt => "print_attempt",
            IntegrityEventType::SuspiciousAnswerPattern => "suspicious_answer_pattern",
            IntegrityEventType::AutomaticTermination => "automatic_termination",
        }
    }

    /// Whether this event increments the shared violation counter that
    /// drives automatic termination. Leaving the exam context (blur/hide)
    /// counts; clipboard, print and key events are monitoring-only.
    pub fn is_counted(&self) -> bool {
        matches!(
            self,
            IntegrityEventType::WindowBlur | IntegrityEventType::TabHidden
        )
    }
}

impl std::fmt::Display for IntegrityEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IntegrityEventType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "window_blur" => Ok(IntegrityEventType::WindowBlur),
            "tab_hidden" => Ok(IntegrityEventType::TabHidden),
            "right_click_attempt" => Ok(IntegrityEventType::RightClickAttempt),
            "copy_attempt" => Ok(IntegrityEventType::CopyAttempt),
            "paste_attempt" => Ok(IntegrityEventType::PasteAttempt),
            "forbidden_key_press" => Ok(IntegrityEventType::ForbiddenKeyPress),
            "print_attempt" => Ok(IntegrityEventType::PrintAttempt),
            "suspicious_answer_pattern" => Ok(IntegrityEventType::SuspiciousAnswerPattern),
            "automatic_termination" => Ok(IntegrityEventType::AutomaticTermination),
            other => Err(format!("unknown integrity event type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn wire_strings_round_trip() {
        let all = [
            IntegrityEventType::WindowBlur,
            IntegrityEventType::TabHidden,
            IntegrityEventType::RightClickAttempt,
            IntegrityEventType::CopyAttempt,
            IntegrityEventType::PasteAttempt,
            IntegrityEventType::ForbiddenKeyPress,
            IntegrityEventType::PrintAttempt,
            IntegrityEventType::SuspiciousAnswerPattern,
            IntegrityEventType::AutomaticTermination,
        ];
        for ty in all {
            assert_eq!(IntegrityEventType::from_str(ty.as_str()).unwrap(), ty);
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
        }
    }

    #[test]
    fn only_blur_and_hide_are_counted() {
        assert!(IntegrityEventType::WindowBlur.is_counted());
        assert!(IntegrityEventType::TabHidden.is_counted());
        assert!(!IntegrityEventType::RightClickAttempt.is_counted());
        assert!(!IntegrityEventType::CopyAttempt.is_counted());
        assert!(!IntegrityEventType::PasteAttempt.is_counted());
        assert!(!IntegrityEventType::ForbiddenKeyPress.is_counted());
        assert!(!IntegrityEventType::PrintAttempt.is_counted());
        assert!(!IntegrityEventType::SuspiciousAnswerPattern.is_counted());
        assert!(!IntegrityEventType::AutomaticTermination.is_counted());
    }
}
