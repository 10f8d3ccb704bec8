use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Proctoring signals the client-side monitor can report. The closed set
/// keeps handling exhaustive; unknown kinds are rejected at the DTO layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    TabSwitch,
    WindowBlur,
    DevtoolsOpen,
    CopyPaste,
    NavigationAway,
    FullscreenExit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityViolation {
    pub kind: ViolationKind,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}
