// =============================================================================
// Shared types used across the Aurum signal desk
// =============================================================================

use serde::{Deserialize, Serialize};

/// Where the last successful price tick came from, or why there was none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedStatus {
    /// No tick received yet since startup.
    Starting,
    /// Primary endpoint answering.
    Live,
    /// Primary failed, fallback endpoint answering.
    Fallback,
    /// Both endpoints failed on the most recent poll.
    Down,
}

impl Default for FeedStatus {
    fn default() -> Self {
        Self::Starting
    }
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "Starting"),
            Self::Live => write!(f, "Live"),
            Self::Fallback => write!(f, "Fallback"),
            Self::Down => write!(f, "Down"),
        }
    }
}
