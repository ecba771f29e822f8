//! Error types for the harvestbot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use crate::geometry::Vec3;
use thiserror::Error;

/// The top-level error type for all harvestbot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- World session errors ---
    #[error("World error: {0}")]
    World(#[from] WorldError),

    // --- Navigation errors ---
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    // --- Chest / deposit errors ---
    #[error("Chest error: {0}")]
    Chest(#[from] ChestError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum WorldError {
    #[error("World session lost: {0}")]
    SessionLost(String),

    #[error("Action failed: {action}: {reason}")]
    ActionFailed { action: String, reason: String },

    #[error("Nothing matching {0} found")]
    NotFound(String),
}

impl WorldError {
    /// Shorthand for an `ActionFailed` error.
    pub fn action(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActionFailed {
            action: action.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    #[error("Goal unreachable after {attempts} attempts")]
    Unreachable { attempts: u32 },

    #[error("Travel failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Error)]
pub enum ChestError {
    #[error("No chest set")]
    NotSet,

    #[error("Saved chest at {position} is missing")]
    Missing { position: Vec3 },

    #[error("No chest found within {radius} blocks")]
    NotFound { radius: f64 },

    #[error("Cannot reach chest after {attempts} attempts")]
    Unreachable { attempts: u32 },

    #[error("Failed to open chest: {0}")]
    OpenFailed(String),

    #[error("Failed to deposit {item}: {reason}")]
    TransferFailed { item: String, reason: String },

    #[error("Timed out waiting for a chest to open")]
    WatchTimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_displays_attempts() {
        let err = Error::Navigation(NavigationError::Unreachable { attempts: 20 });
        assert!(err.to_string().contains("20 attempts"));
    }

    #[test]
    fn chest_missing_displays_position() {
        let err = Error::Chest(ChestError::Missing {
            position: Vec3::new(4.0, 64.0, -2.0),
        });
        assert!(err.to_string().contains("4, 64, -2"));
    }

    #[test]
    fn action_shorthand_builds_action_failed() {
        let err = WorldError::action("equip", "slot empty");
        assert!(matches!(err, WorldError::ActionFailed { .. }));
        assert!(err.to_string().contains("slot empty"));
    }
}
