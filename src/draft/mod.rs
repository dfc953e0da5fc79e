// Draft domain: order generation, state machine, pick application, autopick.

pub mod autopick;
pub mod order;
pub mod state;

use thiserror::Error;

use state::DraftStatus;

/// Errors surfaced by draft operations.
///
/// The first four are terminal validation failures: the requested operation
/// is rejected and no state changes. `Conflict` means a concurrent writer
/// committed between our read and our write; the caller should reload and
/// retry. `Storage` wraps faults from the persistence backend.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("cannot {operation} while draft is {status:?}")]
    InvalidState {
        operation: &'static str,
        status: DraftStatus,
    },

    #[error("team {team_id} is not on the clock (current turn belongs to {on_clock})")]
    OutOfTurn { team_id: String, on_clock: String },

    #[error("player {0} is not in the available pool")]
    PlayerUnavailable(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("draft was modified concurrently; retry against fresh state")]
    Conflict,

    #[error("invalid draft settings: {0}")]
    InvalidSettings(String),

    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
}

impl DraftError {
    /// Whether the caller can retry the operation unchanged after reloading
    /// state. Only concurrent-modification conflicts qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DraftError::Conflict)
    }
}
