// LLM-backed need ranking for autopick.
//
// The generative service is an optional enhancement: any error or
// unparseable result makes the engine fall back to its deterministic local
// policy, so a ranking failure can never block a draft.

pub mod client;
pub mod prompt;

pub use client::{AnthropicClient, RankingClient};

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::PlayerAttributes;
use crate::draft::autopick::RosterNeeds;
use crate::draft::state::TeamDraftRecord;

/// Failures of the ranking collaborator. Never surfaced to engine callers;
/// the engine logs them and falls back.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("ranking service not configured")]
    Disabled,

    #[error("ranking request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ranking service returned status {0}")]
    Api(u16),

    #[error("unparseable ranking response: {0}")]
    Malformed(String),

    #[error("ranking service chose {0}, which is not a supplied candidate")]
    NotACandidate(String),
}

/// A collaborator that picks the best candidate for a team's roster needs.
#[async_trait]
pub trait NeedRanker: Send + Sync {
    /// Choose one player id from `candidates`. Implementations must only
    /// return members of the supplied candidate set.
    async fn rank_for_need(
        &self,
        team: &TeamDraftRecord,
        candidates: &[PlayerAttributes],
        needs: &RosterNeeds,
        pick_number: u32,
        round: u32,
    ) -> Result<String, RankingError>;
}
