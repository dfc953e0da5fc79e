// Autopick policies for computer-controlled teams.
//
// Policies are pure and deterministic: any ranking randomness would make
// draft replays and tests unreproducible. The LLM-backed need ranking lives
// in `crate::llm`; when it is unavailable or fails, the engine falls back to
// a policy from this module, so autopick can never block a draft.

use std::collections::HashMap;

use crate::catalog::PlayerAttributes;

use super::state::{PickRecord, TeamDraftRecord};

/// Per-position fill counts derived from a team's pick history. Feeds the
/// need-aware weighting.
#[derive(Debug, Clone, Default)]
pub struct RosterNeeds {
    counts: HashMap<String, usize>,
}

impl RosterNeeds {
    pub fn from_picks(picks: &[PickRecord]) -> Self {
        let mut counts = HashMap::new();
        for pick in picks {
            *counts.entry(pick.position.clone()).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// How many players at `position` the team has already drafted.
    pub fn filled(&self, position: &str) -> usize {
        self.counts.get(position).copied().unwrap_or(0)
    }

    /// Positions drafted so far, for prompt construction.
    pub fn positions(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(p, &n)| (p.as_str(), n))
    }
}

/// A strategy that selects a player for a computer-controlled team.
///
/// Implementations must always return a member of `candidates` when the
/// slice is non-empty, and must be deterministic from their inputs.
pub trait AutopickPolicy: Send + Sync {
    fn select(
        &self,
        team: &TeamDraftRecord,
        candidates: &[PlayerAttributes],
        needs: &RosterNeeds,
        pick_number: u32,
        round: u32,
    ) -> Option<String>;
}

/// The baseline deterministic policy: highest rating wins, ties broken by
/// lowest player id.
pub struct HighestRated;

impl AutopickPolicy for HighestRated {
    fn select(
        &self,
        _team: &TeamDraftRecord,
        candidates: &[PlayerAttributes],
        _needs: &RosterNeeds,
        _pick_number: u32,
        _round: u32,
    ) -> Option<String> {
        candidates
            .iter()
            .max_by(|a, b| {
                a.rating
                    .cmp(&b.rating)
                    .then_with(|| b.player_id.cmp(&a.player_id))
            })
            .map(|p| p.player_id.clone())
    }
}

/// Need-aware policy: discounts candidates at positions the team has
/// already filled. Still deterministic; ties break to the lowest player id.
pub struct NeedWeighted {
    /// Discount applied per player already drafted at the same position.
    /// 0.0 degenerates to `HighestRated`.
    pub position_discount: f64,
}

impl Default for NeedWeighted {
    fn default() -> Self {
        Self {
            position_discount: 0.25,
        }
    }
}

impl NeedWeighted {
    fn score(&self, player: &PlayerAttributes, needs: &RosterNeeds) -> f64 {
        let filled = needs.filled(&player.position) as f64;
        f64::from(player.rating) / (1.0 + self.position_discount * filled)
    }
}

impl AutopickPolicy for NeedWeighted {
    fn select(
        &self,
        _team: &TeamDraftRecord,
        candidates: &[PlayerAttributes],
        needs: &RosterNeeds,
        _pick_number: u32,
        _round: u32,
    ) -> Option<String> {
        candidates
            .iter()
            .max_by(|a, b| {
                self.score(a, needs)
                    .partial_cmp(&self.score(b, needs))
                    .expect("scores are finite")
                    .then_with(|| b.player_id.cmp(&a.player_id))
            })
            .map(|p| p.player_id.clone())
    }
}
