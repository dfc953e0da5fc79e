// Draft order generation: the precomputed (pick, round, team) sequence.

use serde::{Deserialize, Serialize};

/// How the team sequence evolves from round to round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftMode {
    /// Odd rounds iterate teams in the given order, even rounds in exactly
    /// reversed order (1-indexed).
    Snake,
    /// Every round iterates teams in the given order.
    Linear,
}

/// One entry in the precomputed draft order. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSlot {
    /// Sequential pick number (1-indexed, dense, no gaps).
    pub pick_number: u32,
    /// Round this pick belongs to (1-indexed).
    pub round: u32,
    /// The team that owns this pick.
    pub team_id: String,
}

/// Generate the full pick order for a draft.
///
/// Output length is exactly `rounds * team_ids.len()`, with pick numbers
/// assigned densely starting at 1 in iteration order. Pure and fully
/// deterministic from its inputs, which is what makes draft audit/replay
/// and order tests possible.
///
/// Callers are responsible for rejecting degenerate inputs (fewer than two
/// teams); the generator itself does not special-case them.
pub fn generate_order(team_ids: &[String], rounds: u32, mode: DraftMode) -> Vec<DraftSlot> {
    let mut order = Vec::with_capacity(team_ids.len() * rounds as usize);
    let mut pick_number = 1u32;

    for round in 1..=rounds {
        let reversed = mode == DraftMode::Snake && round % 2 == 0;
        let round_teams: Vec<&String> = if reversed {
            team_ids.iter().rev().collect()
        } else {
            team_ids.iter().collect()
        };

        for team_id in round_teams {
            order.push(DraftSlot {
                pick_number,
                round,
                team_id: team_id.clone(),
            });
            pick_number += 1;
        }
    }

    order
}
