// Draft state machine: lifecycle transitions, turn tracking, pick application.
//
// A `Draft` is the single denormalized snapshot persisted per league. Every
// mutation happens on an owned copy loaded from the store and is committed
// back with a compare-and-swap on `version`, so all methods here are pure
// in-memory state transitions.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::PlayerAttributes;

use super::order::{DraftMode, DraftSlot};
use super::DraftError;

/// Lifecycle states of a draft.
///
/// Transitions move strictly forward (`NotStarted -> InProgress ->
/// Completed`) except for the reversible `InProgress <-> Paused` pair.
/// `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Paused,
    Completed,
}

/// The result of one applied pick, with display attributes captured at pick
/// time for historical fidelity even if the player entity later changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRecord {
    pub pick_number: u32,
    pub round: u32,
    pub player_id: String,
    pub player_name: String,
    pub position: String,
    pub rating: u32,
    pub picked_at: DateTime<Utc>,
}

/// Per-team participation record. `picks` is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDraftRecord {
    pub team_id: String,
    /// Teams without a human owner; their turns are resolved by autopick.
    pub computer_controlled: bool,
    pub picks: Vec<PickRecord>,
}

/// The complete, snapshot-serializable state of one league's draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Owning league. Immutable; drafts are 1:1 with leagues.
    pub league_id: String,
    /// Session id minted at initialization; a reset produces a new one.
    pub session_id: String,
    pub status: DraftStatus,
    /// 1-based index into `order`; monotonically increases while in
    /// progress. Once completed, `current_pick == order.len() + 1`.
    pub current_pick: u32,
    /// 1-based round, derived from `current_pick` and the team count.
    pub current_round: u32,
    pub mode: DraftMode,
    pub rounds: u32,
    /// Precomputed pick order. Immutable once generated.
    pub order: Vec<DraftSlot>,
    /// Sorted by team_id for deterministic iteration and serialization.
    pub teams: Vec<TeamDraftRecord>,
    /// Player ids not yet picked. Strictly shrinks.
    pub available_players: BTreeSet<String>,
    /// Optimistic-concurrency version; bumped on every committed write.
    pub version: u64,
}

impl Draft {
    /// Assemble a fresh draft in `NotStarted`. The caller (the engine) is
    /// responsible for validating settings and generating `order`.
    pub fn new(
        league_id: String,
        session_id: String,
        mode: DraftMode,
        rounds: u32,
        order: Vec<DraftSlot>,
        teams: Vec<(String, bool)>,
        available_players: BTreeSet<String>,
    ) -> Self {
        let mut teams: Vec<TeamDraftRecord> = teams
            .into_iter()
            .map(|(team_id, computer_controlled)| TeamDraftRecord {
                team_id,
                computer_controlled,
                picks: Vec::new(),
            })
            .collect();
        teams.sort_by(|a, b| a.team_id.cmp(&b.team_id));

        Draft {
            league_id,
            session_id,
            status: DraftStatus::NotStarted,
            current_pick: 1,
            current_round: 1,
            mode,
            rounds,
            order,
            teams,
            available_players,
            version: 0,
        }
    }

    /// Generate a session id from the current UTC timestamp. The millisecond
    /// suffix keeps ids unique even when two drafts initialize in the same
    /// second.
    pub fn generate_session_id() -> String {
        Utc::now().format("draft_%Y%m%d_%H%M%S_%3f").to_string()
    }

    /// The slot whose turn it currently is, or `None` once the order is
    /// exhausted.
    pub fn current_slot(&self) -> Option<&DraftSlot> {
        self.order.get(self.current_pick as usize - 1)
    }

    /// Look up a team by id.
    pub fn team(&self, team_id: &str) -> Option<&TeamDraftRecord> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    fn team_mut(&mut self, team_id: &str) -> Option<&mut TeamDraftRecord> {
        self.teams.iter_mut().find(|t| t.team_id == team_id)
    }

    /// Total picks recorded across all teams. Equals `current_pick - 1` at
    /// all times; the engine asserts this invariant in tests.
    pub fn total_picks_made(&self) -> usize {
        self.teams.iter().map(|t| t.picks.len()).sum()
    }

    /// `NotStarted -> InProgress`.
    pub fn start(&mut self) -> Result<(), DraftError> {
        match self.status {
            DraftStatus::NotStarted => {
                self.status = DraftStatus::InProgress;
                Ok(())
            }
            status => Err(DraftError::InvalidState {
                operation: "start",
                status,
            }),
        }
    }

    /// `InProgress -> Paused`. Picks are rejected while paused; an operation
    /// already validated as in-progress is allowed to finish, the pause
    /// takes effect for the next attempt.
    pub fn pause(&mut self) -> Result<(), DraftError> {
        match self.status {
            DraftStatus::InProgress => {
                self.status = DraftStatus::Paused;
                Ok(())
            }
            status => Err(DraftError::InvalidState {
                operation: "pause",
                status,
            }),
        }
    }

    /// `Paused -> InProgress`.
    pub fn resume(&mut self) -> Result<(), DraftError> {
        match self.status {
            DraftStatus::Paused => {
                self.status = DraftStatus::InProgress;
                Ok(())
            }
            status => Err(DraftError::InvalidState {
                operation: "resume",
                status,
            }),
        }
    }

    /// Validate a pick request without mutating anything.
    ///
    /// Checks run in a fixed order, each a distinct failure:
    /// 1. draft must be `InProgress`
    /// 2. the current slot must belong to `team_id`
    /// 3. `player_id` must still be in the available pool
    ///
    /// Catalog resolution (the fourth rule) happens in the engine, which
    /// owns the catalog handle.
    pub fn validate_pick(&self, team_id: &str, player_id: &str) -> Result<(), DraftError> {
        if self.status != DraftStatus::InProgress {
            return Err(DraftError::InvalidState {
                operation: "pick",
                status: self.status,
            });
        }

        let slot = self.current_slot().ok_or(DraftError::InvalidState {
            operation: "pick",
            status: self.status,
        })?;
        if slot.team_id != team_id {
            return Err(DraftError::OutOfTurn {
                team_id: team_id.to_string(),
                on_clock: slot.team_id.clone(),
            });
        }

        if !self.available_players.contains(player_id) {
            return Err(DraftError::PlayerUnavailable(player_id.to_string()));
        }

        Ok(())
    }

    /// Apply a validated pick as one in-memory unit: remove the player from
    /// the pool, append the pick record, advance the turn pointer, and
    /// complete the draft if that was the final slot.
    ///
    /// Re-runs `validate_pick` first so stale callers cannot bypass the
    /// turn rules.
    pub fn apply_pick(
        &mut self,
        team_id: &str,
        player: &PlayerAttributes,
    ) -> Result<PickRecord, DraftError> {
        self.validate_pick(team_id, &player.player_id)?;

        let slot = self
            .current_slot()
            .expect("validate_pick guarantees a current slot")
            .clone();

        self.available_players.remove(&player.player_id);

        let record = PickRecord {
            pick_number: slot.pick_number,
            round: slot.round,
            player_id: player.player_id.clone(),
            player_name: player.name.clone(),
            position: player.position.clone(),
            rating: player.rating,
            picked_at: Utc::now(),
        };

        let team = self
            .team_mut(team_id)
            .expect("validate_pick matched the slot's team");
        team.picks.push(record.clone());

        self.current_pick += 1;
        let team_count = self.teams.len() as u32;
        self.current_round = ((self.current_pick + team_count - 1) / team_count).min(self.rounds);

        if self.current_pick as usize > self.order.len() {
            self.status = DraftStatus::Completed;
            self.current_round = self.rounds;
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::order::generate_order;

    fn attrs(id: &str, rating: u32) -> PlayerAttributes {
        PlayerAttributes {
            player_id: id.to_string(),
            name: format!("Player {id}"),
            position: "UTIL".to_string(),
            rating,
        }
    }

    fn two_team_draft(rounds: u32) -> Draft {
        let team_ids = vec!["team_a".to_string(), "team_b".to_string()];
        let order = generate_order(&team_ids, rounds, DraftMode::Snake);
        let pool: BTreeSet<String> = (1..=10).map(|i| format!("p{i}")).collect();
        Draft::new(
            "league-1".to_string(),
            "session-1".to_string(),
            DraftMode::Snake,
            rounds,
            order,
            vec![("team_a".to_string(), false), ("team_b".to_string(), true)],
            pool,
        )
    }

    #[test]
    fn new_draft_starts_not_started_at_pick_one() {
        let draft = two_team_draft(2);
        assert_eq!(draft.status, DraftStatus::NotStarted);
        assert_eq!(draft.current_pick, 1);
        assert_eq!(draft.current_round, 1);
        assert_eq!(draft.version, 0);
        assert_eq!(draft.total_picks_made(), 0);
    }

    #[test]
    fn teams_sorted_by_id() {
        let order = generate_order(
            &["z".to_string(), "a".to_string(), "m".to_string()],
            1,
            DraftMode::Linear,
        );
        let draft = Draft::new(
            "l".into(),
            "s".into(),
            DraftMode::Linear,
            1,
            order,
            vec![("z".into(), false), ("a".into(), false), ("m".into(), true)],
            BTreeSet::new(),
        );
        let ids: Vec<&str> = draft.teams.iter().map(|t| t.team_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[test]
    fn start_requires_not_started() {
        let mut draft = two_team_draft(1);
        draft.start().unwrap();
        assert_eq!(draft.status, DraftStatus::InProgress);

        let err = draft.start().unwrap_err();
        assert!(matches!(
            err,
            DraftError::InvalidState {
                operation: "start",
                status: DraftStatus::InProgress
            }
        ));
    }

    #[test]
    fn pause_and_resume_toggle() {
        let mut draft = two_team_draft(1);
        assert!(draft.pause().is_err()); // not started yet
        draft.start().unwrap();

        draft.pause().unwrap();
        assert_eq!(draft.status, DraftStatus::Paused);
        assert!(draft.pause().is_err());

        draft.resume().unwrap();
        assert_eq!(draft.status, DraftStatus::InProgress);
        assert!(draft.resume().is_err());
    }

    #[test]
    fn pick_rejected_before_start() {
        let draft = two_team_draft(1);
        let err = draft.validate_pick("team_a", "p1").unwrap_err();
        assert!(matches!(
            err,
            DraftError::InvalidState {
                operation: "pick",
                status: DraftStatus::NotStarted
            }
        ));
    }

    #[test]
    fn pick_rejected_while_paused() {
        let mut draft = two_team_draft(1);
        draft.start().unwrap();
        draft.pause().unwrap();
        let err = draft.validate_pick("team_a", "p1").unwrap_err();
        assert!(matches!(
            err,
            DraftError::InvalidState {
                operation: "pick",
                status: DraftStatus::Paused
            }
        ));
    }

    #[test]
    fn out_of_turn_pick_rejected() {
        let mut draft = two_team_draft(1);
        draft.start().unwrap();

        let err = draft.validate_pick("team_b", "p1").unwrap_err();
        match err {
            DraftError::OutOfTurn { team_id, on_clock } => {
                assert_eq!(team_id, "team_b");
                assert_eq!(on_clock, "team_a");
            }
            other => panic!("expected OutOfTurn, got {other:?}"),
        }
    }

    #[test]
    fn repeat_pick_by_same_team_rejected_as_out_of_turn() {
        let mut draft = two_team_draft(1);
        draft.start().unwrap();
        draft.apply_pick("team_a", &attrs("p1", 90)).unwrap();

        // team_a again at current_pick = 2, which belongs to team_b
        let err = draft.validate_pick("team_a", "p2").unwrap_err();
        assert!(matches!(err, DraftError::OutOfTurn { .. }));
    }

    #[test]
    fn unavailable_player_rejected() {
        let mut draft = two_team_draft(1);
        draft.start().unwrap();
        draft.apply_pick("team_a", &attrs("p1", 90)).unwrap();

        let err = draft.validate_pick("team_b", "p1").unwrap_err();
        assert!(matches!(err, DraftError::PlayerUnavailable(id) if id == "p1"));
    }

    #[test]
    fn apply_pick_updates_pool_picks_and_pointer() {
        let mut draft = two_team_draft(2);
        draft.start().unwrap();

        let record = draft.apply_pick("team_a", &attrs("p3", 85)).unwrap();
        assert_eq!(record.pick_number, 1);
        assert_eq!(record.round, 1);
        assert_eq!(record.player_id, "p3");
        assert_eq!(record.rating, 85);

        assert!(!draft.available_players.contains("p3"));
        assert_eq!(draft.current_pick, 2);
        assert_eq!(draft.team("team_a").unwrap().picks.len(), 1);
        assert_eq!(draft.total_picks_made(), 1);
        assert_eq!(draft.current_pick as usize - 1, draft.total_picks_made());
    }

    #[test]
    fn round_advances_with_pick_pointer() {
        let mut draft = two_team_draft(2);
        draft.start().unwrap();

        draft.apply_pick("team_a", &attrs("p1", 90)).unwrap();
        assert_eq!(draft.current_round, 1);
        draft.apply_pick("team_b", &attrs("p2", 80)).unwrap();
        assert_eq!(draft.current_round, 2);
    }

    #[test]
    fn final_pick_completes_the_draft() {
        let mut draft = two_team_draft(1);
        draft.start().unwrap();

        draft.apply_pick("team_a", &attrs("p1", 90)).unwrap();
        assert_eq!(draft.status, DraftStatus::InProgress);

        draft.apply_pick("team_b", &attrs("p2", 80)).unwrap();
        assert_eq!(draft.status, DraftStatus::Completed);
        assert_eq!(draft.current_pick as usize, draft.order.len() + 1);
        assert_eq!(draft.current_round, 1);

        // Completed is terminal for every transition.
        assert!(draft.start().is_err());
        assert!(draft.pause().is_err());
        assert!(draft.resume().is_err());
        let err = draft.validate_pick("team_a", "p3").unwrap_err();
        assert!(matches!(
            err,
            DraftError::InvalidState {
                operation: "pick",
                status: DraftStatus::Completed
            }
        ));
    }

    #[test]
    fn snake_order_is_respected_across_rounds() {
        let mut draft = two_team_draft(2);
        draft.start().unwrap();

        // Round 1: a, b. Round 2 (snake): b, a.
        draft.apply_pick("team_a", &attrs("p1", 90)).unwrap();
        draft.apply_pick("team_b", &attrs("p2", 80)).unwrap();
        assert!(draft.validate_pick("team_a", "p3").is_err());
        draft.apply_pick("team_b", &attrs("p3", 70)).unwrap();
        draft.apply_pick("team_a", &attrs("p4", 60)).unwrap();
        assert_eq!(draft.status, DraftStatus::Completed);
    }

    #[test]
    fn pool_conservation_invariant() {
        let mut draft = two_team_draft(2);
        let initial_pool = draft.available_players.len();
        draft.start().unwrap();

        draft.apply_pick("team_a", &attrs("p1", 90)).unwrap();
        draft.apply_pick("team_b", &attrs("p2", 80)).unwrap();
        draft.apply_pick("team_b", &attrs("p3", 70)).unwrap();

        assert_eq!(
            draft.available_players.len() + draft.total_picks_made(),
            initial_pool
        );

        // Picked players never appear in the pool.
        for team in &draft.teams {
            for pick in &team.picks {
                assert!(!draft.available_players.contains(&pick.player_id));
            }
        }
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut draft = two_team_draft(2);
        draft.start().unwrap();
        draft.apply_pick("team_a", &attrs("p1", 90)).unwrap();
        draft.version = 3;

        let json = serde_json::to_string(&draft).unwrap();
        let restored: Draft = serde_json::from_str(&json).unwrap();
        assert_eq!(draft, restored);
    }

    #[test]
    fn generate_session_id_format() {
        let id = Draft::generate_session_id();
        assert!(id.starts_with("draft_"), "unexpected session id: {id}");
        assert!(id.len() >= 24);
    }
}
