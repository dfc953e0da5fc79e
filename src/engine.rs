// Draft engine: the orchestration layer tying store, catalog, roster,
// autopick, and events together.
//
// Every mutating operation follows the same shape: load the snapshot,
// transition it in memory, commit with compare-and-swap, then run
// post-commit side effects (roster assignment, event emission). A CAS
// conflict surfaces as `DraftError::Conflict` and the caller retries
// against fresh state; nothing here holds locks across awaits.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::PlayerCatalog;
use crate::draft::autopick::{AutopickPolicy, HighestRated, RosterNeeds};
use crate::draft::order::{generate_order, DraftMode};
use crate::draft::state::{Draft, DraftStatus, PickRecord};
use crate::draft::DraftError;
use crate::events::{DraftEvent, EventSink};
use crate::llm::NeedRanker;
use crate::roster::{entry_terms, RosterStore};
use crate::store::{DraftStore, StoreError};

/// Default number of ranked candidates offered to the need ranker.
pub const DEFAULT_CANDIDATE_POOL: usize = 10;

/// Caller-supplied settings for draft initialization.
#[derive(Debug, Clone)]
pub struct DraftSettings {
    pub rounds: u32,
    pub mode: DraftMode,
    /// How many of the top-ranked catalog players seed the available pool.
    pub pool_size: usize,
    /// Discard any existing draft for the league before initializing.
    pub reset: bool,
}

/// One team entering the draft.
#[derive(Debug, Clone)]
pub struct TeamSeed {
    pub team_id: String,
    pub computer_controlled: bool,
}

impl TeamSeed {
    pub fn new(team_id: impl Into<String>, computer_controlled: bool) -> Self {
        Self {
            team_id: team_id.into(),
            computer_controlled,
        }
    }
}

/// The result of a committed pick.
#[derive(Debug, Clone)]
pub struct PickOutcome {
    pub record: PickRecord,
    /// Draft status after the pick; `Completed` when it was the final slot.
    pub status: DraftStatus,
}

/// The draft orchestrator. Cheap to clone via the `Arc`s it holds; one
/// instance serves all leagues in the store.
pub struct DraftEngine {
    store: Arc<dyn DraftStore>,
    catalog: Arc<dyn PlayerCatalog>,
    rosters: Arc<dyn RosterStore>,
    events: Arc<dyn EventSink>,
    ranker: Arc<dyn NeedRanker>,
    /// Deterministic fallback when the ranker is disabled or fails.
    fallback: Box<dyn AutopickPolicy>,
    candidate_pool: usize,
}

impl DraftEngine {
    pub fn new(
        store: Arc<dyn DraftStore>,
        catalog: Arc<dyn PlayerCatalog>,
        rosters: Arc<dyn RosterStore>,
        events: Arc<dyn EventSink>,
        ranker: Arc<dyn NeedRanker>,
    ) -> Self {
        Self {
            store,
            catalog,
            rosters,
            events,
            ranker,
            fallback: Box::new(HighestRated),
            candidate_pool: DEFAULT_CANDIDATE_POOL,
        }
    }

    /// Replace the fallback autopick policy.
    pub fn with_fallback(mut self, fallback: Box<dyn AutopickPolicy>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Set how many ranked candidates the need ranker sees per decision.
    pub fn with_candidate_pool(mut self, candidate_pool: usize) -> Self {
        self.candidate_pool = candidate_pool.max(1);
        self
    }

    // ---- lifecycle operations ----

    /// Create and persist a fresh draft for a league.
    ///
    /// Validates settings, generates the pick order, seeds the available
    /// pool with the top `pool_size` catalog players, and stores the draft
    /// in `NotStarted`. With `reset`, any existing draft for the league is
    /// discarded first; without it, an existing draft is an error.
    pub async fn initialize_draft(
        &self,
        league_id: &str,
        teams: Vec<TeamSeed>,
        settings: DraftSettings,
    ) -> Result<Draft, DraftError> {
        validate_settings(&teams, &settings, self.catalog.ranked().len())?;

        if settings.reset {
            self.store.delete(league_id).map_err(store_error)?;
        }

        let team_ids: Vec<String> = teams.iter().map(|t| t.team_id.clone()).collect();
        let order = generate_order(&team_ids, settings.rounds, settings.mode);
        let pool: BTreeSet<String> = self
            .catalog
            .ranked()
            .iter()
            .take(settings.pool_size)
            .map(|p| p.player_id.clone())
            .collect();
        // Duplicate catalog ids collapse in the set; re-check against the
        // order length so a draft can never start without enough players.
        if pool.len() < order.len() {
            return Err(DraftError::InvalidSettings(format!(
                "pool of {} distinct players cannot cover {} total picks",
                pool.len(),
                order.len()
            )));
        }

        let draft = Draft::new(
            league_id.to_string(),
            Draft::generate_session_id(),
            settings.mode,
            settings.rounds,
            order,
            teams
                .into_iter()
                .map(|t| (t.team_id, t.computer_controlled))
                .collect(),
            pool,
        );

        self.store.insert_new(&draft).map_err(store_error)?;
        info!(
            league_id,
            session_id = %draft.session_id,
            teams = draft.teams.len(),
            rounds = draft.rounds,
            "draft initialized"
        );
        self.emit_status(league_id, draft.status).await;
        Ok(draft)
    }

    /// Begin the draft: `NotStarted -> InProgress`.
    pub async fn start_draft(&self, league_id: &str) -> Result<Draft, DraftError> {
        self.transition(league_id, "start", Draft::start).await
    }

    /// Suspend an in-progress draft. Picks are rejected until resumed.
    pub async fn pause_draft(&self, league_id: &str) -> Result<Draft, DraftError> {
        self.transition(league_id, "pause", Draft::pause).await
    }

    /// Resume a paused draft.
    pub async fn resume_draft(&self, league_id: &str) -> Result<Draft, DraftError> {
        self.transition(league_id, "resume", Draft::resume).await
    }

    /// Current snapshot for a league.
    pub fn get_draft_state(&self, league_id: &str) -> Result<Draft, DraftError> {
        self.load(league_id)
    }

    async fn transition(
        &self,
        league_id: &str,
        name: &'static str,
        apply: impl FnOnce(&mut Draft) -> Result<(), DraftError>,
    ) -> Result<Draft, DraftError> {
        let mut draft = self.load(league_id)?;
        apply(&mut draft)?;

        let expected = draft.version;
        draft.version = expected + 1;
        self.store
            .compare_and_swap(expected, &draft)
            .map_err(store_error)?;

        info!(league_id, status = ?draft.status, "draft {name}");
        self.emit_status(league_id, draft.status).await;
        Ok(draft)
    }

    // ---- picks ----

    /// Submit a pick on behalf of a team.
    ///
    /// Validation order is fixed: draft in progress, team on the clock,
    /// player still available, player known to the catalog. A successful
    /// pick commits the updated snapshot, records the roster assignment
    /// under entry-level contract terms, and emits events.
    pub async fn submit_pick(
        &self,
        league_id: &str,
        team_id: &str,
        player_id: &str,
    ) -> Result<PickOutcome, DraftError> {
        let mut draft = self.load(league_id)?;

        draft.validate_pick(team_id, player_id)?;
        let player = self
            .catalog
            .resolve(player_id)
            .ok_or_else(|| DraftError::NotFound(format!("player {player_id}")))?;

        let record = draft.apply_pick(team_id, &player)?;
        let status = draft.status;

        let expected = draft.version;
        draft.version = expected + 1;
        self.store
            .compare_and_swap(expected, &draft)
            .map_err(store_error)?;

        // Post-commit side effects. The assignment log is a rebuildable
        // projection of the pick history; like the notification sink, its
        // failure must not unwind a pick that is already durably committed.
        let terms = entry_terms(record.pick_number, record.round, record.rating);
        if let Err(e) = self.rosters.assign(league_id, team_id, player_id, &terms) {
            warn!(
                league_id,
                team_id, player_id, "roster assignment failed for committed pick: {e}"
            );
        }

        info!(
            league_id,
            team_id,
            player_id,
            pick_number = record.pick_number,
            round = record.round,
            "pick applied"
        );
        self.events
            .emit(DraftEvent::PickApplied {
                league_id: league_id.to_string(),
                team_id: team_id.to_string(),
                player_id: record.player_id.clone(),
                player_name: record.player_name.clone(),
                pick_number: record.pick_number,
                round: record.round,
                status,
            })
            .await;
        if status == DraftStatus::Completed {
            info!(league_id, "draft completed");
            self.emit_status(league_id, status).await;
        }

        Ok(PickOutcome { record, status })
    }

    /// Make an automatic pick on behalf of `team_id`, which must be on the
    /// clock. Humans can request this too ("pick for me").
    ///
    /// Candidates are the top available players by catalog rank. The need
    /// ranker gets the first shot; on any ranking failure the deterministic
    /// fallback policy decides, so autopick never blocks on the ranker.
    pub async fn autopick(&self, league_id: &str, team_id: &str) -> Result<PickOutcome, DraftError> {
        let draft = self.load(league_id)?;

        if draft.status != DraftStatus::InProgress {
            return Err(DraftError::InvalidState {
                operation: "autopick",
                status: draft.status,
            });
        }
        let slot = draft.current_slot().ok_or(DraftError::InvalidState {
            operation: "autopick",
            status: draft.status,
        })?;
        if slot.team_id != team_id {
            return Err(DraftError::OutOfTurn {
                team_id: team_id.to_string(),
                on_clock: slot.team_id.clone(),
            });
        }
        let pick_number = slot.pick_number;
        let round = slot.round;

        let candidates: Vec<_> = self
            .catalog
            .ranked()
            .iter()
            .filter(|p| draft.available_players.contains(&p.player_id))
            .take(self.candidate_pool)
            .cloned()
            .collect();
        if candidates.is_empty() {
            return Err(DraftError::PlayerUnavailable(
                "no available players remain".to_string(),
            ));
        }

        let team = draft
            .team(team_id)
            .ok_or_else(|| DraftError::NotFound(format!("team {team_id}")))?;
        let needs = RosterNeeds::from_picks(&team.picks);

        let player_id = match self
            .ranker
            .rank_for_need(team, &candidates, &needs, pick_number, round)
            .await
        {
            Ok(player_id) => player_id,
            Err(e) => {
                warn!(league_id, team_id, "need ranking unavailable, using fallback policy: {e}");
                self.fallback
                    .select(team, &candidates, &needs, pick_number, round)
                    .ok_or_else(|| {
                        DraftError::PlayerUnavailable("no available players remain".to_string())
                    })?
            }
        };

        self.submit_pick(league_id, team_id, &player_id).await
    }

    /// Autopick through consecutive computer-controlled turns.
    ///
    /// Stops when the draft completes, a human team comes on the clock, or
    /// the draft leaves `InProgress`. The loop is bounded by the number of
    /// picks remaining, so it terminates even under concurrent interleaving.
    /// A CAS conflict on one pick just means another caller advanced the
    /// draft; the loop reloads and continues.
    pub async fn advance_computer_turns(
        &self,
        league_id: &str,
    ) -> Result<Vec<PickOutcome>, DraftError> {
        let draft = self.load(league_id)?;
        let mut budget = (draft.order.len() as u32)
            .saturating_sub(draft.current_pick)
            .saturating_add(1);

        let mut outcomes = Vec::new();
        while budget > 0 {
            budget -= 1;

            let draft = self.load(league_id)?;
            if draft.status != DraftStatus::InProgress {
                break;
            }
            let on_clock = match draft.current_slot() {
                Some(slot) => slot.team_id.clone(),
                None => break,
            };
            let computer = draft
                .team(&on_clock)
                .map(|t| t.computer_controlled)
                .unwrap_or(false);
            if !computer {
                break;
            }
            let observed_version = draft.version;

            match self.autopick(league_id, &on_clock).await {
                Ok(outcome) => outcomes.push(outcome),
                // Another writer advanced the draft first; reassess.
                Err(DraftError::Conflict) => continue,
                // A stale turn or a vanished player is either a lost race or
                // a state accounting bug. If nothing committed since we
                // loaded, it is the latter and must surface, not be skipped.
                Err(e @ (DraftError::OutOfTurn { .. } | DraftError::PlayerUnavailable(_))) => {
                    let fresh = self.load(league_id)?;
                    if fresh.version == observed_version {
                        return Err(e);
                    }
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcomes)
    }

    async fn emit_status(&self, league_id: &str, status: DraftStatus) {
        self.events
            .emit(DraftEvent::StatusChanged {
                league_id: league_id.to_string(),
                status,
            })
            .await;
    }

    fn load(&self, league_id: &str) -> Result<Draft, DraftError> {
        self.store
            .load(league_id)
            .map_err(store_error)?
            .ok_or_else(|| DraftError::NotFound(format!("draft for league {league_id}")))
    }
}

fn validate_settings(
    teams: &[TeamSeed],
    settings: &DraftSettings,
    catalog_size: usize,
) -> Result<(), DraftError> {
    if teams.len() < 2 {
        return Err(DraftError::InvalidSettings(
            "a draft needs at least two teams".to_string(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for team in teams {
        if team.team_id.is_empty() {
            return Err(DraftError::InvalidSettings(
                "team ids must be non-empty".to_string(),
            ));
        }
        if !seen.insert(team.team_id.as_str()) {
            return Err(DraftError::InvalidSettings(format!(
                "duplicate team id {}",
                team.team_id
            )));
        }
    }
    if settings.rounds == 0 {
        return Err(DraftError::InvalidSettings(
            "rounds must be at least 1".to_string(),
        ));
    }
    let total_picks = settings.rounds as usize * teams.len();
    if settings.pool_size < total_picks {
        return Err(DraftError::InvalidSettings(format!(
            "pool of {} players cannot cover {} total picks",
            settings.pool_size, total_picks
        )));
    }
    if settings.pool_size > catalog_size {
        return Err(DraftError::InvalidSettings(format!(
            "pool of {} players exceeds the {} in the catalog",
            settings.pool_size, catalog_size
        )));
    }
    Ok(())
}

fn store_error(err: StoreError) -> DraftError {
    match err {
        StoreError::NotFound(league_id) => {
            DraftError::NotFound(format!("draft for league {league_id}"))
        }
        StoreError::AlreadyExists(league_id) => DraftError::InvalidSettings(format!(
            "league {league_id} already has a draft; initialize with reset to replace it"
        )),
        StoreError::Conflict(_) => DraftError::Conflict,
        StoreError::Backend(e) => DraftError::Storage(e),
    }
}
