// SQLite-backed draft snapshot store and roster assignment log.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::draft::state::Draft;
use crate::roster::{ContractTerms, RosterAssignment, RosterStore};

use super::{DraftStore, StoreError};

/// SQLite persistence for draft snapshots and roster assignments.
///
/// Snapshots are stored whole as JSON, one row per league, with a version
/// column driving the compare-and-swap. Roster assignments live in a
/// separate table as a rebuildable projection of the pick history.
pub struct SqliteDraftStore {
    conn: Mutex<Connection>,
}

impl SqliteDraftStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    /// Pass `":memory:"` for an ephemeral database (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open draft store at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set draft store pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS drafts (
                league_id  TEXT PRIMARY KEY,
                version    INTEGER NOT NULL,
                snapshot   TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS roster_assignments (
                league_id   TEXT NOT NULL,
                team_id     TEXT NOT NULL,
                player_id   TEXT NOT NULL,
                salary      INTEGER NOT NULL,
                years       INTEGER NOT NULL,
                assigned_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (league_id, player_id)
            );
            ",
        )
        .context("failed to create draft store schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("draft store mutex poisoned")
    }

    /// Load all roster assignments recorded for a league, ordered by
    /// assignment time.
    pub fn assignments(&self, league_id: &str) -> Result<Vec<RosterAssignment>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT league_id, team_id, player_id, salary, years
                 FROM roster_assignments WHERE league_id = ?1 ORDER BY assigned_at, player_id",
            )
            .context("failed to prepare assignments query")?;

        let rows = stmt
            .query_map(params![league_id], |row| {
                Ok(RosterAssignment {
                    league_id: row.get(0)?,
                    team_id: row.get(1)?,
                    player_id: row.get(2)?,
                    terms: ContractTerms {
                        salary: row.get(3)?,
                        years: row.get(4)?,
                    },
                })
            })
            .context("failed to query roster assignments")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map roster assignment rows")?;

        Ok(rows)
    }
}

impl DraftStore for SqliteDraftStore {
    fn load(&self, league_id: &str) -> Result<Option<Draft>, StoreError> {
        let conn = self.conn();
        let snapshot: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM drafts WHERE league_id = ?1",
                params![league_id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query draft snapshot")?;

        match snapshot {
            Some(json) => {
                let draft: Draft = serde_json::from_str(&json)
                    .context("failed to deserialize draft snapshot")?;
                Ok(Some(draft))
            }
            None => Ok(None),
        }
    }

    fn insert_new(&self, draft: &Draft) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(draft).context("failed to serialize draft snapshot")?;
        let conn = self.conn();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO drafts (league_id, version, snapshot) VALUES (?1, ?2, ?3)",
                params![draft.league_id, draft.version, json],
            )
            .context("failed to insert draft snapshot")?;

        if inserted == 0 {
            return Err(StoreError::AlreadyExists(draft.league_id.clone()));
        }
        Ok(())
    }

    fn compare_and_swap(&self, expected_version: u64, draft: &Draft) -> Result<(), StoreError> {
        let json =
            serde_json::to_string(draft).context("failed to serialize draft snapshot")?;
        let conn = self.conn();
        let updated = conn
            .execute(
                "UPDATE drafts
                 SET version = ?1,
                     snapshot = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE league_id = ?3 AND version = ?4",
                params![draft.version, json, draft.league_id, expected_version],
            )
            .context("failed to update draft snapshot")?;

        if updated == 1 {
            return Ok(());
        }

        // Distinguish a missing draft from a version race.
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM drafts WHERE league_id = ?1)",
                params![draft.league_id],
                |row| row.get(0),
            )
            .context("failed to check draft existence")?;

        if exists {
            Err(StoreError::Conflict(draft.league_id.clone()))
        } else {
            Err(StoreError::NotFound(draft.league_id.clone()))
        }
    }

    fn delete(&self, league_id: &str) -> Result<(), StoreError> {
        let mut conn = self.conn();
        let tx = conn
            .transaction()
            .context("failed to begin delete transaction")?;
        tx.execute("DELETE FROM drafts WHERE league_id = ?1", params![league_id])
            .context("failed to delete draft snapshot")?;
        tx.execute(
            "DELETE FROM roster_assignments WHERE league_id = ?1",
            params![league_id],
        )
        .context("failed to delete roster assignments")?;
        tx.commit().context("failed to commit delete")?;
        Ok(())
    }
}

impl RosterStore for SqliteDraftStore {
    fn assign(
        &self,
        league_id: &str,
        team_id: &str,
        player_id: &str,
        terms: &ContractTerms,
    ) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO roster_assignments
                (league_id, team_id, player_id, salary, years)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![league_id, team_id, player_id, terms.salary, terms.years],
        )
        .context("failed to record roster assignment")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::entry_terms;

    fn test_store() -> SqliteDraftStore {
        SqliteDraftStore::open(":memory:").expect("in-memory store should open")
    }

    #[test]
    fn open_creates_tables() {
        let store = test_store();
        let conn = store.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"drafts".to_string()));
        assert!(tables.contains(&"roster_assignments".to_string()));
    }

    #[test]
    fn assign_and_list_round_trips() {
        let store = test_store();
        let terms = entry_terms(1, 1, 88);

        store.assign("league-1", "team_a", "p1", &terms).unwrap();
        store
            .assign("league-1", "team_b", "p2", &entry_terms(2, 1, 70))
            .unwrap();
        store
            .assign("league-2", "team_x", "p1", &entry_terms(1, 1, 88))
            .unwrap();

        let assignments = store.assignments("league-1").unwrap();
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].player_id, "p1");
        assert_eq!(assignments[0].terms, terms);

        // Other leagues' rows never leak in.
        assert_eq!(store.assignments("league-2").unwrap().len(), 1);
        assert!(store.assignments("league-3").unwrap().is_empty());
    }

    #[test]
    fn assign_replaces_on_same_player() {
        let store = test_store();
        store
            .assign("league-1", "team_a", "p1", &entry_terms(1, 1, 88))
            .unwrap();
        store
            .assign("league-1", "team_b", "p1", &entry_terms(5, 1, 88))
            .unwrap();

        let assignments = store.assignments("league-1").unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].team_id, "team_b");
    }
}
