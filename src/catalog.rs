// Player catalog: identity and point-in-time attributes for draftable players.
//
// The engine never owns player entities; it references them by id and
// snapshots display attributes into pick records at pick time. The default
// implementation loads the catalog from a CSV export of the platform's
// player table.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Point-in-time attributes for a player, as resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAttributes {
    pub player_id: String,
    pub name: String,
    /// Position string as declared by the platform (e.g. "QB", "SS", "C").
    pub position: String,
    /// Declared overall value, higher is better.
    pub rating: u32,
}

/// Read-only lookup interface over the external player catalog.
pub trait PlayerCatalog: Send + Sync {
    /// Resolve a player id to its attributes. `None` if the id is unknown.
    fn resolve(&self, player_id: &str) -> Option<PlayerAttributes>;

    /// All players ranked by rating descending, ties broken by ascending
    /// player id. The ranking is total and deterministic.
    fn ranked(&self) -> &[PlayerAttributes];
}

/// In-memory catalog backed by a CSV file (or a prebuilt player list).
pub struct CsvCatalog {
    /// Sorted by rating descending, then player_id ascending.
    players: Vec<PlayerAttributes>,
    index: HashMap<String, usize>,
}

impl CsvCatalog {
    /// Load a catalog from a CSV file with a header row of
    /// `player_id,name,position,rating`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open player catalog at {}", path.display()))?;

        let mut players = Vec::new();
        for record in reader.deserialize() {
            let player: PlayerAttributes = record
                .with_context(|| format!("malformed player row in {}", path.display()))?;
            players.push(player);
        }

        Ok(Self::from_players(players))
    }

    /// Build a catalog from an already-materialized player list. Used by
    /// tests and by callers that source players from elsewhere.
    pub fn from_players(mut players: Vec<PlayerAttributes>) -> Self {
        players.sort_by(|a, b| {
            b.rating
                .cmp(&a.rating)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        let index = players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.player_id.clone(), i))
            .collect();
        Self { players, index }
    }

    /// Number of players in the catalog.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl PlayerCatalog for CsvCatalog {
    fn resolve(&self, player_id: &str) -> Option<PlayerAttributes> {
        self.index
            .get(player_id)
            .map(|&i| self.players[i].clone())
    }

    fn ranked(&self) -> &[PlayerAttributes] {
        &self.players
    }
}
