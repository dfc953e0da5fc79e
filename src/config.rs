// Configuration loading and parsing (engine.toml, credentials.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::draft::order::DraftMode;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub draft: DraftDefaults,
    pub llm: LlmConfig,
    pub credentials: CredentialsConfig,
    pub ws_port: u16,
    pub db_path: String,
    pub players_csv: String,
}

// ---------------------------------------------------------------------------
// engine.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire engine.toml file.
#[derive(Debug, Clone, Deserialize)]
struct EngineFile {
    draft: DraftDefaults,
    llm: LlmConfig,
    websocket: WebsocketSection,
    database: DatabaseSection,
    players: PlayersSection,
}

/// Default draft settings applied when a caller does not override them.
/// `teams` is the simulated team count used by the dev binary.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftDefaults {
    pub rounds: u32,
    pub mode: DraftMode,
    pub teams: usize,
    pub pool_size: usize,
    /// Ranked candidates offered per autopick decision.
    pub autopick_candidates: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct WebsocketSection {
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PlayersSection {
    csv: String,
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub anthropic_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/engine.toml` and
/// (optionally) `config/credentials.toml`, both relative to `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- engine.toml (required) ---
    let engine_path = config_dir.join("engine.toml");
    let engine_text = read_file(&engine_path)?;
    let engine_file: EngineFile =
        toml::from_str(&engine_text).map_err(|e| ConfigError::ParseError {
            path: engine_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        draft: engine_file.draft,
        llm: engine_file.llm,
        credentials,
        ws_port: engine_file.websocket.port,
        db_path: engine_file.database.path,
        players_csv: engine_file.players.csv,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let draft = &config.draft;

    if draft.teams < 2 {
        return Err(ConfigError::ValidationError {
            field: "draft.teams".into(),
            message: "must be at least 2".into(),
        });
    }

    if draft.rounds == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.rounds".into(),
            message: "must be greater than 0".into(),
        });
    }

    if draft.pool_size < draft.rounds as usize * draft.teams {
        return Err(ConfigError::ValidationError {
            field: "draft.pool_size".into(),
            message: format!(
                "must cover all picks ({} teams x {} rounds)",
                draft.teams, draft.rounds
            ),
        });
    }

    if draft.autopick_candidates == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.autopick_candidates".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.llm.max_tokens == 0 {
        return Err(ConfigError::ValidationError {
            field: "llm.max_tokens".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
