// Configuration loading and parsing (config/draftroom.toml).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::Position;
use crate::draft::recommend::RecommendPolicy;

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
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub draft: DraftDefaults,
    pub recommender: RecommendPolicy,
    pub db_path: String,
    pub simulation: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            draft: DraftDefaults {
                rounds: 15,
                pick_time_limit_secs: 90,
                snake: true,
            },
            recommender: RecommendPolicy::default(),
            db_path: "draftroom.db".to_string(),
            simulation: SimulationConfig {
                seed: 17,
                num_teams: 10,
                catalog_size: 180,
            },
        }
    }
}

/// Default draft settings applied to newly created drafts.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftDefaults {
    pub rounds: u32,
    pub pick_time_limit_secs: u64,
    pub snake: bool,
}

/// Knobs for the simulation binary: seeded so runs are reproducible.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    pub seed: u64,
    pub num_teams: usize,
    pub catalog_size: usize,
}

// ---------------------------------------------------------------------------
// draftroom.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the whole config file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    draft: DraftDefaults,
    database: DatabaseSection,
    simulation: SimulationConfig,
    /// Optional; defaults from `RecommendPolicy::default()` when absent.
    recommender: Option<RecommenderSection>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

/// Raw `[recommender]` table. Positions come in as strings ("QB", "RB", ...)
/// and are parsed during assembly so a typo fails loudly at startup.
#[derive(Debug, Clone, Deserialize)]
struct RecommenderSection {
    early_through_round: u32,
    middle_through_round: u32,
    early_priority: Vec<String>,
    middle_priority: Vec<String>,
    late_priority: Vec<String>,
    default_position_cap: u32,
    #[serde(default)]
    position_caps: HashMap<String, u32>,
}

impl RecommenderSection {
    fn into_policy(self) -> Result<RecommendPolicy, ConfigError> {
        let mut position_caps = HashMap::new();
        for (key, cap) in &self.position_caps {
            let position = parse_position("recommender.position_caps", key)?;
            position_caps.insert(position, *cap);
        }
        Ok(RecommendPolicy {
            early_through_round: self.early_through_round,
            middle_through_round: self.middle_through_round,
            early_priority: parse_positions("recommender.early_priority", &self.early_priority)?,
            middle_priority: parse_positions("recommender.middle_priority", &self.middle_priority)?,
            late_priority: parse_positions("recommender.late_priority", &self.late_priority)?,
            position_caps,
            default_position_cap: self.default_position_cap,
        })
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from a specific TOML file.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let recommender = match file.recommender {
        Some(section) => section.into_policy()?,
        None => RecommendPolicy::default(),
    };

    let config = Config {
        draft: file.draft,
        recommender,
        db_path: file.database.path,
        simulation: file.simulation,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads `config/draftroom.toml` relative to the
/// current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config/draftroom.toml"))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn parse_position(field: &str, raw: &str) -> Result<Position, ConfigError> {
    Position::from_str_pos(raw).ok_or_else(|| ConfigError::ValidationError {
        field: field.to_string(),
        message: format!("unknown position '{raw}'"),
    })
}

fn parse_positions(field: &str, raw: &[String]) -> Result<Vec<Position>, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::ValidationError {
            field: field.to_string(),
            message: "must list at least one position".into(),
        });
    }
    raw.iter().map(|s| parse_position(field, s)).collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.draft.rounds == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.rounds".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.draft.pick_time_limit_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.pick_time_limit_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.simulation.num_teams == 0 {
        return Err(ConfigError::ValidationError {
            field: "simulation.num_teams".into(),
            message: "must be greater than 0".into(),
        });
    }

    // Every turn in the simulated draft needs a player left to claim.
    let needed = config.simulation.num_teams * config.draft.rounds as usize;
    if config.simulation.catalog_size < needed {
        return Err(ConfigError::ValidationError {
            field: "simulation.catalog_size".into(),
            message: format!(
                "must cover the full draft: need at least {needed} players \
                 for {} teams over {} rounds",
                config.simulation.num_teams, config.draft.rounds
            ),
        });
    }

    let rec = &config.recommender;
    if rec.early_through_round == 0 {
        return Err(ConfigError::ValidationError {
            field: "recommender.early_through_round".into(),
            message: "must be greater than 0".into(),
        });
    }
    if rec.middle_through_round < rec.early_through_round {
        return Err(ConfigError::ValidationError {
            field: "recommender.middle_through_round".into(),
            message: format!(
                "must be >= early_through_round ({}), got {}",
                rec.early_through_round, rec.middle_through_round
            ),
        });
    }
    if rec.default_position_cap == 0 {
        return Err(ConfigError::ValidationError {
            field: "recommender.default_position_cap".into(),
            message: "must be greater than 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
