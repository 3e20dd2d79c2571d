//! Scheduler configuration management.
//!
//! Consolidates all environment variable reads and provides a validated,
//! immutable configuration that is handed to the cycle machine and the
//! remote client.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the API token
pub const API_TOKEN_VAR: &str = "BATTLE_API_TOKEN";

/// Environment variable selecting dry-run mode
pub const DRY_RUN_VAR: &str = "DRY_RUN";

const DEFAULT_SERVER_URL: &str = "https://lichess.org";
const DEFAULT_STATE_FILE: &str = "battle_state.json";

/// Complete scheduler configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BattleConfig {
    /// Base URL of the remote tournament service
    pub server_url: String,
    /// Settings sent with every battle
    pub battle: BattleSettings,
    /// Simulate creation without contacting the remote service
    pub dry_run: bool,
    /// Location of the persisted cycle state
    pub state_file: PathBuf,
    /// Delay between successive creations within a batch
    pub pacing_delay: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
}

/// Per-battle settings
#[derive(Debug, Clone, PartialEq)]
pub struct BattleSettings {
    /// Team hosting every battle
    pub host_team: String,
    /// Teams invited to every battle
    pub invited_teams: Vec<String>,
    /// Initial clock in minutes
    pub clock_minutes: f64,
    /// Clock increment in seconds
    pub clock_increment_secs: u32,
    /// Battle duration in minutes
    pub duration_minutes: u32,
    /// Whether games are rated
    pub rated: bool,
    /// Variant key, e.g. `standard` or `chess960`
    pub variant: String,
}

impl BattleSettings {
    /// Invited teams with the host removed, duplicates dropped, order kept
    pub fn invited_excluding_host(&self) -> Vec<&str> {
        let mut teams: Vec<&str> = Vec::with_capacity(self.invited_teams.len());
        for team in &self.invited_teams {
            let team = team.as_str();
            if team != self.host_team && !teams.contains(&team) {
                teams.push(team);
            }
        }
        teams
    }
}

impl BattleConfig {
    /// Configuration with default battle settings for `host_team`
    pub fn new(server_url: impl Into<String>, host_team: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            battle: BattleSettings {
                host_team: host_team.into(),
                invited_teams: Vec::new(),
                clock_minutes: 3.0,
                clock_increment_secs: 2,
                duration_minutes: 120,
                rated: true,
                variant: "standard".to_string(),
            },
            dry_run: false,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            pacing_delay: crate::remote::PACING_DELAY,
            http_timeout: Duration::from_secs(30),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `dry_run_override` - Force dry-run on (from CLI args)
    /// * `state_file_override` - Optional state file path (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing
    pub fn from_env(
        dry_run_override: bool,
        state_file_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let host_team = std::env::var("BATTLE_HOST_TEAM")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "BATTLE_HOST_TEAM".to_string(),
                hint: "Set it to the id of the team hosting the battles".to_string(),
            })?;

        let server_url = std::env::var("BATTLE_SERVER_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());

        let invited_teams = std::env::var("BATTLE_INVITED_TEAMS")
            .map(|v| parse_team_list(&v))
            .unwrap_or_default();

        let battle = BattleSettings {
            host_team,
            invited_teams,
            clock_minutes: parse_env_or("BATTLE_CLOCK_MINUTES", 3.0),
            clock_increment_secs: parse_env_or("BATTLE_CLOCK_INCREMENT", 2),
            duration_minutes: parse_env_or("BATTLE_DURATION_MINUTES", 120),
            rated: parse_flag_or("BATTLE_RATED", true),
            variant: std::env::var("BATTLE_VARIANT").unwrap_or_else(|_| "standard".to_string()),
        };

        let state_file = state_file_override
            .or_else(|| std::env::var("BATTLE_STATE_FILE").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE));

        Ok(BattleConfig {
            server_url,
            battle,
            dry_run: dry_run_override || parse_flag_or(DRY_RUN_VAR, false),
            state_file,
            pacing_delay: crate::remote::PACING_DELAY,
            http_timeout: Duration::from_secs(parse_env_or("BATTLE_HTTP_TIMEOUT_SECS", 30)),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "BATTLE_SERVER_URL".to_string(),
                reason: format!("Must be an http(s) URL, got {:?}", self.server_url),
            });
        }

        if self.battle.host_team.is_empty() {
            return Err(ConfigError::Invalid {
                var: "BATTLE_HOST_TEAM".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if !(self.battle.clock_minutes > 0.0 && self.battle.clock_minutes <= 60.0) {
            return Err(ConfigError::Invalid {
                var: "BATTLE_CLOCK_MINUTES".to_string(),
                reason: "Must be greater than 0 and at most 60".to_string(),
            });
        }

        if self.battle.clock_increment_secs > 60 {
            return Err(ConfigError::Invalid {
                var: "BATTLE_CLOCK_INCREMENT".to_string(),
                reason: "Must be at most 60 seconds".to_string(),
            });
        }

        if !(20..=720).contains(&self.battle.duration_minutes) {
            return Err(ConfigError::Invalid {
                var: "BATTLE_DURATION_MINUTES".to_string(),
                reason: "Must be between 20 and 720".to_string(),
            });
        }

        if self.battle.variant.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "BATTLE_VARIANT".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Read the API token. Its absence is fatal before any other logic runs.
pub fn api_token_from_env() -> Result<String, ConfigError> {
    std::env::var(API_TOKEN_VAR)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingRequired {
            var: API_TOKEN_VAR.to_string(),
            hint: "Create a personal API token with tournament write scope".to_string(),
        })
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_team_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|team| !team.is_empty())
        .map(str::to_string)
        .collect()
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_flag_or(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
