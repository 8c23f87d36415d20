//! Application-level configuration loading: session cap and autopilot pacing.

use std::{env, fs, io::ErrorKind, path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BATTLEBIT_CONFIG_PATH";
/// Advisory cap on live sessions.
const LIMIT_GAMES_ENV: &str = "BB_LIMIT_GAMES";
/// Turn the session cap into a hard limit. Accepts `true`/`false`, `1`/`0`,
/// `yes`/`no` and `on`/`off`, case-insensitively.
const ENFORCE_LIMIT_ENV: &str = "BB_ENFORCE_LIMIT_GAMES";
/// Autopilot pacing in milliseconds.
const AUTOPILOT_DELAY_ENV: &str = "BB_AUTOPILOT_DELAY_MS";

const DEFAULT_LIMIT_GAMES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    limit_games: usize,
    enforce_limit_games: bool,
    autopilot_delay: Duration,
}

impl AppConfig {
    /// Load the configuration file (if any), then apply environment overrides.
    pub fn load() -> Self {
        Self::from_lookup(read_config_file(), |key| env::var(key).ok())
    }

    /// Build a configuration from an optional parsed file and a variable lookup.
    ///
    /// Unparsable variables are logged and ignored.
    pub fn from_lookup<F>(file: Option<RawConfig>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = file.map(Self::from).unwrap_or_default();

        if let Some(limit) = parse_var::<usize, _>(&lookup, LIMIT_GAMES_ENV) {
            config.limit_games = limit;
        }
        if let Some(Flag(enforce)) = parse_var::<Flag, _>(&lookup, ENFORCE_LIMIT_ENV) {
            config.enforce_limit_games = enforce;
        }
        if let Some(delay_ms) = parse_var::<u64, _>(&lookup, AUTOPILOT_DELAY_ENV) {
            config.autopilot_delay = Duration::from_millis(delay_ms);
        }
        config
    }

    /// Session cap; advisory unless [`Self::enforce_limit_games`] is set.
    pub fn limit_games(&self) -> usize {
        self.limit_games
    }

    /// Whether creation past [`Self::limit_games`] is rejected.
    pub fn enforce_limit_games(&self) -> bool {
        self.enforce_limit_games
    }

    /// Pause between two autopilot ticks. Zero means "as fast as allowed".
    pub fn autopilot_delay(&self) -> Duration {
        self.autopilot_delay
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            limit_games: DEFAULT_LIMIT_GAMES,
            enforce_limit_games: false,
            autopilot_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
pub struct RawConfig {
    limit_games: Option<usize>,
    enforce_limit_games: Option<bool>,
    autopilot_delay_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            limit_games: value.limit_games.unwrap_or(defaults.limit_games),
            enforce_limit_games: value
                .enforce_limit_games
                .unwrap_or(defaults.enforce_limit_games),
            autopilot_delay: value
                .autopilot_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.autopilot_delay),
        }
    }
}

/// Boolean switch read from the environment.
struct Flag(bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Flag(true)),
            "false" | "0" | "no" | "off" => Ok(Flag(false)),
            _ => Err(format!("expected a boolean, got `{raw}`")),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, value = %raw, error = %err, "ignoring unparsable environment variable");
            None
        }
    }
}

fn read_config_file() -> Option<RawConfig> {
    let path = resolve_config_path();
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded config file");
                Some(raw)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; falling back to defaults"
                );
                None
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            None
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config; falling back to defaults"
            );
            None
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
