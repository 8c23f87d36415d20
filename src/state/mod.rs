pub mod autopilot;
pub mod board;
pub mod events;
pub mod player;
pub mod registry;
pub mod session;

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;

pub use self::events::EventHub;
use self::registry::GameRegistry;

pub type SharedState = Arc<AppState>;

/// Failures surfaced to callers of the session engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// No session is registered under this id.
    #[error("game `{0}` not found")]
    SessionNotFound(Uuid),
    /// The roster already holds the maximum number of players.
    #[error("game is full")]
    GameFull,
    /// A player with the same id is already in the roster.
    #[error("player already added")]
    DuplicatePlayer,
    /// The configured session cap is enforced and has been reached.
    #[error("session limit of {limit} reached")]
    SessionLimitReached {
        /// Configured cap.
        limit: usize,
    },
}

/// Central application state shared by every connection.
pub struct AppState {
    config: AppConfig,
    registry: GameRegistry,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let registry = GameRegistry::new(&config);
        Arc::new(Self { config, registry })
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry owning every live session.
    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }
}
