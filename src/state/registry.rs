use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::game::{GameMetrics, GameStarted},
    state::{GameError, events::EventHub, session::GameSession},
};

/// Owner of every live session, keyed by session id.
pub struct GameRegistry {
    sessions: DashMap<Uuid, Arc<GameSession>>,
    limit_games: usize,
    enforce_limit: bool,
    autopilot_interval: Duration,
    events: EventHub,
    creation_gate: Mutex<()>,
}

impl GameRegistry {
    /// Build an empty registry from the startup configuration.
    pub fn new(config: &AppConfig) -> Self {
        debug!(
            limit_games = config.limit_games(),
            enforce = config.enforce_limit_games(),
            "created registry"
        );
        Self {
            sessions: DashMap::new(),
            limit_games: config.limit_games(),
            enforce_limit: config.enforce_limit_games(),
            autopilot_interval: config.autopilot_delay(),
            events: EventHub::default(),
            creation_gate: Mutex::new(()),
        }
    }

    /// Hub receiving the events of every session of this registry.
    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Create, register and start a session.
    ///
    /// The session cap is advisory unless enforcement was enabled in the
    /// configuration, in which case creation past the cap fails with
    /// [`GameError::SessionLimitReached`].
    pub async fn create_session(
        &self,
        size: usize,
        autopilots: usize,
    ) -> Result<(Arc<GameSession>, GameStarted), GameError> {
        let gate = self.creation_gate.lock().await;
        let live = self.sessions.len();
        if live >= self.limit_games {
            if self.enforce_limit {
                warn!(live, limit = self.limit_games, "session limit reached");
                return Err(GameError::SessionLimitReached {
                    limit: self.limit_games,
                });
            }
            debug!(live, limit = self.limit_games, "advisory session limit exceeded");
        }

        let session = Arc::new(GameSession::new(
            size,
            autopilots,
            self.autopilot_interval,
            self.events.clone(),
        ));
        self.sessions.insert(session.id(), Arc::clone(&session));
        drop(gate);

        info!(game_id = %session.id(), size, autopilots, "game created");
        let started = session.start().await;
        Ok((session, started))
    }

    /// Look up a session by id.
    pub fn get_session(&self, id: Uuid) -> Result<Arc<GameSession>, GameError> {
        match self.sessions.get(&id) {
            Some(entry) => Ok(Arc::clone(entry.value())),
            None => {
                debug!(game_id = %id, "game not found");
                Err(GameError::SessionNotFound(id))
            }
        }
    }

    /// Unregister a session and stop its autopilot. Unknown ids are ignored.
    pub async fn remove_session(&self, id: Uuid) -> bool {
        let Some((_, session)) = self.sessions.remove(&id) else {
            debug!(game_id = %id, "remove ignored; game not found");
            return false;
        };
        session.shutdown().await;
        info!(game_id = %id, "game removed");
        true
    }

    /// Metrics of every registered session, in no particular order.
    pub async fn list_sessions(&self) -> Vec<GameMetrics> {
        let sessions = self.snapshot_sessions();
        let mut metrics = Vec::with_capacity(sessions.len());
        for session in sessions {
            metrics.push(session.metrics().await);
        }
        debug!(games = metrics.len(), "list games");
        metrics
    }

    /// Stop the autopilot of every registered session.
    pub async fn shutdown(&self) {
        let sessions = self.snapshot_sessions();
        for session in &sessions {
            session.shutdown().await;
        }
        info!(games = sessions.len(), "registry shut down");
    }

    // Map guards must not be held across an await point.
    fn snapshot_sessions(&self) -> Vec<Arc<GameSession>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
