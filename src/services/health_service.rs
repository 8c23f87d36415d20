use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with the number of registered sessions.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let config = state.config();
    let sessions = state.registry().len();
    if sessions > config.limit_games() {
        debug!(sessions, limit = config.limit_games(), "session cap exceeded");
    }
    HealthResponse::ok(sessions, config.limit_games(), config.enforce_limit_games())
}

#[cfg(test)]
mod tests {
    use crate::{config::AppConfig, state::AppState};

    use super::*;

    #[tokio::test]
    async fn counts_live_sessions() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).sessions, 0);

        state.registry().create_session(8, 0).await.unwrap();
        let status = health_status(&state);
        assert_eq!(status.status, "ok");
        assert_eq!(status.sessions, 1);
        assert_eq!(status.limit_games, 5);
        assert!(!status.enforce_limit_games);
        state.registry().shutdown().await;
    }

    #[tokio::test]
    async fn reports_configured_cap() {
        let config = AppConfig::from_lookup(None, |key| match key {
            "BB_LIMIT_GAMES" => Some("2".into()),
            "BB_ENFORCE_LIMIT_GAMES" => Some("yes".into()),
            _ => None,
        });
        let status = health_status(&AppState::new(config));
        assert_eq!(status.limit_games, 2);
        assert!(status.enforce_limit_games);
    }
}
