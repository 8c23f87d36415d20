use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status, always "ok" while the process serves requests.
    pub status: String,
    /// Number of sessions currently registered.
    pub sessions: usize,
    /// Session cap read at startup.
    pub limit_games: usize,
    /// Whether creation past the cap is rejected.
    pub enforce_limit_games: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(sessions: usize, limit_games: usize, enforce_limit_games: bool) -> Self {
        Self {
            status: "ok".to_string(),
            sessions,
            limit_games,
            enforce_limit_games,
        }
    }
}
