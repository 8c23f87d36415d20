use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod home;
pub mod sse;
pub mod websocket;

/// Compose all route trees and attach the shared state.
pub fn router(state: SharedState) -> Router<()> {
    home::router()
        .merge(health::router())
        .merge(sse::router())
        .merge(websocket::router())
        .merge(docs::router())
        .with_state(state)
}
