use axum::{Router, routing::get};

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Plain-text landing page", body = String))
)]
/// Landing page of the server.
pub async fn home() -> &'static str {
    "Home HTTP"
}

/// Configure the landing route.
pub fn router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::<S>::new().route("/", get(home))
}
