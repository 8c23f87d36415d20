use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for BattleBit Back.
#[openapi(
    paths(
        crate::routes::home::home,
        crate::routes::health::healthcheck,
        crate::routes::sse::events_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::rpc::RpcRequest,
            crate::dto::rpc::RpcResponse,
            crate::dto::rpc::RpcErrorBody,
            crate::dto::game::CreateGameParams,
            crate::dto::game::GameIdParams,
            crate::dto::game::JoinGameParams,
            crate::dto::game::LeaveGameParams,
            crate::dto::game::PlayerMoveParams,
            crate::dto::game::GameStatus,
            crate::dto::game::GameStarted,
            crate::dto::game::GameFinished,
            crate::dto::game::PlayerAdded,
            crate::dto::game::PlayerRemoved,
            crate::dto::game::PlayerMoved,
            crate::dto::game::GameMetrics,
            crate::dto::game::PlayerSummary,
            crate::dto::game::GameDetails,
            crate::dto::game::SessionEvent,
            crate::state::autopilot::AutopilotState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "games", description = "JSON-RPC over WebSocket for game sessions"),
    )
)]
pub struct ApiDoc;
