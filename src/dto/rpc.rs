//! JSON-RPC 2.0 envelope exchanged over the `/ws` socket.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Protocol version echoed in every response.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method names accepted by the dispatcher.
pub mod methods {
    /// Create and start a session.
    pub const CREATE_GAME: &str = "create_game";
    /// List metrics of every session.
    pub const LIST_GAMES: &str = "list_game";
    /// Full snapshot of one session.
    pub const GET_GAME: &str = "get_game";
    /// Unregister a session.
    pub const REMOVE_GAME: &str = "remove_game";
    /// Add a human player to a session.
    pub const JOIN_GAME: &str = "join_game";
    /// Remove a player from a session.
    pub const LEAVE_GAME: &str = "leave_game";
    /// Switch a board position on.
    pub const PLAYER_MOVE: &str = "player_move";
    /// Metrics of one session.
    pub const GAME_METRICS: &str = "game_metrics";
}

/// Inbound request. `params` is decoded per method by the dispatcher.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub params: Value,
    /// Opaque correlation id: string, number or null.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub id: Value,
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// Outbound response; exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RpcResponse {
    #[schema(value_type = String)]
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
    #[schema(value_type = Object)]
    pub id: Value,
}

impl RpcResponse {
    /// Successful response for request `id`.
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Failed response for request `id`.
    pub fn error(id: Value, error: RpcErrorBody) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(error),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_defaults_missing_params_and_id() {
        let request: RpcRequest = serde_json::from_str(r#"{"method":"list_game"}"#).unwrap();
        assert_eq!(request.method, methods::LIST_GAMES);
        assert!(request.params.is_null());
        assert!(request.id.is_null());
    }

    #[test]
    fn error_response_omits_result() {
        let response = RpcResponse::error(
            json!(7),
            RpcErrorBody {
                code: 404,
                message: "missing".into(),
            },
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], 404);
    }
}
