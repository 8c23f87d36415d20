use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::{
    dto::{
        game::{
            CreateGameParams, GameIdParams, JoinGameParams, LeaveGameParams, PlayerMoveParams,
            PlayerMoved,
        },
        rpc::{JSONRPC_VERSION, RpcRequest, RpcResponse, methods},
    },
    error::ServiceError,
    state::{SharedState, player::Player},
};

/// Decode a text frame and answer it. Undecodable frames yield a parse error.
pub async fn handle_text(state: &SharedState, text: &str, origin: &str) -> RpcResponse {
    match serde_json::from_str::<RpcRequest>(text) {
        Ok(request) => dispatch(state, request, origin).await,
        Err(err) => {
            warn!(error = %err, "failed to decode request");
            RpcResponse::error(Value::Null, ServiceError::Parse(err.to_string()).into())
        }
    }
}

/// Route a request to the session engine by method name.
///
/// `origin` tags players created by `join_game`.
#[instrument(skip(state, request), fields(method = %request.method))]
pub async fn dispatch(state: &SharedState, request: RpcRequest, origin: &str) -> RpcResponse {
    let RpcRequest {
        jsonrpc,
        method,
        params,
        id,
    } = request;
    if jsonrpc != JSONRPC_VERSION {
        debug!(%jsonrpc, "request without a 2.0 version tag");
    }

    match route(state, &method, params, origin).await {
        Ok(result) => RpcResponse::result(id, result),
        Err(err) => {
            warn!(error = %err, "request failed");
            RpcResponse::error(id, err.into())
        }
    }
}

async fn route(
    state: &SharedState,
    method: &str,
    params: Value,
    origin: &str,
) -> Result<Value, ServiceError> {
    let registry = state.registry();
    match method {
        methods::CREATE_GAME => {
            let params: CreateGameParams = decode(params)?;
            params.validate()?;
            info!(size = params.size, autopilots = params.autopilots, "creating new game");
            let (_, started) = registry
                .create_session(params.size, params.autopilots)
                .await?;
            encode(started)
        }
        methods::LIST_GAMES => encode(registry.list_sessions().await),
        methods::GET_GAME => {
            let GameIdParams { id } = decode(params)?;
            let session = registry.get_session(id)?;
            encode(session.details().await)
        }
        methods::REMOVE_GAME => {
            let GameIdParams { id } = decode(params)?;
            registry.remove_session(id).await;
            Ok(json!({ "message": "game removed" }))
        }
        methods::JOIN_GAME => {
            let params: JoinGameParams = decode(params)?;
            params.validate()?;
            let session = registry.get_session(params.game_id)?;
            let added = session
                .add_player(Player::new(params.player_name, origin))
                .await?;
            encode(added)
        }
        methods::LEAVE_GAME => {
            let params: LeaveGameParams = decode(params)?;
            let session = registry.get_session(params.game_id)?;
            encode(session.remove_player(params.player_id).await)
        }
        methods::PLAYER_MOVE => {
            let params: PlayerMoveParams = decode(params)?;
            let session = registry.get_session(params.game_id)?;
            let moved = match usize::try_from(params.index) {
                Ok(position) => session.move_player(params.player_id, position).await,
                Err(_) => {
                    debug!(index = params.index, "index out of range");
                    PlayerMoved::default()
                }
            };
            encode(moved)
        }
        methods::GAME_METRICS => {
            let GameIdParams { id } = decode(params)?;
            let session = registry.get_session(id)?;
            encode(session.metrics().await)
        }
        other => Err(ServiceError::MethodNotFound(other.to_string())),
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, ServiceError> {
    Ok(serde_json::from_value(params)?)
}

fn encode<T: Serialize>(value: T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|err| ServiceError::Internal(err.to_string()))
}
