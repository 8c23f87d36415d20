use battlebit_back::{
    config::AppConfig,
    dto::rpc::{RpcRequest, RpcResponse, methods},
    error::{INVALID_PARAMS, PARSE_ERROR},
    services::rpc_service,
    state::{AppState, SharedState},
};
use serde_json::{Value, json};

const ORIGIN: &str = "127.0.0.1:40000";

async fn call(state: &SharedState, method: &str, params: Value) -> RpcResponse {
    let request = RpcRequest {
        jsonrpc: "2.0".into(),
        method: method.into(),
        params,
        id: json!("req"),
    };
    rpc_service::dispatch(state, request, ORIGIN).await
}

async fn ok(state: &SharedState, method: &str, params: Value) -> Value {
    let response = call(state, method, params).await;
    assert!(response.error.is_none(), "{method} failed: {:?}", response.error);
    response.result.expect("result")
}

async fn error_code(state: &SharedState, method: &str, params: Value) -> i64 {
    let response = call(state, method, params).await;
    assert!(response.result.is_none(), "{method} unexpectedly succeeded");
    response.error.expect("error").code
}

#[tokio::test]
async fn two_players_complete_a_four_position_board() {
    let state = AppState::new(AppConfig::default());

    let started = ok(&state, methods::CREATE_GAME, json!({ "size": 4, "autopilots": 0 })).await;
    assert_eq!(started["sizeGame"], 4);
    assert_eq!(started["numberAutoPilots"], 0);
    let game_id = started["gameId"].clone();

    let alice = ok(
        &state,
        methods::JOIN_GAME,
        json!({ "gameId": game_id, "playerName": "alice" }),
    )
    .await;
    let bob = ok(
        &state,
        methods::JOIN_GAME,
        json!({ "gameId": game_id, "playerName": "bob" }),
    )
    .await;
    assert_eq!(alice["playerName"], "alice");

    for (player, index) in [(&alice, 2), (&bob, 0), (&alice, 3)] {
        let moved = ok(
            &state,
            methods::PLAYER_MOVE,
            json!({ "gameId": game_id, "playerId": player["playerId"], "index": index }),
        )
        .await;
        assert_eq!(moved["gameStatus"]["isFinished"], false);
        assert_eq!(moved["gameStatus"]["isInProcess"], true);
    }

    let last = ok(
        &state,
        methods::PLAYER_MOVE,
        json!({ "gameId": game_id, "playerId": bob["playerId"], "index": 1 }),
    )
    .await;
    assert_eq!(last["gameStatus"]["isFinished"], true);
    assert_eq!(last["gameStatus"]["isInProcess"], false);

    let details = ok(&state, methods::GET_GAME, json!({ "id": game_id })).await;
    assert_eq!(details["setPositions"], 4);
    assert_eq!(details["winner"]["playerId"], bob["playerId"]);
    assert_eq!(details["lastMoveBy"], bob["playerId"]);
    assert_eq!(details["players"].as_array().map(Vec::len), Some(2));

    let metrics = ok(&state, methods::GAME_METRICS, json!({ "id": game_id })).await;
    assert_eq!(metrics["players"], 2);
    assert_eq!(metrics["autoPilotMoves"], 0);
    assert_eq!(metrics["gameStatus"]["isFinished"], true);

    let listed = ok(&state, methods::LIST_GAMES, Value::Null).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    ok(&state, methods::REMOVE_GAME, json!({ "id": game_id })).await;
    assert_eq!(
        error_code(&state, methods::GET_GAME, json!({ "id": game_id })).await,
        404
    );
    // Removing twice is not an error.
    ok(&state, methods::REMOVE_GAME, json!({ "id": game_id })).await;
    assert!(state.registry().is_empty());
}

#[tokio::test]
async fn leaving_twice_yields_an_empty_snapshot() {
    let state = AppState::new(AppConfig::default());
    let started = ok(&state, methods::CREATE_GAME, json!({ "size": 16 })).await;
    let game_id = started["gameId"].clone();
    let joined = ok(
        &state,
        methods::JOIN_GAME,
        json!({ "gameId": game_id, "playerName": "carol" }),
    )
    .await;

    let params = json!({ "gameId": game_id, "playerId": joined["playerId"] });
    let left = ok(&state, methods::LEAVE_GAME, params.clone()).await;
    assert_eq!(left["playerId"], joined["playerId"]);

    let again = ok(&state, methods::LEAVE_GAME, params).await;
    assert_eq!(again["playerId"], json!(uuid::Uuid::nil()));
    state.registry().shutdown().await;
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let state = AppState::new(AppConfig::default());

    let response = rpc_service::handle_text(&state, "{ not json", ORIGIN).await;
    assert_eq!(response.error.map(|err| err.code), Some(PARSE_ERROR));
    assert!(response.id.is_null());

    assert_eq!(
        error_code(&state, methods::CREATE_GAME, json!({ "size": 0 })).await,
        INVALID_PARAMS
    );
    assert_eq!(
        error_code(&state, methods::CREATE_GAME, json!({ "size": 8, "autopilots": 11 })).await,
        INVALID_PARAMS
    );
    assert_eq!(
        error_code(
            &state,
            methods::JOIN_GAME,
            json!({ "gameId": "not-a-uuid", "playerName": "dave" })
        )
        .await,
        INVALID_PARAMS
    );
    assert_eq!(
        error_code(
            &state,
            methods::JOIN_GAME,
            json!({ "gameId": uuid::Uuid::new_v4(), "playerName": "dave" })
        )
        .await,
        404
    );
    assert!(state.registry().is_empty());
}

#[tokio::test]
async fn enforced_session_limit_is_reported() {
    let config = AppConfig::from_lookup(None, |key| match key {
        "BB_LIMIT_GAMES" => Some("1".into()),
        "BB_ENFORCE_LIMIT_GAMES" => Some("true".into()),
        _ => None,
    });
    let state = AppState::new(config);

    ok(&state, methods::CREATE_GAME, json!({ "size": 8 })).await;
    assert_eq!(
        error_code(&state, methods::CREATE_GAME, json!({ "size": 8 })).await,
        429
    );
    state.registry().shutdown().await;
}

#[tokio::test]
async fn full_game_rejects_extra_players() {
    let state = AppState::new(AppConfig::default());
    let started = ok(&state, methods::CREATE_GAME, json!({ "size": 50_000, "autopilots": 10 })).await;
    let game_id = started["gameId"].clone();

    assert_eq!(
        error_code(
            &state,
            methods::JOIN_GAME,
            json!({ "gameId": game_id, "playerName": "eve" })
        )
        .await,
        409
    );
    state.registry().shutdown().await;
}
