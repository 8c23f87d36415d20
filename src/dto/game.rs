use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::timestamp,
    state::{autopilot::AutopilotState, board::BoardFlags, player::Player},
};

/// Largest board accepted from clients.
pub const MAX_BOARD_SIZE: usize = 65_536;
/// Upper bound on autopilots requested for one session.
pub const MAX_AUTOPILOTS: usize = 10;

/// Params of `create_game`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameParams {
    /// Number of positions on the board.
    #[validate(range(min = 1, max = MAX_BOARD_SIZE))]
    pub size: usize,
    /// Autopilot players spawned alongside the session.
    #[serde(default)]
    #[validate(range(max = MAX_AUTOPILOTS))]
    pub autopilots: usize,
}

/// Params of `get_game`, `remove_game` and `game_metrics`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GameIdParams {
    /// Session identifier.
    pub id: Uuid,
}

/// Params of `join_game`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameParams {
    /// Session to join.
    pub game_id: Uuid,
    /// Display name of the new player.
    #[validate(length(min = 1, max = 64))]
    pub player_name: String,
}

/// Params of `leave_game`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGameParams {
    /// Session to leave.
    pub game_id: Uuid,
    /// Player leaving the session.
    pub player_id: Uuid,
}

/// Params of `player_move`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMoveParams {
    /// Session the move applies to.
    pub game_id: Uuid,
    /// Player submitting the move.
    pub player_id: Uuid,
    /// Board position to switch on. Negative values are treated as out of range.
    pub index: i64,
}

/// In-process/finished flags carried by several snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    /// Started and not finished.
    pub is_in_process: bool,
    /// Every position is on.
    pub is_finished: bool,
}

impl From<BoardFlags> for GameStatus {
    fn from(flags: BoardFlags) -> Self {
        Self {
            is_in_process: flags.in_process(),
            is_finished: flags.has_finished,
        }
    }
}

/// Returned once a session has been created and started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStarted {
    pub game_id: Uuid,
    pub size_game: usize,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String, format = DateTime)]
    pub init_time: OffsetDateTime,
    pub number_auto_pilots: usize,
}

/// Final outcome of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameFinished {
    pub game_id: Uuid,
    pub size_game: usize,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String, format = DateTime)]
    pub init_time: OffsetDateTime,
    pub number_auto_pilots: usize,
    pub winner_id: Uuid,
    pub winner_name: String,
    /// Time between start and the completing move, in milliseconds.
    pub duration_ms: u64,
}

/// Outcome of `join_game`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAdded {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
}

/// Outcome of `leave_game`. Nil ids mean the player was not in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRemoved {
    pub game_id: Uuid,
    pub player_id: Uuid,
}

impl PlayerRemoved {
    /// `true` when nothing was removed.
    pub fn is_empty(&self) -> bool {
        self.game_id.is_nil()
    }
}

/// Outcome of `player_move`. Nil ids mean the move was ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMoved {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub index: usize,
    #[serde(serialize_with = "timestamp::serialize_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub time_move: Option<OffsetDateTime>,
    pub game_status: GameStatus,
}

impl PlayerMoved {
    /// `true` when the move had no effect because the player or position was invalid.
    pub fn is_empty(&self) -> bool {
        self.game_id.is_nil()
    }
}

/// Read-only statistics of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameMetrics {
    pub game_id: Uuid,
    pub size_game: usize,
    pub number_auto_pilots: usize,
    /// Current roster size, autopilots included.
    pub players: usize,
    pub auto_pilots: usize,
    /// Iterations folded into the cumulative counter.
    pub auto_pilot_total_iters: u64,
    /// Iterations of the current sweep.
    pub auto_pilot_current_iters: usize,
    /// `(auto_pilot_total_iters + auto_pilot_current_iters) * auto_pilots`.
    pub auto_pilot_moves: u64,
    pub current_duration_ms: u64,
    pub autopilot_state: AutopilotState,
    pub game_status: GameStatus,
}

/// Public view of a roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_id: Uuid,
    pub player_name: String,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.id,
            player_name: player.name.clone(),
        }
    }
}

/// Full snapshot returned by `get_game`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameDetails {
    pub game_id: Uuid,
    pub size_game: usize,
    /// Positions currently on.
    pub set_positions: usize,
    #[serde(serialize_with = "timestamp::serialize")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(serialize_with = "timestamp::serialize_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub init_time: Option<OffsetDateTime>,
    pub number_auto_pilots: usize,
    pub players: Vec<PlayerSummary>,
    #[serde(serialize_with = "timestamp::serialize_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_move_time: Option<OffsetDateTime>,
    pub last_move_by: Option<Uuid>,
    pub winner: Option<PlayerSummary>,
    pub game_status: GameStatus,
}

/// Notification published for every effective session operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    GameStarted(GameStarted),
    GameFinished(GameFinished),
    PlayerAdded(PlayerAdded),
    PlayerRemoved(PlayerRemoved),
    PlayerMoved(PlayerMoved),
}

impl SessionEvent {
    /// Event name used on the SSE stream.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GameStarted(_) => "game.started",
            Self::GameFinished(_) => "game.finished",
            Self::PlayerAdded(_) => "player.added",
            Self::PlayerRemoved(_) => "player.removed",
            Self::PlayerMoved(_) => "player.moved",
        }
    }

    /// Session the event belongs to.
    pub fn game_id(&self) -> Uuid {
        match self {
            Self::GameStarted(event) => event.game_id,
            Self::GameFinished(event) => event.game_id,
            Self::PlayerAdded(event) => event.game_id,
            Self::PlayerRemoved(event) => event.game_id,
            Self::PlayerMoved(event) => event.game_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_move_serializes_with_nil_ids() {
        let value = serde_json::to_value(PlayerMoved::default()).unwrap();
        assert_eq!(value["gameId"], json!(Uuid::nil().to_string()));
        assert_eq!(value["timeMove"], json!(null));
        assert_eq!(
            value["gameStatus"],
            json!({ "isInProcess": false, "isFinished": false })
        );
    }

    #[test]
    fn create_params_reject_empty_board() {
        let params: CreateGameParams =
            serde_json::from_value(json!({ "size": 0, "autopilots": 1 })).unwrap();
        assert!(params.validate().is_err());

        let params: CreateGameParams = serde_json::from_value(json!({ "size": 16 })).unwrap();
        assert!(params.validate().is_ok());
        assert_eq!(params.autopilots, 0);
    }

    #[test]
    fn join_params_require_a_name() {
        let params: JoinGameParams = serde_json::from_value(json!({
            "gameId": Uuid::new_v4(),
            "playerName": "",
        }))
        .unwrap();
        assert!(params.validate().is_err());
    }

    #[test]
    fn session_event_is_tagged() {
        let event = SessionEvent::PlayerRemoved(PlayerRemoved {
            game_id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "player_removed");
        assert_eq!(event.name(), "player.removed");
    }
}
