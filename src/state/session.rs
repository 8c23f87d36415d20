use std::{
    sync::{Arc, OnceLock},
    time::{Duration, Instant},
};

use indexmap::IndexMap;
use time::OffsetDateTime;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dto::game::{
        GameDetails, GameFinished, GameMetrics, GameStarted, GameStatus, PlayerAdded,
        PlayerMoved, PlayerRemoved, PlayerSummary, SessionEvent,
    },
    state::{
        GameError,
        autopilot::{AutopilotDriver, AutopilotState},
        board::{BoardStatus, ToggleOutcome},
        events::EventHub,
        player::Player,
    },
};

/// Hard cap on the roster of a session, autopilots included.
pub const MAX_PLAYERS: usize = 10;

#[derive(Debug, Clone, Copy)]
struct LastMove {
    at: OffsetDateTime,
    by: Uuid,
}

/// Roster and move bookkeeping, guarded by its own lock.
#[derive(Debug, Default)]
struct Roster {
    players: IndexMap<Uuid, Player>,
    last_move: Option<LastMove>,
    winner: Option<Player>,
}

/// Sweep counters advanced by the autopilot after every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutopilotProgress {
    /// Iteration of the current sweep, used as the mean of the target distribution.
    pub current: usize,
    /// Iterations of every completed sweep.
    pub total: u64,
}

impl AutopilotProgress {
    /// Count one tick. Once the counter passes `size` it is folded into
    /// [`Self::total`] and the sweep restarts at zero; returns `true` in that case.
    pub fn advance(&mut self, size: usize) -> bool {
        self.current += 1;
        if self.current > size {
            self.total += self.current as u64;
            self.current = 0;
            return true;
        }
        false
    }

    /// Ticks performed so far.
    pub fn iterations(&self) -> u64 {
        self.total + self.current as u64
    }
}

#[derive(Debug)]
struct StartInfo {
    instant: Instant,
    snapshot: GameStarted,
}

/// One independent game: a board, its roster and the autopilot feeding it.
///
/// The board and the roster are guarded by two independent locks. The only
/// cross-update (recording the winner) happens under the roster lock after the
/// board lock was released; it is race-free because only the toggle that
/// switched the last open position reports [`ToggleOutcome::Completed`].
#[derive(Debug)]
pub struct GameSession {
    id: Uuid,
    board: BoardStatus,
    roster: Mutex<Roster>,
    created_at: OffsetDateTime,
    number_autopilots: usize,
    autopilot_interval: Duration,
    progress: Mutex<AutopilotProgress>,
    started: OnceLock<StartInfo>,
    finished: OnceLock<GameFinished>,
    cancel: CancellationToken,
    driver: Mutex<Option<JoinHandle<()>>>,
    events: EventHub,
}

impl GameSession {
    /// Build an unstarted session with an all-off board of `size` positions.
    pub fn new(
        size: usize,
        number_autopilots: usize,
        autopilot_interval: Duration,
        events: EventHub,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            board: BoardStatus::new(size),
            roster: Mutex::new(Roster::default()),
            created_at: OffsetDateTime::now_utc(),
            number_autopilots,
            autopilot_interval,
            progress: Mutex::new(AutopilotProgress::default()),
            started: OnceLock::new(),
            finished: OnceLock::new(),
            cancel: CancellationToken::new(),
            driver: Mutex::new(None),
            events,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of board positions.
    pub fn size(&self) -> usize {
        self.board.size()
    }

    /// Autopilots requested when the session was created.
    pub fn number_autopilots(&self) -> usize {
        self.number_autopilots
    }

    /// Whether the board is complete.
    pub async fn is_finished(&self) -> bool {
        self.board.is_finished().await
    }

    /// Final outcome, once the session has finished.
    pub fn finished_snapshot(&self) -> Option<GameFinished> {
        self.finished.get().cloned()
    }

    /// Look up a roster member.
    pub async fn player(&self, player_id: Uuid) -> Option<Player> {
        let roster = self.roster.lock().await;
        let player = roster.players.get(&player_id).cloned();
        if player.is_none() {
            debug!(game_id = %self.id, %player_id, "player not found");
        }
        player
    }

    /// Append `player` to the roster.
    pub async fn add_player(&self, player: Player) -> Result<PlayerAdded, GameError> {
        let mut roster = self.roster.lock().await;
        if roster.players.len() >= MAX_PLAYERS {
            debug!(game_id = %self.id, players = roster.players.len(), "game is full");
            return Err(GameError::GameFull);
        }
        if roster.players.contains_key(&player.id) {
            debug!(game_id = %self.id, player_id = %player.id, "player already added");
            return Err(GameError::DuplicatePlayer);
        }

        let added = PlayerAdded {
            game_id: self.id,
            player_id: player.id,
            player_name: player.name.clone(),
        };
        roster.players.insert(player.id, player);
        drop(roster);

        debug!(game_id = %self.id, player_id = %added.player_id, player_name = %added.player_name, "player added");
        self.events.publish(SessionEvent::PlayerAdded(added.clone()));
        Ok(added)
    }

    /// Remove a player. An empty snapshot means the player was not in the roster.
    pub async fn remove_player(&self, player_id: Uuid) -> PlayerRemoved {
        let removed = self.roster.lock().await.players.shift_remove(&player_id);
        let Some(player) = removed else {
            debug!(game_id = %self.id, %player_id, "player not found");
            return PlayerRemoved::default();
        };

        let removed = PlayerRemoved {
            game_id: self.id,
            player_id: player.id,
        };
        debug!(game_id = %self.id, %player_id, "player removed");
        self.events.publish(SessionEvent::PlayerRemoved(removed.clone()));
        removed
    }

    /// Switch `position` on for `player_id`.
    ///
    /// Unknown players and out-of-range positions yield an empty snapshot and
    /// leave the session untouched. The move that completes the board records
    /// its player as winner and finishes the session.
    pub async fn move_player(&self, player_id: Uuid, position: usize) -> PlayerMoved {
        let Some(player) = self.player(player_id).await else {
            return PlayerMoved::default();
        };
        if position >= self.board.size() {
            debug!(game_id = %self.id, %player_id, index = position, "index out of range");
            return PlayerMoved::default();
        }

        let outcome = self.board.toggle(position).await;
        let time_move = OffsetDateTime::now_utc();
        {
            let mut roster = self.roster.lock().await;
            roster.last_move = Some(LastMove {
                at: time_move,
                by: player.id,
            });
            if outcome.completed() {
                roster.winner = Some(player.clone());
            }
        }

        let moved = PlayerMoved {
            game_id: self.id,
            player_id: player.id,
            index: position,
            time_move: Some(time_move),
            game_status: self.board.flags().await.into(),
        };
        debug!(game_id = %self.id, %player_id, index = position, ?outcome, "player moved");
        if outcome != ToggleOutcome::AlreadySet {
            self.events.publish(SessionEvent::PlayerMoved(moved.clone()));
        }

        if outcome.completed() {
            self.finish().await;
        }
        moved
    }

    /// Mark the session started and spawn its autopilot driver.
    ///
    /// Only the first call spawns a driver; later calls return the first snapshot.
    pub async fn start(self: &Arc<Self>) -> GameStarted {
        let mut driver = self.driver.lock().await;
        if let Some(info) = self.started.get() {
            warn!(game_id = %self.id, "session already started");
            return info.snapshot.clone();
        }

        let snapshot = GameStarted {
            game_id: self.id,
            size_game: self.board.size(),
            init_time: OffsetDateTime::now_utc(),
            number_auto_pilots: self.number_autopilots,
        };
        let _ = self.started.set(StartInfo {
            instant: Instant::now(),
            snapshot: snapshot.clone(),
        });
        self.board.mark_started().await;

        let pilots = self.enlist_autopilots().await;
        let handle = AutopilotDriver::new(pilots, self.autopilot_interval, self.cancel.clone())
            .spawn(Arc::clone(self));
        *driver = Some(handle);
        drop(driver);

        info!(
            game_id = %self.id,
            size = snapshot.size_game,
            autopilots = self.number_autopilots,
            "game started"
        );
        self.events.publish(SessionEvent::GameStarted(snapshot.clone()));
        snapshot
    }

    async fn enlist_autopilots(&self) -> Vec<Player> {
        let mut pilots = Vec::with_capacity(self.number_autopilots);
        for index in 0..self.number_autopilots {
            let pilot = Player::autopilot(index);
            match self.add_player(pilot.clone()).await {
                Ok(_) => pilots.push(pilot),
                Err(err) => error!(game_id = %self.id, error = %err, "error adding autopilot"),
            }
        }
        pilots
    }

    /// Stop the autopilot and produce the final snapshot.
    ///
    /// Called by the move that completes the board. A second call is a contract
    /// violation: it is logged and the first snapshot is returned.
    pub async fn finish(&self) -> GameFinished {
        if let Some(done) = self.finished.get() {
            error!(game_id = %self.id, "finish invoked on an already finished session");
            return done.clone();
        }

        self.cancel.cancel();
        let winner = self.roster.lock().await.winner.clone().unwrap_or_else(|| {
            warn!(game_id = %self.id, "session finished without a winner");
            Player {
                id: Uuid::nil(),
                name: String::new(),
                connection: String::new(),
            }
        });
        let (init_time, duration) = match self.started.get() {
            Some(info) => (info.snapshot.init_time, info.instant.elapsed()),
            None => (self.created_at, Duration::ZERO),
        };

        let snapshot = GameFinished {
            game_id: self.id,
            size_game: self.board.size(),
            init_time,
            number_auto_pilots: self.number_autopilots,
            winner_id: winner.id,
            winner_name: winner.name,
            duration_ms: millis(duration),
        };
        if self.finished.set(snapshot.clone()).is_err() {
            error!(game_id = %self.id, "concurrent finish detected");
            return self.finished.get().cloned().unwrap_or(snapshot);
        }

        info!(
            game_id = %self.id,
            size = snapshot.size_game,
            winner_id = %snapshot.winner_id,
            winner_name = %snapshot.winner_name,
            duration_ms = snapshot.duration_ms,
            "game finished"
        );
        self.events.publish(SessionEvent::GameFinished(snapshot.clone()));
        snapshot
    }

    /// Cancel the autopilot without finishing the game and wait for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.driver.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(game_id = %self.id, error = %err, "autopilot task failed");
            }
        }
        debug!(game_id = %self.id, "session shut down");
    }

    /// Lifecycle of the autopilot driver.
    pub async fn autopilot_state(&self) -> AutopilotState {
        let driver = self.driver.lock().await;
        match driver.as_ref() {
            None if self.cancel.is_cancelled() && self.started.get().is_some() => {
                AutopilotState::Stopped
            }
            None => AutopilotState::Idle,
            Some(handle) if handle.is_finished() => AutopilotState::Stopped,
            Some(_) if self.cancel.is_cancelled() => AutopilotState::Stopping,
            Some(_) => AutopilotState::Running,
        }
    }

    /// Current autopilot sweep counters.
    pub async fn progress(&self) -> AutopilotProgress {
        *self.progress.lock().await
    }

    pub(crate) async fn advance_iteration(&self) -> bool {
        self.progress.lock().await.advance(self.board.size())
    }

    fn elapsed(&self) -> Duration {
        if let Some(done) = self.finished.get() {
            return Duration::from_millis(done.duration_ms);
        }
        self.started
            .get()
            .map(|info| info.instant.elapsed())
            .unwrap_or_default()
    }

    /// Read-only statistics snapshot.
    pub async fn metrics(&self) -> GameMetrics {
        let players = self.roster.lock().await.players.len();
        let progress = self.progress().await;
        let game_status: GameStatus = self.board.flags().await.into();
        let autopilot_state = self.autopilot_state().await;

        debug!(game_id = %self.id, "getting metrics");
        GameMetrics {
            game_id: self.id,
            size_game: self.board.size(),
            number_auto_pilots: self.number_autopilots,
            players,
            auto_pilots: self.number_autopilots,
            auto_pilot_total_iters: progress.total,
            auto_pilot_current_iters: progress.current,
            auto_pilot_moves: progress.iterations() * self.number_autopilots as u64,
            current_duration_ms: millis(self.elapsed()),
            autopilot_state,
            game_status,
        }
    }

    /// Full snapshot of the session.
    pub async fn details(&self) -> GameDetails {
        let (players, last_move, winner) = {
            let roster = self.roster.lock().await;
            (
                roster.players.values().map(PlayerSummary::from).collect(),
                roster.last_move,
                roster.winner.as_ref().map(PlayerSummary::from),
            )
        };

        GameDetails {
            game_id: self.id,
            size_game: self.board.size(),
            set_positions: self.board.set_count().await,
            created_at: self.created_at,
            init_time: self.started.get().map(|info| info.snapshot.init_time),
            number_auto_pilots: self.number_autopilots,
            players,
            last_move_time: last_move.map(|last| last.at),
            last_move_by: last_move.map(|last| last.by),
            winner,
            game_status: self.board.flags().await.into(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
