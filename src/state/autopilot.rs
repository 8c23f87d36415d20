use std::{sync::Arc, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::Normal;
use serde::Serialize;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::state::{player::Player, session::GameSession};

/// Floor applied to the pacing interval; a zero interval would spin.
pub const MIN_AUTOPILOT_INTERVAL: Duration = Duration::from_millis(1);
/// Standard deviation of the target distribution around the sweep counter.
pub const TARGET_STD_DEV: f64 = 5.0;

/// Lifecycle of the autopilot of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AutopilotState {
    /// The session has not been started yet.
    Idle,
    /// Ticking and issuing moves.
    Running,
    /// Cancellation delivered, loop not yet exited.
    Stopping,
    /// Loop exited.
    Stopped,
}

/// Background task submitting synthetic moves for the autopilot players of a session.
#[derive(Debug)]
pub struct AutopilotDriver {
    pilots: Vec<Player>,
    interval: Duration,
    cancel: CancellationToken,
}

impl AutopilotDriver {
    /// Build a driver for `pilots`, ticking every `interval` until `cancel` fires.
    pub fn new(pilots: Vec<Player>, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            pilots,
            interval: interval.max(MIN_AUTOPILOT_INTERVAL),
            cancel,
        }
    }

    /// Effective pacing interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the driver on the Tokio runtime.
    pub fn spawn(self, session: Arc<GameSession>) -> JoinHandle<()> {
        tokio::spawn(self.run(session))
    }

    /// Tick until the cancellation token fires or the board completes.
    ///
    /// Every tick draws one target and every pilot moves there, through the
    /// same path as human players.
    async fn run(self, session: Arc<GameSession>) {
        let game_id = session.id();
        let mut rng = StdRng::from_rng(&mut rand::rng());
        // First round runs immediately, the next one a full interval later.
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            %game_id,
            pilots = self.pilots.len(),
            interval_ms = self.interval.as_millis() as u64,
            "autopilot running"
        );

        while !session.is_finished().await {
            let mean = session.progress().await.current;
            if let Some(target) = sample_target(&mut rng, mean, TARGET_STD_DEV, session.size()) {
                for pilot in &self.pilots {
                    session.move_player(pilot.id, target).await;
                }
            }

            if session.advance_iteration().await {
                debug!(%game_id, size = session.size(), "restarting sweep; game is still running");
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!(%game_id, "autopilot stopping");
                    break;
                }
                _ = ticker.tick() => {}
            }
        }

        let iterations = session.progress().await.iterations();
        info!(%game_id, iterations, "autopilot stopped");
    }
}

/// Draw a board position from a normal distribution centred on `mean`,
/// redrawing until the truncated sample lands in `[0, size)`.
///
/// Returns `None` for an empty board, where no sample can ever be accepted.
pub fn sample_target<R>(rng: &mut R, mean: usize, std_dev: f64, size: usize) -> Option<usize>
where
    R: Rng + ?Sized,
{
    if size == 0 {
        return None;
    }
    let normal = Normal::new(mean as f64, std_dev).ok()?;
    loop {
        let candidate = rng.sample(normal).trunc();
        if candidate >= 0.0 && candidate < size as f64 {
            return Some(candidate as usize);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::state::events::EventHub;

    use super::*;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    #[test]
    fn samples_centre_on_the_sweep_counter() {
        let mut rng = seeded();
        let draws = 20_000;
        let samples: Vec<f64> = (0..draws)
            .map(|_| sample_target(&mut rng, 200, TARGET_STD_DEV, 1_000).unwrap() as f64)
            .collect();

        let mean = samples.iter().sum::<f64>() / draws as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (draws - 1) as f64;
        // Truncation shifts the mean of positive samples down by half a position.
        assert!((199.3..=199.7).contains(&mean), "mean {mean}");
        assert!((4.8..=5.2).contains(&variance.sqrt()), "std dev {}", variance.sqrt());
    }

    #[test]
    fn accepted_samples_stay_on_the_board() {
        let mut rng = seeded();
        for mean in [0, 1, 2, 3] {
            for _ in 0..2_000 {
                let position = sample_target(&mut rng, mean, TARGET_STD_DEV, 3).unwrap();
                assert!(position < 3);
            }
        }
    }

    #[test]
    fn empty_board_never_samples() {
        assert_eq!(sample_target(&mut seeded(), 0, TARGET_STD_DEV, 0), None);
    }

    #[test]
    fn zero_interval_is_raised_to_the_floor() {
        let driver = AutopilotDriver::new(Vec::new(), Duration::ZERO, CancellationToken::new());
        assert_eq!(driver.interval(), MIN_AUTOPILOT_INTERVAL);
    }

    #[tokio::test]
    async fn autopilot_plays_a_small_board_to_the_end() {
        let session = Arc::new(GameSession::new(8, 2, Duration::ZERO, EventHub::default()));
        session.start().await;

        tokio::time::timeout(Duration::from_secs(10), async {
            while session.autopilot_state().await != AutopilotState::Stopped {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("autopilot should finish the board");

        let finished = session.finished_snapshot().expect("session finished");
        assert!(finished.winner_name.starts_with("Autopilot"));
        let metrics = session.metrics().await;
        assert!(metrics.game_status.is_finished);
        assert_eq!(
            metrics.auto_pilot_moves,
            (metrics.auto_pilot_total_iters + metrics.auto_pilot_current_iters as u64) * 2
        );
    }

    #[tokio::test]
    async fn shutdown_stops_a_running_driver() {
        let session = Arc::new(GameSession::new(
            100_000,
            1,
            Duration::from_millis(20),
            EventHub::default(),
        ));
        session.start().await;
        assert_eq!(session.autopilot_state().await, AutopilotState::Running);

        tokio::time::timeout(Duration::from_secs(1), session.shutdown())
            .await
            .expect("driver should stop");
        assert_eq!(session.autopilot_state().await, AutopilotState::Stopped);
        assert!(!session.is_finished().await);
    }

    #[tokio::test]
    async fn first_round_is_followed_by_a_full_interval() {
        let session = Arc::new(GameSession::new(
            100_000,
            1,
            Duration::from_secs(10),
            EventHub::default(),
        ));
        session.start().await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        let metrics = session.metrics().await;
        assert_eq!(metrics.auto_pilot_current_iters, 1);
        assert_eq!(metrics.auto_pilot_total_iters, 0);
        assert_eq!(metrics.auto_pilot_moves, 1);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn driver_exits_on_a_complete_board_without_cancellation() {
        let session = Arc::new(GameSession::new(1, 0, Duration::ZERO, EventHub::default()));
        let player = Player::new("solo", "127.0.0.1:9000");
        session.add_player(player.clone()).await.unwrap();
        session.move_player(player.id, 0).await;
        assert!(session.is_finished().await);

        let cancel = CancellationToken::new();
        let handle = AutopilotDriver::new(Vec::new(), Duration::ZERO, cancel.clone())
            .spawn(Arc::clone(&session));
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("driver should stop on its own")
            .expect("task should not panic");
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn repeated_cancellation_does_not_block() {
        let cancel = CancellationToken::new();
        let session = Arc::new(GameSession::new(50, 0, Duration::ZERO, EventHub::default()));
        let handle = AutopilotDriver::new(Vec::new(), Duration::ZERO, cancel.clone())
            .spawn(Arc::clone(&session));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("driver should stop")
            .expect("task should not panic");
        cancel.cancel();
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }
}
