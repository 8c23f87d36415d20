use tokio::sync::Mutex;
use tracing::debug;

/// Result of a single toggle request against a [`BoardStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The position was already on; nothing changed.
    AlreadySet,
    /// The position was switched on and the board still has open positions.
    Set,
    /// The position was switched on and it was the last open one.
    ///
    /// Exactly one toggle per board ever reports this outcome.
    Completed,
}

impl ToggleOutcome {
    /// Whether this toggle is the one that completed the board.
    pub fn completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Started/finished flags of a board at a given instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardFlags {
    /// At least one position was toggled or the session was started.
    pub has_started: bool,
    /// Every position is on.
    pub has_finished: bool,
}

impl BoardFlags {
    /// Started and not yet finished.
    pub fn in_process(&self) -> bool {
        self.has_started && !self.has_finished
    }
}

#[derive(Debug)]
struct BoardBits {
    bytes: Vec<u8>,
    flags: BoardFlags,
}

impl BoardBits {
    fn is_on(&self, position: usize) -> bool {
        self.bytes[position >> 3] & (1 << (position & 7)) != 0
    }

    /// Full rescan of the addressable positions.
    fn count_on(&self, size: usize) -> usize {
        (0..size).filter(|&position| self.is_on(position)).count()
    }
}

/// Fixed-size bit board shared by all players of one session.
///
/// The bit array and both flags live behind a single lock so a toggle and the
/// finished determination that follows it are observed atomically.
#[derive(Debug)]
pub struct BoardStatus {
    size: usize,
    bits: Mutex<BoardBits>,
}

impl BoardStatus {
    /// Allocate an all-off board with `size` positions.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            bits: Mutex::new(BoardBits {
                bytes: vec![0; size.div_ceil(8)],
                flags: BoardFlags::default(),
            }),
        }
    }

    /// Number of positions on the board.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Switch `position` on.
    ///
    /// Bounds are the caller's responsibility: `position` must be below [`Self::size`].
    pub async fn toggle(&self, position: usize) -> ToggleOutcome {
        let mut bits = self.bits.lock().await;
        if bits.is_on(position) {
            return ToggleOutcome::AlreadySet;
        }

        bits.bytes[position >> 3] |= 1 << (position & 7);
        bits.flags.has_started = true;

        let on = bits.count_on(self.size);
        debug!(position, on, off = self.size - on, "bit toggled");
        if on == self.size {
            bits.flags.has_finished = true;
            debug!(size = self.size, "board completed");
            ToggleOutcome::Completed
        } else {
            ToggleOutcome::Set
        }
    }

    /// Flag the board as started without touching any position.
    pub async fn mark_started(&self) {
        self.bits.lock().await.flags.has_started = true;
    }

    /// Current started/finished flags.
    pub async fn flags(&self) -> BoardFlags {
        self.bits.lock().await.flags
    }

    /// Whether every position is on.
    pub async fn is_finished(&self) -> bool {
        self.bits.lock().await.flags.has_finished
    }

    /// Whether `position` is on. Out-of-range positions read as off.
    pub async fn is_set(&self, position: usize) -> bool {
        position < self.size && self.bits.lock().await.is_on(position)
    }

    /// Number of positions currently on.
    pub async fn set_count(&self) -> usize {
        self.bits.lock().await.count_on(self.size)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn toggling_every_position_finishes_the_board() {
        for size in [1, 7, 8, 9, 33] {
            let board = BoardStatus::new(size);
            for position in 0..size - 1 {
                assert_eq!(board.toggle(position).await, ToggleOutcome::Set);
                assert!(!board.is_finished().await, "size {size} finished early");
            }
            assert_eq!(board.toggle(size - 1).await, ToggleOutcome::Completed);
            assert!(board.is_finished().await);
            assert_eq!(board.set_count().await, size);
        }
    }

    #[tokio::test]
    async fn order_of_toggles_does_not_matter() {
        let board = BoardStatus::new(10);
        for position in (0..10).rev().skip(1) {
            board.toggle(position).await;
        }
        assert!(!board.is_finished().await);
        assert!(board.toggle(9).await.completed());
    }

    #[tokio::test]
    async fn retoggling_a_set_position_is_a_no_op() {
        let board = BoardStatus::new(3);
        board.toggle(1).await;

        assert_eq!(board.toggle(1).await, ToggleOutcome::AlreadySet);
        assert!(board.is_set(1).await);
        assert_eq!(board.set_count().await, 1);
        assert!(!board.is_finished().await);

        board.toggle(0).await;
        board.toggle(2).await;
        assert_eq!(board.toggle(2).await, ToggleOutcome::AlreadySet);
        assert!(board.is_finished().await);
    }

    #[tokio::test]
    async fn first_toggle_marks_board_started() {
        let board = BoardStatus::new(4);
        assert_eq!(board.flags().await, BoardFlags::default());

        board.toggle(2).await;
        let flags = board.flags().await;
        assert!(flags.has_started);
        assert!(flags.in_process());
    }

    #[tokio::test]
    async fn concurrent_toggles_complete_exactly_once() {
        let board = Arc::new(BoardStatus::new(64));
        let mut handles = Vec::new();
        for worker in 0..8 {
            let board = Arc::clone(&board);
            handles.push(tokio::spawn(async move {
                let mut completed = 0;
                for position in 0..64 {
                    if board.toggle((position + worker * 8) % 64).await.completed() {
                        completed += 1;
                    }
                }
                completed
            }));
        }

        let mut completed = 0;
        for handle in handles {
            completed += handle.await.unwrap();
        }
        assert_eq!(completed, 1);
        assert!(board.is_finished().await);
    }
}
