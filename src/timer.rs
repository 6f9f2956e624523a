//! One-shot timers for the delayed transitions after a hit or a miss.
//!
//! A session owns at most one pending timer. Every schedule or cancel bumps a
//! generation counter, so a handle captured before a pause, quit or restart can
//! never be redeemed afterwards.

use std::time::Duration;

/// Pause shown after a hit before the next rep starts.
pub const HIT_RECOVERY: Duration = Duration::from_millis(800);
/// Pause shown after a miss before the next rep starts.
pub const MISS_RECOVERY: Duration = Duration::from_millis(1000);
/// Pause after the final miss before the game over screen.
pub const GAME_OVER_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Hit/Miss -> Playing with a fresh rep.
    NextRep,
    /// Miss -> GameOver.
    EndGame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    generation: u64,
    kind: TimerKind,
}

impl TimerHandle {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: TimerHandle,
    remaining: Duration,
}

#[derive(Debug, Default)]
pub struct Timers {
    generation: u64,
    pending: Option<Pending>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` after `delay`, replacing whatever was pending.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerHandle {
        self.generation += 1;
        let handle = TimerHandle {
            generation: self.generation,
            kind,
        };
        self.pending = Some(Pending {
            handle,
            remaining: delay,
        });
        handle
    }

    /// Drop the pending timer and invalidate every handle issued so far.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.pending = None;
    }

    /// Count the pending timer down. Returns its handle once it has expired;
    /// the timer stays pending until redeemed with [`Timers::take`].
    pub fn advance(&mut self, elapsed: Duration) -> Option<TimerHandle> {
        let pending = self.pending.as_mut()?;
        pending.remaining = pending.remaining.saturating_sub(elapsed);
        if pending.remaining.is_zero() {
            Some(pending.handle)
        } else {
            None
        }
    }

    /// Redeem `handle`. Returns false for stale or already-redeemed handles.
    pub fn take(&mut self, handle: TimerHandle) -> bool {
        match self.pending {
            Some(p) if p.handle == handle && handle.generation == self.generation => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<(TimerHandle, Duration)> {
        self.pending.map(|p| (p.handle, p.remaining))
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.is_some_and(|p| p.handle.kind == kind)
    }
}
