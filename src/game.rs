use std::fmt;
use std::time::Duration;

use crate::difficulty::{Difficulty, TargetWindow, TRACK_CENTER, TRACK_END};
use crate::highscore::HighScoreStore;
use crate::session::{GameState, SessionConfig, SessionState, WorkoutSummary, MAX_MISSES};
use crate::tasks::WorkoutRecorder;
use crate::timer::{
    TimerHandle, TimerKind, Timers, GAME_OVER_DELAY, HIT_RECOVERY, MISS_RECOVERY,
};

/// Combo bonus per consecutive hit already banked.
const COMBO_BONUS: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepGrade {
    Perfect,
    Great,
    Good,
    Solid,
}

impl RepGrade {
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 95.0 {
            RepGrade::Perfect
        } else if accuracy >= 85.0 {
            RepGrade::Great
        } else if accuracy >= 70.0 {
            RepGrade::Good
        } else {
            RepGrade::Solid
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RepGrade::Perfect => "PERFECT REP!",
            RepGrade::Great => "GREAT REP!",
            RepGrade::Good => "GOOD REP!",
            RepGrade::Solid => "REP!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// Triggered outside the power zone.
    OutOfZone,
    /// The indicator reached the end of the track.
    TooLate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepOutcome {
    Hit {
        accuracy: f64,
        points: u64,
        combo: u32,
        grade: RepGrade,
    },
    Miss {
        accuracy: f64,
        reason: MissReason,
    },
}

impl RepOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, RepOutcome::Hit { .. })
    }

    /// Banner shown while the Hit/Miss state is on screen.
    pub fn message(&self) -> String {
        match self {
            RepOutcome::Hit {
                points,
                combo,
                grade,
                ..
            } => {
                let mut msg = format!("{} +{}", grade.label(), points);
                if *combo > 1 {
                    msg.push_str(&format!(" ({}x COMBO!)", combo));
                }
                msg
            }
            RepOutcome::Miss {
                reason: MissReason::TooLate,
                ..
            } => "TOO SLOW! BAD FORM!".to_string(),
            RepOutcome::Miss { .. } => "BAD FORM!".to_string(),
        }
    }
}

/// Timing accuracy for a trigger at `position`: 100 at the track centre,
/// dropping two points per unit of distance, floored at 0.
///
/// Distance is measured from the track centre, not from the target window's
/// midpoint. Every difficulty's window is centred on the track, so the two
/// agree today.
pub fn accuracy(position: f64) -> f64 {
    (100.0 - (position - TRACK_CENTER).abs() * 2.0).clamp(0.0, 100.0)
}

/// Points for a hit with `accuracy` when `combo` consecutive hits precede it.
pub fn points_for(accuracy: f64, combo: u32) -> u64 {
    (accuracy * (1.0 + combo as f64 * COMBO_BONUS)).round() as u64
}

/// The rep timing game: an indicator sweeps the track, the player triggers a
/// rep, and hits inside the power zone score points with a combo multiplier.
/// Three misses end the workout.
pub struct RepGame {
    pub session_config: SessionConfig,
    pub session_state: SessionState,
    high_score: u64,
    timers: Timers,
    last_outcome: Option<RepOutcome>,
    finalized: bool,
    high_scores: Box<dyn HighScoreStore>,
    recorder: Box<dyn WorkoutRecorder>,
}

impl fmt::Debug for RepGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepGame")
            .field("session_config", &self.session_config)
            .field("session_state", &self.session_state)
            .field("high_score", &self.high_score)
            .field("timers", &self.timers)
            .field("last_outcome", &self.last_outcome)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl RepGame {
    /// Opens the game in `Ready`, reading the stored high score once.
    pub fn new(
        high_scores: Box<dyn HighScoreStore>,
        recorder: Box<dyn WorkoutRecorder>,
    ) -> Self {
        let high_score = high_scores.get().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read high score, starting from 0");
            0
        });

        Self {
            session_config: SessionConfig::default(),
            session_state: SessionState::default(),
            high_score,
            timers: Timers::new(),
            last_outcome: None,
            finalized: false,
            high_scores,
            recorder,
        }
    }

    pub fn state(&self) -> GameState {
        self.session_state.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.session_config.difficulty
    }

    pub fn target_window(&self) -> TargetWindow {
        self.session_config.target_window
    }

    pub fn position(&self) -> f64 {
        self.session_state.position
    }

    pub fn score(&self) -> u64 {
        self.session_state.score
    }

    pub fn combo(&self) -> u32 {
        self.session_state.combo
    }

    pub fn best_combo(&self) -> u32 {
        self.session_state.best_combo
    }

    pub fn total_hits(&self) -> u32 {
        self.session_state.total_hits
    }

    pub fn total_misses(&self) -> u32 {
        self.session_state.total_misses
    }

    pub fn is_paused(&self) -> bool {
        self.session_state.paused
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn is_new_record(&self) -> bool {
        self.session_state.new_record
    }

    pub fn last_outcome(&self) -> Option<RepOutcome> {
        self.last_outcome
    }

    pub fn pending_timer(&self) -> Option<(TimerHandle, Duration)> {
        self.timers.pending()
    }

    pub fn summary(&self) -> WorkoutSummary {
        WorkoutSummary::from_state(self.difficulty(), &self.session_state)
    }

    /// Begin a fresh workout. Accepted from `Ready`, and from `GameOver`
    /// (which discards the finished session first). Returns false otherwise.
    pub fn start(&mut self, difficulty: Difficulty) -> bool {
        match self.state() {
            GameState::Ready => {}
            GameState::GameOver => {
                self.restart();
            }
            _ => return false,
        }

        self.session_config = difficulty.into();
        self.session_state = SessionState {
            state: GameState::Playing,
            ..SessionState::default()
        };
        self.timers.cancel();
        self.last_outcome = None;
        self.finalized = false;

        tracing::info!(%difficulty, high_score = self.high_score, "workout started");
        true
    }

    /// Advance the indicator by one normalized step. Reaching the end of the
    /// track without a trigger is a miss with zero accuracy.
    pub fn tick(&mut self) -> Option<RepOutcome> {
        if self.state() != GameState::Playing || self.session_state.paused {
            return None;
        }

        let next = self.session_state.position + self.session_config.difficulty.step();
        if next >= TRACK_END {
            self.session_state.position = TRACK_END;
            return Some(self.register_miss(0.0, MissReason::TooLate));
        }

        self.session_state.position = next;
        None
    }

    /// The player's rep. A no-op unless playing and unpaused.
    pub fn trigger(&mut self) -> Option<RepOutcome> {
        if self.state() != GameState::Playing || self.session_state.paused {
            return None;
        }

        let position = self.session_state.position;
        let acc = accuracy(position);
        if self.session_config.target_window.contains(position) {
            Some(self.register_hit(acc))
        } else {
            Some(self.register_miss(acc, MissReason::OutOfZone))
        }
    }

    /// One animation frame: a tick, then `elapsed` worth of timer progress.
    /// A timer scheduled by this frame's tick starts counting next frame.
    pub fn on_frame(&mut self, elapsed: Duration) -> Option<RepOutcome> {
        let outcome = self.tick();
        if outcome.is_some() {
            return outcome;
        }
        if let Some(handle) = self.timers.advance(elapsed) {
            self.fire(handle);
        }
        None
    }

    /// Deliver an expired timer. Stale handles, and handles whose expected
    /// state no longer holds, are ignored.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        if !self.timers.take(handle) {
            return false;
        }

        let misses = self.session_state.total_misses;
        match (handle.kind(), self.state()) {
            (TimerKind::NextRep, GameState::Hit | GameState::Miss) if misses < MAX_MISSES => {
                self.begin_rep();
                true
            }
            (TimerKind::EndGame, GameState::Miss) if misses >= MAX_MISSES => {
                self.end_game();
                true
            }
            (kind, state) => {
                tracing::debug!(?kind, ?state, "ignoring timer for a state that moved on");
                false
            }
        }
    }

    /// Suspend the rep. While playing, the snapshot is the current position.
    /// During the Hit/Miss banner the snapshot is the next rep's start
    /// (position 0), not the scored position, so resuming does not replay it.
    /// Refused once the final miss has been scored.
    pub fn pause(&mut self) -> bool {
        if !self.state().is_active()
            || self.session_state.paused
            || self.timers.is_pending(TimerKind::EndGame)
        {
            return false;
        }

        self.timers.cancel();
        if self.state() != GameState::Playing {
            self.session_state.state = GameState::Playing;
            self.session_state.position = 0.0;
            self.last_outcome = None;
        }
        self.session_state.paused = true;
        self.session_state.paused_position = self.session_state.position;

        tracing::debug!(position = self.session_state.position, "paused");
        true
    }

    /// Continue from the exact position held at pause time.
    pub fn resume(&mut self) -> bool {
        if !self.session_state.paused {
            return false;
        }

        self.session_state.paused = false;
        self.session_state.position = self.session_state.paused_position;

        tracing::debug!(position = self.session_state.position, "resumed");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.session_state.paused {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Abandon the running workout. Requires the caller's confirmation and
    /// an active session; nothing is recorded.
    pub fn quit(&mut self, confirmed: bool) -> bool {
        if !confirmed || !self.state().is_active() {
            return false;
        }

        tracing::info!(score = self.session_state.score, "workout abandoned");
        self.discard();
        true
    }

    /// Leave the game over screen for the difficulty menu.
    pub fn restart(&mut self) -> bool {
        if self.state() != GameState::GameOver {
            return false;
        }

        self.discard();
        true
    }

    fn discard(&mut self) {
        self.timers.cancel();
        self.session_state = SessionState::default();
        self.last_outcome = None;
        self.finalized = false;
    }

    fn begin_rep(&mut self) {
        self.session_state.state = GameState::Playing;
        self.session_state.position = 0.0;
        self.last_outcome = None;
    }

    fn register_hit(&mut self, accuracy: f64) -> RepOutcome {
        let state = &mut self.session_state;
        let points = points_for(accuracy, state.combo);

        state.score += points;
        state.combo += 1;
        state.best_combo = state.best_combo.max(state.combo);
        state.total_hits += 1;
        state.state = GameState::Hit;

        let outcome = RepOutcome::Hit {
            accuracy,
            points,
            combo: state.combo,
            grade: RepGrade::from_accuracy(accuracy),
        };
        tracing::debug!(
            position = state.position,
            accuracy,
            points,
            combo = state.combo,
            "rep hit"
        );

        self.timers.schedule(TimerKind::NextRep, HIT_RECOVERY);
        self.last_outcome = Some(outcome);
        outcome
    }

    fn register_miss(&mut self, accuracy: f64, reason: MissReason) -> RepOutcome {
        let state = &mut self.session_state;

        state.best_combo = state.best_combo.max(state.combo);
        state.combo = 0;
        state.total_misses += 1;
        state.state = GameState::Miss;

        tracing::debug!(
            position = state.position,
            ?reason,
            misses = state.total_misses,
            "rep missed"
        );

        if state.total_misses >= MAX_MISSES {
            self.timers.schedule(TimerKind::EndGame, GAME_OVER_DELAY);
        } else {
            self.timers.schedule(TimerKind::NextRep, MISS_RECOVERY);
        }

        let outcome = RepOutcome::Miss { accuracy, reason };
        self.last_outcome = Some(outcome);
        outcome
    }

    fn end_game(&mut self) {
        self.timers.cancel();
        self.session_state.state = GameState::GameOver;
        self.last_outcome = None;
        self.finalize();
    }

    /// Settle the finished workout: persist a new high score and hand the
    /// summary to the recorder. Runs once per session; collaborator failures
    /// are logged and do not affect the result.
    fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let score = self.session_state.score;
        if score > self.high_score {
            if let Err(e) = self.high_scores.set(score) {
                tracing::warn!(error = %e, score, "failed to persist high score");
            }
            self.high_score = score;
            self.session_state.new_record = true;
        }

        let summary = self.summary();
        if let Err(e) = self.recorder.record(&summary) {
            tracing::warn!(error = %e, "failed to record workout");
        }

        tracing::info!(
            score,
            hits = summary.hits,
            misses = summary.misses,
            best_combo = summary.best_combo,
            new_record = summary.new_record,
            "workout complete"
        );
    }
}
