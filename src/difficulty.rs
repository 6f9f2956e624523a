use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Position units the indicator moves per tick unit, before normalization.
/// One call to `RepGame::tick` advances by `speed * TICK_UNIT`.
pub const TICK_UNIT: f64 = 0.1;

/// Length of the rep track; reaching it without a trigger is a miss.
pub const TRACK_END: f64 = 100.0;

/// Centre of the track, used as the reference point for accuracy.
pub const TRACK_CENTER: f64 = 50.0;

#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// Closed interval on the track where a trigger counts as a hit ("power zone").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetWindow {
    pub start: f64,
    pub end: f64,
}

impl TargetWindow {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn speed(&self) -> f64 {
        match self {
            Difficulty::Easy => 15.0,
            Difficulty::Medium => 20.0,
            Difficulty::Hard => 30.0,
        }
    }

    pub fn target_window(&self) -> TargetWindow {
        match self {
            Difficulty::Easy => TargetWindow::new(40.0, 60.0),
            Difficulty::Medium => TargetWindow::new(45.0, 55.0),
            Difficulty::Hard => TargetWindow::new(47.0, 53.0),
        }
    }

    /// Position delta applied by a single normalized tick.
    pub fn step(&self) -> f64 {
        self.speed() * TICK_UNIT
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Beginner",
            Difficulty::Medium => "Intermediate",
            Difficulty::Hard => "Advanced",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Hard,
            Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
        }
    }
}
