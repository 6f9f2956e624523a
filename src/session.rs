use crate::difficulty::{Difficulty, TargetWindow};

/// Misses allowed before the workout ends.
pub const MAX_MISSES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ready,
    Playing,
    Hit,
    Miss,
    GameOver,
}

impl GameState {
    /// Playing, Hit or Miss: a session exists and can be paused or quit.
    pub fn is_active(&self) -> bool {
        matches!(self, GameState::Playing | GameState::Hit | GameState::Miss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub difficulty: Difficulty,
    pub speed: f64,
    pub target_window: TargetWindow,
}

impl From<Difficulty> for SessionConfig {
    fn from(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            speed: difficulty.speed(),
            target_window: difficulty.target_window(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Difficulty::default().into()
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub state: GameState,
    pub position: f64,
    pub paused: bool,
    pub paused_position: f64,
    // Scoring
    pub score: u64,
    pub combo: u32,
    pub best_combo: u32,
    pub total_hits: u32,
    pub total_misses: u32,
    // Set once at game over
    pub new_record: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            state: GameState::Ready,
            position: 0.0,
            paused: false,
            paused_position: 0.0,
            score: 0,
            combo: 0,
            best_combo: 0,
            total_hits: 0,
            total_misses: 0,
            new_record: false,
        }
    }
}

/// Final numbers of a finished workout, handed to the task recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutSummary {
    pub difficulty: Difficulty,
    pub score: u64,
    pub hits: u32,
    pub misses: u32,
    pub best_combo: u32,
    pub new_record: bool,
}

impl WorkoutSummary {
    pub fn from_state(difficulty: Difficulty, state: &SessionState) -> Self {
        Self {
            difficulty,
            score: state.score,
            hits: state.total_hits,
            misses: state.total_misses,
            best_combo: state.best_combo,
            new_record: state.new_record,
        }
    }

    pub fn title(&self) -> String {
        format!("Rep Challenge - Score: {}", self.score)
    }

    pub fn description(&self) -> String {
        format!(
            "Reps: {}, Misses: {}, Best Combo: {}",
            self.hits, self.misses, self.best_combo
        )
    }

    /// Share of attempts that were hits, as a rounded percentage.
    pub fn hit_rate(&self) -> u32 {
        if self.hits == 0 {
            return 0;
        }
        let attempts = (self.hits + self.misses) as f64;
        ((self.hits as f64 / attempts) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(hits: u32, misses: u32) -> WorkoutSummary {
        WorkoutSummary {
            difficulty: Difficulty::Medium,
            score: 420,
            hits,
            misses,
            best_combo: 4,
            new_record: false,
        }
    }

    #[test]
    fn test_summary_text() {
        let s = summary(7, 3);
        assert_eq!(s.title(), "Rep Challenge - Score: 420");
        assert_eq!(s.description(), "Reps: 7, Misses: 3, Best Combo: 4");
    }

    #[test]
    fn test_hit_rate() {
        assert_eq!(summary(7, 3).hit_rate(), 70);
        assert_eq!(summary(1, 2).hit_rate(), 33);
        assert_eq!(summary(2, 1).hit_rate(), 67);
        assert_eq!(summary(0, 3).hit_rate(), 0);
    }

    #[test]
    fn test_session_config_from_difficulty() {
        let cfg = SessionConfig::from(Difficulty::Hard);
        assert_eq!(cfg.speed, 30.0);
        assert_eq!(cfg.target_window, TargetWindow::new(47.0, 53.0));
        assert_eq!(SessionConfig::default().difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_active_states() {
        assert!(!GameState::Ready.is_active());
        assert!(GameState::Playing.is_active());
        assert!(GameState::Hit.is_active());
        assert!(GameState::Miss.is_active());
        assert!(!GameState::GameOver.is_active());
    }
}
