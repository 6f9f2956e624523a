use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::difficulty::Difficulty;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                // Windows reports releases too; only presses drive the game.
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => GameEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => GameEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "terminal input closed");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks are due once per interval even while input keeps arriving, so a
/// player mashing keys cannot stall the indicator.
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    last_tick: Cell<Instant>,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            last_tick: Cell::new(Instant::now()),
        }
    }

    /// Nominal time covered by one Tick.
    pub fn frame(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks until the next event, or returns Tick when the interval is up
    pub fn step(&self) -> GameEvent {
        let interval = self.ticker.interval();
        let since = self.last_tick.get().elapsed();
        if since >= interval {
            return self.tick();
        }

        let remaining = interval - since;
        match self.event_source.recv_timeout(remaining) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.tick(),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(remaining);
                self.tick()
            }
        }
    }

    fn tick(&self) -> GameEvent {
        self.last_tick.set(Instant::now());
        GameEvent::Tick
    }
}

/// Which key bindings are live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Menu,
    Playing,
    ConfirmQuit,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Trigger,
    TogglePause,
    RequestQuit,
    ConfirmQuit,
    CancelQuit,
    SelectDifficulty(Difficulty),
    PrevDifficulty,
    NextDifficulty,
    Start,
    TrainAgain,
    Exit,
}

/// Translate a key press into a game action for the current mode.
pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Exit);
    }

    match mode {
        InputMode::Menu => match key.code {
            KeyCode::Char('1') => Some(Action::SelectDifficulty(Difficulty::Easy)),
            KeyCode::Char('2') => Some(Action::SelectDifficulty(Difficulty::Medium)),
            KeyCode::Char('3') => Some(Action::SelectDifficulty(Difficulty::Hard)),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::PrevDifficulty),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::NextDifficulty),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Start),
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Exit),
            _ => None,
        },
        InputMode::Playing => match key.code {
            KeyCode::Char(' ') => Some(Action::Trigger),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::TogglePause),
            KeyCode::Esc => Some(Action::RequestQuit),
            _ => None,
        },
        InputMode::ConfirmQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ConfirmQuit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::CancelQuit),
            _ => None,
        },
        InputMode::GameOver => match key.code {
            KeyCode::Char('r') | KeyCode::Enter => Some(Action::TrainAgain),
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::Exit),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            GameEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(50));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            GameEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn step_ticks_even_with_queued_input() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..1000 {
            tx.send(GameEvent::Key(key(KeyCode::Char(' ')))).unwrap();
        }
        let es = TestEventSource::new(rx);
        let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(5)));

        std::thread::sleep(Duration::from_millis(10));
        match runner.step() {
            GameEvent::Tick => {}
            _ => panic!("overdue tick should win over queued keys"),
        }
    }

    #[test]
    fn step_ticks_when_source_disconnected() {
        let (tx, rx) = mpsc::channel::<GameEvent>();
        drop(tx);
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(2)),
        );
        assert!(matches!(runner.step(), GameEvent::Tick));
    }

    #[test]
    fn menu_keys() {
        assert_eq!(
            map_key(InputMode::Menu, key(KeyCode::Char('3'))),
            Some(Action::SelectDifficulty(Difficulty::Hard))
        );
        assert_eq!(
            map_key(InputMode::Menu, key(KeyCode::Left)),
            Some(Action::PrevDifficulty)
        );
        assert_eq!(
            map_key(InputMode::Menu, key(KeyCode::Enter)),
            Some(Action::Start)
        );
        assert_eq!(map_key(InputMode::Menu, key(KeyCode::Esc)), Some(Action::Exit));
    }

    #[test]
    fn playing_keys() {
        assert_eq!(
            map_key(InputMode::Playing, key(KeyCode::Char(' '))),
            Some(Action::Trigger)
        );
        assert_eq!(
            map_key(InputMode::Playing, key(KeyCode::Char('p'))),
            Some(Action::TogglePause)
        );
        assert_eq!(
            map_key(InputMode::Playing, key(KeyCode::Esc)),
            Some(Action::RequestQuit)
        );
        assert_eq!(map_key(InputMode::Playing, key(KeyCode::Char('q'))), None);
    }

    #[test]
    fn quit_needs_explicit_yes() {
        assert_eq!(
            map_key(InputMode::ConfirmQuit, key(KeyCode::Char('y'))),
            Some(Action::ConfirmQuit)
        );
        assert_eq!(
            map_key(InputMode::ConfirmQuit, key(KeyCode::Esc)),
            Some(Action::CancelQuit)
        );
        assert_eq!(map_key(InputMode::ConfirmQuit, key(KeyCode::Char(' '))), None);
    }

    #[test]
    fn ctrl_c_exits_everywhere() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for mode in [
            InputMode::Menu,
            InputMode::Playing,
            InputMode::ConfirmQuit,
            InputMode::GameOver,
        ] {
            assert_eq!(map_key(mode, ctrl_c), Some(Action::Exit));
        }
    }
}
