pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repzone::{
    app_dirs::AppDirs,
    celebration::Celebration,
    config::{Config, ConfigStore, FileConfigStore},
    difficulty::Difficulty,
    game::RepGame,
    highscore::{FileHighScoreStore, HighScoreStore},
    runtime::{map_key, Action, CrosstermEventSource, FixedTicker, GameEvent, InputMode, Runner},
    session::GameState,
    tasks::{self, MemoryRecorder, TaskLog, WorkoutRecorder},
};

/// rep challenge: time your reps in the power zone
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal timing game for calisthenics reps. Trigger each rep while the indicator is inside the power zone, build combos, chase your high score, and keep a log of every workout."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// intensity preselected on the menu (defaults to the last one played)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// milliseconds per animation frame
    #[clap(long)]
    frame_rate_ms: Option<u64>,

    /// workout log database
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// high score file
    #[clap(long, global = true)]
    high_score_file: Option<PathBuf>,

    /// config file
    #[clap(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// list recorded workouts, newest first
    History {
        /// number of workouts to show
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// print as csv instead of a table
        #[clap(long)]
        csv: bool,
    },
    /// set the stored high score back to zero
    ResetHighScore,
}

impl Cli {
    fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(AppDirs::db_path)
    }

    fn high_score_store(&self) -> FileHighScoreStore {
        match &self.high_score_file {
            Some(p) => FileHighScoreStore::with_path(p),
            None => FileHighScoreStore::new(),
        }
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(p) => FileConfigStore::with_path(p),
            None => FileConfigStore::new(),
        }
    }

    /// Stored preferences with command line overrides applied.
    fn effective_config(&self, stored: Config) -> Config {
        Config {
            difficulty: self.difficulty.unwrap_or(stored.difficulty),
            frame_rate_ms: self.frame_rate_ms.unwrap_or(stored.frame_rate_ms).max(1),
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub game: RepGame,
    pub selected: Difficulty,
    /// Some while the quit prompt is open; true if opening it paused the rep.
    pub confirm_quit: Option<bool>,
    pub celebration: Celebration,
    config: Config,
    config_store: FileConfigStore,
}

impl App {
    pub fn new(game: RepGame, config: Config, config_store: FileConfigStore) -> Self {
        Self {
            game,
            selected: config.difficulty,
            confirm_quit: None,
            celebration: Celebration::new(),
            config,
            config_store,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.confirm_quit.is_some() {
            return InputMode::ConfirmQuit;
        }
        match self.game.state() {
            GameState::Ready => InputMode::Menu,
            GameState::Playing | GameState::Hit | GameState::Miss => InputMode::Playing,
            GameState::GameOver => InputMode::GameOver,
        }
    }

    /// Advance one frame. `width`/`height` size the celebration.
    pub fn on_tick(&mut self, frame: Duration, width: u16, height: u16) {
        let before = self.game.state();
        self.game.on_frame(frame);

        if before != GameState::GameOver && self.game.state() == GameState::GameOver {
            // a quit prompt left open across the final miss has nothing to quit
            self.confirm_quit = None;
            if self.game.is_new_record() {
                self.celebration.start(width, height);
            }
        }

        self.celebration.update(frame.as_secs_f64());
    }

    /// Apply a player action. Returns false when the app should exit.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::SelectDifficulty(d) => self.selected = d,
            Action::PrevDifficulty => self.selected = self.selected.prev(),
            Action::NextDifficulty => self.selected = self.selected.next(),
            Action::Start => {
                if self.game.start(self.selected) {
                    self.remember_difficulty();
                }
            }
            Action::Trigger => {
                self.game.trigger();
            }
            Action::TogglePause => {
                self.game.toggle_pause();
            }
            Action::RequestQuit => {
                let paused_here = self.game.pause();
                self.confirm_quit = Some(paused_here);
            }
            Action::ConfirmQuit => {
                self.confirm_quit = None;
                self.game.quit(true);
            }
            Action::CancelQuit => {
                if self.confirm_quit.take() == Some(true) {
                    self.game.resume();
                }
            }
            Action::TrainAgain => {
                self.celebration.stop();
                self.game.restart();
            }
            Action::Exit => return false,
        }
        true
    }

    fn remember_difficulty(&mut self) {
        if self.config.difficulty == self.selected {
            return;
        }
        self.config.difficulty = self.selected;
        if let Err(e) = self.config_store.save(&self.config) {
            tracing::warn!(error = %e, "could not save preferences");
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let _log_guard = match setup_logging() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("logging disabled: {e}");
            None
        }
    };

    match &cli.command {
        Some(Command::History { limit, csv }) => return print_history(&cli, *limit, *csv),
        Some(Command::ResetHighScore) => {
            let mut store = cli.high_score_store();
            store.set(0)?;
            tracing::info!(path = %store.path().display(), "high score reset");
            println!("High score reset.");
            return Ok(());
        }
        None => {}
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = cli.config_store();
    let config = cli.effective_config(config_store.load());

    let recorder: Box<dyn WorkoutRecorder> = match TaskLog::open(cli.db_path()) {
        Ok(log) => Box::new(log),
        Err(e) => {
            tracing::warn!(error = %e, "workout log unavailable, results will not be kept");
            Box::new(MemoryRecorder::new())
        }
    };
    let game = RepGame::new(Box::new(cli.high_score_store()), recorder);
    let mut app = App::new(game, config.clone(), config_store);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(config.frame_rate_ms)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        match runner.step() {
            GameEvent::Tick => {
                let size = terminal.size().unwrap_or_default();
                app.on_tick(runner.frame(), size.width, size.height);
            }
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if let Some(action) = map_key(app.input_mode(), key) {
                    if !app.apply(action) {
                        break;
                    }
                }
            }
        }

        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}

fn print_history(cli: &Cli, limit: usize, as_csv: bool) -> Result<(), Box<dyn Error>> {
    let log = TaskLog::open(cli.db_path())?;
    let workouts = log.recent(limit)?;

    if as_csv {
        tasks::write_csv(&workouts, io::stdout().lock())?;
        return Ok(());
    }

    if workouts.is_empty() {
        println!("No workouts recorded yet.");
        return Ok(());
    }

    println!("Recent workouts:");
    println!("{:-<72}", "");
    for w in &workouts {
        println!(
            "{} | {:6} | {:>6} | {}",
            w.created_at.format("%Y-%m-%d %H:%M"),
            w.difficulty,
            w.score,
            w.description
        );
    }
    if let Some(best) = log.best_score()? {
        println!("{:-<72}", "");
        println!("{} workouts logged, best score {}", log.count()?, best);
    }
    Ok(())
}

/// File-only logging: the terminal belongs to the TUI.
fn setup_logging() -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn Error>> {
    let log_dir = AppDirs::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "repzone.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init()?;

    tracing::debug!(dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}
