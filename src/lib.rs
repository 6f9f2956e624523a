// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod game;
pub mod highscore;
pub mod runtime;
pub mod session;
pub mod tasks;
pub mod timer;

pub use error::{Error, Result};
