use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "repzone";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/repzone`, falling back to the platform data dir.
    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            proj_dirs.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn db_path() -> PathBuf {
        Self::state_dir().join("workouts.db")
    }

    pub fn high_score_path() -> PathBuf {
        Self::state_dir().join("highscore.json")
    }

    pub fn log_dir() -> PathBuf {
        Self::state_dir().join("logs")
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", APP_NAME) {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("repzone_config.json")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_files_share_a_directory() {
        let state = AppDirs::state_dir();
        assert_eq!(AppDirs::db_path().parent(), Some(state.as_path()));
        assert_eq!(AppDirs::high_score_path().parent(), Some(state.as_path()));
        assert!(AppDirs::log_dir().starts_with(&state));
    }

    #[test]
    fn config_is_json() {
        assert_eq!(
            AppDirs::config_path().extension().and_then(|e| e.to_str()),
            Some("json")
        );
    }
}
