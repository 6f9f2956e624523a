use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::session::WorkoutSummary;

pub const TASK_CATEGORY: &str = "other";
pub const TASK_PRIORITY: &str = "medium";
pub const TASK_STATUS: &str = "completed";

/// Receives one summary per finished workout.
pub trait WorkoutRecorder {
    fn record(&mut self, summary: &WorkoutSummary) -> Result<()>;
}

/// A finished workout as stored in the task log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub difficulty: String,
    pub score: u64,
    pub hits: u32,
    pub misses: u32,
    pub best_combo: u32,
    pub created_at: DateTime<Local>,
}

impl TaskRecord {
    pub fn from_summary(summary: &WorkoutSummary, created_at: DateTime<Local>) -> Self {
        Self {
            id: None,
            title: summary.title(),
            description: summary.description(),
            category: TASK_CATEGORY.to_string(),
            priority: TASK_PRIORITY.to_string(),
            status: TASK_STATUS.to_string(),
            difficulty: summary.difficulty.to_string().to_lowercase(),
            score: summary.score,
            hits: summary.hits,
            misses: summary.misses,
            best_combo: summary.best_combo,
            created_at,
        }
    }
}

/// SQLite-backed workout log
#[derive(Debug)]
pub struct TaskLog {
    conn: Connection,
}

impl TaskLog {
    /// Open (or create) the log at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                score INTEGER NOT NULL,
                hits INTEGER NOT NULL,
                misses INTEGER NOT NULL,
                best_combo INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at)",
            [],
        )?;

        Ok(TaskLog { conn })
    }

    pub fn insert(&self, task: &TaskRecord) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO tasks
            (title, description, category, priority, status, difficulty,
             score, hits, misses, best_combo, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                task.title,
                task.description,
                task.category,
                task.priority,
                task.status,
                task.difficulty,
                task.score as i64,
                task.hits,
                task.misses,
                task.best_combo,
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent workouts first.
    pub fn recent(&self, limit: usize) -> Result<Vec<TaskRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, title, description, category, priority, status, difficulty,
                   score, hits, misses, best_combo, created_at
            FROM tasks
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let created_at: String = row.get(11)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        11,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Local);

            Ok(TaskRecord {
                id: Some(row.get(0)?),
                title: row.get(1)?,
                description: row.get(2)?,
                category: row.get(3)?,
                priority: row.get(4)?,
                status: row.get(5)?,
                difficulty: row.get(6)?,
                score: row.get::<_, i64>(7)?.max(0) as u64,
                hits: row.get(8)?,
                misses: row.get(9)?,
                best_combo: row.get(10)?,
                created_at,
            })
        })?;

        let mut tasks = Vec::new();
        for task in rows {
            tasks.push(task?);
        }
        Ok(tasks)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn best_score(&self) -> Result<Option<u64>> {
        let best: Option<i64> = self
            .conn
            .query_row("SELECT MAX(score) FROM tasks", [], |row| row.get(0))?;
        Ok(best.map(|s| s.max(0) as u64))
    }
}

impl WorkoutRecorder for TaskLog {
    fn record(&mut self, summary: &WorkoutSummary) -> Result<()> {
        let id = self.insert(&TaskRecord::from_summary(summary, Local::now()))?;
        tracing::debug!(id, score = summary.score, "workout recorded");
        Ok(())
    }
}

/// Write `tasks` as CSV with a header row.
pub fn write_csv<W: io::Write>(tasks: &[TaskRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for task in tasks {
        wtr.serialize(task)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Recorder that keeps summaries in memory. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    recorded: Arc<Mutex<Vec<WorkoutSummary>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded(&self) -> Vec<WorkoutSummary> {
        self.recorded
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl WorkoutRecorder for MemoryRecorder {
    fn record(&mut self, summary: &WorkoutSummary) -> Result<()> {
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.push(summary.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use chrono::Duration;
    use tempfile::tempdir;

    fn summary(score: u64) -> WorkoutSummary {
        WorkoutSummary {
            difficulty: Difficulty::Hard,
            score,
            hits: 5,
            misses: 3,
            best_combo: 4,
            new_record: false,
        }
    }

    #[test]
    fn record_builds_task_fields() {
        let task = TaskRecord::from_summary(&summary(321), Local::now());
        assert_eq!(task.title, "Rep Challenge - Score: 321");
        assert_eq!(task.description, "Reps: 5, Misses: 3, Best Combo: 4");
        assert_eq!(task.category, "other");
        assert_eq!(task.priority, "medium");
        assert_eq!(task.status, "completed");
        assert_eq!(task.difficulty, "hard");
    }

    #[test]
    fn recorded_workouts_come_back_newest_first() {
        let log = TaskLog::in_memory().unwrap();
        let now = Local::now();
        log.insert(&TaskRecord::from_summary(&summary(100), now - Duration::minutes(5)))
            .unwrap();
        log.insert(&TaskRecord::from_summary(&summary(200), now))
            .unwrap();

        let tasks = log.recent(10).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].score, 200);
        assert_eq!(tasks[1].score, 100);
        assert!(tasks[0].id.is_some());
        assert_eq!(log.count().unwrap(), 2);
        assert_eq!(log.best_score().unwrap(), Some(200));
    }

    #[test]
    fn recent_respects_limit() {
        let mut log = TaskLog::in_memory().unwrap();
        for score in [10, 20, 30] {
            log.record(&summary(score)).unwrap();
        }
        assert_eq!(log.recent(2).unwrap().len(), 2);
    }

    #[test]
    fn empty_log_has_no_best_score() {
        let log = TaskLog::in_memory().unwrap();
        assert_eq!(log.count().unwrap(), 0);
        assert_eq!(log.best_score().unwrap(), None);
    }

    #[test]
    fn log_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("workouts.db");
        {
            let mut log = TaskLog::open(&path).unwrap();
            log.record(&summary(77)).unwrap();
        }
        let log = TaskLog::open(&path).unwrap();
        assert_eq!(log.recent(1).unwrap()[0].score, 77);
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let task = TaskRecord::from_summary(&summary(150), Local::now());
        let mut out = Vec::new();
        write_csv(&[task], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,title,description,category"));
        let row = lines.next().unwrap();
        assert!(row.contains("Rep Challenge - Score: 150"));
        assert!(lines.next().is_none());
    }
}
