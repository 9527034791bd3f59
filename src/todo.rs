// Data model for the todo list

use chrono::{NaiveDateTime, Timelike, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Storage format for timestamps, matching SQLite's CURRENT_TIMESTAMP
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single task with completion state and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub task: String,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Todo {
    /// Column list matching [`Todo::from_row`]
    pub(crate) const COLUMNS: &'static str = "id, task, completed, created_at, completed_at, updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let completed: Option<i64> = row.get(2)?;
        Ok(Todo {
            id: row.get(0)?,
            task: row.get(1)?,
            completed: completed.unwrap_or(0) != 0,
            created_at: row.get(3)?,
            completed_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

/// Aggregate counts over the whole list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    pub completion_percentage: f64,
}

impl Stats {
    pub fn new(total: u64, completed: u64) -> Self {
        let completion_percentage = if total == 0 {
            0.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        Stats {
            total,
            completed,
            pending: total.saturating_sub(completed),
            completion_percentage,
        }
    }
}

/// Current UTC time at second precision
pub fn now_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Trim task text, rejecting empty input
pub(crate) fn normalize_task(task: &str) -> crate::Result<String> {
    let trimmed = task.trim();
    if trimmed.is_empty() {
        return Err(crate::TodoError::Validation("task must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_has_no_fraction() {
        let ts = now_timestamp();
        assert_eq!(ts.nanosecond(), 0);
        // After 2020
        assert!(ts.and_utc().timestamp() > 1_600_000_000);
    }

    #[test]
    fn test_format_timestamp() {
        let ts = NaiveDateTime::parse_from_str("2024-03-05 07:08:09", TIMESTAMP_FORMAT).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-05 07:08:09");
    }

    #[test]
    fn test_stats_percentage() {
        let stats = Stats::new(5, 2);
        assert_eq!(stats.pending, 3);
        assert!((stats.completion_percentage - 40.0).abs() < f64::EPSILON);

        let empty = Stats::new(0, 0);
        assert_eq!(empty.pending, 0);
        assert_eq!(empty.completion_percentage, 0.0);
    }

    #[test]
    fn test_normalize_task() {
        assert_eq!(normalize_task("  Buy milk \n").unwrap(), "Buy milk");
        assert!(matches!(normalize_task(""), Err(crate::TodoError::Validation(_))));
        assert!(matches!(normalize_task("   "), Err(crate::TodoError::Validation(_))));
    }

    #[test]
    fn test_todo_serialization() {
        let todo = Todo {
            id: 1,
            task: "Buy milk".to_string(),
            completed: false,
            created_at: NaiveDateTime::parse_from_str("2024-01-01 10:00:00", TIMESTAMP_FORMAT).unwrap(),
            completed_at: None,
            updated_at: None,
        };

        let json = serde_json::to_string(&todo).unwrap();
        assert!(json.contains("\"task\":\"Buy milk\""));
        assert!(json.contains("\"completed_at\":null"));

        let deserialized: Todo = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, todo);
    }
}
