// Todo store backed by a single SQLite database file

use crate::error::{Result, TodoError};
use crate::filter::{LOWER_FN, TodoFilter};
use crate::todo::{Stats, Todo, format_timestamp, normalize_task, now_timestamp};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, MAIN_DB, OptionalExtension, Transaction, params};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name used when no database path is given
pub const DEFAULT_DB_FILE: &str = "todos.db";

/// Default database location: `<data_local_dir>/todostore/todos.db`,
/// or `./todos.db` when the platform has no data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("todostore").join(DEFAULT_DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

/// Persistent todo list owning one SQLite connection
///
/// Every mutation runs in its own transaction and is committed before the
/// call returns, so the file on disk always reflects the last completed
/// operation.
pub struct TodoStore {
    path: Option<PathBuf>,
    db: Option<Connection>,
}

impl TodoStore {
    /// Open the database at `path`, creating the file and schema if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let existed = path.exists();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TodoError::init(&path, e))?;
        }

        let db = Connection::open(&path).map_err(|e| TodoError::init(&path, e))?;
        Self::register_functions(&db).map_err(|e| TodoError::init(&path, e))?;
        Self::create_schema(&db).map_err(|e| TodoError::init(&path, e))?;

        // SQLite silently falls back to read-only for write-protected files
        if db.is_readonly(MAIN_DB).map_err(|e| TodoError::init(&path, e))? {
            return Err(TodoError::init(
                &path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "database file is read-only"),
            ));
        }

        if existed {
            info!(path = %path.display(), "Loaded existing todo database");
        } else {
            info!(path = %path.display(), "Created new todo database");
        }

        Ok(Self {
            path: Some(path),
            db: Some(db),
        })
    }

    /// Open a store that lives only in memory
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().map_err(|e| TodoError::init(":memory:", e))?;
        Self::register_functions(&db).map_err(|e| TodoError::init(":memory:", e))?;
        Self::create_schema(&db).map_err(|e| TodoError::init(":memory:", e))?;
        debug!("Opened in-memory todo database");

        Ok(Self { path: None, db: Some(db) })
    }

    /// Path of the backing file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// Unicode-aware lowercasing; SQLite's own `lower()` folds ASCII only
    fn register_functions(db: &Connection) -> rusqlite::Result<()> {
        db.create_scalar_function(
            LOWER_FN,
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let text: Option<String> = ctx.get(0)?;
                Ok(text.map(|t| t.to_lowercase()))
            },
        )
    }

    fn create_schema(db: &Connection) -> rusqlite::Result<()> {
        debug!("Creating todo schema");

        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task TEXT NOT NULL,
                completed INTEGER DEFAULT 0,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP,
                completed_at TEXT,
                updated_at TEXT
            );
            "#,
        )?;

        // Reject an existing todos table that lacks the expected columns
        db.prepare(&format!("SELECT {} FROM todos LIMIT 0", Todo::COLUMNS))?;

        Ok(())
    }

    fn conn(&self) -> Result<&Connection> {
        self.db.as_ref().ok_or(TodoError::Closed)
    }

    fn begin(&mut self) -> Result<Transaction<'_>> {
        let db = self.db.as_mut().ok_or(TodoError::Closed)?;
        db.transaction().map_err(TodoError::write)
    }

    /// Make the mutation in `tx` durable
    fn persist(tx: Transaction<'_>) -> Result<()> {
        tx.commit().map_err(TodoError::write)?;
        debug!("Persisted todo database");
        Ok(())
    }

    fn fetch_one(db: &Connection, id: i64) -> Result<Option<Todo>> {
        let todo = db
            .query_row(
                &format!("SELECT {} FROM todos WHERE id = ?1", Todo::COLUMNS),
                [id],
                Todo::from_row,
            )
            .optional()?;
        Ok(todo)
    }

    fn fetch(&self, filter: &TodoFilter) -> Result<Vec<Todo>> {
        let db = self.conn()?;
        let query = format!("SELECT {} FROM todos{} ORDER BY id ASC", Todo::COLUMNS, filter.to_sql());
        let mut stmt = db.prepare(&query)?;

        let params: Vec<Box<dyn rusqlite::ToSql>> = filter.param().into_iter().collect();
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt.query_map(params_refs.as_slice(), Todo::from_row)?;

        let mut todos = Vec::new();
        for row in rows {
            todos.push(row?);
        }

        debug!(filter = %filter, count = todos.len(), "Fetched todos");
        Ok(todos)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a new pending todo and return it with its assigned id
    pub fn add_todo(&mut self, task: &str) -> Result<Todo> {
        let task = normalize_task(task)?;
        let now = format_timestamp(&now_timestamp());

        let tx = self.begin()?;
        let todo = tx
            .query_row(
                &format!(
                    "INSERT INTO todos (task, completed, created_at) VALUES (?1, 0, ?2) RETURNING {}",
                    Todo::COLUMNS
                ),
                params![task, now],
                Todo::from_row,
            )
            .map_err(TodoError::write)?;
        Self::persist(tx)?;

        info!(id = todo.id, task = %todo.task, "Todo added");
        Ok(todo)
    }

    /// Mark a todo as completed
    ///
    /// Completing an already-completed todo changes nothing and keeps its
    /// original `completed_at`.
    pub fn complete_todo(&mut self, id: i64) -> Result<Todo> {
        let tx = self.begin()?;
        let existing = Self::fetch_one(&tx, id)?.ok_or(TodoError::NotFound(id))?;
        if existing.completed {
            debug!(id, "Todo already completed");
            return Ok(existing);
        }

        let now = format_timestamp(&now_timestamp());
        let todo = tx
            .query_row(
                &format!(
                    "UPDATE todos SET completed = 1, completed_at = ?1, updated_at = ?1 WHERE id = ?2 RETURNING {}",
                    Todo::COLUMNS
                ),
                params![now, id],
                Todo::from_row,
            )
            .map_err(TodoError::write)?;
        Self::persist(tx)?;

        info!(id, "Todo completed");
        Ok(todo)
    }

    /// Mark a completed todo as pending again, clearing `completed_at`
    pub fn reopen_todo(&mut self, id: i64) -> Result<Todo> {
        let tx = self.begin()?;
        let existing = Self::fetch_one(&tx, id)?.ok_or(TodoError::NotFound(id))?;
        if !existing.completed {
            debug!(id, "Todo already pending");
            return Ok(existing);
        }

        let now = format_timestamp(&now_timestamp());
        let todo = tx
            .query_row(
                &format!(
                    "UPDATE todos SET completed = 0, completed_at = NULL, updated_at = ?1 WHERE id = ?2 RETURNING {}",
                    Todo::COLUMNS
                ),
                params![now, id],
                Todo::from_row,
            )
            .map_err(TodoError::write)?;
        Self::persist(tx)?;

        info!(id, "Todo reopened");
        Ok(todo)
    }

    /// Replace the task text of a todo
    pub fn update_todo(&mut self, id: i64, new_task: &str) -> Result<Todo> {
        let task = normalize_task(new_task)?;
        let now = format_timestamp(&now_timestamp());

        let tx = self.begin()?;
        let todo = tx
            .query_row(
                &format!(
                    "UPDATE todos SET task = ?1, updated_at = ?2 WHERE id = ?3 RETURNING {}",
                    Todo::COLUMNS
                ),
                params![task, now, id],
                Todo::from_row,
            )
            .optional()
            .map_err(TodoError::write)?
            .ok_or(TodoError::NotFound(id))?;
        Self::persist(tx)?;

        info!(id, task = %todo.task, "Todo updated");
        Ok(todo)
    }

    /// Permanently remove a todo
    pub fn delete_todo(&mut self, id: i64) -> Result<()> {
        let tx = self.begin()?;
        let removed = tx
            .execute("DELETE FROM todos WHERE id = ?1", [id])
            .map_err(TodoError::write)?;
        if removed == 0 {
            return Err(TodoError::NotFound(id));
        }
        Self::persist(tx)?;

        info!(id, "Todo deleted");
        Ok(())
    }

    /// Remove every completed todo, returning how many were removed
    pub fn clear_completed(&mut self) -> Result<usize> {
        let tx = self.begin()?;
        let removed = tx
            .execute(&format!("DELETE FROM todos{}", TodoFilter::Status(true).to_sql()), [])
            .map_err(TodoError::write)?;
        Self::persist(tx)?;

        info!(removed, "Cleared completed todos");
        Ok(removed)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All todos in ascending id order
    pub fn list_todos(&self) -> Result<Vec<Todo>> {
        self.fetch(&TodoFilter::All)
    }

    pub fn get_todo(&self, id: i64) -> Result<Todo> {
        Self::fetch_one(self.conn()?, id)?.ok_or(TodoError::NotFound(id))
    }

    /// Case-insensitive substring search on task text
    ///
    /// An empty keyword matches nothing.
    pub fn search_todos(&self, keyword: &str) -> Result<Vec<Todo>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            self.conn()?;
            return Ok(Vec::new());
        }
        self.fetch(&TodoFilter::Search(keyword.to_string()))
    }

    pub fn todos_by_status(&self, completed: bool) -> Result<Vec<Todo>> {
        self.fetch(&TodoFilter::Status(completed))
    }

    pub fn stats(&self) -> Result<Stats> {
        let db = self.conn()?;
        let total: i64 = db.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?;
        let completed: i64 = db.query_row(
            &format!("SELECT COUNT(*) FROM todos{}", TodoFilter::Status(true).to_sql()),
            [],
            |row| row.get(0),
        )?;

        Ok(Stats::new(total as u64, completed as u64))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Write a consistent copy of the whole database to `dest`
    ///
    /// The copy is built next to `dest` and renamed into place.
    pub fn export_to<P: AsRef<Path>>(&self, dest: P) -> Result<()> {
        let dest = dest.as_ref();
        let db = self.conn()?;

        if let Some(own) = &self.path {
            let same_file = own == dest
                || matches!(
                    (fs::canonicalize(own), fs::canonicalize(dest)),
                    (Ok(a), Ok(b)) if a == b
                );
            if same_file {
                return Err(TodoError::Validation(
                    "export path must differ from the database path".to_string(),
                ));
            }
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(TodoError::write)?;
        }

        let mut tmp = dest.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if tmp.exists() {
            fs::remove_file(&tmp).map_err(TodoError::write)?;
        }

        let written = db
            .execute("VACUUM INTO ?1", [tmp.to_string_lossy().into_owned()])
            .map_err(TodoError::write)
            .and_then(|_| fs::rename(&tmp, dest).map_err(TodoError::write));
        if let Err(e) = written {
            if tmp.exists() {
                if let Err(cleanup) = fs::remove_file(&tmp) {
                    warn!(path = %tmp.display(), error = %cleanup, "Failed to remove partial export");
                }
            }
            return Err(e);
        }

        info!(dest = %dest.display(), "Exported todo database");
        Ok(())
    }

    /// Release the database handle; calling it again is a no-op
    pub fn close(&mut self) -> Result<()> {
        let Some(db) = self.db.take() else {
            debug!("Todo database already closed");
            return Ok(());
        };

        if let Err((db, e)) = db.close() {
            self.db = Some(db);
            return Err(TodoError::write(e));
        }

        info!("Todo database closed");
        Ok(())
    }
}

impl Drop for TodoStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to close todo database");
        }
    }
}
