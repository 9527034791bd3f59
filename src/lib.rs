// todostore - single-user todo list persisted in SQLite

pub mod error;
pub mod filter;
pub mod render;
pub mod store;
pub mod todo;

// Re-export main types for convenience
pub use error::{Result, TodoError};
pub use filter::TodoFilter;
pub use render::OutputFormat;
pub use store::{DEFAULT_DB_FILE, TodoStore, default_db_path};
pub use todo::{Stats, Todo, now_timestamp};
