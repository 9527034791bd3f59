// Query selection for todo listings

/// SQL function registered by the store for Unicode-aware lowercasing
pub(crate) const LOWER_FN: &str = "unicode_lower";

/// Which todos a listing should return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoFilter {
    /// Every todo
    All,
    /// Todos whose completion flag equals the value
    Status(bool),
    /// Case-insensitive substring match on the task text
    Search(String),
}

impl TodoFilter {
    /// WHERE clause for this filter, using `?1` for its parameter
    pub(crate) fn to_sql(&self) -> &'static str {
        match self {
            TodoFilter::All => "",
            TodoFilter::Status(true) => " WHERE COALESCE(completed, 0) != 0",
            TodoFilter::Status(false) => " WHERE COALESCE(completed, 0) = 0",
            TodoFilter::Search(_) => " WHERE unicode_lower(task) LIKE ?1 ESCAPE '\\'",
        }
    }

    /// Bound parameter for [`TodoFilter::to_sql`], if any
    pub(crate) fn param(&self) -> Option<Box<dyn rusqlite::ToSql>> {
        match self {
            TodoFilter::All | TodoFilter::Status(_) => None,
            TodoFilter::Search(keyword) => Some(Box::new(format!("%{}%", escape_like(&keyword.to_lowercase())))),
        }
    }
}

impl std::fmt::Display for TodoFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TodoFilter::All => write!(f, "all"),
            TodoFilter::Status(true) => write!(f, "completed"),
            TodoFilter::Status(false) => write!(f, "pending"),
            TodoFilter::Search(keyword) => write!(f, "search({})", keyword),
        }
    }
}

// LIKE wildcards in user input match literally
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
