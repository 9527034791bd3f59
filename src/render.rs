// Human and machine readable output for todos

use crate::todo::{Stats, Todo};
use clap::ValueEnum;
use colored::Colorize;
use eyre::{Context, Result};
use serde::Serialize;

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// Render a list of todos, numbered by position
pub fn render_todos(todos: &[Todo], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(todos_text(todos)),
        OutputFormat::Json => to_json(todos),
        OutputFormat::Yaml => to_yaml(todos),
    }
}

pub fn render_todo(todo: &Todo, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(todo_line(None, todo)),
        OutputFormat::Json => to_json(todo),
        OutputFormat::Yaml => to_yaml(todo),
    }
}

pub fn render_stats(stats: &Stats, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "Total: {}\nCompleted: {}\nPending: {}\nCompletion: {:.1}%",
            stats.total, stats.completed, stats.pending, stats.completion_percentage
        )),
        OutputFormat::Json => to_json(stats),
        OutputFormat::Yaml => to_yaml(stats),
    }
}

fn todos_text(todos: &[Todo]) -> String {
    if todos.is_empty() {
        return "No todos found!".to_string();
    }

    todos
        .iter()
        .enumerate()
        .map(|(index, todo)| todo_line(Some(index + 1), todo))
        .collect::<Vec<_>>()
        .join("\n")
}

fn todo_line(position: Option<usize>, todo: &Todo) -> String {
    let marker = if todo.completed { "x" } else { " " };
    let task = if todo.completed {
        todo.task.strikethrough().dimmed().to_string()
    } else {
        todo.task.clone()
    };
    let id = format!("(ID: {})", todo.id).dimmed();

    match position {
        Some(n) => format!("{}. [{}] {} {}", n, marker, task, id),
        None => format!("[{}] {} {}", marker, task, id),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize JSON")
}

fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let yaml = serde_yaml::to_string(value).context("Failed to serialize YAML")?;
    Ok(yaml.trim_end().to_string())
}
