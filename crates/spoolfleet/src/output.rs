//! Output rendering: table, JSON, or bare ids.

use clap::ValueEnum;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Table,
    /// Pretty-printed JSON.
    Json,
    /// One id per line, for scripting.
    Ids,
}

/// Render a list of entities in the requested format.
pub fn render_list<T, R>(
    format: OutputFormat,
    items: &[T],
    row: impl Fn(&T) -> R,
    id: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                "(none)".into()
            } else {
                Table::new(items.iter().map(row))
                    .with(Style::sharp())
                    .to_string()
            }
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".into())
        }
        OutputFormat::Ids => items.iter().map(id).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single entity: a detail block for tables, JSON otherwise.
pub fn render_single<T>(
    format: OutputFormat,
    item: &T,
    detail: impl Fn(&T) -> String,
    id: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
{
    match format {
        OutputFormat::Table => detail(item),
        OutputFormat::Json => {
            serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".into())
        }
        OutputFormat::Ids => id(item),
    }
}

/// Print rendered output unless `--quiet` suppressed it.
pub fn print_output(out: &str, quiet: bool) {
    if !quiet && !out.is_empty() {
        println!("{out}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: i64,
        name: String,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item { id: 1, name: "alpha".into() },
            Item { id: 2, name: "beta".into() },
        ]
    }

    #[test]
    fn ids_format_is_one_per_line() {
        let out = render_list(
            OutputFormat::Ids,
            &items(),
            |i| Row { id: i.id, name: i.name.clone() },
            |i| i.id.to_string(),
        );
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn json_format_round_trips() {
        let out = render_list(
            OutputFormat::Json,
            &items(),
            |i| Row { id: i.id, name: i.name.clone() },
            |i| i.id.to_string(),
        );
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[1]["name"], "beta");
    }

    #[test]
    fn empty_table_renders_placeholder() {
        let out = render_list(
            OutputFormat::Table,
            &[] as &[Item],
            |i| Row { id: i.id, name: i.name.clone() },
            |i| i.id.to_string(),
        );
        assert_eq!(out, "(none)");
    }
}
