use anyhow::{Context, Result, anyhow, ensure};
use itertools::Itertools;

use crate::{
    schema::{ColumnDefinition, Schema},
    sql_type::SqlType,
};

pub fn render_column(column: &ColumnDefinition) -> String {
    format!(" {} {}", column.name, column.sql_type)
}

/// Column list suitable for the body of `CREATE TABLE <name> ( ... )`.
pub fn render_fragment(schema: &Schema) -> String {
    schema.iter().map(render_column).join(",\n")
}

/// Identifiers are emitted verbatim, without quoting or escaping.
pub fn create_table_statement(table: &str, schema: &Schema) -> String {
    format!("CREATE TABLE {table} (\n{}\n)", render_fragment(schema))
}

/// Parses a fragment produced by [`render_fragment`] back into a schema.
pub fn parse_fragment(fragment: &str) -> Result<Schema> {
    let mut columns = Vec::new();
    for (idx, line) in split_top_level(fragment).into_iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, type_token) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| anyhow!("Column definition {} '{line}' is missing a type", idx + 1))?;
        let sql_type: SqlType = type_token
            .trim()
            .parse()
            .with_context(|| format!("Parsing type of column '{name}'"))?;
        columns.push(ColumnDefinition::new(name, sql_type));
    }
    ensure!(!columns.is_empty(), "Column list is empty");
    Ok(Schema::new(columns))
}

/// Splits on commas outside parentheses, so `DECIMAL(5,2)` stays whole.
fn split_top_level(fragment: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (idx, ch) in fragment.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&fragment[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&fragment[start..]);
    parts
}
