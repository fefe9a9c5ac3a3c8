use std::fmt::Write as _;

use crate::schema::Schema;

const HEADERS: [&str; 6] = ["#", "name", "type", "size", "precision", "scale"];

pub fn describe_schema(schema: &Schema) -> String {
    let rows = schema
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            [
                (idx + 1).to_string(),
                column.name.clone(),
                column.sql_type.name().to_string(),
                column.size().map(|s| s.to_string()).unwrap_or_default(),
                column.precision().map(|p| p.to_string()).unwrap_or_default(),
                column.scale().map(|s| s.to_string()).unwrap_or_default(),
            ]
        })
        .collect::<Vec<_>>();
    render_table(&HEADERS.map(String::from), &rows)
}

pub fn render_table<const N: usize>(headers: &[String; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.each_ref().map(|h| display_width(h).max(3));
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let separator = widths.map(|w| "-".repeat(w));
    let _ = writeln!(output, "{}", format_row(&separator, &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row<const N: usize>(values: &[String; N], widths: &[usize; N]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = value.replace(['\n', '\r', '\t'], " ");
            let padding = width.saturating_sub(display_width(&cell));
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}
