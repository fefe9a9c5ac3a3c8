//! Reverse schema extraction from catalog column metadata.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    io_utils,
    schema::{ColumnDefinition, Schema},
    sql_type::{ColumnSize, DECIMAL_MAX_PRECISION, DecimalSpec, SqlType},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TableMetadataRow {
    pub column_name: String,
    pub type_name: String,
    #[serde(default)]
    pub column_size: u32,
    #[serde(default)]
    pub decimal_digits: Option<u32>,
}

impl TableMetadataRow {
    pub fn new(
        column_name: impl Into<String>,
        type_name: impl Into<String>,
        column_size: u32,
        decimal_digits: Option<u32>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            type_name: type_name.into(),
            column_size,
            decimal_digits,
        }
    }

    /// The row a catalog reports for a declared column.
    pub fn for_definition(definition: &ColumnDefinition) -> Self {
        let sql_type = &definition.sql_type;
        let column_size = match sql_type {
            SqlType::Varchar(size) | SqlType::Varbinary(size) => size.reported(),
            SqlType::Decimal(spec) => spec.precision,
            _ => 0,
        };
        Self::new(
            definition.name.clone(),
            sql_type.name(),
            column_size,
            sql_type.scale(),
        )
    }
}

pub fn extract_schema(rows: &[TableMetadataRow]) -> Schema {
    rows.iter().map(extract_column).collect()
}

pub fn extract_column(row: &TableMetadataRow) -> ColumnDefinition {
    let type_name = row.type_name.trim().to_ascii_uppercase();
    let sql_type = match type_name.as_str() {
        "VARCHAR" => SqlType::Varchar(ColumnSize::from_reported(row.column_size)),
        "DECIMAL" => SqlType::Decimal(reported_decimal_spec(row)),
        "VARBINARY" => SqlType::Varbinary(ColumnSize::from_reported(row.column_size)),
        other => SqlType::from_name(other),
    };
    ColumnDefinition::new(row.column_name.clone(), sql_type)
}

/// Reported precision is kept within `1..=38` and never below the scale, so
/// the result always renders as valid `DECIMAL(p,s)`.
fn reported_decimal_spec(row: &TableMetadataRow) -> DecimalSpec {
    let scale = row.decimal_digits.unwrap_or(0).min(DECIMAL_MAX_PRECISION);
    let precision = row
        .column_size
        .max(scale)
        .clamp(1, DECIMAL_MAX_PRECISION);
    DecimalSpec::new(precision, scale)
}

/// Reads catalog metadata exported as CSV with
/// `COLUMN_NAME,TYPE_NAME,COLUMN_SIZE,DECIMAL_DIGITS` headers, in column order.
pub fn load_metadata_csv(path: &Path, delimiter: Option<u8>) -> Result<Vec<TableMetadataRow>> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<TableMetadataRow>().enumerate() {
        let row = record.with_context(|| {
            format!("Reading metadata row {} from {path:?}", idx + 1)
        })?;
        rows.push(row);
    }
    Ok(rows)
}
