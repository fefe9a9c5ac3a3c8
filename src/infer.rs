//! Forward schema inference: a pure, infallible mapping from columns to SQL types.

use rust_decimal::Decimal;

use crate::{
    data::{Column, Dataset, Value, ValueKind},
    sampler::sample_column,
    schema::{ColumnDefinition, Schema},
    sql_type::{ColumnSize, DecimalSpec, SqlType, sql_type_for},
};

/// Text columns whose longest value is below this many characters become `VARCHAR(255)`.
pub const VARCHAR_THRESHOLD: usize = 255;
pub const VARCHAR_SIZE: u32 = 255;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Rows scanned when measuring text length; 0 scans the whole column.
    pub string_scan_limit: usize,
}

impl InferenceOptions {
    pub fn with_string_scan_limit(mut self, limit: usize) -> Self {
        self.string_scan_limit = limit;
        self
    }
}

pub fn infer_schema(dataset: &Dataset, options: &InferenceOptions) -> Schema {
    dataset
        .columns
        .iter()
        .map(|column| infer_column(column, options))
        .collect()
}

pub fn infer_column(column: &Column, options: &InferenceOptions) -> ColumnDefinition {
    ColumnDefinition::new(column.name.clone(), infer_sql_type(column, options))
}

fn infer_sql_type(column: &Column, options: &InferenceOptions) -> SqlType {
    if !column.element_type.is_object() {
        if column.values.iter().all(Option::is_none) {
            return SqlType::Text;
        }
        return sql_type_for(column.element_type);
    }

    let Some(sample) = sample_column(&column.values, options.string_scan_limit) else {
        return SqlType::Text;
    };
    match (sample.kind, sample.representative) {
        (ValueKind::Binary, _) => SqlType::Varbinary(ColumnSize::Max),
        (ValueKind::Text, _) => {
            let longest = sample.max_text_length.unwrap_or(0);
            if longest < VARCHAR_THRESHOLD {
                SqlType::Varchar(ColumnSize::Length(VARCHAR_SIZE))
            } else {
                SqlType::Text
            }
        }
        (ValueKind::Decimal, Value::Decimal(value)) => SqlType::Decimal(decimal_spec_for(value)),
        (ValueKind::Timestamp, _) => SqlType::Timestamp,
        (
            ValueKind::Decimal
            | ValueKind::Integer
            | ValueKind::Float
            | ValueKind::Bool,
            _,
        ) => SqlType::Text,
    }
}

/// Precision and scale for a sampled decimal.
///
/// Scale is the number of fractional digits. When the integer part is zero,
/// precision counts only the fractional digits (`0.25` is `DECIMAL(2,2)`);
/// otherwise it counts every digit (`123.45` is `DECIMAL(5,2)`). Precision is
/// never below 1.
pub fn decimal_spec_for(value: &Decimal) -> DecimalSpec {
    let scale = value.scale();
    let precision = if value.trunc().is_zero() {
        scale
    } else {
        value.mantissa().unsigned_abs().to_string().len() as u32
    };
    DecimalSpec::new(precision.max(1), scale)
}
