use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::{
    data::{
        Column, Dataset, Value, parse_decimal_literal, parse_hex_literal, parse_naive_datetime,
    },
    io_utils,
    sql_type::ElementType,
};

#[derive(Debug, Clone)]
pub struct CsvSourceOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub type_sample_rows: usize,
    /// Keep fractional columns as exact decimals instead of 64-bit floats.
    pub exact_decimals: bool,
}

impl Default for CsvSourceOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: encoding_rs::UTF_8,
            type_sample_rows: 0,
            exact_decimals: false,
        }
    }
}

#[derive(Debug, Clone)]
struct TypeCandidate {
    seen: usize,
    possible_boolean: bool,
    possible_integer: bool,
    possible_float: bool,
    possible_datetime: bool,
    possible_binary: bool,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            seen: 0,
            possible_boolean: true,
            possible_integer: true,
            possible_float: true,
            possible_datetime: true,
            possible_binary: true,
        }
    }

    fn observe(&mut self, value: &str) {
        self.seen += 1;
        if self.possible_boolean
            && !matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "t" | "f" | "yes" | "no" | "y" | "n"
            )
        {
            self.possible_boolean = false;
        }
        if self.possible_integer && value.parse::<i64>().is_err() {
            self.possible_integer = false;
        }
        if self.possible_float && value.parse::<f64>().is_err() {
            self.possible_float = false;
        }
        if self.possible_datetime && parse_naive_datetime(value).is_err() {
            self.possible_datetime = false;
        }
        if self.possible_binary && parse_hex_literal(value).is_err() {
            self.possible_binary = false;
        }
    }

    fn decide(&self, exact_decimals: bool) -> Decision {
        if self.seen == 0 {
            Decision::Element(ElementType::Object)
        } else if self.possible_boolean {
            Decision::Element(ElementType::Bool)
        } else if self.possible_integer {
            Decision::Element(ElementType::Int64)
        } else if self.possible_float {
            if exact_decimals {
                Decision::Decimal
            } else {
                Decision::Element(ElementType::Float64)
            }
        } else if self.possible_datetime {
            Decision::Element(ElementType::DateTime)
        } else if self.possible_binary {
            Decision::Binary
        } else {
            Decision::Element(ElementType::Object)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Element(ElementType),
    Decimal,
    Binary,
}

/// Reads every field as text, decides each column's type from the sampled
/// rows, then converts the column. A column with a value that does not fit
/// falls back to text.
pub fn load_dataset(path: &Path, options: &CsvSourceOptions) -> Result<Dataset> {
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)
        .with_context(|| format!("Reading headers from {path:?}"))?;

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut candidates = vec![TypeCandidate::new(); headers.len()];
    let mut record = csv::ByteRecord::new();
    let mut rows = 0usize;
    while reader
        .read_byte_record(&mut record)
        .with_context(|| format!("Reading row {} from {path:?}", rows + 1))?
    {
        let decoded = io_utils::decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {} from {path:?}", rows + 1))?;
        let sampling = options.type_sample_rows == 0 || rows < options.type_sample_rows;
        for (idx, field) in decoded.into_iter().enumerate() {
            if sampling && !field.is_empty() {
                candidates[idx].observe(&field);
            }
            cells[idx].push(field);
        }
        rows += 1;
    }
    debug!("Read {rows} row(s) across {} column(s)", headers.len());

    let columns = headers
        .into_iter()
        .zip(cells)
        .zip(candidates)
        .map(|((name, raw), candidate)| {
            let decision = candidate.decide(options.exact_decimals);
            debug!("Column '{name}' resolved as {decision:?}");
            build_column(name, decision, raw)
        })
        .collect();
    Ok(Dataset::new(columns))
}

fn build_column(name: String, decision: Decision, raw: Vec<String>) -> Column {
    let parsed: Option<Vec<Option<Value>>> = raw
        .iter()
        .map(|field| parse_field(field, decision))
        .collect();
    match parsed {
        Some(values) => {
            let element_type = match decision {
                Decision::Element(element_type) => element_type,
                Decision::Decimal | Decision::Binary => ElementType::Object,
            };
            Column::new(name, element_type, values)
        }
        // A value past the sampled rows did not fit; keep the column as text.
        None => {
            let values = raw.into_iter().map(text_value).collect();
            Column::new(name, ElementType::Object, values)
        }
    }
}

/// `None` when the field cannot be represented by `decision`.
fn parse_field(field: &str, decision: Decision) -> Option<Option<Value>> {
    if field.is_empty() {
        return Some(None);
    }
    let value = match decision {
        Decision::Element(ElementType::Bool) => {
            let truthy = match field.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" => true,
                "false" | "f" | "no" | "n" => false,
                _ => return None,
            };
            Value::Boolean(truthy)
        }
        Decision::Element(ElementType::Int64 | ElementType::Int32 | ElementType::Int16) => {
            Value::Integer(field.parse().ok()?)
        }
        Decision::Element(ElementType::Float64 | ElementType::Float32) => {
            Value::Float(field.parse().ok()?)
        }
        Decision::Element(ElementType::DateTime) => {
            Value::Timestamp(parse_naive_datetime(field).ok()?)
        }
        Decision::Element(ElementType::Object) => Value::Text(field.to_string()),
        Decision::Decimal => Value::Decimal(parse_decimal_literal(field).ok()?),
        Decision::Binary => Value::Binary(parse_hex_literal(field).ok()?),
    };
    Some(Some(value))
}

fn text_value(field: String) -> Option<Value> {
    if field.is_empty() {
        None
    } else {
        Some(Value::Text(field))
    }
}
