use crate::data::{Value, ValueKind};

#[derive(Debug, Clone, PartialEq)]
pub struct SampledValue<'a> {
    pub kind: ValueKind,
    pub representative: &'a Value,
    /// Longest text value in the scan window, in characters. Only set for text samples.
    pub max_text_length: Option<usize>,
}

pub fn sample_column(values: &[Option<Value>], scan_limit: usize) -> Option<SampledValue<'_>> {
    let representative = values.iter().flatten().next()?;
    let kind = representative.kind();
    let max_text_length = match kind {
        ValueKind::Text => Some(max_text_length(values, scan_limit)),
        _ => None,
    };
    Some(SampledValue {
        kind,
        representative,
        max_text_length,
    })
}

/// Character length of the longest text value in the window. Non-text values are ignored.
pub fn max_text_length(values: &[Option<Value>], scan_limit: usize) -> usize {
    let window = if scan_limit == 0 {
        values
    } else {
        &values[..scan_limit.min(values.len())]
    };
    window
        .iter()
        .flatten()
        .filter_map(Value::as_text)
        .map(|text| text.chars().count())
        .max()
        .unwrap_or(0)
}
