use std::str::FromStr;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use table_forge::{
    data::{Column, Dataset, Value},
    ddl::render_fragment,
    infer::{InferenceOptions, infer_schema},
    sql_type::{ColumnSize, DecimalSpec, ElementType, SqlType},
};

fn decimal_column(name: &str, literal: &str) -> Column {
    Column::objects(name, [Decimal::from_str(literal).expect("decimal literal")])
}

fn single_type(column: Column) -> SqlType {
    let schema = infer_schema(
        &Dataset::default().with_column(column),
        &InferenceOptions::default(),
    );
    schema.columns[0].sql_type.clone()
}

#[test]
fn mixed_dataset_infers_expected_ddl_in_column_order() {
    let when = NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let dataset = Dataset::new(vec![
        Column::new("id", ElementType::Int64, vec![Some(Value::Integer(1))]),
        Column::new("qty", ElementType::Int32, vec![Some(Value::Integer(2))]),
        Column::new("flag", ElementType::Bool, vec![Some(Value::Boolean(true))]),
        Column::new("ratio", ElementType::Float32, vec![Some(Value::Float(0.5))]),
        Column::objects("name", ["alice"]),
        decimal_column("price", "123.45"),
        Column::objects("payload", [vec![0u8, 1, 2]]),
        Column::objects("seen", [when]),
        Column::new("created", ElementType::DateTime, vec![Some(Value::Timestamp(when))]),
    ]);
    let schema = infer_schema(&dataset, &InferenceOptions::default());
    assert_eq!(
        render_fragment(&schema),
        " id BIGINT,\n qty INT,\n flag BIT,\n ratio REAL,\n name VARCHAR(255),\n \
         price DECIMAL(5,2),\n payload VARBINARY(MAX),\n seen TIMESTAMP,\n created TIMESTAMP"
    );
}

#[test]
fn string_threshold_boundary() {
    assert_eq!(
        single_type(Column::objects("s", ["x".repeat(254)])),
        SqlType::Varchar(ColumnSize::Length(255))
    );
    assert_eq!(
        single_type(Column::objects("s", ["x".repeat(255)])),
        SqlType::Text
    );
}

#[test]
fn varchar_size_is_fixed_regardless_of_length() {
    assert_eq!(
        single_type(Column::objects("s", ["a"])),
        SqlType::Varchar(ColumnSize::Length(255))
    );
}

#[test]
fn decimal_precision_examples() {
    assert_eq!(
        single_type(decimal_column("d", "0.25")),
        SqlType::Decimal(DecimalSpec::new(2, 2))
    );
    assert_eq!(
        single_type(decimal_column("d", "123.45")),
        SqlType::Decimal(DecimalSpec::new(5, 2))
    );
    assert_eq!(
        single_type(decimal_column("d", "100")),
        SqlType::Decimal(DecimalSpec::new(3, 0))
    );
}

#[test]
fn decimal_spec_comes_from_representative_sample_only() {
    let column = Column::objects(
        "d",
        [
            Decimal::from_str("1.5").unwrap(),
            Decimal::from_str("12345.6789").unwrap(),
        ],
    );
    assert_eq!(
        single_type(column),
        SqlType::Decimal(DecimalSpec::new(2, 1))
    );
}

#[test]
fn empty_columns_infer_text_for_every_tag() {
    for tag in [
        ElementType::Int64,
        ElementType::Int32,
        ElementType::Int16,
        ElementType::Float64,
        ElementType::Float32,
        ElementType::Bool,
        ElementType::DateTime,
        ElementType::Object,
    ] {
        assert_eq!(
            single_type(Column::new("e", tag, vec![None, None])),
            SqlType::Text,
            "tag {tag}"
        );
        assert_eq!(single_type(Column::new("e", tag, Vec::new())), SqlType::Text);
    }
}

#[test]
fn binary_sample_ignores_length() {
    let column = Column::new(
        "b",
        ElementType::Object,
        vec![None, Some(Value::Binary(vec![7; 10_000]))],
    );
    assert_eq!(single_type(column), SqlType::Varbinary(ColumnSize::Max));
}

#[test]
fn first_non_null_sample_decides_branch() {
    let column = Column::new(
        "mixed",
        ElementType::Object,
        vec![
            None,
            Some(Value::Text("x".into())),
            Some(Value::Binary(vec![1])),
        ],
    );
    assert_eq!(single_type(column), SqlType::Varchar(ColumnSize::Length(255)));
}

fn text_column_strategy() -> impl Strategy<Value = Vec<Option<String>>> {
    proptest::collection::vec(
        proptest::option::of("[a-zA-Z0-9 éü]{0,300}"),
        0..20,
    )
}

proptest! {
    #[test]
    fn inference_is_deterministic(values in text_column_strategy(), limit in 0usize..5) {
        let column = Column::new(
            "s",
            ElementType::Object,
            values.into_iter().map(|v| v.map(Value::Text)).collect(),
        );
        let dataset = Dataset::default().with_column(column);
        let options = InferenceOptions::default().with_string_scan_limit(limit);
        let first = infer_schema(&dataset, &options);
        let second = infer_schema(&dataset, &options);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn full_scan_matches_longest_value(values in text_column_strategy()) {
        let longest = values
            .iter()
            .flatten()
            .map(|v| v.chars().count())
            .max();
        let column = Column::new(
            "s",
            ElementType::Object,
            values.into_iter().map(|v| v.map(Value::Text)).collect(),
        );
        let inferred = single_type(column);
        let expected = match longest {
            None => SqlType::Text,
            Some(len) if len < 255 => SqlType::Varchar(ColumnSize::Length(255)),
            Some(_) => SqlType::Text,
        };
        prop_assert_eq!(inferred, expected);
    }

    #[test]
    fn decimal_scale_matches_fraction_digits(
        integer in 0u64..1_000_000,
        fraction in proptest::collection::vec(0u8..=9, 0..6),
    ) {
        let mut literal = integer.to_string();
        if !fraction.is_empty() {
            literal.push('.');
            literal.extend(fraction.iter().map(|d| (b'0' + d) as char));
        }
        let spec = match single_type(decimal_column("d", &literal)) {
            SqlType::Decimal(spec) => spec,
            other => panic!("expected DECIMAL, got {other}"),
        };
        prop_assert_eq!(spec.scale as usize, fraction.len());
        let expected_precision = if integer == 0 {
            fraction.len().max(1)
        } else {
            integer.to_string().len() + fraction.len()
        };
        prop_assert_eq!(spec.precision as usize, expected_precision);
    }
}
