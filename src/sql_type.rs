use std::{fmt, str::FromStr};

use anyhow::{Context, Result, anyhow, bail, ensure};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

pub const DECIMAL_MAX_PRECISION: u32 = 38;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Int64,
    Int32,
    Int16,
    Float64,
    Float32,
    Bool,
    DateTime,
    /// Mixed or string-like storage; the actual kind is decided by sampling.
    Object,
}

impl ElementType {
    pub fn is_object(self) -> bool {
        matches!(self, ElementType::Object)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            ElementType::Int64 => "int64",
            ElementType::Int32 => "int32",
            ElementType::Int16 => "int16",
            ElementType::Float64 => "float64",
            ElementType::Float32 => "float32",
            ElementType::Bool => "bool",
            ElementType::DateTime => "datetime",
            ElementType::Object => "object",
        };
        f.write_str(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnSize {
    Length(u32),
    Max,
}

impl ColumnSize {
    /// Catalogs report an unbounded column as size 0.
    pub fn from_reported(size: u32) -> Self {
        if size == 0 {
            ColumnSize::Max
        } else {
            ColumnSize::Length(size)
        }
    }

    pub fn reported(self) -> u32 {
        match self {
            ColumnSize::Length(size) => size,
            ColumnSize::Max => 0,
        }
    }
}

impl fmt::Display for ColumnSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSize::Length(size) => write!(f, "{size}"),
            ColumnSize::Max => f.write_str("MAX"),
        }
    }
}

impl FromStr for ColumnSize {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let token = value.trim();
        if token.eq_ignore_ascii_case("max") {
            return Ok(ColumnSize::Max);
        }
        let size: u32 = token
            .parse()
            .with_context(|| format!("Parsing column size '{token}'"))?;
        ensure!(size > 0, "Column size must be positive or MAX");
        Ok(ColumnSize::Length(size))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecimalSpec {
    pub precision: u32,
    pub scale: u32,
}

impl DecimalSpec {
    pub fn new(precision: u32, scale: u32) -> Self {
        Self { precision, scale }
    }

    pub fn ensure_valid(&self) -> Result<()> {
        ensure!(self.precision > 0, "Decimal precision must be positive");
        ensure!(
            self.precision <= DECIMAL_MAX_PRECISION,
            "Decimal precision must be <= {}",
            DECIMAL_MAX_PRECISION
        );
        ensure!(
            self.scale <= self.precision,
            "Decimal scale ({}) cannot exceed precision ({})",
            self.scale,
            self.precision
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    BigInt,
    Int,
    SmallInt,
    Float,
    Real,
    Bit,
    Text,
    Varchar(ColumnSize),
    Decimal(DecimalSpec),
    Timestamp,
    Varbinary(ColumnSize),
    /// A catalog type outside the mapped vocabulary, kept by its uppercased name.
    Other(String),
}

/// Fixed mapping from element tags to SQL types. Generic objects fall back to `TEXT`.
pub fn sql_type_for(element_type: ElementType) -> SqlType {
    match element_type {
        ElementType::Int64 => SqlType::BigInt,
        ElementType::Int32 => SqlType::Int,
        ElementType::Int16 => SqlType::SmallInt,
        ElementType::Float64 => SqlType::Float,
        ElementType::Float32 => SqlType::Real,
        ElementType::Bool => SqlType::Bit,
        ElementType::DateTime => SqlType::Timestamp,
        ElementType::Object => SqlType::Text,
    }
}

impl SqlType {
    pub fn name(&self) -> &str {
        match self {
            SqlType::BigInt => "BIGINT",
            SqlType::Int => "INT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Float => "FLOAT",
            SqlType::Real => "REAL",
            SqlType::Bit => "BIT",
            SqlType::Text => "TEXT",
            SqlType::Varchar(_) => "VARCHAR",
            SqlType::Decimal(_) => "DECIMAL",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Varbinary(_) => "VARBINARY",
            SqlType::Other(name) => name,
        }
    }

    pub fn size(&self) -> Option<ColumnSize> {
        match self {
            SqlType::Varchar(size) | SqlType::Varbinary(size) => Some(*size),
            _ => None,
        }
    }

    pub fn decimal_spec(&self) -> Option<DecimalSpec> {
        match self {
            SqlType::Decimal(spec) => Some(*spec),
            _ => None,
        }
    }

    pub fn precision(&self) -> Option<u32> {
        self.decimal_spec().map(|spec| spec.precision)
    }

    pub fn scale(&self) -> Option<u32> {
        self.decimal_spec().map(|spec| spec.scale)
    }

    /// Unparameterized type by uppercased name; unknown names become [`SqlType::Other`].
    pub(crate) fn from_name(name: &str) -> Self {
        match name {
            "BIGINT" => SqlType::BigInt,
            "INT" => SqlType::Int,
            "SMALLINT" => SqlType::SmallInt,
            "FLOAT" => SqlType::Float,
            "REAL" => SqlType::Real,
            "BIT" => SqlType::Bit,
            "TEXT" => SqlType::Text,
            "TIMESTAMP" => SqlType::Timestamp,
            other => SqlType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Varchar(size) | SqlType::Varbinary(size) => {
                write!(f, "{}({size})", self.name())
            }
            SqlType::Decimal(spec) => write!(f, "DECIMAL({},{})", spec.precision, spec.scale),
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for SqlType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        ensure!(!trimmed.is_empty(), "SQL type cannot be empty");
        let (name, args) = match trimmed.find('(') {
            Some(start) => {
                ensure!(
                    trimmed.ends_with(')'),
                    "SQL type '{trimmed}' must close its parameter list with ')'"
                );
                (
                    &trimmed[..start],
                    Some(&trimmed[start + 1..trimmed.len() - 1]),
                )
            }
            None => (trimmed, None),
        };
        let name = name.trim().to_ascii_uppercase();
        ensure!(
            !name.contains(char::is_whitespace),
            "SQL type name '{name}' must be a single token"
        );

        match (name.as_str(), args) {
            ("VARCHAR", Some(args)) => Ok(SqlType::Varchar(args.parse()?)),
            ("VARBINARY", Some(args)) => Ok(SqlType::Varbinary(args.parse()?)),
            ("DECIMAL", Some(args)) => parse_decimal_args(args).map(SqlType::Decimal),
            ("VARCHAR" | "VARBINARY" | "DECIMAL", None) => {
                bail!("SQL type {name} requires parameters, e.g. {name}(...)")
            }
            (_, Some(_)) => Err(anyhow!("SQL type {name} does not accept parameters")),
            (_, None) => Ok(SqlType::from_name(&name)),
        }
    }
}

fn parse_decimal_args(args: &str) -> Result<DecimalSpec> {
    let mut parts = args.split(',').map(str::trim);
    let precision = parts
        .next()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| anyhow!("DECIMAL requires a precision, e.g. DECIMAL(18,4)"))?;
    let precision: u32 = precision
        .parse()
        .with_context(|| format!("Parsing decimal precision '{precision}'"))?;
    let scale: u32 = match parts.next() {
        Some(token) => token
            .parse()
            .with_context(|| format!("Parsing decimal scale '{token}'"))?,
        None => 0,
    };
    ensure!(
        parts.next().is_none(),
        "DECIMAL accepts at most two parameters"
    );
    let spec = DecimalSpec::new(precision, scale);
    spec.ensure_valid()?;
    Ok(spec)
}

impl Serialize for SqlType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SqlType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        SqlType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}
