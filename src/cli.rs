use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer SQL table schemas from tabular data and provision tables",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer a SQL schema from a CSV file and print its DDL
    Infer(InferArgs),
    /// Rebuild a SQL schema from catalog column metadata
    Extract(ExtractArgs),
    /// Create a table in a catalog unless it already exists
    Provision(ProvisionArgs),
}

#[derive(Debug, Args)]
pub struct InferArgs {
    /// Input CSV file to inspect ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Wrap the column list in a CREATE TABLE statement for this table
    #[arg(short = 't', long = "table")]
    pub table: Option<String>,
    /// Also write the inferred schema to this file (.yml/.yaml or .json)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Rows scanned when measuring text length (0 means full scan)
    #[arg(long = "string-scan-limit", default_value_t = 0)]
    pub string_scan_limit: usize,
    /// Rows sampled when deciding column element types (0 means full scan)
    #[arg(long = "sample-rows", default_value_t = 0)]
    pub sample_rows: usize,
    /// Keep fractional numbers as exact decimals (DECIMAL) instead of FLOAT
    #[arg(long = "exact-decimals")]
    pub exact_decimals: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Print a column table instead of DDL
    #[arg(long = "describe")]
    pub describe: bool,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["metadata", "catalog"])
))]
pub struct ExtractArgs {
    /// CSV export of catalog columns (COLUMN_NAME,TYPE_NAME,COLUMN_SIZE,DECIMAL_DIGITS)
    #[arg(short = 'm', long = "metadata")]
    pub metadata: Option<PathBuf>,
    /// Catalog snapshot to read the table from
    #[arg(long = "catalog", requires = "config", requires = "table")]
    pub catalog: Option<PathBuf>,
    /// Connection configuration (YAML) used with --catalog
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Table to extract; with --metadata, wraps output in CREATE TABLE
    #[arg(short = 't', long = "table")]
    pub table: Option<String>,
    /// CSV delimiter for --metadata input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Print a column table instead of DDL
    #[arg(long = "describe")]
    pub describe: bool,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("definition")
        .required(true)
        .args(["input", "schema"])
))]
pub struct ProvisionArgs {
    /// Catalog snapshot standing in for the target database
    #[arg(long = "catalog")]
    pub catalog: PathBuf,
    /// Connection configuration (YAML)
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,
    /// Table to create
    #[arg(short = 't', long = "table")]
    pub table: String,
    /// CSV file to infer the table schema from
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Saved schema file (.yml/.yaml or .json) to create the table from
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,
    /// Rows scanned when measuring text length (0 means full scan)
    #[arg(long = "string-scan-limit", default_value_t = 0)]
    pub string_scan_limit: usize,
    /// Rows sampled when deciding column element types (0 means full scan)
    #[arg(long = "sample-rows", default_value_t = 0)]
    pub sample_rows: usize,
    /// Keep fractional numbers as exact decimals (DECIMAL) instead of FLOAT
    #[arg(long = "exact-decimals")]
    pub exact_decimals: bool,
    /// CSV delimiter character for --input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the --input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
