pub mod cli;
pub mod config;
pub mod csv_source;
pub mod data;
pub mod ddl;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod infer;
pub mod io_utils;
pub mod provision;
pub mod sampler;
pub mod schema;
pub mod sql_type;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands},
    config::ConnectionConfig,
    csv_source::CsvSourceOptions,
    gateway::{CatalogGateway, DatabaseGateway},
    infer::InferenceOptions,
    provision::TableProvisioner,
    schema::Schema,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table_forge", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Infer(args) => handle_infer(&args),
        Commands::Extract(args) => handle_extract(&args),
        Commands::Provision(args) => handle_provision(&args),
    }
}

fn handle_infer(args: &cli::InferArgs) -> Result<()> {
    info!(
        "Inferring schema from '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(
            &args.input,
            args.delimiter
        ))
    );
    let source = CsvSourceOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        type_sample_rows: args.sample_rows,
        exact_decimals: args.exact_decimals,
    };
    let dataset = csv_source::load_dataset(&args.input, &source)
        .with_context(|| format!("Loading tabular data from {:?}", args.input))?;
    let options = InferenceOptions::default().with_string_scan_limit(args.string_scan_limit);
    let schema = infer::infer_schema(&dataset, &options);
    info!(
        "Inferred {} column(s) from {} row(s)",
        schema.len(),
        dataset.row_count()
    );

    if let Some(path) = &args.output {
        schema
            .save(path)
            .with_context(|| format!("Writing schema to {path:?}"))?;
        info!("Schema written to {path:?}");
    }
    emit_schema(&schema, args.table.as_deref(), args.describe);
    Ok(())
}

fn handle_extract(args: &cli::ExtractArgs) -> Result<()> {
    let schema = match (&args.metadata, &args.catalog) {
        (Some(metadata), _) => {
            info!("Extracting schema from metadata export {metadata:?}");
            let rows = extract::load_metadata_csv(metadata, args.delimiter)
                .with_context(|| format!("Loading catalog metadata from {metadata:?}"))?;
            extract::extract_schema(&rows)
        }
        (None, Some(catalog)) => {
            let (Some(config_path), Some(table)) = (&args.config, &args.table) else {
                bail!("--catalog requires both --config and --table");
            };
            let mut provisioner = open_provisioner(config_path, catalog)?;
            info!(
                "Extracting schema of '{table}' from {}",
                provisioner.server_name()
            );
            provisioner
                .extract_schema(table)
                .with_context(|| format!("Extracting schema of table '{table}'"))?
        }
        (None, None) => bail!("Provide either --metadata or --catalog"),
    };
    info!("Extracted {} column(s)", schema.len());
    emit_schema(&schema, args.table.as_deref(), args.describe);
    Ok(())
}

fn handle_provision(args: &cli::ProvisionArgs) -> Result<()> {
    let schema = match (&args.input, &args.schema) {
        (_, Some(path)) => {
            Schema::load(path).with_context(|| format!("Loading schema from {path:?}"))?
        }
        (Some(input), None) => {
            let source = CsvSourceOptions {
                delimiter: args.delimiter,
                encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
                type_sample_rows: args.sample_rows,
                exact_decimals: args.exact_decimals,
            };
            let dataset = csv_source::load_dataset(input, &source)
                .with_context(|| format!("Loading tabular data from {input:?}"))?;
            let options =
                InferenceOptions::default().with_string_scan_limit(args.string_scan_limit);
            infer::infer_schema(&dataset, &options)
        }
        (None, None) => bail!("Provide either --input or --schema"),
    };
    debug!("Provisioning with schema:\n{}", ddl::render_fragment(&schema));

    let mut provisioner = open_provisioner(&args.config, &args.catalog)?;
    let server = provisioner.server_name();
    let outcome = provisioner
        .provision(&args.table, &schema)
        .with_context(|| format!("Provisioning table '{}' on {server}", args.table))?;
    provisioner.close();
    info!("Table '{}' {} in {server}", args.table, outcome.describe());
    println!("{}", outcome.describe());
    Ok(())
}

fn open_provisioner(
    config_path: &std::path::Path,
    catalog: &std::path::Path,
) -> Result<TableProvisioner<CatalogGateway>> {
    let config = ConnectionConfig::load(config_path)
        .with_context(|| format!("Loading connection config from {config_path:?}"))?;
    let gateway = CatalogGateway::connect(&config, catalog)
        .with_context(|| format!("Connecting to catalog {catalog:?}"))?;
    info!("Connected to server: {}", gateway.server_name());
    Ok(TableProvisioner::new(gateway))
}

fn emit_schema(schema: &Schema, table: Option<&str>, describe: bool) {
    if describe {
        print!("{}", table::describe_schema(schema));
    } else if let Some(table) = table {
        println!("{}", ddl::create_table_statement(table, schema));
    } else {
        println!("{}", ddl::render_fragment(schema));
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
