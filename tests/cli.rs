mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestWorkspace;
use predicates::prelude::*;
use predicates::str::contains;
use table_forge::{
    gateway::CatalogSnapshot,
    schema::Schema,
    sql_type::{ColumnSize, DecimalSpec, SqlType},
};

const ORDERS_CSV: &str = "\
id,customer,amount,shipped,ordered_at,signature,notes
1,alice,12.50,yes,2024-05-06,0x0AFF,
2,bob,0.75,no,2024-05-07 10:15:00,0x00,
";

#[test]
fn infer_prints_column_fragment() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS_CSV);
    cargo_bin_cmd!("table-forge")
        .args(["infer", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            " id BIGINT,\n customer VARCHAR(255),\n amount FLOAT,\n shipped BIT,\n \
             ordered_at TIMESTAMP,\n signature VARBINARY(MAX),\n notes TEXT\n",
        );
}

#[test]
fn infer_with_table_and_exact_decimals_emits_create_statement() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS_CSV);
    cargo_bin_cmd!("table-forge")
        .args([
            "infer",
            "-i",
            input.to_str().unwrap(),
            "--table",
            "orders",
            "--exact-decimals",
        ])
        .assert()
        .success()
        .stdout(contains("CREATE TABLE orders (\n id BIGINT,"))
        .stdout(contains(" amount DECIMAL(4,2),"));
}

#[test]
fn infer_writes_schema_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS_CSV);
    let output = workspace.path().join("orders-schema.yml");
    cargo_bin_cmd!("table-forge")
        .args([
            "infer",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let schema = Schema::load(&output).expect("load inferred schema");
    assert_eq!(schema.len(), 7);
    assert_eq!(
        schema.column("customer").unwrap().sql_type,
        SqlType::Varchar(ColumnSize::Length(255))
    );
}

#[test]
fn infer_string_scan_limit_can_under_measure() {
    let workspace = TestWorkspace::new();
    let long = "x".repeat(300);
    let input = workspace.write("notes.csv", &format!("note\nshort\n{long}\n"));
    cargo_bin_cmd!("table-forge")
        .args(["infer", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(" note TEXT\n");
    cargo_bin_cmd!("table-forge")
        .args([
            "infer",
            "-i",
            input.to_str().unwrap(),
            "--string-scan-limit",
            "1",
        ])
        .assert()
        .success()
        .stdout(" note VARCHAR(255)\n");
}

#[test]
fn infer_describe_prints_column_table() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS_CSV);
    cargo_bin_cmd!("table-forge")
        .args(["infer", "-i", input.to_str().unwrap(), "--describe"])
        .assert()
        .success()
        .stdout(contains("precision"))
        .stdout(contains("VARBINARY"));
}

#[test]
fn infer_missing_input_fails() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("missing.csv");
    cargo_bin_cmd!("table-forge")
        .args(["infer", "-i", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn extract_from_metadata_export() {
    let workspace = TestWorkspace::new();
    let metadata = workspace.write(
        "columns.csv",
        "COLUMN_NAME,TYPE_NAME,COLUMN_SIZE,DECIMAL_DIGITS\n\
         id,int,10,0\n\
         name,varchar,80,\n\
         price,decimal,9,2\n\
         blob,varbinary,0,\n\
         created,datetime2,27,7\n",
    );
    cargo_bin_cmd!("table-forge")
        .args(["extract", "--metadata", metadata.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            " id INT,\n name VARCHAR(80),\n price DECIMAL(9,2),\n blob VARBINARY(MAX),\n \
             created DATETIME2\n",
        );
}

#[test]
fn provision_creates_then_reports_existing() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS_CSV);
    let config = workspace.write_config();
    let catalog = workspace.path().join("catalog.yml");
    let args = [
        "provision",
        "--catalog",
        catalog.to_str().unwrap(),
        "-c",
        config.to_str().unwrap(),
        "-t",
        "orders",
        "-i",
        input.to_str().unwrap(),
        "--exact-decimals",
    ];

    cargo_bin_cmd!("table-forge")
        .args(args)
        .assert()
        .success()
        .stdout("created\n");
    cargo_bin_cmd!("table-forge")
        .args(args)
        .assert()
        .success()
        .stdout("already exists\n");

    let snapshot = CatalogSnapshot::load(&catalog).expect("load catalog");
    assert_eq!(snapshot.tables.len(), 1);
    let orders = snapshot.table("orders").expect("orders table");
    assert_eq!(orders.columns.len(), 7);
    assert_eq!(orders.columns[2].type_name, "DECIMAL");
    assert_eq!(orders.columns[2].column_size, 4);
    assert_eq!(orders.columns[2].decimal_digits, Some(2));

    cargo_bin_cmd!("table-forge")
        .args([
            "extract",
            "--catalog",
            catalog.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "-t",
            "orders",
        ])
        .assert()
        .success()
        .stdout(contains("CREATE TABLE orders (\n id BIGINT,"))
        .stdout(contains(" amount DECIMAL(4,2),"));
}

#[test]
fn provision_from_saved_schema() {
    let workspace = TestWorkspace::new();
    let schema = Schema::new(vec![table_forge::schema::ColumnDefinition::new(
        "total",
        SqlType::Decimal(DecimalSpec::new(10, 2)),
    )]);
    let schema_path = workspace.path().join("totals.json");
    schema.save(&schema_path).expect("save schema");
    let config = workspace.write_config();
    let catalog = workspace.path().join("catalog.yml");

    cargo_bin_cmd!("table-forge")
        .args([
            "provision",
            "--catalog",
            catalog.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "-t",
            "totals",
            "-s",
            schema_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout("created\n");
}

#[test]
fn provision_rejects_bad_credentials() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", ORDERS_CSV);
    let config = workspace.write(
        "bad.yml",
        "server_name: sql01\ncredentials: [a, b, c]\ndriver:\n  driver_identifier: odbc\n  dialect_flavor: sql-server\n",
    );
    let catalog = workspace.path().join("catalog.yml");
    cargo_bin_cmd!("table-forge")
        .args([
            "provision",
            "--catalog",
            catalog.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "-t",
            "orders",
            "-i",
            input.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("exactly 2 elements").and(contains("found 3")));
    assert!(!catalog.exists());
}

#[test]
fn provision_sample_rows_matches_infer_type_decisions() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("readings.csv", "reading\n1\n2.5\n");
    let config = workspace.write_config();
    let provision = |catalog: &std::path::Path, extra: &[&str]| {
        cargo_bin_cmd!("table-forge")
            .args([
                "provision",
                "--catalog",
                catalog.to_str().unwrap(),
                "-c",
                config.to_str().unwrap(),
                "-t",
                "readings",
                "-i",
                input.to_str().unwrap(),
            ])
            .args(extra)
            .assert()
            .success()
            .stdout("created\n");
        let snapshot = CatalogSnapshot::load(catalog).expect("load catalog");
        snapshot.table("readings").expect("readings table").columns[0]
            .type_name
            .clone()
    };

    let full = workspace.path().join("full.yml");
    assert_eq!(provision(&full, &[]), "FLOAT");
    let sampled = workspace.path().join("sampled.yml");
    assert_eq!(provision(&sampled, &["--sample-rows", "1"]), "VARCHAR");

    cargo_bin_cmd!("table-forge")
        .args(["infer", "-i", input.to_str().unwrap(), "--sample-rows", "1"])
        .assert()
        .success()
        .stdout(" reading VARCHAR(255)\n");
}
