//! The database gateway seam and a file-backed catalog implementation.
//!
//! [`DatabaseGateway`] is the only way the crate touches a database: catalog
//! lookups, statement execution, and transaction/connection lifetime. Driver
//! integrations implement it outside this crate.
//!
//! [`CatalogGateway`] keeps a catalog of tables and their column metadata in
//! memory, optionally persisted as a YAML snapshot. It understands
//! `CREATE TABLE` statements rendered by [`crate::ddl`] and reflects declared
//! column types back as [`TableMetadataRow`]s, which makes it usable both for
//! offline provisioning and as a test double.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::ConnectionConfig,
    ddl,
    error::{ProvisionError, StatementError},
    extract::TableMetadataRow,
};

pub const BASE_TABLE: &str = "BASE TABLE";

pub trait DatabaseGateway {
    /// Names of base tables matching `name` exactly (case-sensitive).
    fn query_catalog_tables(&mut self, name: &str) -> Result<Vec<String>, StatementError>;

    /// Column metadata for `table` in ordinal order. Unknown tables yield no rows.
    fn query_catalog_columns(
        &mut self,
        table: &str,
    ) -> Result<Vec<TableMetadataRow>, StatementError>;

    fn execute(&mut self, sql: &str) -> Result<(), StatementError>;

    fn commit(&mut self) -> Result<(), StatementError>;

    /// Discards uncommitted work. Best effort.
    fn rollback(&mut self) -> Result<(), StatementError> {
        Ok(())
    }

    /// Releases the connection. Calling it more than once is harmless.
    fn close(&mut self);

    fn server_name(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub name: String,
    #[serde(default = "CatalogTable::default_table_type")]
    pub table_type: String,
    pub columns: Vec<TableMetadataRow>,
}

impl CatalogTable {
    pub fn base_table(name: impl Into<String>, columns: Vec<TableMetadataRow>) -> Self {
        Self {
            name: name.into(),
            table_type: BASE_TABLE.to_string(),
            columns,
        }
    }

    fn default_table_type() -> String {
        BASE_TABLE.to_string()
    }

    fn is_base_table(&self) -> bool {
        self.table_type.eq_ignore_ascii_case(BASE_TABLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub tables: Vec<CatalogTable>,
}

impl CatalogSnapshot {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening catalog file {path:?}"))?;
        let reader = BufReader::new(file);
        let snapshot = serde_yaml::from_reader(reader).context("Parsing catalog YAML")?;
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path).with_context(|| format!("Creating catalog file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing catalog YAML")
    }

    pub fn table(&self, name: &str) -> Option<&CatalogTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[derive(Debug)]
pub struct CatalogGateway {
    server_name: String,
    snapshot: CatalogSnapshot,
    path: Option<PathBuf>,
    autocommit: bool,
    staged: Vec<CatalogTable>,
    executed: Vec<String>,
    closed: bool,
}

impl CatalogGateway {
    pub fn in_memory(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            snapshot: CatalogSnapshot::default(),
            path: None,
            autocommit: false,
            staged: Vec::new(),
            executed: Vec::new(),
            closed: false,
        }
    }

    /// Opens the snapshot at `path` as the database named by `config`. A
    /// missing file starts an empty catalog that is written on first commit.
    pub fn connect(config: &ConnectionConfig, path: &Path) -> Result<Self, ProvisionError> {
        config.validate()?;
        let snapshot = if path.exists() {
            CatalogSnapshot::load(path)
                .map_err(|err| StatementError::Connectivity(format!("{err:#}")))?
        } else {
            CatalogSnapshot::default()
        };
        debug!(
            "Connected to catalog {:?} as {:?} on {}",
            path,
            config.username(),
            config.server_name
        );
        Ok(Self {
            server_name: config.server_name.clone(),
            snapshot,
            path: Some(path.to_path_buf()),
            autocommit: config.autocommit,
            staged: Vec::new(),
            executed: Vec::new(),
            closed: false,
        })
    }

    pub fn with_table(mut self, table: CatalogTable) -> Self {
        self.snapshot.tables.push(table);
        self
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    /// Every statement passed to [`DatabaseGateway::execute`], in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), StatementError> {
        if self.closed {
            Err(StatementError::Closed)
        } else {
            Ok(())
        }
    }

    fn table_exists(&self, name: &str) -> bool {
        self.snapshot.table(name).is_some() || self.staged.iter().any(|t| t.name == name)
    }
}

impl DatabaseGateway for CatalogGateway {
    fn query_catalog_tables(&mut self, name: &str) -> Result<Vec<String>, StatementError> {
        self.ensure_open()?;
        Ok(self
            .snapshot
            .tables
            .iter()
            .filter(|t| t.is_base_table() && t.name == name)
            .map(|t| t.name.clone())
            .collect())
    }

    fn query_catalog_columns(
        &mut self,
        table: &str,
    ) -> Result<Vec<TableMetadataRow>, StatementError> {
        self.ensure_open()?;
        Ok(self
            .snapshot
            .table(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    fn execute(&mut self, sql: &str) -> Result<(), StatementError> {
        self.ensure_open()?;
        self.executed.push(sql.to_string());
        let table = parse_create_table(sql)?;
        if self.table_exists(&table.name) {
            return Err(StatementError::Syntax(format!(
                "There is already an object named '{}' in the database",
                table.name
            )));
        }
        self.staged.push(table);
        if self.autocommit {
            self.commit()?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StatementError> {
        self.ensure_open()?;
        if self.staged.is_empty() {
            return Ok(());
        }
        let mut next = self.snapshot.clone();
        next.tables.extend(self.staged.iter().cloned());
        if let Some(path) = &self.path {
            next.save(path)
                .map_err(|err| StatementError::Connectivity(format!("{err:#}")))?;
        }
        self.snapshot = next;
        self.staged.clear();
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StatementError> {
        self.ensure_open()?;
        self.staged.clear();
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            self.staged.clear();
            self.closed = true;
        }
    }

    fn server_name(&self) -> String {
        self.server_name.clone()
    }
}

fn parse_create_table(sql: &str) -> Result<CatalogTable, StatementError> {
    let statement = sql.trim().trim_end_matches(';').trim_end();
    let rest = strip_keyword(statement, "CREATE")
        .and_then(|rest| strip_keyword(rest, "TABLE"))
        .ok_or_else(|| {
            StatementError::Syntax("Only CREATE TABLE statements are supported".to_string())
        })?;
    let open = rest
        .find('(')
        .ok_or_else(|| StatementError::Syntax("CREATE TABLE is missing a column list".to_string()))?;
    if !rest.ends_with(')') {
        return Err(StatementError::Syntax(
            "CREATE TABLE column list is not closed".to_string(),
        ));
    }
    let name = rest[..open].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(StatementError::Syntax(format!(
            "Invalid table name '{name}'"
        )));
    }
    let schema = ddl::parse_fragment(&rest[open + 1..rest.len() - 1])
        .map_err(|err| StatementError::Syntax(format!("{err:#}")))?;
    let columns = schema.iter().map(TableMetadataRow::for_definition).collect();
    Ok(CatalogTable::base_table(name, columns))
}

fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let head = input.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let rest = &input[keyword.len()..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}
