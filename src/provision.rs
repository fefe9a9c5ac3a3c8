//! Create-if-absent table provisioning over a [`DatabaseGateway`].
//!
//! A [`TableProvisioner`] owns its gateway for its whole lifetime. Each
//! `provision` call moves through `Checking`, then either `Creating` and
//! `Done`, or straight to `AlreadyExists`; any gateway failure ends in
//! `Failed` and is returned unchanged. The connection is released exactly once,
//! when the provisioner is closed or dropped, so several operations can run
//! against the same connection.

use log::debug;

use crate::{
    ddl::create_table_statement,
    error::ProvisionError,
    extract::extract_schema,
    gateway::DatabaseGateway,
    schema::Schema,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Checking,
    Creating,
    Done,
    AlreadyExists,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created,
    AlreadyExists,
}

impl ProvisionOutcome {
    pub fn describe(self) -> &'static str {
        match self {
            ProvisionOutcome::Created => "created",
            ProvisionOutcome::AlreadyExists => "already exists",
        }
    }
}

pub struct TableProvisioner<G: DatabaseGateway> {
    gateway: G,
    state: Option<ProvisionState>,
    released: bool,
}

impl<G: DatabaseGateway> TableProvisioner<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            state: None,
            released: false,
        }
    }

    /// The state reached by the latest `provision` call, `None` before the first.
    pub fn state(&self) -> Option<ProvisionState> {
        self.state
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn server_name(&self) -> String {
        self.gateway.server_name()
    }

    /// Creates `table` from `schema` unless a base table with that exact name exists.
    pub fn provision(
        &mut self,
        table: &str,
        schema: &Schema,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        self.transition(ProvisionState::Checking);
        let result = self.check_and_create(table, schema);
        let terminal = match &result {
            Ok(ProvisionOutcome::Created) => ProvisionState::Done,
            Ok(ProvisionOutcome::AlreadyExists) => ProvisionState::AlreadyExists,
            Err(_) => ProvisionState::Failed,
        };
        self.transition(terminal);
        result
    }

    fn check_and_create(
        &mut self,
        table: &str,
        schema: &Schema,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let existing = self.gateway.query_catalog_tables(table)?;
        if !existing.is_empty() {
            return Ok(ProvisionOutcome::AlreadyExists);
        }

        self.transition(ProvisionState::Creating);
        let statement = create_table_statement(table, schema);
        let created = self
            .gateway
            .execute(&statement)
            .and_then(|()| self.gateway.commit());
        if let Err(err) = created {
            let _ = self.gateway.rollback();
            return Err(err.into());
        }
        Ok(ProvisionOutcome::Created)
    }

    /// Rebuilds the schema of an existing table from catalog metadata.
    pub fn extract_schema(&mut self, table: &str) -> Result<Schema, ProvisionError> {
        if self.gateway.query_catalog_tables(table)?.is_empty() {
            return Err(ProvisionError::TableNotFound(table.to_string()));
        }
        let rows = self.gateway.query_catalog_columns(table)?;
        Ok(extract_schema(&rows))
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.gateway.close();
            self.released = true;
            debug!("Released connection to {}", self.gateway.server_name());
        }
    }

    fn transition(&mut self, next: ProvisionState) {
        debug!("Provisioner state {:?} -> {next:?}", self.state);
        self.state = Some(next);
    }
}

impl<G: DatabaseGateway> Drop for TableProvisioner<G> {
    fn drop(&mut self) {
        self.release();
    }
}
