use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Credentials must contain exactly 2 elements [username, password], found {found}")]
    CredentialCount { found: usize },
    #[error("Configuration field '{0}' must not be empty")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Permission denied: {0}")]
    Permission(String),
    #[error("Connectivity failure: {0}")]
    Connectivity(String),
    #[error("Connection is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Statement(#[from] StatementError),
    #[error("Table '{0}' does not exist")]
    TableNotFound(String),
}
