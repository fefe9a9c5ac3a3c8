//! Connection configuration supplied by the caller.
//!
//! There is no built-in driver or dialect: both come from the configuration
//! file. A typical file looks like:
//!
//! ```yaml
//! server_name: sql01.internal
//! database: analytics
//! credentials: [loader, s3cret]
//! driver:
//!   driver_identifier: "{ODBC Driver 17 for SQL Server}"
//!   dialect_flavor: sql-server
//! ```

use std::{fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

pub const DEFAULT_DATABASE: &str = "master";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialectFlavor {
    SqlServer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    pub driver_identifier: String,
    pub dialect_flavor: DialectFlavor,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub server_name: String,
    #[serde(default = "ConnectionConfig::default_database")]
    pub database: String,
    /// `[username, password]`
    pub credentials: Vec<String>,
    pub driver: DriverConfig,
    #[serde(default)]
    pub autocommit: bool,
}

impl ConnectionConfig {
    pub fn new(
        server_name: impl Into<String>,
        credentials: Vec<String>,
        driver: DriverConfig,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            database: Self::default_database(),
            credentials,
            driver,
            autocommit: false,
        }
    }

    fn default_database() -> String {
        DEFAULT_DATABASE.to_string()
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.credentials.len() != 2 {
            return Err(ConfigurationError::CredentialCount {
                found: self.credentials.len(),
            });
        }
        if self.credentials[0].trim().is_empty() {
            return Err(ConfigurationError::MissingField("credentials.username"));
        }
        if self.server_name.trim().is_empty() {
            return Err(ConfigurationError::MissingField("server_name"));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigurationError::MissingField("database"));
        }
        if self.driver.driver_identifier.trim().is_empty() {
            return Err(ConfigurationError::MissingField("driver.driver_identifier"));
        }
        Ok(())
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.first().map(String::as_str)
    }

    pub fn connection_string(&self) -> Result<String, ConfigurationError> {
        self.validate()?;
        Ok(format!(
            "DRIVER={};SERVER={};DATABASE={};UID={};PWD={};",
            self.driver.driver_identifier,
            self.server_name,
            self.database,
            self.credentials[0],
            self.credentials[1]
        ))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader).context("Parsing connection config YAML")?;
        Ok(config)
    }
}

// Keeps the password out of debug logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_name", &self.server_name)
            .field("database", &self.database)
            .field("username", &self.username())
            .field("driver", &self.driver)
            .field("autocommit", &self.autocommit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> DriverConfig {
        DriverConfig {
            driver_identifier: "{ODBC Driver 17 for SQL Server}".to_string(),
            dialect_flavor: DialectFlavor::SqlServer,
        }
    }

    fn creds(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn connection_string_includes_every_part() {
        let config = ConnectionConfig::new("sql01", creds(&["sa", "pw"]), driver())
            .with_database("analytics");
        assert_eq!(
            config.connection_string().unwrap(),
            "DRIVER={ODBC Driver 17 for SQL Server};SERVER=sql01;DATABASE=analytics;UID=sa;PWD=pw;"
        );
    }

    #[test]
    fn credentials_must_be_a_pair() {
        let config = ConnectionConfig::new("sql01", creds(&["sa"]), driver());
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::CredentialCount { found: 1 })
        );
        let config = ConnectionConfig::new("sql01", creds(&["a", "b", "c"]), driver());
        assert!(config.connection_string().is_err());
    }

    #[test]
    fn empty_server_is_rejected() {
        let config = ConnectionConfig::new(" ", creds(&["sa", "pw"]), driver());
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::MissingField("server_name"))
        );
    }

    #[test]
    fn yaml_defaults_database_and_autocommit() {
        let yaml = "server_name: sql01\ncredentials: [sa, pw]\ndriver:\n  driver_identifier: odbc\n  dialect_flavor: sql-server\n";
        let config: ConnectionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database, DEFAULT_DATABASE);
        assert!(!config.autocommit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_output_hides_password() {
        let config = ConnectionConfig::new("sql01", creds(&["sa", "topsecret"]), driver());
        let rendered = format!("{config:?}");
        assert!(rendered.contains("sa"));
        assert!(!rendered.contains("topsecret"));
    }
}
