//! Column definitions and the ordered [`Schema`] shared by inference and extraction.
//!
//! Both the forward path (tabular data) and the reverse path (catalog
//! metadata) produce the same [`Schema`], so rendering and persistence treat
//! them uniformly. Column order is significant and always mirrors the source.
//! Name uniqueness is the caller's responsibility.
//!
//! Schemas persist as YAML (or JSON for `.json` paths) with one entry per
//! column:
//!
//! ```yaml
//! columns:
//! - name: id
//!   type: BIGINT
//! - name: price
//!   type: DECIMAL(5,2)
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::sql_type::{ColumnSize, SqlType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub sql_type: SqlType,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }

    pub fn size(&self) -> Option<ColumnSize> {
        self.sql_type.size()
    }

    pub fn precision(&self) -> Option<u32> {
        self.sql_type.precision()
    }

    pub fn scale(&self) -> Option<u32> {
        self.sql_type.scale()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnDefinition>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDefinition> {
        self.columns.iter()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing schema to YAML string")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating schema file {path:?}"))?;
        if is_json_path(path) {
            serde_json::to_writer_pretty(file, self).context("Writing schema JSON")
        } else {
            serde_yaml::to_writer(file, self).context("Writing schema YAML")
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema: Schema = if is_json_path(path) {
            serde_json::from_reader(reader).context("Parsing schema JSON")?
        } else {
            serde_yaml::from_reader(reader).context("Parsing schema YAML")?
        };
        ensure!(
            !schema.is_empty(),
            "Schema file {path:?} does not define any columns"
        );
        Ok(schema)
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a ColumnDefinition;
    type IntoIter = std::slice::Iter<'a, ColumnDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl FromIterator<ColumnDefinition> for Schema {
    fn from_iter<I: IntoIterator<Item = ColumnDefinition>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
