//! TOML schema files.
//!
//! ```toml
//! [[command]]
//! name = "ping"
//!
//! [[command]]
//! name = "config"
//! subcommands = ["set", "view"]
//!
//! [[command]]
//! name = "manage"
//! [command.groups]
//! roles = ["add", "remove"]
//! ```

use super::{CommandKind, CommandSchema, SchemaError};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

/// Errors loading a schema file.
#[derive(Debug, Error)]
pub enum SchemaFileError {
    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse schema: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid schema: {0}")]
    Invalid(#[from] SchemaError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    #[serde(default, rename = "command")]
    commands: Vec<CommandEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandEntry {
    name: String,
    subcommands: Option<BTreeSet<String>>,
    groups: Option<BTreeMap<String, BTreeSet<String>>>,
}

impl CommandEntry {
    fn into_kind(self) -> Result<(String, CommandKind), SchemaError> {
        let kind = match (self.subcommands, self.groups) {
            (None, None) => CommandKind::Leaf,
            (Some(subs), None) => CommandKind::DirectSubcommands(subs),
            (None, Some(groups)) => CommandKind::SubcommandGroups(groups),
            (Some(_), Some(_)) => return Err(SchemaError::AmbiguousShape(self.name)),
        };
        Ok((self.name, kind))
    }
}

impl CommandSchema {
    /// Load a schema from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SchemaFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a schema from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SchemaFileError> {
        let file: SchemaFile = toml::from_str(content)?;
        let entries = file
            .commands
            .into_iter()
            .map(CommandEntry::into_kind)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(entries)?)
    }
}
