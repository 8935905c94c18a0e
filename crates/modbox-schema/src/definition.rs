use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read mod definition: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse mod definition: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("mod name must not be empty")]
    EmptyName,
    #[error("mod category must not be empty")]
    EmptyCategory,
    #[error("mod '{id}' declares category '{declared}' but lives under '{path}'")]
    CategoryMismatch {
        id: String,
        declared: String,
        path: String,
    },
    #[error("os mod '{0}' must declare base_image")]
    MissingBaseImage(String),
    #[error("mod '{id}' has an empty environment variable name")]
    EmptyEnvName { id: String },
}

/// A mod document as written on disk.
///
/// Unknown keys are ignored so newer documents stay loadable by older binaries.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ModDefinition {
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

pub fn parse_definition_str(input: &str) -> Result<ModDefinition, DefinitionError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_definition_file(path: impl AsRef<Path>) -> Result<ModDefinition, DefinitionError> {
    let content = fs::read_to_string(path)?;
    parse_definition_str(&content)
}
