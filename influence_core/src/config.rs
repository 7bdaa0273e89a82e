//! Service configuration.

use serde::{Deserialize, Serialize};
use sheet_records::RELATIONSHIPS_PATH;

use crate::error::{InfluenceError, Result};

/// How the service reacts to record changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluenceConfig {
    /// Mirror relationship edits onto the named counterparts.
    pub symmetric_sync: bool,

    /// Dotted path of the relationship entries inside a record.
    pub relationships_path: String,

    /// Dotted paths whose change alters a record's candidate names.
    pub name_paths: Vec<String>,
}

impl Default for InfluenceConfig {
    fn default() -> Self {
        Self {
            symmetric_sync: true,
            relationships_path: RELATIONSHIPS_PATH.to_string(),
            name_paths: vec!["name".into(), "realName".into(), "tokenName".into()],
        }
    }
}

impl InfluenceConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the watched paths are usable.
    pub fn validate(&self) -> Result<()> {
        if self.relationships_path.trim().is_empty() {
            return Err(InfluenceError::Config(
                "relationships_path must not be empty".into(),
            ));
        }
        if self.name_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(InfluenceError::Config("name_paths must not contain empty paths".into()));
        }
        Ok(())
    }
}
