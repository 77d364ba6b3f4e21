//! Assembly configuration.
//!
//! Configuration can be specified in `weave.toml` under the `[assembly]`
//! section.
//!
//! # Example Configuration
//!
//! ```toml
//! [assembly]
//! root = "api/src/graphql"
//! persistence_schema = "api/db/schema.prisma"
//! computed_directive = "computed"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::model::PersistenceSchema;

/// Where fragments live and how they are validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Directory searched recursively for `<domain>.sdl` fragments.
    /// Default: `api/src/graphql`
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Persistence schema (`.prisma`, `.toml` or `.json`) used for naming
    /// validation. Validation is skipped when unset.
    #[serde(default)]
    pub persistence_schema: Option<PathBuf>,

    /// Directive marking derived fields exempt from naming validation.
    /// Default: `computed`
    #[serde(default = "default_computed_directive")]
    pub computed_directive: String,
}

fn default_root() -> PathBuf {
    PathBuf::from("api/src/graphql")
}

fn default_computed_directive() -> String {
    "computed".to_string()
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            persistence_schema: None,
            computed_directive: default_computed_directive(),
        }
    }
}

impl AssemblyConfig {
    /// Config rooted at `root` with every other setting defaulted.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.root.as_os_str().is_empty() {
            return Err("assembly.root must not be empty".into());
        }
        if self.computed_directive.trim().is_empty() {
            return Err("assembly.computed_directive must not be empty".into());
        }
        if self.computed_directive.starts_with('@') {
            return Err("assembly.computed_directive is a bare name, without '@'".into());
        }
        Ok(())
    }

    /// Loads the configured persistence schema, if any.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Discovery`] if the file cannot be loaded.
    pub fn load_persistence(&self) -> Result<Option<PersistenceSchema>, BuildError> {
        self.persistence_schema
            .as_deref()
            .map(PersistenceSchema::load)
            .transpose()
    }
}
