//! Layered CLI configuration: `weave.toml`, then `WEAVE__SECTION__KEY`
//! environment overrides, then command-line flags.

use serde::{Deserialize, Serialize};
use weave_graphql::GraphQLConfig;
use weave_schema::AssemblyConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub assembly: AssemblyConfig,
    #[serde(default)]
    pub graphql: GraphQLConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.assembly.validate()?;
        self.graphql.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err("logging.level must not be empty".into());
        }
        Ok(())
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    /// Loads `path` if it exists, applies environment overrides such as
    /// `WEAVE__ASSEMBLY__ROOT=schema` and validates the result.
    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let path = PathBuf::from(path.unwrap_or("weave.toml"));
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(
            Environment::with_prefix("WEAVE")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.assembly.root, PathBuf::from("api/src/graphql"));
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weave.toml");
        fs::write(
            &path,
            r#"
[assembly]
root = "schema"
persistence_schema = "db/schema.prisma"

[graphql]
max_depth = 8
batching = true

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = loader::load_config(path.to_str()).unwrap();
        assert_eq!(config.assembly.root, PathBuf::from("schema"));
        assert_eq!(
            config.assembly.persistence_schema,
            Some(PathBuf::from("db/schema.prisma"))
        );
        assert_eq!(config.assembly.computed_directive, "computed");
        assert_eq!(config.graphql.max_depth, 8);
        assert!(config.graphql.batching);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weave.toml");
        fs::write(&path, "[graphql]\nmax_depth = 0\n").unwrap();
        assert!(loader::load_config(path.to_str()).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = loader::load_config(path.to_str()).unwrap();
        assert_eq!(config.graphql.max_complexity, 500);
    }
}
