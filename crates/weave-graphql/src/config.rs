//! Limits applied when the merged schema is turned into an
//! [`ExecutableSchema`](crate::ExecutableSchema).
//!
//! Read from the `[graphql]` section of `weave.toml`:
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! batching = true
//! max_batch_size = 10
//! ```
//!
//! Depth, complexity and introspection are handed to the async-graphql
//! schema builder. Batching only governs
//! [`ExecutableSchema::execute_batch`](crate::ExecutableSchema::execute_batch);
//! single requests are never affected by it.

use serde::{Deserialize, Serialize};

/// Execution limits for assembled schemas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Deepest selection nesting a request may use. Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Complexity budget per request, one point per selected field.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Whether `__schema` / `__type` queries are answered. Turning this off
    /// hides the merged operations, and so which domains exist, from
    /// clients. Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Accept several requests in one call, each gated and answered on its
    /// own. Default: false
    #[serde(default = "default_batching")]
    pub batching: bool,

    /// Largest batch accepted while `batching` is on. Default: 10
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_batching() -> bool {
    false
}

fn default_max_batch_size() -> usize {
    10
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            batching: default_batching(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl GraphQLConfig {
    /// Largest batch `execute_batch` accepts, `None` when batching is off.
    #[must_use]
    pub fn batch_limit(&self) -> Option<usize> {
        self.batching.then_some(self.max_batch_size)
    }

    /// Checks the limits before a schema is built with them.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending `graphql.*` key.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be at least 1".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be at least 1".into());
        }
        if self.batch_limit() == Some(0) {
            return Err("graphql.max_batch_size must be at least 1 when batching is on".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_batching_off() {
        let config = GraphQLConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert_eq!(config.batch_limit(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_limit_follows_batching_switch() {
        let config = GraphQLConfig {
            batching: true,
            max_batch_size: 4,
            ..GraphQLConfig::default()
        };
        assert_eq!(config.batch_limit(), Some(4));

        let config = GraphQLConfig {
            batching: false,
            max_batch_size: 0,
            ..GraphQLConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = GraphQLConfig {
            max_depth: 0,
            ..GraphQLConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("max_depth"));

        let config = GraphQLConfig {
            batching: true,
            max_batch_size: 0,
            ..GraphQLConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("max_batch_size"));
    }

    #[test]
    fn test_deserialize_graphql_section() {
        let config: GraphQLConfig = toml::from_str(
            r#"
            max_depth = 8
            batching = true
        "#,
        )
        .unwrap();
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.batch_limit(), Some(10));
        assert_eq!(config.max_complexity, 500);
    }
}
