//! Request identity and credential validation.
//!
//! Credential verification itself is external: a [`CredentialValidator`]
//! turns an opaque token into an [`Identity`] or rejects it. The result is
//! stored per request as [`RequestAuth`] and never shared across requests.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub subject: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Identity {
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            roles: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True if the identity holds at least one of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[String]) -> bool {
        roles.iter().any(|r| self.roles.contains(r))
    }
}

/// Outcome of validating a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialCheck {
    Valid(Identity),
    Invalid,
}

/// External capability that verifies credentials.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    async fn validate_credential(&self, token: &str) -> CredentialCheck;
}

/// Validator backed by a fixed token table. Useful for development and
/// tests; production deployments plug in their own validator.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenValidator {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

impl FromIterator<(String, Identity)> for StaticTokenValidator {
    fn from_iter<T: IntoIterator<Item = (String, Identity)>>(iter: T) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl CredentialValidator for StaticTokenValidator {
    async fn validate_credential(&self, token: &str) -> CredentialCheck {
        match self.tokens.get(token) {
            Some(identity) => CredentialCheck::Valid(identity.clone()),
            None => CredentialCheck::Invalid,
        }
    }
}

/// Authentication state of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestAuth {
    /// No verified identity (initial state).
    #[default]
    Unauthenticated,
    Authenticated(Identity),
}

impl RequestAuth {
    /// Resolves the state for a raw credential. A `Bearer ` prefix is
    /// stripped; missing or invalid credentials leave the request
    /// unauthenticated.
    pub async fn from_credential(
        validator: &dyn CredentialValidator,
        credential: Option<&str>,
    ) -> Self {
        let Some(raw) = credential else {
            return Self::Unauthenticated;
        };
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        if token.is_empty() {
            return Self::Unauthenticated;
        }

        match validator.validate_credential(token).await {
            CredentialCheck::Valid(identity) => {
                debug!(subject = %identity.subject, "Credential validated");
                Self::Authenticated(identity)
            }
            CredentialCheck::Invalid => {
                warn!("Invalid credential presented, continuing unauthenticated");
                Self::Unauthenticated
            }
        }
    }

    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Unauthenticated => None,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
