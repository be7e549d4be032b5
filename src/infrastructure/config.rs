//! Configuration management

use crate::pipeline::ConfigError;
use serde::{Deserialize, Serialize};

/// Registry credentials and repository naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry user name
    pub registry_user: String,

    /// Registry access token
    pub registry_token: String,

    /// Full repository override; derived from the user when absent
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub registry_repo_override: Option<String>,
}

impl RegistryConfig {
    /// Creates a config from required credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when either credential is
    /// empty.
    pub fn new(
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let registry_user = user.into();
        let registry_token = token.into();
        if registry_user.is_empty() {
            return Err(ConfigError::MissingField {
                field: "registry_user".to_string(),
            });
        }
        if registry_token.is_empty() {
            return Err(ConfigError::MissingField {
                field: "registry_token".to_string(),
            });
        }
        Ok(Self {
            registry_user,
            registry_token,
            registry_repo_override: None,
        })
    }

    /// Sets the repository override
    #[must_use]
    pub fn with_repo_override(mut self, repo: impl Into<String>) -> Self {
        self.registry_repo_override = Some(repo.into());
        self
    }

    /// Loads the config from `CONVEYOR_REGISTRY_USER`,
    /// `CONVEYOR_REGISTRY_TOKEN` and optional `CONVEYOR_REGISTRY_REPO`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required variable
    /// is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let user = std::env::var("CONVEYOR_REGISTRY_USER").unwrap_or_default();
        let token = std::env::var("CONVEYOR_REGISTRY_TOKEN").unwrap_or_default();
        let mut config = Self::new(user, token)?;
        if let Ok(repo) = std::env::var("CONVEYOR_REGISTRY_REPO")
            && !repo.is_empty()
        {
            config.registry_repo_override = Some(repo);
        }
        Ok(config)
    }

    /// Resolves the target repository: the override when set, otherwise
    /// `<registry_user>/<default_name>`.
    #[must_use]
    pub fn repo(&self, default_name: &str) -> String {
        match &self.registry_repo_override {
            Some(repo) => repo.clone(),
            None => format!("{}/{}", self.registry_user, default_name),
        }
    }
}
