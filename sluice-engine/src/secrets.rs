//! Secret resolution for task bodies
//!
//! Tasks declare the secrets they need by reference (a path such as
//! `github/token`). In the orchestrator the reference is interpolated into the
//! task params as `((github/token))`; when running the same task anywhere
//! the engine resolves it through a [`SecretManager`].
//!
//! Strategies:
//! - [`EnvSecretManager`]: environment variable named after the last path segment
//! - [`VaultSecretManager`]: `vault read -field=value <reference>`
//! - [`StaticSecretManager`]: fixed in-memory values
//!
//! The pipeline wraps the selected strategy in a [`NamespacedSecretManager`] so
//! references are looked up below `/concourse/<team>/`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// A secret a task declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    reference: String,
    optional: bool,
}

impl Secret {
    /// A secret the task cannot run without
    pub fn required(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            optional: false,
        }
    }

    /// A secret that resolves to an empty string when it is not available
    pub fn optional(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            optional: true,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Trait for resolving secret references
///
/// Implementations must be Send + Sync; task bodies may be invoked from
/// inside other task bodies that captured a task handle.
pub trait SecretManager: Send + Sync {
    /// Looks up a secret.
    ///
    /// # Returns
    /// `Ok(None)` when the backend has no value for the reference, an error
    /// when the backend itself failed.
    fn resolve(&self, reference: &str) -> Result<Option<String>>;
}

/// Reads secrets from environment variables
///
/// Only the last path segment is used: `/concourse/main/github/token` is
/// read from `$token`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretManager;

impl SecretManager for EnvSecretManager {
    fn resolve(&self, reference: &str) -> Result<Option<String>> {
        let key = reference.rsplit('/').next().unwrap_or(reference);
        debug!("Resolving secret '{}' from environment variable '{}'", reference, key);
        Ok(std::env::var(key).ok())
    }
}

/// Reads secrets with the vault CLI
#[derive(Debug, Clone)]
pub struct VaultSecretManager {
    program: String,
}

impl VaultSecretManager {
    pub fn new() -> Self {
        Self::with_program("vault")
    }

    /// Uses a different executable (wrapper script, absolute path)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for VaultSecretManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretManager for VaultSecretManager {
    fn resolve(&self, reference: &str) -> Result<Option<String>> {
        debug!("Resolving secret '{}' from vault", reference);
        let value = sluice_core::capture(&self.program, &["read", "-field=value", reference], None)
            .map_err(|source| PipelineError::SecretBackend {
                reference: reference.to_string(),
                source,
            })?;
        Ok(Some(value))
    }
}

/// Fixed secret values, keyed by the full reference
#[derive(Debug, Clone, Default)]
pub struct StaticSecretManager {
    values: HashMap<String, String>,
}

impl StaticSecretManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reference: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(reference.into(), value.into());
        self
    }
}

impl SecretManager for StaticSecretManager {
    fn resolve(&self, reference: &str) -> Result<Option<String>> {
        Ok(self.values.get(reference).cloned())
    }
}

/// Scopes references to a team: `token` becomes `/concourse/<team>/token`
///
/// Absolute references are passed through unchanged.
#[derive(Clone)]
pub struct NamespacedSecretManager {
    team: String,
    inner: Arc<dyn SecretManager>,
}

impl NamespacedSecretManager {
    pub fn new(team: impl Into<String>, inner: Arc<dyn SecretManager>) -> Self {
        Self {
            team: team.into(),
            inner,
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn scoped_reference(&self, reference: &str) -> String {
        if reference.starts_with('/') {
            reference.to_string()
        } else {
            format!("/concourse/{}/{}", self.team, reference)
        }
    }
}

impl SecretManager for NamespacedSecretManager {
    fn resolve(&self, reference: &str) -> Result<Option<String>> {
        self.inner.resolve(&self.scoped_reference(reference))
    }
}

/// Namespaced manager shared between a pipeline builder and its tasks
///
/// The builder may change team or backend after tasks were registered; tasks
/// always resolve through the latest configuration.
pub(crate) struct SecretScope {
    current: RwLock<NamespacedSecretManager>,
}

impl SecretScope {
    pub(crate) fn new(team: &str, inner: Arc<dyn SecretManager>) -> Self {
        Self {
            current: RwLock::new(NamespacedSecretManager::new(team, inner)),
        }
    }

    fn snapshot(&self) -> NamespacedSecretManager {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_team(&self, team: &str) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.team = team.to_string();
    }

    pub(crate) fn set_manager(&self, inner: Arc<dyn SecretManager>) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.inner = inner;
    }
}

impl SecretManager for SecretScope {
    fn resolve(&self, reference: &str) -> Result<Option<String>> {
        self.snapshot().resolve(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_manager_uses_last_segment() {
        let expected = std::env::var("PATH").ok();
        let value = EnvSecretManager.resolve("/concourse/main/PATH").unwrap();
        assert_eq!(value, expected);

        let missing = EnvSecretManager
            .resolve("/concourse/main/SLUICE_TEST_SURELY_UNSET_SECRET")
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_vault_failure_is_backend_error() {
        let vault = VaultSecretManager::with_program("sluice-test-no-such-vault");
        let err = vault.resolve("/concourse/main/token").unwrap_err();
        match err {
            PipelineError::SecretBackend { reference, .. } => {
                assert_eq!(reference, "/concourse/main/token")
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_namespaced_manager() {
        let inner = StaticSecretManager::new()
            .with("/concourse/dev/github/token", "s3cr3t")
            .with("/shared/key", "abc");
        let manager = NamespacedSecretManager::new("dev", Arc::new(inner));

        assert_eq!(manager.resolve("github/token").unwrap().as_deref(), Some("s3cr3t"));
        assert_eq!(manager.resolve("/shared/key").unwrap().as_deref(), Some("abc"));
        assert_eq!(manager.resolve("other").unwrap(), None);
    }

    #[test]
    fn test_scope_follows_reconfiguration() {
        let scope = SecretScope::new(
            "main",
            Arc::new(StaticSecretManager::new().with("/concourse/main/token", "one")),
        );
        assert_eq!(scope.resolve("token").unwrap().as_deref(), Some("one"));

        scope.set_team("dev");
        assert_eq!(scope.resolve("token").unwrap(), None);

        scope.set_manager(Arc::new(
            StaticSecretManager::new().with("/concourse/dev/token", "two"),
        ));
        assert_eq!(scope.resolve("token").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn test_secret_kinds() {
        assert!(!Secret::required("a").is_optional());
        assert!(Secret::optional("b").is_optional());
        assert_eq!(Secret::required("github/token").reference(), "github/token");
    }
}
