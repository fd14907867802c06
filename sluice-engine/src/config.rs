//! Engine settings
//!
//! Defines where task results are cached, where outputs are placed, which
//! execution context the process runs in, and which secret backend is used.

use sluice_core::{CACHE_DIR, ExecutionContext};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::secrets::{EnvSecretManager, SecretManager, VaultSecretManager};

/// Parameter set on every task container so the entrypoint starts in the
/// remote context
pub const CONTEXT_ENV: &str = "SLUICE_CONCOURSE";

/// Secret backend selectable from the command line or environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretSource {
    #[default]
    Env,
    Vault,
}

impl SecretSource {
    pub fn manager(self) -> Arc<dyn SecretManager> {
        match self {
            SecretSource::Env => Arc::new(EnvSecretManager),
            SecretSource::Vault => Arc::new(VaultSecretManager::new()),
        }
    }
}

impl fmt::Display for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretSource::Env => write!(f, "env"),
            SecretSource::Vault => write!(f, "vault"),
        }
    }
}

impl FromStr for SecretSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "env" => Ok(SecretSource::Env),
            "vault" => Ok(SecretSource::Vault),
            other => Err(format!(
                "unknown secret manager '{}' (expected 'env' or 'vault')",
                other
            )),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Local workstation or orchestrator task container
    pub context: ExecutionContext,

    /// Root of the task result cache (`<cache_root>/<job>/<task>.json`)
    pub cache_root: PathBuf,

    /// Root of local task outputs (`<scratch_root>/<job>/<task>/<output>`)
    pub scratch_root: PathBuf,

    /// Working directory of a task container; remote outputs live directly below it
    pub work_root: PathBuf,

    pub secret_source: SecretSource,
}

impl Settings {
    /// Creates settings with defaults for the given context
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            context,
            cache_root: PathBuf::from(CACHE_DIR),
            scratch_root: std::env::temp_dir().join("outputs"),
            work_root: PathBuf::from("."),
            secret_source: SecretSource::Env,
        }
    }

    /// Creates settings from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - SLUICE_CONCOURSE (`remote`/`local` or a boolean flag value, default: local)
    /// - SLUICE_CACHE_DIR (default: `tasks`)
    /// - SLUICE_SCRATCH_DIR (default: `<tmp>/outputs`)
    /// - SLUICE_WORK_DIR (default: `.`)
    /// - SLUICE_SECRET_MANAGER (`env` or `vault`, default: env)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let context = match lookup(CONTEXT_ENV) {
            Some(value) => value
                .parse::<ExecutionContext>()
                .map_err(|e| PipelineError::InvalidSettings(format!("{}: {}", CONTEXT_ENV, e)))?,
            None => ExecutionContext::Local,
        };

        let mut settings = Self::new(context);

        if let Some(dir) = lookup("SLUICE_CACHE_DIR") {
            settings.cache_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SLUICE_SCRATCH_DIR") {
            settings.scratch_root = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SLUICE_WORK_DIR") {
            settings.work_root = PathBuf::from(dir);
        }
        if let Some(source) = lookup("SLUICE_SECRET_MANAGER") {
            settings.secret_source = source.parse().map_err(|e| {
                PipelineError::InvalidSettings(format!("SLUICE_SECRET_MANAGER: {}", e))
            })?;
        }

        Ok(settings)
    }

    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_cache_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_root = dir.into();
        self
    }

    pub fn with_scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_root = dir.into();
        self
    }

    pub fn with_work_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_root = dir.into();
        self
    }

    pub fn with_secret_source(mut self, source: SecretSource) -> Self {
        self.secret_source = source;
        self
    }

    /// Validates the settings
    pub fn validate(&self) -> Result<()> {
        if self.cache_root.as_os_str().is_empty() {
            return Err(PipelineError::InvalidSettings(
                "cache_root cannot be empty".to_string(),
            ));
        }

        if self.scratch_root.as_os_str().is_empty() {
            return Err(PipelineError::InvalidSettings(
                "scratch_root cannot be empty".to_string(),
            ));
        }

        if self.work_root.as_os_str().is_empty() {
            return Err(PipelineError::InvalidSettings(
                "work_root cannot be empty".to_string(),
            ));
        }

        if self.cache_root == self.scratch_root {
            return Err(PipelineError::InvalidSettings(
                "cache_root and scratch_root must differ".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(ExecutionContext::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.context, ExecutionContext::Local);
        assert_eq!(settings.cache_root, PathBuf::from("tasks"));
        assert!(settings.scratch_root.ends_with("outputs"));
        assert_eq!(settings.secret_source, SecretSource::Env);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let settings = Settings::from_lookup(lookup(&[
            ("SLUICE_CONCOURSE", "true"),
            ("SLUICE_CACHE_DIR", "/work/tasks"),
            ("SLUICE_WORK_DIR", "/work"),
            ("SLUICE_SECRET_MANAGER", "vault"),
        ]))
        .unwrap();

        assert!(settings.context.is_remote());
        assert_eq!(settings.cache_root, PathBuf::from("/work/tasks"));
        assert_eq!(settings.work_root, PathBuf::from("/work"));
        assert_eq!(settings.secret_source, SecretSource::Vault);
    }

    #[test]
    fn test_context_accepts_names_and_flag_values() {
        for value in ["remote", "yes", "true", "1"] {
            let settings = Settings::from_lookup(lookup(&[("SLUICE_CONCOURSE", value)])).unwrap();
            assert!(settings.context.is_remote(), "{}", value);
        }
        for value in ["local", "no", "false"] {
            let settings = Settings::from_lookup(lookup(&[("SLUICE_CONCOURSE", value)])).unwrap();
            assert!(!settings.context.is_remote(), "{}", value);
        }
    }

    #[test]
    fn test_from_lookup_rejects_unknown_values() {
        let err = Settings::from_lookup(lookup(&[("SLUICE_SECRET_MANAGER", "keychain")]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSettings(_)));

        let err = Settings::from_lookup(lookup(&[("SLUICE_CONCOURSE", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("SLUICE_CONCOURSE"));
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = Settings::default();

        // Valid settings should pass
        assert!(settings.validate().is_ok());

        // Empty cache root should fail
        settings.cache_root = PathBuf::new();
        assert!(settings.validate().is_err());

        // Cache and scratch may not overlap
        settings.cache_root = PathBuf::from("/tmp/x");
        settings.scratch_root = PathBuf::from("/tmp/x");
        assert!(settings.validate().is_err());

        settings.scratch_root = PathBuf::from("/tmp/y");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_with_setters() {
        let settings = Settings::default()
            .with_context(ExecutionContext::Remote)
            .with_cache_root("cache")
            .with_scratch_root("scratch")
            .with_work_root("work")
            .with_secret_source(SecretSource::Vault);

        assert!(settings.context.is_remote());
        assert_eq!(settings.cache_root, PathBuf::from("cache"));
        assert_eq!(settings.scratch_root, PathBuf::from("scratch"));
        assert_eq!(settings.work_root, PathBuf::from("work"));
        assert_eq!("VAULT".parse::<SecretSource>(), Ok(SecretSource::Vault));
    }
}
