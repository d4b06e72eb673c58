//! Credential resolution for tenant databases.
//!
//! Each tenant's database is opened with its own secret. Resolution is a
//! plain synchronous lookup; where the secret comes from (environment,
//! config file, secret manager) is up to the implementation.

use std::collections::HashMap;
use std::sync::RwLock;

/// Resolves a tenant key to a connection secret.
pub trait CredentialResolver: Send + Sync + 'static {
    /// Look up the secret for a tenant. `None` means no credential is
    /// configured; the caller must not attempt a connection in that case.
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Resolves credentials from environment variables using a templated name.
///
/// The template's `{key}` placeholder is replaced with the tenant key, e.g.
/// `STORE_{key}_TOKEN` resolves tenant `5` from `STORE_5_TOKEN`.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    template: String,
}

impl EnvCredentials {
    /// Create a resolver with the given variable-name template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The environment variable name for a tenant key.
    pub fn var_name(&self, key: &str) -> String {
        self.template.replace("{key}", key)
    }
}

impl CredentialResolver for EnvCredentials {
    fn resolve(&self, key: &str) -> Option<String> {
        std::env::var(self.var_name(key)).ok()
    }
}

/// An in-memory credential map, mainly for tests and development.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    secrets: RwLock<HashMap<String, String>>,
}

impl StaticCredentials {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret for a tenant.
    pub fn register(&self, key: impl Into<String>, secret: impl Into<String>) -> &Self {
        self.secrets
            .write()
            .expect("lock poisoned")
            .insert(key.into(), secret.into());
        self
    }

    /// Remove a tenant's secret.
    pub fn unregister(&self, key: &str) -> Option<String> {
        self.secrets.write().expect("lock poisoned").remove(key)
    }

    /// Number of registered secrets.
    pub fn len(&self) -> usize {
        self.secrets.read().expect("lock poisoned").len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialResolver for StaticCredentials {
    fn resolve(&self, key: &str) -> Option<String> {
        self.secrets.read().expect("lock poisoned").get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_name() {
        let creds = EnvCredentials::new("STORE_{key}_TOKEN");
        assert_eq!(creds.var_name("5"), "STORE_5_TOKEN");
        assert_eq!(creds.var_name("acme"), "STORE_acme_TOKEN");
    }

    #[test]
    fn test_static_credentials() {
        let creds = StaticCredentials::new();
        creds.register("1", "secret-1").register("2", "secret-2");

        assert_eq!(creds.resolve("1"), Some("secret-1".to_string()));
        assert_eq!(creds.resolve("3"), None);
        assert_eq!(creds.len(), 2);

        creds.unregister("1");
        assert_eq!(creds.resolve("1"), None);
    }
}
