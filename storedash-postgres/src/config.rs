//! Store cluster connection configuration.
//!
//! One base configuration covers every store: host, port and user are
//! shared, the database name is derived from the store id, and the password
//! is the store's resolved credential.

use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::types::StoreId;

/// Default database-name template; `{key}` is replaced by the store id.
pub const DEFAULT_DATABASE_TEMPLATE: &str = "store_{key}";

/// Base PostgreSQL configuration shared by all stores.
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// Host.
    pub host: String,
    /// Port (default: 5432).
    pub port: u16,
    /// Username.
    pub user: String,
    /// Database-name template with a `{key}` placeholder.
    pub database_template: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Application name (shown in pg_stat_activity).
    pub application_name: Option<String>,
}

impl PgConfig {
    /// Create a builder for configuration.
    pub fn builder() -> PgConfigBuilder {
        PgConfigBuilder::new()
    }

    /// Load configuration from `STOREDASH_PG_*` environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let host = std::env::var("STOREDASH_PG_HOST")
            .map_err(|_| StoreError::config("STOREDASH_PG_HOST is not set"))?;

        let port = match std::env::var("STOREDASH_PG_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| StoreError::config("invalid STOREDASH_PG_PORT"))?,
            Err(_) => 5432,
        };

        let user = std::env::var("STOREDASH_PG_USER")
            .map_err(|_| StoreError::config("STOREDASH_PG_USER is not set"))?;

        let database_template = std::env::var("STOREDASH_PG_DATABASE_TEMPLATE")
            .unwrap_or_else(|_| DEFAULT_DATABASE_TEMPLATE.to_string());

        Ok(Self {
            host,
            port,
            user,
            database_template,
            connect_timeout: Duration::from_secs(30),
            application_name: Some("storedash".to_string()),
        })
    }

    /// The database name for a store.
    pub fn database_for(&self, store: StoreId) -> String {
        self.database_template.replace("{key}", &store.to_string())
    }

    /// Build a tokio-postgres config for one store, using its credential as
    /// the password.
    pub fn to_pg_config(&self, store: StoreId, secret: &str) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config.host(&self.host);
        config.port(self.port);
        config.dbname(&self.database_for(store));
        config.user(&self.user);
        config.password(secret);
        config.connect_timeout(self.connect_timeout);

        if let Some(ref app_name) = self.application_name {
            config.application_name(app_name);
        }

        config
    }
}

/// Builder for store cluster configuration.
#[derive(Debug, Default)]
pub struct PgConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    database_template: Option<String>,
    connect_timeout: Option<Duration>,
    application_name: Option<String>,
}

impl PgConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the database-name template.
    pub fn database_template(mut self, template: impl Into<String>) -> Self {
        self.database_template = Some(template.into());
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> StoreResult<PgConfig> {
        let host = self
            .host
            .ok_or_else(|| StoreError::config("host is required"))?;
        let user = self.user.unwrap_or_else(|| "postgres".to_string());

        Ok(PgConfig {
            host,
            port: self.port.unwrap_or(5432),
            user,
            database_template: self
                .database_template
                .unwrap_or_else(|| DEFAULT_DATABASE_TEMPLATE.to_string()),
            connect_timeout: self.connect_timeout.unwrap_or(Duration::from_secs(30)),
            application_name: self.application_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_builder() {
        let config = PgConfig::builder()
            .host("localhost")
            .port(5433)
            .user("dashboard")
            .build()
            .unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5433);
        assert_eq!(config.user, "dashboard");
        assert_eq!(config.database_template, "store_{key}");
    }

    #[test]
    fn test_config_requires_host() {
        let result = PgConfig::builder().user("dashboard").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_database_derivation() {
        let config = PgConfig::builder().host("localhost").build().unwrap();
        assert_eq!(config.database_for(StoreId::new(5)), "store_5");

        let config = PgConfig::builder()
            .host("localhost")
            .database_template("tenant_{key}_data")
            .build()
            .unwrap();
        assert_eq!(config.database_for(StoreId::new(12)), "tenant_12_data");
    }

    #[test]
    fn test_to_pg_config_sets_store_database() {
        let config = PgConfig::builder()
            .host("db.internal")
            .user("dashboard")
            .application_name("storedash")
            .build()
            .unwrap();

        let pg = config.to_pg_config(StoreId::new(3), "s3cret");
        assert_eq!(pg.get_dbname(), Some("store_3"));
        assert_eq!(pg.get_user(), Some("dashboard"));
        assert_eq!(pg.get_application_name(), Some("storedash"));
    }
}
