//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use storedash_postgres::StoreId;

/// Command-line arguments; every flag also reads its environment variable.
#[derive(Debug, Parser)]
#[command(
    name = "storedash-server",
    about = "Multi-tenant store analytics dashboard backend"
)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "STOREDASH_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Store whose database holds the cross-store access mappings.
    #[arg(long, env = "STOREDASH_DIRECTORY_STORE", default_value_t = 1)]
    pub directory_store: i32,

    /// Seconds of inactivity before a store connection is closed.
    #[arg(long, env = "STOREDASH_IDLE_TIMEOUT_SECS", default_value_t = 180)]
    pub idle_timeout_secs: u64,

    /// Env-var name template for store credentials; `{key}` is replaced by
    /// the store id.
    #[arg(
        long,
        env = "STOREDASH_CREDENTIAL_TEMPLATE",
        default_value = "STORE_{key}_TOKEN"
    )]
    pub credential_template: String,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub directory_store: StoreId,
    pub idle_timeout: Duration,
    pub credential_template: String,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            bind: args.bind,
            directory_store: StoreId::new(args.directory_store),
            idle_timeout: Duration::from_secs(args.idle_timeout_secs),
            credential_template: args.credential_template,
        }
    }
}
