//! Process configuration: listen address, database and logging settings.

use sqlx::postgres::PgConnectOptions;
use std::time::Duration;

/// Listen address used when `LISTEN_ADDR` is unset. `:port` binds all interfaces.
pub const DEFAULT_LISTEN_ADDR: &str = ":8080";

/// DSN used when `GOOSE_DBSTRING` is unset.
pub const DEFAULT_DSN: &str =
    "host=localhost user=postgres password=postgres dbname=ecom sslmode=disable";

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub const DEFAULT_LOG_FILTER: &str = "ecom_api=info,tower_http=info";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub db: DbConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Normalized `host:port`, ready for `TcpListener::bind`.
    pub addr: String,
    /// Upper bound on receiving request headers and body.
    pub read_timeout: Duration,
    /// Upper bound on streaming a response body.
    pub write_timeout: Duration,
    /// Upper bound on handling a request, after which it is cancelled.
    pub request_timeout: Duration,
    /// Keep-alive connections with no request in flight for this long are closed.
    pub idle_timeout: Duration,
}

impl ServerConfig {
    pub fn new(addr: String) -> Self {
        Self {
            addr,
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new("0.0.0.0:8080".into())
    }
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    /// DSN as given, kept for logging with the password masked.
    pub dsn: String,
    pub connect_options: PgConnectOptions,
    pub max_connections: u32,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.into(),
        }
    }
}
