//! Load configuration from the environment (and `.env`, when present).

use crate::config::types::*;
use crate::error::ConfigError;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;

pub const LISTEN_ADDR_VAR: &str = "LISTEN_ADDR";
pub const DSN_VAR: &str = "GOOSE_DBSTRING";
pub const MAX_CONNECTIONS_VAR: &str = "DB_MAX_CONNECTIONS";
pub const LOG_FILTER_VAR: &str = "RUST_LOG";

impl LogConfig {
    /// Log filter from `RUST_LOG` (after loading `.env`), so logging can start
    /// before the rest of the configuration is parsed.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let filter = std::env::var(LOG_FILTER_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.into());
        Self { filter }
    }
}

impl AppConfig {
    /// Read configuration from process environment after loading `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup. Unset and blank
    /// variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let addr = get(LISTEN_ADDR_VAR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into());
        let addr = normalize_listen_addr(&addr)?;

        let dsn = get(DSN_VAR).unwrap_or_else(|| DEFAULT_DSN.into());
        let connect_options = parse_dsn(&dsn)?;
        let max_connections = match get(MAX_CONNECTIONS_VAR) {
            Some(v) => v
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: MAX_CONNECTIONS_VAR,
                    value: v,
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log = LogConfig {
            filter: get(LOG_FILTER_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.into()),
        };

        Ok(AppConfig {
            server: ServerConfig::new(addr),
            db: DbConfig {
                dsn,
                connect_options,
                max_connections,
            },
            log,
        })
    }
}

/// `:8080` becomes `0.0.0.0:8080`; anything else must already be `host:port`.
pub fn normalize_listen_addr(addr: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidListenAddr {
        addr: addr.to_string(),
        reason: reason.to_string(),
    };
    let (host, port) = addr.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
    port.parse::<u16>().map_err(|_| invalid("port is not a number"))?;
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok(format!("{}:{}", host, port))
}

/// Parse a `postgres://` URL or a libpq keyword/value DSN
/// (`host=... user=... dbname=...`). Keyword values may be single-quoted, with
/// `\'` and `\\` escapes. Keywords with no pool-level equivalent are ignored
/// with a warning.
pub fn parse_dsn(dsn: &str) -> Result<PgConnectOptions, ConfigError> {
    let dsn = dsn.trim();
    if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
        return PgConnectOptions::from_str(dsn)
            .map_err(|e| ConfigError::InvalidDsn(e.to_string()));
    }

    let mut opts = PgConnectOptions::new();
    for (key, value) in dsn_pairs(dsn)? {
        let value = value.as_str();
        opts = match key.as_str() {
            "host" | "hostaddr" => opts.host(value),
            "port" => {
                let port = value
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidDsn(format!("invalid port '{}'", value)))?;
                opts.port(port)
            }
            "user" => opts.username(value),
            "password" => opts.password(value),
            "dbname" => opts.database(value),
            "sslmode" => {
                let mode = PgSslMode::from_str(value).map_err(|_| {
                    ConfigError::InvalidDsn(format!("invalid sslmode '{}'", value))
                })?;
                opts.ssl_mode(mode)
            }
            "sslrootcert" => opts.ssl_root_cert(value),
            "application_name" => opts.application_name(value),
            "options" => opts.options(server_options(value)),
            other => {
                tracing::warn!(key = %other, "ignoring unsupported dsn keyword");
                opts
            }
        };
    }
    Ok(opts)
}

/// Split a keyword/value DSN into pairs, following libpq quoting rules.
fn dsn_pairs(dsn: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut chars = dsn.chars().peekable();
    let mut pairs = Vec::new();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if key.is_empty() || chars.next() != Some('=') {
            return Err(ConfigError::InvalidDsn(format!(
                "expected key=value near '{}'",
                key
            )));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            loop {
                match chars.next() {
                    Some('\\') => {
                        if let Some(c) = chars.next() {
                            value.push(c);
                        }
                    }
                    Some('\'') => break,
                    Some(c) => value.push(c),
                    None => {
                        return Err(ConfigError::InvalidDsn(format!(
                            "unterminated quoted value for '{}'",
                            key
                        )))
                    }
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                } else {
                    value.push(c);
                }
            }
        }
        pairs.push((key, value));
    }
    Ok(pairs)
}

/// `-c name=value` settings from the libpq `options` keyword.
fn server_options(value: &str) -> Vec<(String, String)> {
    let mut settings = Vec::new();
    let mut tokens = value.split_whitespace();
    while let Some(token) = tokens.next() {
        let setting = if token == "-c" {
            tokens.next()
        } else {
            token.strip_prefix("-c").or_else(|| token.strip_prefix("--"))
        };
        match setting.and_then(|s| s.split_once('=')) {
            Some((name, val)) => settings.push((name.to_string(), val.to_string())),
            None => tracing::warn!(option = %token, "ignoring unsupported server option"),
        }
    }
    settings
}

/// DSN with any password replaced by `***`, safe to log.
pub fn redact_dsn(dsn: &str) -> String {
    let url = dsn
        .strip_prefix("postgres://")
        .or_else(|| dsn.strip_prefix("postgresql://"));
    if let Some(rest) = url {
        let scheme = &dsn[..dsn.len() - rest.len()];
        if let Some((userinfo, host)) = rest.split_once('@') {
            if let Some((user, _)) = userinfo.split_once(':') {
                return format!("{}{}:***@{}", scheme, user, host);
            }
        }
        return dsn.to_string();
    }
    match dsn_pairs(dsn) {
        Ok(pairs) => pairs
            .into_iter()
            .map(|(key, value)| match key.as_str() {
                "password" => "password=***".to_string(),
                _ => format!("{}={}", key, quote_dsn_value(&value)),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => "<unparseable dsn>".to_string(),
    }
}

fn quote_dsn_value(value: &str) -> String {
    let plain = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if plain {
        return value.to_string();
    }
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
