//! Configuration for the server binary.
//!
//! All configuration is loaded from environment variables. The server
//! needs the database URL and the session signing secret; everything else
//! has a sensible default.

use pulse_db::PostgresConfig;

use crate::error::ServerSetupError;

/// Complete server configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Maximum number of `PostgreSQL` connections in the pool.
    pub db_max_connections: u32,
    /// HMAC secret for session tokens.
    pub jwt_secret: String,
    /// The host address to bind to.
    pub host: String,
    /// The TCP port to listen on.
    pub port: u16,
    /// Frontend origin allowed to send credentialed requests.
    pub frontend_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `DATABASE_URL` -- `PostgreSQL` connection string
    /// - `JWT_SECRET` -- session token signing secret
    ///
    /// Optional variables:
    /// - `PULSE_HOST` -- bind address (default `0.0.0.0`)
    /// - `PULSE_PORT` -- bind port (default `8000`)
    /// - `PULSE_DB_MAX_CONNECTIONS` -- pool size (default `10`)
    /// - `FRONTEND_URL` -- origin for credentialed CORS (default: permissive)
    pub fn from_env() -> Result<Self, ServerSetupError> {
        let database_url = env_var("DATABASE_URL")?;
        let jwt_secret = env_var("JWT_SECRET")?;

        let db_max_connections: u32 = std::env::var("PULSE_DB_MAX_CONNECTIONS")
            .map_or(Ok(PostgresConfig::DEFAULT_MAX_CONNECTIONS), |v| {
                v.parse().map_err(|e| {
                    ServerSetupError::Config(format!("invalid PULSE_DB_MAX_CONNECTIONS: {e}"))
                })
            })?;

        let host = std::env::var("PULSE_HOST").unwrap_or_else(|_| "0.0.0.0".to_owned());
        let port: u16 = std::env::var("PULSE_PORT")
            .unwrap_or_else(|_| "8000".to_owned())
            .parse()
            .map_err(|e| ServerSetupError::Config(format!("invalid PULSE_PORT: {e}")))?;
        let frontend_url = std::env::var("FRONTEND_URL").ok();

        Ok(Self {
            database_url,
            db_max_connections,
            jwt_secret,
            host,
            port,
            frontend_url,
        })
    }
}

fn env_var(name: &str) -> Result<String, ServerSetupError> {
    std::env::var(name)
        .map_err(|_| ServerSetupError::Config(format!("missing environment variable {name}")))
}
