//! Error types for server startup.

/// Errors that can occur while assembling and starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerSetupError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The database could not be reached or migrated.
    #[error("database error: {0}")]
    Database(#[from] pulse_db::DbError),

    /// The HTTP server failed to bind or serve.
    #[error("server error: {0}")]
    Server(#[from] pulse_api::ServerError),
}
