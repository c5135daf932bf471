//! Error type shared by every fallible reporter operation.

use crate::protocol::constants::API_KEY_ENV;

/// Errors surfaced to callers.
///
/// Projection failures never appear here: they are folded into the report
/// as placeholder strings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No API key was passed and none was found in the environment.
    #[error("must provide an API key (pass one in Options or set {API_KEY_ENV})")]
    MissingApiKey,

    /// The process-wide reporter was already initialized.
    #[error("rglogger is already initialized")]
    AlreadyInitialized,

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    /// Network failure or timeout while sending. Non-success statuses are
    /// not errors; they come back as a normal response.
    #[error("failed to send report: {0}")]
    Transport(#[from] ureq::Error),

    #[error("failed to install logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}
