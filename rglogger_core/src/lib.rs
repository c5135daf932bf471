/*!
 * rglogger core: the reporting engine.
 *
 * This crate turns an error, a message or a log record into a Raygun-style
 * JSON report (stack frames, local and global variables, request details,
 * host environment) and POSTs it synchronously. End users usually depend
 * on the `rglogger` facade crate, which also wires up the panic hook and
 * the log bridge.
 *
 * # Module structure
 *
 * - `capture/`: which error and which stack (frames, tracebacks,
 *   exception info, the ambient "currently handled" error)
 * - `projection`: turning captured values into strings that never fail
 * - `request`: request details from any request-like value
 * - `environment`: the host snapshot taken once per reporter
 * - `protocol/`: wire types and constants
 * - `transport/`: blocking HTTP POST
 * - `client`: the `Reporter`, its options and the global instance
 * - `logger`: `log::Log` bridge
 */

pub mod capture;
mod client;
pub mod environment;
mod error;
pub mod logger;
pub mod projection;
mod protocol;
pub mod request;
mod transport;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use capture::{ambient, Capture, ExceptionInfo, Frame, LocalValue, Locals, LogRecord, Traceback};
pub use client::{get_reporter, set_global, Options, Reporter};
pub use error::Error;
pub use protocol::constants::{
    API_KEY_ENV, API_KEY_HEADER, CLIENT_NAME, CLIENT_URL, CLIENT_VERSION, DEFAULT_ENDPOINT,
    UNDEFINED_VERSION,
};
pub use protocol::types::{ClientInfo, Details, ErrorDetails, FrameDetails, ReportDocument};
pub use request::{RequestDetails, RequestLike};
pub use transport::Response;

// ---------------------------------------------------------------------------
// Public functions
// ---------------------------------------------------------------------------

/**
 * Builds the process-wide reporter.
 *
 * Returns the shared reporter so it can be handed to the panic hook or the
 * log bridge. Returns `Err` if no API key can be resolved or `init` was
 * already called.
 */
pub fn init(options: Options) -> Result<std::sync::Arc<Reporter>, Error> {
    client::init(options)
}

/**
 * Reports a message through the global reporter.
 *
 * Accepts anything that implements `Display`. The stack of the calling code
 * is attached, so the dashboard shows exactly where `rglogger::send(...)`
 * was called from.
 *
 * Returns `Ok(None)` if `init` has not run.
 */
pub fn send(message: &(impl std::fmt::Display + ?Sized)) -> Result<Option<Response>, Error> {
    capture(Capture::message(message.to_string()))
}

/// Reports `error` through the global reporter. `Ok(None)` if not
/// initialized.
pub fn capture_error<E: std::error::Error + 'static>(error: &E) -> Result<Option<Response>, Error> {
    capture(Capture::exception(ExceptionInfo::from_error(error)))
}

/**
 * Sends a fully specified `Capture` through the global reporter.
 *
 * Low-level API used by addons and by callers that need per-call tags,
 * custom data or explicit frames. `Ok(None)` if not initialized.
 */
pub fn capture(capture: Capture) -> Result<Option<Response>, Error> {
    match client::get_reporter() {
        Some(reporter) => reporter.emit(capture).map(Some),
        None => Ok(None),
    }
}
