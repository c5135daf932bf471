/**
 * rglogger: send Rust errors, panics and log records to Raygun.
 *
 * This is the main crate users should depend on. It re-exports the core
 * API and wires up the panic hook and the log bridge through a single
 * `init` call.
 *
 * # Quick start
 *
 * ```ignore
 * fn main() -> Result<(), rglogger::Error> {
 *     let _installed = rglogger::init("YOUR_API_KEY")?;
 *
 *     rglogger::send("Application started")?;
 *
 *     // panics are reported automatically (catch_panics defaults to true)
 *     Ok(())
 * }
 * ```
 *
 * # With options
 *
 * ```ignore
 * let installed = rglogger::init(rglogger::Options {
 *     reporter: rglogger::ReporterOptions {
 *         api_key: Some("YOUR_API_KEY".into()),
 *         version: env!("CARGO_PKG_VERSION").into(),
 *         tags: vec!["billing".into()],
 *         ..Default::default()
 *     },
 *     capture_logs: Some(log::LevelFilter::Error),
 *     ..Default::default()
 * })?;
 *
 * installed.reporter().capture_message("something happened")?;
 * ```
 */

use std::sync::Arc;

use log::LevelFilter;

// ---------------------------------------------------------------------------
// Re-exports from rglogger_core: the public surface area
// ---------------------------------------------------------------------------

pub use rglogger_core::{
    ambient, capture, capture_error, get_reporter, send, Capture, Error, ExceptionInfo, Frame,
    LocalValue, Locals, LogRecord, ReportDocument, Reporter, RequestDetails, RequestLike,
    Response, Traceback, CLIENT_NAME, CLIENT_VERSION,
};
pub use rglogger_core::Options as ReporterOptions;
pub use rglogger_panic::PanicHookHandle;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/**
 * Configuration for `init`.
 *
 * Implements `From<&str>` so you can pass just an API key. Defaults:
 * - `catch_panics` = `true`
 * - `capture_logs` = `None` (the log bridge is not installed)
 */
#[derive(Debug, Clone)]
pub struct Options {
    /// Reporter construction options.
    pub reporter: ReporterOptions,

    /// Whether to install a panic hook that reports panics.
    pub catch_panics: bool,

    /// Install the log bridge, forwarding records at or above this level.
    pub capture_logs: Option<LevelFilter>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reporter: ReporterOptions::default(),
            catch_panics: true,
            capture_logs: None,
        }
    }
}

impl From<&str> for Options {
    fn from(api_key: &str) -> Self {
        Self {
            reporter: ReporterOptions::from(api_key),
            ..Default::default()
        }
    }
}

impl From<ReporterOptions> for Options {
    fn from(reporter: ReporterOptions) -> Self {
        Self {
            reporter,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

/// What `init` set up.
#[derive(Debug, Clone)]
pub struct Installed {
    reporter: Arc<Reporter>,
    panic_hook: Option<PanicHookHandle>,
}

impl Installed {
    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    /// `None` when `catch_panics` was off.
    pub fn panic_hook(&self) -> Option<&PanicHookHandle> {
        self.panic_hook.as_ref()
    }
}

/**
 * Initializes the global reporter and the integrations enabled in
 * `options`.
 *
 * # Errors
 * - `Error::MissingApiKey` when no key is given and `RGLOGGER_API_KEY`
 *   is unset
 * - `Error::AlreadyInitialized` on a second call
 * - `Error::Logger` when `capture_logs` is set but another logger is
 *   already registered. Nothing is installed in that case, so `init` may
 *   be retried without `capture_logs`.
 */
pub fn init(options: impl Into<Options>) -> Result<Installed, Error> {
    let opts = options.into();

    if rglogger_core::get_reporter().is_some() {
        return Err(Error::AlreadyInitialized);
    }

    let reporter = Arc::new(Reporter::new(opts.reporter)?);

    /*
     * The log bridge is the only integration that can fail; it must succeed
     * before the reporter becomes the global one.
     */
    if let Some(level) = opts.capture_logs {
        rglogger_core::logger::install(Arc::clone(&reporter), level)?;
    }

    let reporter = rglogger_core::set_global(reporter)?;

    let panic_hook = opts
        .catch_panics
        .then(|| rglogger_panic::install(Arc::clone(&reporter)));

    Ok(Installed {
        reporter,
        panic_hook,
    })
}
