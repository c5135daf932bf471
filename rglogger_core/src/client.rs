/**
 * The reporter: owns configuration, the environment snapshot and the
 * transport, and turns a `Capture` into a delivered report.
 *
 * Lifecycle:
 * 1. `Reporter::new(options)` resolves the API key, probes the host once
 *    and builds the HTTP agent.
 * 2. Each `emit` resolves the stack, projects variables, assembles a
 *    `ReportDocument` and POSTs it on the calling thread.
 * 3. Optionally, `init` stores one reporter process-wide so the free
 *    functions, panic hook and logger can reach it.
 *
 * A `Reporter` is read-only after construction. Per-call tags and
 * environment extras are applied to copies.
 */
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::capture::{self, Capture, ExceptionInfo, Frame, LocalValue};
use crate::environment;
use crate::error::Error;
use crate::projection;
use crate::protocol::constants::{API_KEY_ENV, DEFAULT_ENDPOINT, UNDEFINED_VERSION};
use crate::protocol::types::{ClientInfo, Details, ErrorDetails, FrameDetails, ReportDocument};
use crate::request::RequestDetails;
use crate::transport::{Response, Transport};

// ---------------------------------------------------------------------------
// Global singleton
// ---------------------------------------------------------------------------

/**
 * Process-wide reporter set by `init()`.
 *
 * `OnceLock` ensures `init()` succeeds only once. The free functions in
 * the crate root reach the reporter through `get_reporter()`.
 */
static GLOBAL_REPORTER: OnceLock<Arc<Reporter>> = OnceLock::new();

/// Returns the global reporter, or `None` if `init()` has not run.
pub fn get_reporter() -> Option<&'static Arc<Reporter>> {
    GLOBAL_REPORTER.get()
}

/**
 * Builds a `Reporter` and stores it as the process-wide instance.
 *
 * Fails with `Error::AlreadyInitialized` on a second call, and with
 * `Error::MissingApiKey` when no key can be resolved.
 */
pub fn init(options: Options) -> Result<Arc<Reporter>, Error> {
    /* avoid probing the host again if we would be rejected anyway */
    if GLOBAL_REPORTER.get().is_some() {
        return Err(Error::AlreadyInitialized);
    }

    set_global(Arc::new(Reporter::new(options)?))
}

/**
 * Stores an already built reporter as the process-wide instance.
 *
 * Lets callers finish fallible setup around a reporter before publishing
 * it. Fails with `Error::AlreadyInitialized` if a global reporter exists.
 */
pub fn set_global(reporter: Arc<Reporter>) -> Result<Arc<Reporter>, Error> {
    GLOBAL_REPORTER
        .set(Arc::clone(&reporter))
        .map_err(|_| Error::AlreadyInitialized)?;

    Ok(reporter)
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/**
 * Construction-time configuration.
 *
 * All fields have defaults; only the API key is effectively required, and
 * it may come from the `RGLOGGER_API_KEY` environment variable instead.
 *
 * # Example
 * ```ignore
 * let reporter = Reporter::new(Options {
 *     api_key: Some("MY_KEY".into()),
 *     version: "2.4.1".into(),
 *     tags: vec!["billing".into()],
 *     ..Default::default()
 * })?;
 * ```
 */
#[derive(Debug, Clone)]
pub struct Options {
    /// Application API key. Falls back to `RGLOGGER_API_KEY` when `None`
    /// or empty.
    pub api_key: Option<String>,

    /// Ingestion URL. Default: `https://api.raygun.io/entries`.
    pub endpoint: String,

    /// Release label sent as `details.version`. Default: empty
    /// (sent as `"Not defined"`).
    pub version: String,

    /// Project frame locals into the report. Default: `true`.
    pub transmit_local_variables: bool,

    /// Project the outermost frame's globals into the report.
    /// Default: `true`.
    pub transmit_global_variables: bool,

    /// Bound on the whole HTTP exchange. Default: 30 seconds.
    pub timeout: Duration,

    /// Default: the host name.
    pub machine_name: Option<String>,

    /// Tags attached to every report. Default: none.
    pub tags: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            version: String::new(),
            transmit_local_variables: true,
            transmit_global_variables: true,
            timeout: Duration::from_secs(30),
            machine_name: None,
            tags: Vec::new(),
        }
    }
}

/// `Options::from("KEY")`: an API key with every other option defaulted.
impl From<&str> for Options {
    fn from(api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Default::default()
        }
    }
}

/**
 * Picks the explicit key if non-empty, otherwise asks `lookup` for the
 * `RGLOGGER_API_KEY` setting.
 */
fn resolve_api_key(
    explicit: Option<String>,
    lookup: impl FnOnce(&str) -> Option<String>,
) -> Result<String, Error> {
    explicit
        .filter(|key| !key.is_empty())
        .or_else(|| lookup(API_KEY_ENV).filter(|key| !key.is_empty()))
        .ok_or(Error::MissingApiKey)
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

pub struct Reporter {
    api_key: String,
    endpoint: String,
    version: String,
    transmit_local_variables: bool,
    transmit_global_variables: bool,
    timeout: Duration,
    machine_name: String,
    tags: Vec<String>,

    /// Probed once in `new`; cloned into every report.
    environment: Map<String, Value>,

    transport: Transport,
}

/// Stack trace, globals and request found while walking the frames.
struct WalkedFrames {
    stack_trace: Vec<FrameDetails>,
    global_variables: BTreeMap<String, String>,
    request: Option<RequestDetails>,
}

impl Reporter {
    /**
     * Creates a reporter.
     *
     * Probes the host for the environment snapshot and hostname; this is
     * the only time the probe runs.
     *
     * # Errors
     * `Error::MissingApiKey` if neither `options.api_key` nor the
     * `RGLOGGER_API_KEY` environment variable provides a key.
     */
    pub fn new(options: Options) -> Result<Self, Error> {
        let api_key = resolve_api_key(options.api_key, |name| std::env::var(name).ok())?;

        let machine_name = options
            .machine_name
            .filter(|name| !name.is_empty())
            .or_else(environment::hostname)
            .unwrap_or_default();

        tracing::debug!(
            endpoint = %options.endpoint,
            machine_name = %machine_name,
            "reporter configured"
        );

        Ok(Self {
            api_key,
            transport: Transport::new(options.timeout),
            endpoint: options.endpoint,
            version: options.version,
            transmit_local_variables: options.transmit_local_variables,
            transmit_global_variables: options.transmit_global_variables,
            timeout: options.timeout,
            machine_name,
            tags: options.tags,
            environment: environment::collect(),
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    /// Default tags; never modified by per-call tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The base environment snapshot; never modified by per-call extras.
    pub fn environment(&self) -> &Map<String, Value> {
        &self.environment
    }

    /**
     * Assembles the report for `capture` without sending it.
     *
     * Never fails: stringification problems become placeholder strings and
     * missing stack information becomes an empty or live-walked trace.
     */
    pub fn build_report(&self, capture: Capture) -> ReportDocument {
        let Capture {
            log_record,
            class_name,
            message,
            exc_info,
            frames,
            extra_environment_data,
            user_custom_data,
            tags,
            extra_tags,
            user,
            request,
        } = capture;

        let mut environment = self.environment.clone();
        if let Some(extra) = extra_environment_data {
            environment.extend(extra);
        }

        let resolved = capture::resolve(log_record.as_ref(), class_name, message, exc_info, frames);
        let walked = self.walk_frames(&resolved.frames, request.is_none());

        let mut tags = tags.unwrap_or_else(|| self.tags.clone());
        if let Some(extra) = extra_tags {
            tags.extend(extra);
        }

        tracing::debug!(
            class_name = %resolved.class_name,
            frames = walked.stack_trace.len(),
            "report assembled"
        );

        ReportDocument {
            occurred_on: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            details: Details {
                version: if self.version.is_empty() {
                    UNDEFINED_VERSION.to_string()
                } else {
                    self.version.clone()
                },
                tags: (!tags.is_empty()).then_some(tags),
                machine_name: (!self.machine_name.is_empty()).then(|| self.machine_name.clone()),
                environment,
                client: ClientInfo::default(),
                error: ErrorDetails {
                    class_name: resolved.class_name,
                    message: resolved.message,
                    stack_trace: walked.stack_trace,
                    global_variables: walked.global_variables,
                    data: String::new(),
                },
                request: request.or(walked.request),
                user,
                user_custom_data: user_custom_data.unwrap_or_default(),
            },
        }
    }

    /**
     * Walks `frames` in order, projecting locals and (first frame only)
     * globals, and picking up the first `request` local that is a
     * request-like value.
     */
    fn walk_frames(&self, frames: &[Frame], find_request: bool) -> WalkedFrames {
        let mut stack_trace = Vec::with_capacity(frames.len());
        let mut global_variables = BTreeMap::new();
        let mut request = None;

        for (idx, frame) in frames.iter().enumerate() {
            if idx == 0 && self.transmit_global_variables {
                global_variables = projection::project_locals(&frame.globals);
            }

            let local_variables = if self.transmit_local_variables {
                if find_request && request.is_none() {
                    request = frame
                        .locals
                        .get("request")
                        .and_then(LocalValue::as_request)
                        .map(RequestDetails::from_request);
                }
                Some(projection::project_locals(&frame.locals)).filter(|vars| !vars.is_empty())
            } else {
                None
            };

            stack_trace.push(FrameDetails {
                line_number: frame.line_number,
                class_name: frame.class_name.clone(),
                file_name: frame.file_name.clone(),
                method_name: frame.method_name.clone(),
                local_variables,
            });
        }

        WalkedFrames {
            stack_trace,
            global_variables,
            request,
        }
    }

    /**
     * Assembles and sends a report, returning the raw HTTP response.
     *
     * # Errors
     * `Error::Transport` on network failure or timeout. Non-success
     * statuses are returned as `Ok`.
     */
    pub fn emit(&self, capture: Capture) -> Result<Response, Error> {
        let report = self.build_report(capture);
        self.send_report(&report)
    }

    /// Sends an already assembled report.
    pub fn send_report(&self, report: &ReportDocument) -> Result<Response, Error> {
        self.transport.send(&self.endpoint, &self.api_key, report)
    }

    /// Reports `error`, classed by its concrete type, with the stack of
    /// the calling code.
    pub fn capture_error<E: std::error::Error + 'static>(&self, error: &E) -> Result<Response, Error> {
        self.emit(Capture::exception(ExceptionInfo::from_error(error)))
    }

    /// Reports a plain message with the stack of the calling code.
    pub fn capture_message(&self, message: &str) -> Result<Response, Error> {
        self.emit(Capture::message(message))
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("endpoint", &self.endpoint)
            .field("version", &self.version)
            .field("transmit_local_variables", &self.transmit_local_variables)
            .field("transmit_global_variables", &self.transmit_global_variables)
            .field("timeout", &self.timeout)
            .field("machine_name", &self.machine_name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}
