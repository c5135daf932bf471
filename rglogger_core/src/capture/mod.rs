/*!
 * Capture layer: deciding *which* error and *which* stack a report is about.
 *
 * - `frame`: input frames and captured bindings
 * - `traceback`: backtrace conversion and live stack walking
 * - `exception`: exception info (class, value, traceback)
 * - `ambient`: thread-local "error being handled" scopes
 *
 * `resolve` applies the fixed precedence between the per-call inputs.
 */

pub mod ambient;
pub mod exception;
pub mod frame;
pub mod traceback;

use serde_json::{Map, Value};

use crate::request::RequestDetails;

pub use exception::ExceptionInfo;
pub use frame::{Frame, LocalValue, Locals};
pub use traceback::Traceback;

// ---------------------------------------------------------------------------
// LogRecord
// ---------------------------------------------------------------------------

/**
 * A structured log record: the level name becomes the report class and
 * the rendered text its message.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: String,
    pub message: String,
    pub target: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl LogRecord {
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
            target: String::new(),
            file: None,
            line: None,
        }
    }
}

impl From<&log::Record<'_>> for LogRecord {
    fn from(record: &log::Record<'_>) -> Self {
        Self {
            level: record.level().as_str().to_string(),
            message: record.args().to_string(),
            target: record.target().to_string(),
            file: record.file().map(str::to_string),
            line: record.line(),
        }
    }
}

// ---------------------------------------------------------------------------
// Capture: per-call parameters
// ---------------------------------------------------------------------------

/**
 * Everything a single report call may carry. All fields are optional.
 *
 * # Example
 * ```ignore
 * reporter.emit(Capture {
 *     class_name: Some("RuntimeError".into()),
 *     message: Some("boom".into()),
 *     extra_tags: Some(vec!["release-42".into()]),
 *     ..Default::default()
 * })?;
 * ```
 */
#[derive(Debug, Clone, Default)]
pub struct Capture {
    /// When set, overrides class name and message.
    pub log_record: Option<LogRecord>,

    pub class_name: Option<String>,

    pub message: Option<String>,

    /// Takes precedence over `frames` when it carries a traceback.
    pub exc_info: Option<ExceptionInfo>,

    /// Explicit frames, oldest call first. An empty list counts as absent.
    pub frames: Option<Vec<Frame>>,

    /// Shallow-merged over the environment snapshot for this call only.
    pub extra_environment_data: Option<Map<String, Value>>,

    pub user_custom_data: Option<Map<String, Value>>,

    /// Replaces the reporter's default tags for this call.
    pub tags: Option<Vec<String>>,

    /// Appended to the effective tags.
    pub extra_tags: Option<Vec<String>>,

    /// Opaque user identity.
    pub user: Option<Value>,

    /// Pre-built request details; disables the `request` local lookup.
    pub request: Option<RequestDetails>,
}

impl Capture {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn exception(info: ExceptionInfo) -> Self {
        Self {
            exc_info: Some(info),
            ..Default::default()
        }
    }

    pub fn log(record: LogRecord) -> Self {
        Self {
            log_record: Some(record),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Class, message and frames after applying the capture precedence.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub class_name: String,
    pub message: String,
    pub frames: Vec<Frame>,
}

/**
 * Resolves class name, message and frames for one report.
 *
 * Precedence:
 * 1. explicit `class_name` / `message`;
 * 2. with no exception info and no frames, the ambient exception;
 * 3. exception info overrides class and message, and its traceback (when
 *    non-empty) becomes the frame list;
 * 4. with still no frames, the live call stack of the caller;
 * 5. a log record overrides class and message last.
 *
 * Never fails; the worst case is an empty frame list.
 */
pub fn resolve(
    log_record: Option<&LogRecord>,
    class_name: Option<String>,
    message: Option<String>,
    exc_info: Option<ExceptionInfo>,
    frames: Option<Vec<Frame>>,
) -> Resolved {
    let mut class_name = class_name.unwrap_or_default();
    let mut message = message.unwrap_or_default();
    let mut frames = frames.filter(|f| !f.is_empty());

    let exc_info = match exc_info {
        Some(info) => Some(info),
        None if frames.is_none() => ambient::current(),
        None => None,
    };

    if let Some(info) = exc_info {
        message = info.message();
        class_name = info.class_name;
        if let Some(tb) = info.traceback.filter(|tb| !tb.is_empty()) {
            frames = Some(tb.into_frames());
        }
    }

    /* called directly: no std frame may sit between the walk and the caller */
    let frames = match frames {
        Some(frames) => frames,
        None => traceback::walk_live_stack(),
    };

    if let Some(record) = log_record {
        class_name = record.level.to_uppercase();
        message = record.message.clone();
    }

    Resolved {
        class_name,
        message,
        frames,
    }
}
