/*!
 * `log` bridge: forwards enabled log records to a `Reporter`.
 *
 * Every record becomes a report classed by its upper-cased level. Records
 * emitted by the reporter's own stack are dropped, otherwise a failing
 * delivery that logs would report itself forever.
 */
use std::cell::Cell;
use std::sync::Arc;

use log::{LevelFilter, Log, Metadata, Record};

use crate::capture::{Capture, LogRecord};
use crate::client::Reporter;
use crate::error::Error;

/// Crates whose records are never forwarded, matched as whole path
/// segments so `rglogger_demo` still gets through.
const IGNORED_CRATES: &[&str] = &[
    "rglogger",
    "rglogger_core",
    "rglogger_panic",
    "ureq",
    "ureq_proto",
    "rustls",
];

thread_local! {
    static IN_LOGGER: Cell<bool> = const { Cell::new(false) };
}

pub struct ReportLogger {
    reporter: Arc<Reporter>,
    level: LevelFilter,
}

impl ReportLogger {
    pub fn new(reporter: Arc<Reporter>, level: LevelFilter) -> Self {
        Self { reporter, level }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

fn is_ignored_target(target: &str) -> bool {
    IGNORED_CRATES.iter().any(|krate| {
        target
            .strip_prefix(krate)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

impl Log for ReportLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && !is_ignored_target(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let reentered = IN_LOGGER.with(|flag| flag.replace(true));
        if reentered {
            return;
        }

        if let Err(err) = self.reporter.emit(Capture::log(LogRecord::from(record))) {
            tracing::warn!(error = %err, "failed to report log record");
        }

        IN_LOGGER.with(|flag| flag.set(false));
    }

    fn flush(&self) {}
}

/**
 * Registers a `ReportLogger` as the process logger and raises the `log`
 * max level to `level`.
 *
 * Fails with `Error::Logger` when another logger is already installed.
 */
pub fn install(reporter: Arc<Reporter>, level: LevelFilter) -> Result<(), Error> {
    log::set_boxed_logger(Box::new(ReportLogger::new(reporter, level)))?;
    log::set_max_level(level);
    tracing::debug!(%level, "log bridge installed");
    Ok(())
}
