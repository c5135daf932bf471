//! A failed log-bridge install leaves nothing behind. Process-wide state,
//! so one test drives it all.

use std::time::Duration;

struct NullLogger;

impl log::Log for NullLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        false
    }

    fn log(&self, _: &log::Record) {}

    fn flush(&self) {}
}

fn reporter_options() -> rglogger::ReporterOptions {
    rglogger::ReporterOptions {
        endpoint: "http://127.0.0.1:9/entries".into(),
        timeout: Duration::from_millis(500),
        ..rglogger::ReporterOptions::from("k1")
    }
}

#[test]
fn test_init_can_retry_after_logger_conflict() {
    log::set_boxed_logger(Box::new(NullLogger)).unwrap();

    let result = rglogger::init(rglogger::Options {
        reporter: reporter_options(),
        catch_panics: false,
        capture_logs: Some(log::LevelFilter::Error),
    });
    assert!(matches!(result, Err(rglogger::Error::Logger(_))));
    assert!(rglogger::get_reporter().is_none());

    let installed = rglogger::init(rglogger::Options {
        reporter: reporter_options(),
        catch_panics: false,
        capture_logs: None,
    })
    .unwrap();
    assert!(rglogger::get_reporter().is_some());
    assert!(installed.panic_hook().is_none());
}
