//! Live-stack fallback, checked against real symbol names.

use rglogger_core::{Capture, Options, Reporter};

fn reporter() -> Reporter {
    Reporter::new(Options::from("k1")).unwrap()
}

#[inline(never)]
fn report_from_here(reporter: &Reporter) -> rglogger_core::ReportDocument {
    reporter.build_report(Capture::message("no stack given"))
}

#[test]
fn test_fallback_ends_at_immediate_caller() {
    let report = report_from_here(&reporter());
    let trace = &report.details.error.stack_trace;

    assert!(!trace.is_empty());

    let last = trace.last().unwrap();
    assert_eq!(last.method_name.as_deref(), Some("report_from_here"));
    assert_eq!(last.class_name.as_deref(), Some("live_stack"));

    for frame in trace {
        let class = frame.class_name.as_deref().unwrap_or_default();
        assert!(!class.starts_with("rglogger_core"), "leaked frame: {frame:?}");
        assert!(!class.starts_with("backtrace"), "leaked frame: {frame:?}");
    }
}

#[test]
fn test_fallback_is_oldest_first() {
    let report = report_from_here(&reporter());
    let methods: Vec<_> = report
        .details
        .error
        .stack_trace
        .iter()
        .filter_map(|f| f.method_name.as_deref())
        .collect();

    let test_fn = methods
        .iter()
        .position(|m| *m == "test_fallback_is_oldest_first")
        .unwrap();
    let helper = methods.iter().position(|m| *m == "report_from_here").unwrap();
    assert!(test_fn < helper);
}

#[test]
fn test_ambient_exception_is_used_without_frames() {
    let reporter = reporter();
    let report = {
        let _scope = rglogger_core::ambient::enter(rglogger_core::ExceptionInfo::new(
            "TimeoutError",
            "upstream took too long",
        ));
        reporter.build_report(Capture::default())
    };

    assert_eq!(report.details.error.class_name, "TimeoutError");
    assert_eq!(report.details.error.message, "TimeoutError: upstream took too long");
    assert!(!report.details.error.stack_trace.is_empty());

    let after = reporter.build_report(Capture::default());
    assert_eq!(after.details.error.class_name, "");
}
