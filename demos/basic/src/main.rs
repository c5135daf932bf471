/**
 * Minimal harness for the rglogger reporter.
 *
 * Set RGLOGGER_API_KEY to a real application key (or paste one into
 * API_KEY below), then run:
 *
 *   cargo run -p rglogger_demo
 *   cargo run -p rglogger_demo -- --panic   # test panic capture
 *   cargo run -p rglogger_demo -- --log     # test the log bridge
 */
use std::collections::BTreeMap;

use rglogger::{Capture, ExceptionInfo, Frame, LocalValue, Locals, Traceback};

/// Paste your API key here, or leave empty to use RGLOGGER_API_KEY.
const API_KEY: &str = "";

/// Stand-in for a framework request, bound as the `request` local below.
#[derive(Debug)]
struct DemoRequest {
    path: &'static str,
    query: BTreeMap<&'static str, &'static str>,
}

impl rglogger::RequestLike for DemoRequest {
    fn host(&self) -> String {
        "demo.local".into()
    }

    fn path(&self) -> String {
        self.path.into()
    }

    fn method(&self) -> String {
        "GET".into()
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

fn report_status(what: &str, result: Result<Option<rglogger::Response>, rglogger::Error>) {
    match result {
        Ok(Some(response)) => println!("[demo] {what}: HTTP {}", response.status()),
        Ok(None) => println!("[demo] {what}: reporter not initialized"),
        Err(err) => println!("[demo] {what}: failed: {err}"),
    }
}

fn main() -> Result<(), rglogger::Error> {
    let args: Vec<String> = std::env::args().collect();
    let test_panic = args.iter().any(|a| a == "--panic");
    let test_log = args.iter().any(|a| a == "--log");

    /*
     * Initialize. An empty key falls back to RGLOGGER_API_KEY.
     */
    let installed = rglogger::init(rglogger::Options {
        reporter: rglogger::ReporterOptions {
            api_key: Some(API_KEY.to_string()),
            version: env!("CARGO_PKG_VERSION").into(),
            tags: vec!["demo".into()],
            ..Default::default()
        },
        capture_logs: test_log.then_some(log::LevelFilter::Warn),
        ..Default::default()
    })?;

    /*
     * A plain message, with the live stack attached.
     */
    report_status("message", rglogger::send("Hello from the rglogger demo!"));

    /*
     * A real error (file not found).
     */
    if let Err(e) = std::fs::read_to_string("/nonexistent/path.txt") {
        report_status("io::Error", rglogger::capture_error(&e));
    }

    /*
     * Hand-built frames with locals, including a request-like value.
     */
    let frames = vec![
        Frame::new("main", "demos/basic/src/main.rs", 1)
            .with_globals(Locals::new().with("API_KEY_SET", (!API_KEY.is_empty()).to_string())),
        Frame::new("serve_cart", "demos/basic/src/cart.rs", 42).with_locals(
            Locals::new()
                .with_display("item_count", 3)
                .with_debug("cart", vec!["apple", "pear"])
                .with(
                    "request",
                    LocalValue::request(DemoRequest {
                        path: "/cart",
                        query: BTreeMap::from([("page", "2")]),
                    }),
                ),
        ),
    ];
    let info = ExceptionInfo::new("CartError", "cart total mismatch")
        .with_traceback(Traceback::new(frames));
    report_status(
        "explicit frames",
        installed
            .reporter()
            .emit(Capture {
                extra_tags: Some(vec!["checkout".into()]),
                ..Capture::exception(info)
            })
            .map(Some),
    );

    if test_log {
        log::error!("payment gateway unreachable");
        println!("[demo] Logged an error through the log bridge");
    }

    /*
     * The panic hook (catch_panics = true by default) reports this after
     * the default hook output.
     */
    if test_panic {
        println!("[demo] Triggering a panic...");
        panic!("Test panic from rglogger demo");
    }

    println!("[demo] Done.");
    Ok(())
}
