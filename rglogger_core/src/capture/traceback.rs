/**
 * Backtrace handling: converting `backtrace::Backtrace` into frames and
 * walking the live call stack.
 *
 * The `backtrace` crate reports frames innermost first. Everything leaving
 * this module is ordered oldest call first, the order the dashboard
 * displays.
 */
use crate::capture::frame::Frame;

// ---------------------------------------------------------------------------
// Dispatch-layer filtering
// ---------------------------------------------------------------------------

/// Symbol prefixes of the reporting layer itself. Leading frames matching
/// these are dropped so the trace ends at the code that asked for a report.
pub const DISPATCH_PREFIXES: &[&str] = &[
    "backtrace::",
    "rglogger_core::",
    "rglogger_panic::",
    "rglogger::",
    "log::",
];

/// Symbol prefixes of the std panic runtime, sitting between a panic hook
/// and the code that panicked.
pub const PANIC_RUNTIME_PREFIXES: &[&str] = &[
    "std::panicking::",
    "std::panic::",
    "core::panicking::",
    "core::panic::",
    "std::sys::backtrace::",
    "std::sys_common::backtrace::",
    "alloc::boxed::",
    "core::ops::function::",
    "rust_begin_unwind",
    "__rust_try",
    "__rustc::",
];

/// Whether `symbol` belongs to one of `prefixes`. Trait-impl symbols
/// (`<Type as Trait>::method`) are matched on their `Type`.
pub fn is_dispatch_frame(symbol: &str, prefixes: &[&str]) -> bool {
    let name = symbol.trim_start_matches('<');
    prefixes.iter().any(|prefix| name.starts_with(prefix))
}

// ---------------------------------------------------------------------------
// Backtrace conversion
// ---------------------------------------------------------------------------

/**
 * Converts a `backtrace::Backtrace` into `(symbol, Frame)` pairs,
 * innermost first.
 *
 * Inlined functions yield one entry per symbol. Symbols with neither a
 * name nor a file are skipped; typically runtime or linker trampolines.
 */
fn symbolized_frames(bt: &backtrace::Backtrace) -> Vec<(String, Frame)> {
    let mut frames = Vec::new();

    for frame in bt.frames() {
        for symbol in frame.symbols() {
            /* `{:#}` drops the trailing `::h0123…` hash */
            let name = symbol.name().map(|n| format!("{n:#}"));
            let file = symbol.filename().map(|p| p.display().to_string());

            if name.is_none() && file.is_none() {
                continue;
            }

            let name = name.unwrap_or_default();
            let converted = Frame::from_symbol(&name, file, symbol.lineno());
            frames.push((name, converted));
        }
    }

    frames
}

/// Converts a backtrace into frames, oldest call first, after dropping the
/// leading (innermost) frames that match `skip_prefixes`.
pub fn frames_from_backtrace(bt: &backtrace::Backtrace, skip_prefixes: &[&str]) -> Vec<Frame> {
    let mut frames: Vec<Frame> = symbolized_frames(bt)
        .into_iter()
        .skip_while(|(name, _)| name.is_empty() || is_dispatch_frame(name, skip_prefixes))
        .map(|(_, frame)| frame)
        .collect();
    frames.reverse();
    frames
}

/**
 * Walks the live call stack of the current thread.
 *
 * The result starts at the outermost caller and ends at the first frame
 * outside the reporting layer, i.e. the code that asked for the report.
 */
pub fn walk_live_stack() -> Vec<Frame> {
    let bt = backtrace::Backtrace::new();
    frames_from_backtrace(&bt, DISPATCH_PREFIXES)
}

// ---------------------------------------------------------------------------
// Traceback
// ---------------------------------------------------------------------------

/**
 * How execution reached the point where an error was raised, oldest call
 * first.
 */
#[derive(Debug, Clone, Default)]
pub struct Traceback {
    frames: Vec<Frame>,
}

impl Traceback {
    /// Wraps frames that are already ordered oldest first.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    /// Captures the current stack, trimming the reporting layer and the
    /// panic runtime from the innermost end.
    pub fn capture() -> Self {
        let bt = backtrace::Backtrace::new();
        let prefixes: Vec<&str> = DISPATCH_PREFIXES
            .iter()
            .chain(PANIC_RUNTIME_PREFIXES)
            .copied()
            .collect();
        Self::from_backtrace(&bt, &prefixes)
    }

    pub fn from_backtrace(bt: &backtrace::Backtrace, skip_prefixes: &[&str]) -> Self {
        Self::new(frames_from_backtrace(bt, skip_prefixes))
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl From<Vec<Frame>> for Traceback {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_frame_matches_plain_and_trait_symbols() {
        assert!(is_dispatch_frame("rglogger_core::client::Reporter::emit", DISPATCH_PREFIXES));
        assert!(is_dispatch_frame(
            "<rglogger_core::logger::ReportLogger as log::Log>::log",
            DISPATCH_PREFIXES
        ));
        assert!(is_dispatch_frame("log::__private_api::log", DISPATCH_PREFIXES));
        assert!(!is_dispatch_frame("shop::checkout::run", DISPATCH_PREFIXES));
        assert!(!is_dispatch_frame("logistics::route", DISPATCH_PREFIXES));
    }

    #[test]
    fn test_capture_with_no_prefixes_keeps_this_test() {
        let bt = backtrace::Backtrace::new();
        let frames = frames_from_backtrace(&bt, &[]);

        assert!(frames.iter().any(|f| {
            f.method_name.as_deref() == Some("test_capture_with_no_prefixes_keeps_this_test")
        }));
    }

    #[test]
    fn test_frames_are_oldest_first() {
        let bt = backtrace::Backtrace::new();
        let frames = frames_from_backtrace(&bt, &[]);

        let test_idx = frames
            .iter()
            .position(|f| {
                f.method_name.as_deref() == Some("test_frames_are_oldest_first")
            })
            .expect("test frame present");
        let capture_idx = frames
            .iter()
            .rposition(|f| {
                f.class_name
                    .as_deref()
                    .is_some_and(|scope| scope.starts_with("backtrace::"))
            })
            .expect("backtrace frame present");

        assert!(test_idx < capture_idx);
    }

    #[test]
    fn test_traceback_preserves_given_order() {
        let tb = Traceback::new(vec![
            Frame::new("main", "src/main.rs", 3),
            Frame::new("run", "src/lib.rs", 10),
        ]);
        let names: Vec<_> = tb.frames().iter().map(|f| f.method_name.clone()).collect();
        assert_eq!(names, [Some("main".to_string()), Some("run".to_string())]);
    }
}
