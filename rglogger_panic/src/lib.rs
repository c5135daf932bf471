/*!
 * rglogger panic hook: automatic panic reporting.
 *
 * `install()` registers a `std::panic::set_hook` handler bound to a
 * `Reporter`. When a panic occurs, it:
 *
 * 1. Calls the previous panic hook, so the default stderr output is
 *    printed first.
 * 2. Extracts the panic message, source location and thread name.
 * 3. Captures a backtrace at the panic site, with the panic machinery
 *    trimmed off.
 * 4. Reports it as exception info of class `"panic"`, with
 *    `{ panic: { thread, location } }` as custom data.
 *
 * Delivery failures are logged through `tracing` and never propagated.
 *
 * # Recursion safety
 *
 * A `thread_local` flag stops re-entry if reporting itself panics. Panics
 * raised (and caught) while projecting a variable are neither reported nor
 * forwarded to the previous hook.
 *
 * # Multiple registrations
 *
 * Each `install()` wraps whatever hook is current, so installing twice
 * chains two reporting hooks and every panic is reported twice.
 * `PanicHookHandle::uninstall()` only silences its own registration.
 */

use std::cell::Cell;
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::{json, Map};

use rglogger_core::capture::exception::panic_message;
use rglogger_core::{projection, Capture, ExceptionInfo, Reporter, Traceback};

/// Class name reported for panics.
pub const PANIC_CLASS: &str = "panic";

thread_local! {
    /**
     * Per-thread flag that prevents re-entrancy into the panic hook.
     * Breaks recursion if reporting itself panics.
     */
    static IN_HOOK: Cell<bool> = const { Cell::new(false) };
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/**
 * Handle for one hook registration.
 *
 * The hook itself stays registered for the life of the process (std has
 * no way to remove a hook from the middle of a chain); `uninstall()` turns
 * it into a plain forwarder to the previous hook.
 */
#[derive(Debug, Clone)]
pub struct PanicHookHandle {
    active: Arc<AtomicBool>,
}

impl PanicHookHandle {
    /// Stops reporting panics through this registration.
    pub fn uninstall(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/**
 * Installs a panic hook that reports every panic through `reporter`.
 *
 * The previous hook is kept and called before reporting.
 */
pub fn install(reporter: Arc<Reporter>) -> PanicHookHandle {
    let active = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&active);

    let previous_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        /* projection catches these itself; stay silent */
        if projection::is_projecting() {
            return;
        }

        previous_hook(info);

        if !flag.load(Ordering::SeqCst) {
            return;
        }

        let is_recursive = IN_HOOK.with(|in_hook| in_hook.replace(true));
        if is_recursive {
            return;
        }

        let _ = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            handle_panic(&reporter, info);
        }));

        IN_HOOK.with(|in_hook| in_hook.set(false));
    }));

    tracing::debug!("panic hook installed");

    PanicHookHandle { active }
}

// ---------------------------------------------------------------------------
// Internal: build and send the panic report
// ---------------------------------------------------------------------------

fn handle_panic(reporter: &Reporter, info: &PanicHookInfo) {
    let message = panic_message(info.payload());
    let location = info
        .location()
        .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()));
    let thread = std::thread::current()
        .name()
        .unwrap_or("<unnamed>")
        .to_string();

    let capture = panic_capture(message, location, thread, Traceback::capture());

    if let Err(err) = reporter.emit(capture) {
        tracing::warn!(error = %err, "failed to report panic");
    }
}

fn panic_capture(
    message: String,
    location: Option<String>,
    thread: String,
    traceback: Traceback,
) -> Capture {
    let mut custom = Map::new();
    custom.insert(
        "panic".into(),
        json!({ "thread": thread, "location": location }),
    );

    Capture {
        exc_info: Some(ExceptionInfo::new(PANIC_CLASS, message).with_traceback(traceback)),
        user_custom_data: Some(custom),
        ..Default::default()
    }
}
