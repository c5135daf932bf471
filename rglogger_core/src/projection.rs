/**
 * Value projection: turning captured bindings into JSON-safe strings.
 *
 * Every value goes through a three-tier chain:
 * 1. its rich form (`Display`), or the text itself for `LocalValue::Text`;
 * 2. on failure, its debug form (`Debug`);
 * 3. on failure again, a placeholder assembled only from `&str`/`String`
 *    formatting, which cannot fail.
 *
 * "Failure" covers both a formatter returning `fmt::Error` and an impl that
 * panics. Projection never propagates either.
 */
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::panic::{self, AssertUnwindSafe};

use crate::capture::exception::panic_message;
use crate::capture::frame::{LocalValue, Locals};

thread_local! {
    static PROJECTING: Cell<bool> = const { Cell::new(false) };
}

/**
 * Whether the current thread is inside a guarded render.
 *
 * Panic hooks check this to stay quiet about panics that projection is
 * about to catch.
 */
pub fn is_projecting() -> bool {
    PROJECTING.with(Cell::get)
}

/// Runs one formatting attempt, converting `fmt::Error` and panics into a
/// description of what went wrong.
fn render<F>(write: F) -> Result<String, String>
where
    F: FnOnce(&mut String) -> fmt::Result,
{
    let mut out = String::new();
    let was_projecting = PROJECTING.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(|| write(&mut out)));
    PROJECTING.with(|flag| flag.set(was_projecting));

    match result {
        Ok(Ok(())) => Ok(out),
        Ok(Err(fmt::Error)) => Err("fmt::Error".to_string()),
        Err(payload) => Err(format!("panic: {}", panic_message(payload.as_ref()))),
    }
}

/// Final tier. Only formats owned strings, so it cannot fail.
fn placeholder(name: &str, repr: Result<String, String>, error: &str) -> String {
    let repr = match repr {
        Ok(repr) => repr,
        Err(repr_error) => format!("Couldn't convert to repr due to {repr_error}"),
    };
    format!("!!! Couldn't convert {name:?} (repr: {repr}) due to {error:?} !!!")
}

/// Projects any `Display + Debug` value bound to `name`.
pub fn render_display<T>(name: &str, value: &T) -> String
where
    T: fmt::Display + fmt::Debug + ?Sized,
{
    match render(|out| write!(out, "{value}")) {
        Ok(text) => text,
        Err(error) => placeholder(name, render(|out| write!(out, "{value:?}")), &error),
    }
}

/// Projects a debug-only value bound to `name`.
pub fn render_debug<T>(name: &str, value: &T) -> String
where
    T: fmt::Debug + ?Sized,
{
    match render(|out| write!(out, "{value:?}")) {
        Ok(text) => text,
        Err(error) => placeholder(name, Err(error.clone()), &error),
    }
}

/// Projects a single binding.
pub fn project_value(name: &str, value: &LocalValue) -> String {
    match value {
        LocalValue::Text(text) => text.clone(),
        LocalValue::Display(value) => render_display(name, &**value),
        LocalValue::Debug(value) => render_debug(name, &**value),
        LocalValue::Request(request) => render_debug(name, &**request),
    }
}

/// Projects every binding of a scope.
pub fn project_locals(locals: &Locals) -> BTreeMap<String, String> {
    locals
        .iter()
        .map(|(name, value)| (name.to_string(), project_value(name, value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails its rich form with `fmt::Error` and panics in its debug form.
    struct Cursed;

    impl fmt::Display for Cursed {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    impl fmt::Debug for Cursed {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("no debug for you")
        }
    }

    /// Panics in its rich form, debug works.
    struct Touchy;

    impl fmt::Display for Touchy {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("touchy")
        }
    }

    impl fmt::Debug for Touchy {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("Touchy")
        }
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        assert_eq!(project_value("s", &LocalValue::text("héllo")), "héllo");
    }

    #[test]
    fn test_display_is_preferred_over_debug() {
        assert_eq!(project_value("n", &LocalValue::display("quoted")), "quoted");
        assert_eq!(project_value("n", &LocalValue::display(42)), "42");
    }

    #[test]
    fn test_debug_only_value() {
        assert_eq!(project_value("v", &LocalValue::debug(vec![1, 2])), "[1, 2]");
    }

    #[test]
    fn test_failed_display_falls_back_to_debug_in_placeholder() {
        let projected = project_value("touchy_var", &LocalValue::display(Touchy));
        assert_eq!(
            projected,
            "!!! Couldn't convert \"touchy_var\" (repr: Touchy) due to \"panic: touchy\" !!!"
        );
    }

    #[test]
    fn test_both_forms_failing_yields_placeholder() {
        let projected = project_value("cursed", &LocalValue::display(Cursed));

        assert!(projected.contains("\"cursed\""));
        assert!(projected.contains("Couldn't convert to repr due to panic: no debug for you"));
        assert!(projected.contains("fmt::Error"));
    }

    #[test]
    fn test_projection_flag_is_reset() {
        let _ = project_value("cursed", &LocalValue::display(Cursed));
        assert!(!is_projecting());
    }

    #[test]
    fn test_project_locals_maps_every_binding() {
        let locals = Locals::new()
            .with("name", "widget")
            .with_display("qty", 3)
            .with_display("bad", Cursed);
        let projected = project_locals(&locals);

        assert_eq!(projected.len(), 3);
        assert_eq!(projected["name"], "widget");
        assert_eq!(projected["qty"], "3");
        assert!(projected["bad"].starts_with("!!! Couldn't convert \"bad\""));
    }
}
