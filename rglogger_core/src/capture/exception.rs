/**
 * Exception info: the class, rendered value and optional traceback of an
 * error being reported.
 *
 * Built from a `std::error::Error`, a panic payload, or by hand. The value
 * is rendered once at construction through the same guarded path as local
 * variables, so a broken `Display` impl cannot break a report.
 */
use std::any::Any;

use crate::capture::traceback::Traceback;
use crate::projection;

#[derive(Debug, Clone)]
pub struct ExceptionInfo {
    /// Short type name, e.g. `"ParseIntError"` or `"panic"`.
    pub class_name: String,

    /// The error rendered through `Display`.
    pub value: String,

    pub traceback: Option<Traceback>,
}

impl ExceptionInfo {
    pub fn new(class_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            value: value.into(),
            traceback: None,
        }
    }

    /// Exception info for `error`, classed by its concrete type.
    pub fn from_error<E: std::error::Error + 'static>(error: &E) -> Self {
        Self::new(short_type_name::<E>(), projection::render_display("error", error))
    }

    /// Exception info for a type-erased error; the class must be given.
    pub fn from_dyn_error(class_name: impl Into<String>, error: &dyn std::error::Error) -> Self {
        Self::new(class_name, projection::render_display("error", error))
    }

    pub fn with_traceback(mut self, traceback: Traceback) -> Self {
        self.traceback = Some(traceback);
        self
    }

    /// The report message: `"<class>: <value>"`.
    pub fn message(&self) -> String {
        format!("{}: {}", self.class_name, self.value)
    }
}

/// Last path segment of `T`'s type name, without generic arguments.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/**
 * Extracts a human-readable message from a panic payload.
 *
 * Tries `&str`, then `String`, falling back to `"<unknown panic>"`.
 */
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<unknown panic>".to_string()
    }
}
