/**
 * Input-side frame model: what a caller (or the backtrace walker) hands to
 * the reporter before projection.
 *
 * Rust has no runtime access to a function's locals, so bindings are
 * recorded explicitly with `Locals::with_*`. A `Frame` produced from a
 * backtrace carries location data only.
 */
use std::fmt;
use std::sync::Arc;

use crate::request::RequestLike;

// ---------------------------------------------------------------------------
// LocalValue
// ---------------------------------------------------------------------------

/// Anything with both a rich and a debug form.
pub trait DisplayValue: fmt::Display + fmt::Debug + Send + Sync {}

impl<T: ?Sized + fmt::Display + fmt::Debug + Send + Sync> DisplayValue for T {}

/**
 * A single captured binding.
 *
 * Values are shared behind `Arc` so frames (and the exception info that
 * owns them) stay cheap to clone across ambient scopes.
 */
#[derive(Clone)]
pub enum LocalValue {
    /// Already text; sent verbatim.
    Text(String),

    /// Rendered through `Display`, falling back to `Debug`.
    Display(Arc<dyn DisplayValue>),

    /// Only a `Debug` form is available.
    Debug(Arc<dyn fmt::Debug + Send + Sync>),

    /// A web request. Projected through `Debug`; when bound to the name
    /// `request` it also supplies the report's request details.
    Request(Arc<dyn RequestLike>),
}

impl LocalValue {
    pub fn text(value: impl Into<String>) -> Self {
        LocalValue::Text(value.into())
    }

    pub fn display<T: fmt::Display + fmt::Debug + Send + Sync + 'static>(value: T) -> Self {
        LocalValue::Display(Arc::new(value))
    }

    pub fn debug<T: fmt::Debug + Send + Sync + 'static>(value: T) -> Self {
        LocalValue::Debug(Arc::new(value))
    }

    pub fn request<R: RequestLike + 'static>(request: R) -> Self {
        LocalValue::Request(Arc::new(request))
    }

    /// Returns the request capability if this binding holds one.
    pub fn as_request(&self) -> Option<&dyn RequestLike> {
        match self {
            LocalValue::Request(request) => Some(request.as_ref()),
            _ => None,
        }
    }
}

impl From<String> for LocalValue {
    fn from(value: String) -> Self {
        LocalValue::Text(value)
    }
}

impl From<&str> for LocalValue {
    fn from(value: &str) -> Self {
        LocalValue::Text(value.to_string())
    }
}

impl fmt::Debug for LocalValue {
    // Never formats the wrapped value: a broken impl must not leak out of
    // an innocent `{:?}` on a frame.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            LocalValue::Text(_) => "Text",
            LocalValue::Display(_) => "Display",
            LocalValue::Debug(_) => "Debug",
            LocalValue::Request(_) => "Request",
        };
        write!(f, "LocalValue::{kind}")
    }
}

// ---------------------------------------------------------------------------
// Locals
// ---------------------------------------------------------------------------

/// Ordered name → value bindings of one scope.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    bindings: Vec<(String, LocalValue)>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing an earlier binding with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<LocalValue>) {
        let name = name.into();
        let value = value.into();
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.bindings.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<LocalValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_display<T>(self, name: impl Into<String>, value: T) -> Self
    where
        T: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.with(name, LocalValue::display(value))
    }

    pub fn with_debug<T>(self, name: impl Into<String>, value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        self.with(name, LocalValue::debug(value))
    }

    pub fn get(&self, name: &str) -> Option<&LocalValue> {
        self.bindings.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LocalValue)> {
        self.bindings.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/**
 * One level of a call stack.
 *
 * `globals` is the namespace visible from the frame; only the outermost
 * frame's globals make it into a report.
 */
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub line_number: Option<u32>,
    pub class_name: Option<String>,
    pub file_name: Option<String>,
    pub method_name: Option<String>,
    pub locals: Locals,
    pub globals: Locals,
}

impl Frame {
    /// A frame for `method_name` at `file_name:line_number`.
    pub fn new(method_name: impl Into<String>, file_name: impl Into<String>, line_number: u32) -> Self {
        Self {
            line_number: Some(line_number),
            file_name: Some(file_name.into()),
            method_name: Some(method_name.into()),
            ..Default::default()
        }
    }

    /// Builds a frame from a demangled symbol path, splitting it into the
    /// enclosing scope and the function name.
    pub fn from_symbol(symbol: &str, file_name: Option<String>, line_number: Option<u32>) -> Self {
        let (class_name, method_name) = split_symbol(symbol);
        Self {
            line_number,
            class_name,
            file_name,
            method_name: Some(method_name),
            ..Default::default()
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_locals(mut self, locals: Locals) -> Self {
        self.locals = locals;
        self
    }

    pub fn with_globals(mut self, globals: Locals) -> Self {
        self.globals = globals;
        self
    }
}

/**
 * Splits `a::b::Type::method` into (`Some("a::b::Type")`, `"method"`).
 *
 * Only `::` outside angle brackets counts, so trait impls such as
 * `<a::Reporter as log::Log>::log` split into
 * (`Some("<a::Reporter as log::Log>")`, `"log"`).
 */
pub fn split_symbol(symbol: &str) -> (Option<String>, String) {
    let bytes = symbol.as_bytes();
    let mut depth: i32 = 0;
    let mut split_at = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' if depth > 0 => depth -= 1,
            // `::<` opens a turbofish, not a new path segment.
            b':' if depth == 0
                && bytes.get(i + 1) == Some(&b':')
                && bytes.get(i + 2) != Some(&b'<') =>
            {
                split_at = Some(i);
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    match split_at {
        Some(idx) => (Some(symbol[..idx].to_string()), symbol[idx + 2..].to_string()),
        None => (None, symbol.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_path() {
        assert_eq!(
            split_symbol("app::orders::Service::place"),
            (Some("app::orders::Service".to_string()), "place".to_string())
        );
    }

    #[test]
    fn test_split_trait_impl() {
        assert_eq!(
            split_symbol("<app::Reporter as log::Log>::log"),
            (Some("<app::Reporter as log::Log>".to_string()), "log".to_string())
        );
    }

    #[test]
    fn test_split_bare_function() {
        assert_eq!(split_symbol("main"), (None, "main".to_string()));
    }

    #[test]
    fn test_split_ignores_generic_arguments() {
        let (scope, method) = split_symbol("app::run::<std::string::String>");
        assert_eq!(scope.as_deref(), Some("app"));
        assert_eq!(method, "run::<std::string::String>");
    }

    #[test]
    fn test_locals_insert_replaces_existing_binding() {
        let locals = Locals::new().with("user", "alice").with("user", "bob");
        assert_eq!(locals.len(), 1);
        assert!(matches!(locals.get("user"), Some(LocalValue::Text(s)) if s == "bob"));
    }

    #[test]
    fn test_locals_keep_insertion_order() {
        let locals = Locals::new()
            .with("b", "2")
            .with_display("a", 1)
            .with_debug("c", vec![3]);
        let names: Vec<&str> = locals.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }
}
