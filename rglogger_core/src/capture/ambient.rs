/**
 * Thread-local "error currently being handled".
 *
 * Inside a recover block, `enter` makes an `ExceptionInfo` ambient for the
 * lifetime of the returned guard. Any capture on the same thread that is
 * given neither exception info nor frames picks it up, including log
 * records routed through `ReportLogger`.
 *
 * ```ignore
 * if let Err(err) = place_order(&cart) {
 *     let _scope = ambient::enter(ExceptionInfo::from_error(&err));
 *     log::error!("order failed"); // reported with err's class and message
 * }
 * ```
 */
use std::cell::RefCell;
use std::marker::PhantomData;

use crate::capture::exception::ExceptionInfo;

thread_local! {
    /// Innermost scope last.
    static SCOPES: RefCell<Vec<ExceptionInfo>> = const { RefCell::new(Vec::new()) };
}

/**
 * Keeps an exception ambient until dropped.
 *
 * Not `Send`: the scope belongs to the thread that entered it.
 */
#[must_use = "the exception is only ambient while the scope is alive"]
pub struct ExceptionScope {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

/// Makes `info` the current exception for this thread.
pub fn enter(info: ExceptionInfo) -> ExceptionScope {
    let depth = SCOPES.with(|scopes| {
        let mut scopes = scopes.borrow_mut();
        scopes.push(info);
        scopes.len()
    });
    ExceptionScope {
        depth,
        _not_send: PhantomData,
    }
}

/// The innermost ambient exception on this thread, if any.
pub fn current() -> Option<ExceptionInfo> {
    SCOPES.with(|scopes| scopes.borrow().last().cloned())
}

impl Drop for ExceptionScope {
    fn drop(&mut self) {
        // Truncating (rather than popping) keeps the stack consistent even
        // if inner scopes were leaked with `mem::forget`.
        let _ = SCOPES.try_with(|scopes| {
            scopes.borrow_mut().truncate(self.depth.saturating_sub(1));
        });
    }
}
