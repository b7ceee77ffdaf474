// Session context shared by a client and its owner.
//
// Holds the session-kind marker and the single unauthorized-handler slot.
// Both are lock-free (`ArcSwapOption`); requests only read them, the
// owning auth controller writes them.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::debug;

use crate::auth::SessionKind;

type HandlerFn = dyn Fn() + Send + Sync;

struct UnauthorizedHandler(Box<HandlerFn>);

/// Per-session state injected into an [`ApiClient`](crate::ApiClient).
///
/// One context corresponds to one logical browser tab: the marker lives
/// in memory only and is never persisted. Independent contexts give
/// independent sessions inside one process.
#[derive(Default)]
pub struct SessionContext {
    kind: ArcSwapOption<SessionKind>,
    on_unauthorized: ArcSwapOption<UnauthorizedHandler>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("kind", &self.kind())
            .field("has_unauthorized_handler", &self.has_unauthorized_handler())
            .finish()
    }
}

impl SessionContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // ── Session marker ───────────────────────────────────────────────

    /// The profile the current session belongs to, if any.
    pub fn kind(&self) -> Option<SessionKind> {
        self.kind.load_full().map(|kind| *kind)
    }

    pub fn set_kind(&self, kind: SessionKind) {
        debug!(%kind, "session marker set");
        self.kind.store(Some(Arc::new(kind)));
    }

    pub fn clear_kind(&self) {
        if self.kind.swap(None).is_some() {
            debug!("session marker cleared");
        }
    }

    // ── Unauthorized handler ────────────────────────────────────────

    /// Register the handler invoked when a session cannot be refreshed.
    ///
    /// Replaces any previously registered handler.
    pub fn set_unauthorized_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        self.on_unauthorized
            .store(Some(Arc::new(UnauthorizedHandler(Box::new(handler)))));
    }

    pub fn clear_unauthorized_handler(&self) {
        self.on_unauthorized.store(None);
    }

    /// Register a handler for the lifetime of the returned guard.
    ///
    /// Dropping the guard clears the slot, unless another handler has been
    /// registered in the meantime.
    #[must_use = "the handler is cleared as soon as the guard is dropped"]
    pub fn register_unauthorized_handler(
        self: &Arc<Self>,
        handler: impl Fn() + Send + Sync + 'static,
    ) -> HandlerGuard {
        let handler = Arc::new(UnauthorizedHandler(Box::new(handler)));
        self.on_unauthorized.store(Some(Arc::clone(&handler)));
        HandlerGuard {
            context: Arc::clone(self),
            handler,
        }
    }

    pub fn has_unauthorized_handler(&self) -> bool {
        self.on_unauthorized.load().is_some()
    }

    /// Invoke the registered handler, if any. Returns whether one ran.
    pub(crate) fn notify_unauthorized(&self) -> bool {
        let Some(handler) = self.on_unauthorized.load_full() else {
            return false;
        };
        (handler.0)();
        true
    }
}

/// Keeps an unauthorized handler registered until dropped.
pub struct HandlerGuard {
    context: Arc<SessionContext>,
    handler: Arc<UnauthorizedHandler>,
}

impl fmt::Debug for HandlerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerGuard").finish_non_exhaustive()
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        let current = self.context.on_unauthorized.load_full();
        if current.is_some_and(|h| Arc::ptr_eq(&h, &self.handler)) {
            self.context.on_unauthorized.store(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn marker_lifecycle() {
        let ctx = SessionContext::new();
        assert_eq!(ctx.kind(), None);
        ctx.set_kind(SessionKind::Employee);
        assert_eq!(ctx.kind(), Some(SessionKind::Employee));
        ctx.clear_kind();
        assert_eq!(ctx.kind(), None);
    }

    #[test]
    fn handler_replaces_previous() {
        let ctx = SessionContext::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&first);
        ctx.set_unauthorized_handler(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = Arc::clone(&second);
        ctx.set_unauthorized_handler(move || {
            s.fetch_add(1, Ordering::SeqCst);
        });

        assert!(ctx.notify_unauthorized());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        ctx.clear_unauthorized_handler();
        assert!(!ctx.notify_unauthorized());
    }

    #[test]
    fn guard_clears_only_its_own_handler() {
        let ctx = SessionContext::new();

        let guard = ctx.register_unauthorized_handler(|| {});
        assert!(ctx.has_unauthorized_handler());
        drop(guard);
        assert!(!ctx.has_unauthorized_handler());

        let stale = ctx.register_unauthorized_handler(|| {});
        ctx.set_unauthorized_handler(|| {});
        drop(stale);
        assert!(ctx.has_unauthorized_handler());
    }
}
