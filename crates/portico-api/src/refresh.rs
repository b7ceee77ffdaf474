// Session refresh gate
//
// Without coalescing every 401 runs its own refresh. With coalescing the
// refresh is single-flight per session profile: callers refreshing the same
// profile serialize on its mutex, and a caller whose original request was
// sent before another refresh of that profile completed reuses that outcome
// instead of issuing a new one. Profiles never share an outcome.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::trace;

use crate::auth::SessionKind;

/// Result of asking the gate for a refreshed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefreshOutcome {
    Refreshed,
    /// `performed` is false when the failure was observed from another
    /// caller's refresh rather than from one this caller issued.
    Failed { performed: bool },
}

impl RefreshOutcome {
    fn from_result(ok: bool, performed: bool) -> Self {
        if ok {
            Self::Refreshed
        } else {
            Self::Failed { performed }
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Number of refreshes of this profile completed through the gate.
    generation: AtomicU64,
    last_ok: Mutex<bool>,
}

#[derive(Debug, Default)]
pub(crate) struct RefreshGate {
    coalesce: bool,
    staff: Slot,
    employee: Slot,
}

impl RefreshGate {
    pub(crate) fn new(coalesce: bool) -> Self {
        Self {
            coalesce,
            ..Self::default()
        }
    }

    fn slot(&self, kind: SessionKind) -> &Slot {
        match kind {
            SessionKind::Staff => &self.staff,
            SessionKind::Employee => &self.employee,
        }
    }

    /// Snapshot for `kind` taken before sending a request, passed back to
    /// [`run`].
    ///
    /// [`run`]: Self::run
    pub(crate) fn generation(&self, kind: SessionKind) -> u64 {
        self.slot(kind).generation.load(Ordering::Acquire)
    }

    pub(crate) async fn run<F, Fut>(
        &self,
        kind: SessionKind,
        seen: u64,
        refresh: F,
    ) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if !self.coalesce {
            return RefreshOutcome::from_result(refresh().await, true);
        }

        let slot = self.slot(kind);
        let mut last_ok = slot.last_ok.lock().await;
        if slot.generation.load(Ordering::Acquire) != seen {
            trace!(%kind, ok = *last_ok, "reusing refresh completed by another request");
            return RefreshOutcome::from_result(*last_ok, false);
        }

        let ok = refresh().await;
        *last_ok = ok;
        slot.generation.fetch_add(1, Ordering::AcqRel);
        RefreshOutcome::from_result(ok, true)
    }
}
