use std::cell::{OnceCell, RefCell};
use std::collections::HashSet;

use tracing::warn;

use crate::window::{ExternalWindowId, SystemWindowEntry, WindowService};

/// Per-scan state shared by every resolution in one pass.
///
/// The system-wide window list is fetched lazily and at most once, however
/// many windows need it. A failed fetch is remembered as unavailable for the
/// rest of the pass.
pub struct ResolveContext<'a> {
    service: &'a dyn WindowService,
    system_list: OnceCell<Option<Vec<SystemWindowEntry>>>,
    claimed: RefCell<HashSet<ExternalWindowId>>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(service: &'a dyn WindowService) -> Self {
        Self {
            service,
            system_list: OnceCell::new(),
            claimed: RefCell::new(HashSet::new()),
        }
    }

    pub fn service(&self) -> &'a dyn WindowService {
        self.service
    }

    /// The batched system list, fetched on first use.
    pub fn system_list(&self) -> Option<&[SystemWindowEntry]> {
        self.system_list
            .get_or_init(|| match self.service.system_wide_window_list() {
                Ok(entries) => Some(entries),
                Err(e) => {
                    warn!(event = "core.identity.system_list_failed", error = %e);
                    None
                }
            })
            .as_deref()
    }

    pub fn was_fetched(&self) -> bool {
        self.system_list.get().is_some()
    }

    /// Every identity present in the system list, if it was fetched and
    /// succeeded. Does not trigger a fetch.
    pub fn confirmed_live_ids(&self) -> Option<HashSet<ExternalWindowId>> {
        let entries = self.system_list.get()?.as_ref()?;
        Some(
            entries
                .iter()
                .map(|e| ExternalWindowId::new(e.owner, e.number))
                .collect(),
        )
    }

    pub fn is_claimed(&self, id: &ExternalWindowId) -> bool {
        self.claimed.borrow().contains(id)
    }

    pub(crate) fn claim(&self, id: ExternalWindowId) {
        self.claimed.borrow_mut().insert(id);
    }
}
