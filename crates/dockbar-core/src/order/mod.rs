//! Order Keeper: insertion-stable ordering of published windows.
//!
//! Windows keep their first-seen relative order while they stay published.
//! Anything not in the prior order, including a window that was removed and
//! came back, is appended at the end.

use std::collections::HashMap;

use crate::window::{ExternalWindowId, WindowRecord};

/// Order `published` by `prior_order`, appending unknown ids in the order
/// they appear in `published`. Returns the ordered records and the new order.
pub fn reorder(
    published: Vec<WindowRecord>,
    prior_order: &[ExternalWindowId],
) -> (Vec<WindowRecord>, Vec<ExternalWindowId>) {
    let mut by_id: HashMap<ExternalWindowId, WindowRecord> =
        HashMap::with_capacity(published.len());
    let mut arrivals = Vec::new();
    for record in published {
        let id = record.external_id;
        if by_id.insert(id, record).is_none() {
            arrivals.push(id);
        }
    }

    let mut order = Vec::with_capacity(by_id.len());
    let mut ordered = Vec::with_capacity(by_id.len());

    for id in prior_order {
        if let Some(record) = by_id.remove(id) {
            order.push(*id);
            ordered.push(record);
        }
    }
    for id in arrivals {
        if let Some(record) = by_id.remove(&id) {
            order.push(id);
            ordered.push(record);
        }
    }

    (ordered, order)
}

/// Holds the current order between passes.
#[derive(Debug, Clone, Default)]
pub struct OrderKeeper {
    order: Vec<ExternalWindowId>,
}

impl OrderKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(&self) -> &[ExternalWindowId] {
        &self.order
    }

    pub fn apply(&mut self, published: Vec<WindowRecord>) -> Vec<WindowRecord> {
        let (ordered, order) = reorder(published, &self.order);
        self.order = order;
        ordered
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
