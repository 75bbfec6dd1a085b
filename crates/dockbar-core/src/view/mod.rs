//! Presentation helpers over a published snapshot: one bar per display,
//! optionally grouped by application.

use serde::Serialize;

use crate::window::{DisplayId, ScanSnapshot, WindowRecord};

/// Windows of one application, in published order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppGroup<'a> {
    pub app_name: &'a str,
    pub windows: Vec<&'a WindowRecord>,
}

/// The records a bar on `display_id` shows, in published order.
pub fn windows_for_display(snapshot: &ScanSnapshot, display_id: DisplayId) -> Vec<&WindowRecord> {
    snapshot
        .records
        .iter()
        .filter(|r| r.display_id == display_id)
        .collect()
}

/// Group records by owning application. Apps appear in the order of their
/// first window; windows keep their relative order within each app.
pub fn group_by_app<'a>(records: &[&'a WindowRecord]) -> Vec<AppGroup<'a>> {
    let mut groups: Vec<AppGroup<'a>> = Vec::new();
    for &record in records {
        match groups
            .iter_mut()
            .find(|g| g.app_name == record.owner_app_name)
        {
            Some(group) => group.windows.push(record),
            None => groups.push(AppGroup {
                app_name: &record.owner_app_name,
                windows: vec![record],
            }),
        }
    }
    groups
}
