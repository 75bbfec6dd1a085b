//! Running GUI applications, found through their bundle executables.

use std::path::Path;

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use crate::window::{OwnerId, OwnerInfo};

const BUNDLE_EXECUTABLE_DIR: &str = ".app/Contents/MacOS/";

/// The bundle name for a top-level application executable.
///
/// Helpers nested inside another bundle (`Foo.app/.../Bar.app/...`) are not
/// applications the user sees and yield `None`.
fn bundle_name(exe: &Path) -> Option<String> {
    let path = exe.to_str()?;
    if path.matches(".app/").count() != 1 {
        return None;
    }
    let bundle_end = path.find(BUNDLE_EXECUTABLE_DIR)?;
    let bundle_path = &path[..bundle_end];
    let name = bundle_path.rsplit('/').next()?;
    (!name.is_empty()).then(|| name.to_string())
}

pub(super) fn running_applications() -> Vec<OwnerInfo> {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
    );

    let mut owners: Vec<OwnerInfo> = system
        .processes()
        .iter()
        .filter_map(|(pid, process)| {
            let name = bundle_name(process.exe()?)?;
            let pid = i32::try_from(pid.as_u32()).ok()?;
            Some(OwnerInfo {
                id: OwnerId(pid),
                name,
            })
        })
        .collect();
    owners.sort_by_key(|o| o.id.pid());
    owners
}
