use sysinfo::{Pid as SysinfoPid, ProcessesToUpdate, Signal, System};
use tracing::{debug, info};

use crate::process::errors::ProcessError;

/// Minimum length required for prefix matching, so short names like "sh"
/// never match "bash".
const MIN_PREFIX_MATCH_LENGTH: usize = 5;

fn to_sysinfo_pid(pid: i32) -> Result<(u32, SysinfoPid), ProcessError> {
    let raw = u32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .ok_or(ProcessError::InvalidPid { pid })?;
    Ok((raw, SysinfoPid::from_u32(raw)))
}

fn refreshed(pid: SysinfoPid) -> System {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system
}

fn extract_base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Whether a process name plausibly belongs to the application the user
/// saw in the bar.
///
/// Matching is exact, then base name, then case-insensitive (bundle
/// display names and executable names differ in case for some apps), then
/// prefix for names of at least [`MIN_PREFIX_MATCH_LENGTH`] characters.
fn process_name_matches(actual_name: &str, expected_name: &str) -> bool {
    if actual_name == expected_name {
        return true;
    }

    let actual_base = extract_base_name(actual_name);
    let expected_base = extract_base_name(expected_name);

    if actual_base == expected_base || actual_base.eq_ignore_ascii_case(expected_base) {
        return true;
    }

    if expected_base.len() >= MIN_PREFIX_MATCH_LENGTH && actual_base.starts_with(expected_base) {
        debug!(
            event = "core.process.prefix_match",
            actual = actual_name,
            expected = expected_name
        );
        return true;
    }

    false
}

/// Ask a process to quit, falling back to a hard kill where SIGTERM is not
/// available. Refuses when the PID no longer belongs to `expected_name`.
pub fn terminate_process(pid: i32, expected_name: &str) -> Result<(), ProcessError> {
    let (raw, pid_obj) = to_sysinfo_pid(pid)?;
    let system = refreshed(pid_obj);
    let process = system
        .process(pid_obj)
        .ok_or(ProcessError::NotFound { pid: raw })?;

    let actual_name = process.name().to_string_lossy().to_string();
    if !process_name_matches(&actual_name, expected_name) {
        return Err(ProcessError::PidReused {
            pid: raw,
            expected: expected_name.to_string(),
            actual: actual_name,
        });
    }

    let sent = match process.kill_with(Signal::Term) {
        Some(sent) => sent,
        None => process.kill(),
    };
    if !sent {
        return Err(ProcessError::TerminateFailed {
            pid: raw,
            message: "signal delivery failed".to_string(),
        });
    }

    info!(
        event = "core.process.terminate_completed",
        pid = raw,
        name = %actual_name
    );
    Ok(())
}
