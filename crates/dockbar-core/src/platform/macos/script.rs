//! AppleScript fallbacks routed through System Events.

use std::process::Command;

use tracing::warn;

use crate::window::WindowServiceError;

fn process_clause(pid: i32) -> String {
    format!("(first process whose unix id is {})", pid)
}

/// AppleScript string literal body: backslashes and quotes escaped.
fn quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

pub(super) fn activate_script(pid: i32) -> String {
    format!(
        r#"tell application "System Events" to set frontmost of {} to true"#,
        process_clause(pid)
    )
}

/// Set `AXMinimized` on the owner's window named `title`, leaving focus
/// alone. `None` for an untitled window, which no name filter can single out.
pub(super) fn minimize_script(pid: i32, title: &str) -> Option<String> {
    if title.is_empty() {
        return None;
    }
    Some(format!(
        r#"tell application "System Events"
    tell {}
        set value of attribute "AXMinimized" of (first window whose name is "{}") to true
    end tell
end tell"#,
        process_clause(pid),
        quoted(title)
    ))
}

pub(super) fn run(script: &str, pid: i32) -> Result<(), WindowServiceError> {
    match Command::new("osascript").arg("-e").arg(script).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let hint = if stderr.contains("not allowed") || stderr.contains("permission") {
                " (check System Settings > Privacy & Security > Automation)"
            } else if stderr.contains("Can't get") {
                " (is the app running?)"
            } else {
                ""
            };
            warn!(
                event = "core.platform.script_failed",
                pid = pid,
                stderr = %stderr
            );
            Err(WindowServiceError::ScriptFailed {
                reason: format!("{}{}", stderr, hint),
            })
        }
        Err(e) => Err(WindowServiceError::ScriptFailed {
            reason: format!("failed to run osascript: {}", e),
        }),
    }
}
