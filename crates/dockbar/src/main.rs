use std::process::ExitCode;

use dockbar_core::{WindowServiceError, init_logging};

mod app;
mod commands;
mod table;

/// Exit status when windows could not be read at all: no permission, no
/// backend for this platform, or enumeration failing outright.
const EXIT_NO_WINDOW_ACCESS: u8 = 2;

fn main() -> ExitCode {
    let matches = app::build_cli().get_matches();

    // Quiet must be known before the subscriber is installed
    init_logging(matches.get_flag("quiet"));

    match commands::run_command(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        // Already reported by the command with a permission hint.
        Err(e) if e.downcast_ref::<WindowServiceError>().is_some() => {
            ExitCode::from(EXIT_NO_WINDOW_ACCESS)
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}
