use std::sync::Arc;

use clap::ArgMatches;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use dockbar_core::config::DockbarConfig;
use dockbar_core::events::{self, RunMode};
use dockbar_core::platform;
use dockbar_core::view::{group_by_app, windows_for_display};
use dockbar_core::{
    CapabilityStatus, DockbarError, EngineHandle, EngineNotice, EngineOptions, ScanEngine,
    ScanSnapshot, WindowService, WindowServiceError,
};

use crate::table::{TableFormatter, WindowRow};

/// Load configuration with warning on errors.
///
/// Falls back to defaults if config loading fails, but notifies the user via:
/// - stderr message for immediate visibility
/// - structured log event `cli.config.load_failed` for debugging
fn load_config_with_warning() -> DockbarConfig {
    match DockbarConfig::load_hierarchy() {
        Ok(config) => config,
        Err(e) => {
            let tip = if e.is_validation() {
                "Tip: Fix the value named above in ~/.dockbar/config.toml or $DOCKBAR_CONFIG."
            } else {
                "Tip: Check ~/.dockbar/config.toml and $DOCKBAR_CONFIG for syntax errors."
            };
            eprintln!("Warning: Could not load config: {}. Using defaults.\n{}", e, tip);
            warn!(
                event = "cli.config.load_failed",
                code = e.error_code(),
                error = %e,
                "Config load failed, using defaults"
            );
            DockbarConfig::default()
        }
    }
}

fn apply_watch_overrides(config: &mut DockbarConfig, matches: &ArgMatches) {
    if let Some(height) = matches.get_one::<f64>("bar-height") {
        config.taskbar.bar_height = Some(*height);
    }
    if matches.get_flag("no-edge-guard") {
        config.edge_guard.enabled = Some(false);
    }
    if matches.get_flag("allow-terminate") {
        config.actions.allow_terminate_on_close = Some(true);
    }
}

fn window_service(mode: RunMode) -> Result<Arc<dyn WindowService>, Box<dyn std::error::Error>> {
    platform::default_service().map_err(|e| {
        eprintln!("❌ Window access unavailable: {}", e);
        events::log_run_failed(mode, &e);
        e.into()
    })
}

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        Some(("watch", sub_matches)) => {
            events::log_run_started(RunMode::Watch);
            handle_watch_command(sub_matches)
        }
        Some(("list", sub_matches)) => {
            events::log_run_started(RunMode::List);
            handle_list_command(sub_matches)
        }
        Some(("config", _)) => {
            events::log_run_started(RunMode::Config);
            handle_config_command()
        }
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

fn handle_config_command() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning();
    print!("{}", toml::to_string_pretty(&config.effective())?);
    events::log_run_finished(RunMode::Config, 0);
    Ok(())
}

fn handle_list_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    info!(event = "cli.list_started", json_output = json_output);

    let config = load_config_with_warning();
    let service = window_service(RunMode::List)?;
    let scanner = ScanEngine::new(service, &config.filter.excluded_apps);
    let outcome = scanner.scan(&ScanSnapshot::default());

    if let CapabilityStatus::Degraded { reason } = &outcome.capability {
        eprintln!("❌ Window access unavailable: {}", reason);
        let failure = WindowServiceError::EnumerationFailed {
            reason: reason.clone(),
        };
        events::log_run_failed(RunMode::List, &failure);
        return Err(failure.into());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&outcome.candidates)?);
    } else if outcome.candidates.is_empty() {
        println!("No windows found.");
    } else {
        let rows: Vec<WindowRow> = outcome.candidates.iter().map(WindowRow::from).collect();
        TableFormatter::new(&rows).print_table(&rows);
    }

    info!(
        event = "cli.list_completed",
        rejected = outcome.stats.rejected,
        unresolved = outcome.stats.unresolved
    );
    events::log_run_finished(RunMode::List, outcome.candidates.len());
    Ok(())
}

fn handle_watch_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let mut config = load_config_with_warning();
    apply_watch_overrides(&mut config, matches);
    config.validate()?;

    let service = window_service(RunMode::Watch)?;
    if !service.is_trusted() && !service.request_trust() {
        eprintln!(
            "Waiting for accessibility permission (System Settings > Privacy & Security > Accessibility)..."
        );
    }

    info!(event = "cli.watch_started", json_output = json_output);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch(service, EngineOptions::from(&config), json_output))
}

async fn watch(
    service: Arc<dyn WindowService>,
    options: EngineOptions,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = EngineHandle::start(service, options);
    let mut snapshots = engine.subscribe();
    let mut status = engine.status_receiver();
    let mut notices = engine.notices();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut delivered = 0usize;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_snapshot(&snapshot, json_output)?;
                delivered += 1;
            }

            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                match status.borrow_and_update().clone() {
                    CapabilityStatus::Ready => eprintln!("✅ Window access available"),
                    CapabilityStatus::Degraded { reason } => {
                        eprintln!("⚠️  Degraded: {}", reason)
                    }
                }
            }

            notice = notices.recv() => match notice {
                Ok(notice) => print_notice(&notice),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(event = "cli.watch.notices_lagged", skipped = skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    engine.stop().await?;
    events::log_run_finished(RunMode::Watch, delivered);
    Ok(())
}

fn print_snapshot(
    snapshot: &ScanSnapshot,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        println!("{}", serde_json::to_string(snapshot)?);
        return Ok(());
    }

    let mut displays: Vec<_> = snapshot.records.iter().map(|r| r.display_id).collect();
    displays.sort_unstable();
    displays.dedup();

    println!(
        "── generation {} · update {} · {} windows",
        snapshot.generation,
        snapshot.sequence,
        snapshot.len()
    );
    for display_id in displays {
        let visible = windows_for_display(snapshot, display_id);
        println!("Display {}:", display_id);
        for group in group_by_app(&visible) {
            let titles: Vec<String> = group
                .windows
                .iter()
                .map(|r| {
                    if r.minimized {
                        format!("({})", r.title)
                    } else {
                        r.title.clone()
                    }
                })
                .collect();
            println!("  {}: {}", group.app_name, titles.join(" | "));
        }
    }
    Ok(())
}

fn print_notice(notice: &EngineNotice) {
    match notice {
        EngineNotice::ActionFailed { local_id, error } => {
            eprintln!("❌ {} ({})", error, local_id);
        }
        EngineNotice::WindowTerminated { app, .. } => {
            eprintln!("⚠️  Terminated {} to close its window", app);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_cli;

    #[test]
    fn test_watch_overrides_applied() {
        let matches = build_cli()
            .try_get_matches_from([
                "dockbar",
                "watch",
                "--bar-height",
                "48",
                "--no-edge-guard",
                "--allow-terminate",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        let mut config = DockbarConfig::default();
        apply_watch_overrides(&mut config, sub);
        let options = EngineOptions::from(&config);
        assert_eq!(options.band_heights.height_for(1), 48.0);
        assert!(!options.edge_guard);
        assert!(options.allow_terminate_on_close);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let matches = build_cli()
            .try_get_matches_from(["dockbar", "watch"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        let mut config = DockbarConfig::default();
        apply_watch_overrides(&mut config, sub);
        assert_eq!(config, DockbarConfig::default());
    }
}
