use clap::{Arg, ArgAction, Command, value_parser};

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

pub fn build_cli() -> Command {
    Command::new("dockbar")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Per-display taskbar window list for macOS")
        .long_about(
            "dockbar keeps a stable, ordered list of the windows of other applications on \
             each display, and keeps them clear of the band reserved for the bar at the \
             bottom of the screen.",
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("watch")
                .about("Run the engine and print every published window list")
                .arg(json_arg().help("Print each snapshot as one JSON line"))
                .arg(
                    Arg::new("bar-height")
                        .long("bar-height")
                        .help("Reserved band height in points (overrides config)")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("no-edge-guard")
                        .long("no-edge-guard")
                        .help("Do not move windows out of the reserved band")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("allow-terminate")
                        .long("allow-terminate")
                        .help("Allow close requests to terminate the owning app as a last resort")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("Run one raw scan pass and print the candidate windows")
                .arg(json_arg()),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}
