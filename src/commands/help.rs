//! Help command implementation for coopdoor.
//!
//! Shows command-specific help or the command list.

use anyhow::Result;

/// Show brief usage for a command (used for error messages)
pub fn show_command_usage(command: &str) {
    match command {
        "run" => log_block_start!("Usage: coopdoor [OPTIONS] run"),
        "schedule" | "s" => log_block_start!("Usage: coopdoor schedule [YYYY-MM-DD]"),
        "simulate" | "S" => {
            log_block_start!("Usage: coopdoor simulate <start> <end> [multiplier]")
        }
        _ => log_block_start!("Usage: coopdoor [OPTIONS] [COMMAND]"),
    }
}

/// Run the help command (dispatcher)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("run") => display_run_help(),
        Some("schedule") | Some("s") => super::schedule::display_help(),
        Some("simulate") | Some("S") => super::simulate::display_help(),
        Some("help") => display_help_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("help [COMMAND]          Show detailed help for a command");
    log_indented!("run                     Run the door controller (default)");
    log_indented!("schedule, s [date]      Show solar times and the day's schedule");
    log_indented!("simulate, S <start> <end> [multiplier]");
    log_indented!("                        Dry run on the simulated board");
    log_pipe!();
    log_info!("Use 'coopdoor help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'coopdoor --help' to see all options and general usage.");
    log_end!();
}

fn display_run_help() {
    log_version!();
    show_command_usage("run");
    log_block_start!("Description:");
    log_indented!("Runs the controller until SIGINT, SIGTERM or SIGHUP.");
    log_indented!("Opens the door at the opening event, toggles the interior light");
    log_indented!("before closing and closes the door at the closing event.");
    log_indented!("Front-panel buttons work at all times; the override button");
    log_indented!("suspends the automatic actions and lights the override LED.");
    log_block_start!("On shutdown:");
    log_indented!("The motor is halted and every relay and the LED switched off.");
    log_end!();
}

fn display_help_help() {
    log_version!();
    log_block_start!("Usage: coopdoor help [COMMAND]");
    log_indented!("Without a command, lists every command.");
    log_end!();
}
