//! Main application entry point.
//!
//! Parses the command line and dispatches to the matching command handler or to
//! the [`CoopDoor`] runner. Errors are printed with their full context chain.

use anyhow::Result;

use coopdoor::args::{self, CliAction, ParsedArgs};
use coopdoor::commands;
use coopdoor::config;
use coopdoor::constants::EXIT_FAILURE;
use coopdoor::{CoopDoor, log_error_exit};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    if let Err(e) = dispatch(parsed_args.action) {
        log_error_exit!("{e}");
        for cause in e.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(EXIT_FAILURE);
    }
}

fn dispatch(action: CliAction) -> Result<()> {
    match action {
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            config::set_config_dir(config_dir)?;
            CoopDoor::new(debug_enabled).run()
        }
        CliAction::Schedule {
            debug_enabled,
            config_dir,
            date,
        } => {
            config::set_config_dir(config_dir)?;
            coopdoor::logger::Log::set_debug_enabled(debug_enabled);
            commands::schedule::handle_schedule_command(date.as_deref())
        }
        CliAction::Simulate {
            debug_enabled,
            config_dir,
            start_time,
            end_time,
            multiplier,
        } => {
            config::set_config_dir(config_dir)?;
            let config = config::Config::load()?;
            commands::simulate::handle_simulate_command(
                &config,
                &start_time,
                &end_time,
                multiplier,
            )?;
            CoopDoor::new(debug_enabled)
                .with_config(config)
                .without_lock()
                .without_headers()
                .simulated()
                .run()
        }
        CliAction::HelpCommand { command } => {
            commands::help::run_help_command(command.as_deref())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
    }
}
