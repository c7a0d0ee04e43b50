//! Command-line argument parsing.
//!
//! Arguments are parsed by hand into a [`CliAction`]. Global flags (`--debug`,
//! `--config DIR`) may appear before or after the command. Help and version
//! flags take precedence over everything else.

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the controller (no command, or `run`)
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print solar times and the schedule for a day
    Schedule {
        debug_enabled: bool,
        config_dir: Option<String>,
        /// `YYYY-MM-DD`; today when absent
        date: Option<String>,
    },
    /// Run against the simulated board and a simulated clock
    Simulate {
        debug_enabled: bool,
        config_dir: Option<String>,
        start_time: String,
        end_time: String,
        /// 0 = fast-forward
        multiplier: f64,
    },
    /// Detailed help for one command, or the command list
    HelpCommand { command: Option<String> },
    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to bad arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse `args`, including the program name in first position.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        ParsedArgs {
            action: Self::parse_action(&args_vec),
        }
    }

    fn parse_action(args_vec: &[String]) -> CliAction {
        let mut debug_enabled = false;
        let mut config_dir: Option<String> = None;
        let mut positional: Vec<&str> = Vec::new();
        let mut unknown_arg_found = false;

        let mut idx = 0;
        while idx < args_vec.len() {
            let arg = args_vec[idx].as_str();
            match arg {
                "--help" | "-h" => return CliAction::ShowHelp,
                "--version" | "-V" | "-v" => return CliAction::ShowVersion,
                "--debug" | "-d" => debug_enabled = true,
                "--config" | "-c" => match args_vec.get(idx + 1) {
                    Some(dir) if !dir.starts_with('-') => {
                        config_dir = Some(dir.clone());
                        idx += 1;
                    }
                    _ => {
                        log_warning!("Missing directory for {arg}");
                        unknown_arg_found = true;
                    }
                },
                _ if arg.starts_with('-') && arg.parse::<f64>().is_err() => {
                    log_warning!("Unknown argument: {arg}");
                    unknown_arg_found = true;
                }
                _ => positional.push(arg),
            }
            idx += 1;
        }

        if unknown_arg_found {
            return CliAction::ShowHelpDueToError;
        }

        let Some((command, rest)) = positional.split_first() else {
            return CliAction::Run {
                debug_enabled,
                config_dir,
            };
        };

        match *command {
            "run" => {
                if let Some(extra) = rest.first() {
                    log_warning!("Unexpected argument for run: {extra}");
                    return CliAction::ShowHelpDueToError;
                }
                CliAction::Run {
                    debug_enabled,
                    config_dir,
                }
            }
            "schedule" | "s" => match rest {
                [] => CliAction::Schedule {
                    debug_enabled,
                    config_dir,
                    date: None,
                },
                [date] => CliAction::Schedule {
                    debug_enabled,
                    config_dir,
                    date: Some(date.to_string()),
                },
                _ => {
                    log_warning!("Usage: coopdoor schedule [YYYY-MM-DD]");
                    CliAction::ShowHelpDueToError
                }
            },
            "simulate" | "S" => Self::parse_simulate(rest, debug_enabled, config_dir),
            "help" => CliAction::HelpCommand {
                command: rest.first().map(|c| c.to_string()),
            },
            "version" => CliAction::ShowVersion,
            other => {
                log_warning!("Unknown command: {other}");
                CliAction::ShowHelpDueToError
            }
        }
    }

    /// `simulate <start> <end> [multiplier]`, where each time is
    /// `"YYYY-MM-DD HH:MM[:SS]"` passed as one quoted argument.
    fn parse_simulate(
        rest: &[&str],
        debug_enabled: bool,
        config_dir: Option<String>,
    ) -> CliAction {
        let (start, end, multiplier) = match rest {
            [start, end] => (start, end, None),
            [start, end, multiplier] => (start, end, Some(multiplier)),
            _ => {
                log_warning!("Usage: coopdoor simulate <start> <end> [multiplier]");
                return CliAction::ShowHelpDueToError;
            }
        };

        let multiplier = match multiplier.map(|m| m.parse::<f64>()) {
            None => 0.0,
            Some(Ok(m)) if m >= 0.0 => m,
            _ => {
                log_warning!("Multiplier must be a number, 0 or more (0 = fast-forward)");
                return CliAction::ShowHelpDueToError;
            }
        };

        CliAction::Simulate {
            debug_enabled,
            config_dir,
            start_time: start.to_string(),
            end_time: end.to_string(),
            multiplier,
        }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("coopdoor [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("help [command]         Show detailed help for a command");
    log_indented!("run                    Run the door controller (default)");
    log_indented!("schedule, s [date]     Show solar times and schedule for a day");
    log_indented!("simulate, S <start> <end> [multiplier]");
    log_indented!("                       Run on the simulated board with simulated time");
    log_indented!("                       Times as \"YYYY-MM-DD HH:MM\", multiplier 0 = fast-forward");
    log_end!();
}
