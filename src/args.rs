//! Command-line argument parsing.
//!
//! ```text
//! shutterd [--debug] [--config <dir>]
//! shutterd plan [YYYY-MM-DD] [--json] [--config <dir>]
//! shutterd --help | --version
//! ```

use chrono::NaiveDate;

/// What the binary should do.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon.
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print the resolved trigger plan for a date and exit.
    Plan {
        debug_enabled: bool,
        config_dir: Option<String>,
        /// Today when absent.
        date: Option<NaiveDate>,
        json: bool,
    },
    ShowHelp,
    ShowVersion,
    /// Unknown or malformed arguments; the message says which.
    ShowHelpDueToError(String),
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse arguments, the first of which is the program name.
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let action = match parse_action(args.into_iter().skip(1).map(|s| s.as_ref().to_string()))
        {
            Ok(action) => action,
            Err(message) => CliAction::ShowHelpDueToError(message),
        };
        ParsedArgs { action }
    }

    /// Parse the arguments of the current process.
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

fn parse_action(mut args: impl Iterator<Item = String>) -> Result<CliAction, String> {
    let mut debug_enabled = false;
    let mut json = false;
    let mut config_dir: Option<String> = None;
    let mut positionals: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(CliAction::ShowHelp),
            "--version" | "-V" | "-v" => return Ok(CliAction::ShowVersion),
            "--debug" | "-d" => debug_enabled = true,
            "--json" => json = true,
            "--config" | "-c" => match args.next() {
                Some(dir) if !dir.starts_with('-') => config_dir = Some(dir),
                _ => return Err(format!("{arg} requires a directory")),
            },
            _ if arg.starts_with('-') => return Err(format!("Unknown option: {arg}")),
            _ => positionals.push(arg),
        }
    }

    match positionals.split_first() {
        None if json => Err("--json is only valid with 'plan'".to_string()),
        None => Ok(CliAction::Run {
            debug_enabled,
            config_dir,
        }),
        Some((command, rest)) if command == "plan" => {
            let date = match rest {
                [] => None,
                [date] => Some(
                    NaiveDate::parse_from_str(date, "%Y-%m-%d")
                        .map_err(|_| format!("Invalid date '{date}', expected YYYY-MM-DD"))?,
                ),
                _ => return Err("'plan' takes at most one date".to_string()),
            };
            Ok(CliAction::Plan {
                debug_enabled,
                config_dir,
                date,
                json,
            })
        }
        Some((command, _)) => Err(format!("Unknown command: {command}")),
    }
}

/// Print the version line and the package description.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    println!("┗ {}", env!("CARGO_PKG_DESCRIPTION"));
}

/// Print usage information.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("shutterd [OPTIONS] [COMMAND]");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("plan [YYYY-MM-DD]      Print the triggers a date would arm, then exit");
    log_indented!("     --json            Print the plan as JSON");
    log_block_start!("Signals:");
    log_indented!("SIGUSR2                Reload the configuration and recompute");
    log_indented!("SIGINT, SIGTERM        Disarm all triggers and exit");
    log_end!();
}
