//! shutterd binary: argument dispatch only; everything else lives in the library.

use shutterd::Shutterd;
use shutterd::args::{self, CliAction, ParsedArgs};
use shutterd::commands;
use shutterd::config;
use shutterd::constants::EXIT_FAILURE;
use shutterd::logger::Log;
use shutterd::{log_end, log_error, log_error_exit, log_pipe};

fn main() {
    let parsed_args = ParsedArgs::from_env();

    let result = match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp => {
            args::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError(message) => {
            log_pipe!();
            log_error!("{message}");
            args::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => config::set_config_dir(config_dir)
            .and_then(|()| Shutterd::new(debug_enabled).run()),
        CliAction::Plan {
            debug_enabled,
            config_dir,
            date,
            json,
        } => {
            Log::set_debug_enabled(debug_enabled);
            config::set_config_dir(config_dir)
                .and_then(|()| commands::plan::handle_plan_command(date, json))
        }
    };

    if let Err(e) = result {
        Log::set_enabled(true);
        log_error_exit!("{e:#}");
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }
}
