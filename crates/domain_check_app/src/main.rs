use std::process::ExitCode;

use clap::Parser;
use domain_check_app::cli::Cli;
use engine_logging::{engine_error, LogDestination};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let destination = match &cli.log_file {
        Some(path) => LogDestination::TerminalAndFile(path.clone()),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(&destination, engine_logging::level_for_verbosity(cli.verbose));

    match domain_check_app::run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
