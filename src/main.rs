//! relnote binary entry point.

use std::process::ExitCode;

use relnote::cli::{self, Cli};
use relnote::ui::{logging, output};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let verbosity = output::Verbosity::from_flags(cli.quiet, cli.debug);
    logging::init_logging(verbosity.log_level());

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
