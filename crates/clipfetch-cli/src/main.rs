use clipfetch_core::logging;

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible.
    logging::init();

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("clipfetch error: {:#}", err);
        std::process::exit(1);
    }
}
