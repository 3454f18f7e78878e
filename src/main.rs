use clap::Parser;
use macrobug::config::Config;
use macrobug::{logging, rpc};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = Config::parse();

    let _guard = match logging::init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("macrobug: could not set up logging: {e}");
            None
        }
    };

    match rpc::run_rpc_mode(config.session_options()) {
        Ok(()) => {
            tracing::info!("=== macrobug exiting ===");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "rpc loop failed");
            eprintln!("macrobug: {e}");
            ExitCode::FAILURE
        }
    }
}
