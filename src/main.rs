//! Main entry point for the samplepack CLI app

use samplepack::cli_runner;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(e) = cli_runner::run_cli_app().await {
        eprintln!("Error: {}", e);
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}
