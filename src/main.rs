use clap::Parser;
use std::process::ExitCode;
use vetpms_desktop_lib::core::config::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match vetpms_desktop_lib::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("vetpms-desktop: {error}");
            ExitCode::FAILURE
        }
    }
}
