use std::process::ExitCode;

use scripts::{parse_config, report, run, MidenToolchain, RegressionInput};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match parse_config(std::env::args_os()) {
        Ok(config) => config,
        Err(status) => return ExitCode::from(status),
    };

    let input = match RegressionInput::sample() {
        Ok(input) => input,
        Err(err) => {
            error!(%err, "invalid sample input");
            return ExitCode::FAILURE;
        }
    };

    let mut toolchain = match MidenToolchain::connect(&config).await {
        Ok(toolchain) => toolchain,
        Err(err) => {
            error!(error = ?err, "failed to set up the Miden client");
            return ExitCode::FAILURE;
        }
    };

    let result = run(&mut toolchain, &input).await;
    ExitCode::from(report(result, &mut std::io::stdout().lock()))
}
