use color_eyre::eyre::eyre;
use color_eyre::Result;

use parlor::cli::{parse_args, run_ask, run_cli_command, CliCommand};
use parlor::config::ClientConfig;
use parlor::models::TurnStatus;

/// Exit code for a turn aborted with Ctrl-C
const EXIT_ABORTED: i32 = 130;

/// Log to stderr so stdout carries only the reply.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("parlor=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let command = parse_args(std::env::args());
    if let Some(result) = run_cli_command(&command) {
        return result;
    }
    let CliCommand::Ask(args) = command else {
        return Ok(());
    };

    init_logging();

    let config = ClientConfig::from_env();
    tracing::debug!("Using endpoint {}", config.stream_url());

    let outcome = run_ask(args, config).await?;
    match outcome.status {
        TurnStatus::Done => Ok(()),
        TurnStatus::Aborted => std::process::exit(EXIT_ABORTED),
        status => match outcome.error {
            Some(err) => Err(eyre!(err)),
            None => Err(eyre!("Turn ended in state {}", status)),
        },
    }
}
