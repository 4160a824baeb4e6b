use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    ticketwatch::logging::init().context("init logging")?;

    let cli = ticketwatch::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        ticketwatch::cli::Command::Snapshot(args) => {
            ticketwatch::snapshot::run(args).await.context("snapshot")?;
        }
        ticketwatch::cli::Command::Replay(args) => {
            ticketwatch::snapshot::replay(args).await.context("replay")?;
        }
    }

    Ok(())
}
