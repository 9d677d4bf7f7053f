mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use harvester_cli::follow::{self, Completion, FollowOptions, Input};
use harvester_cli::settings::{self, Overrides};
use harvester_reader::ReaderConfig;
use harvester_reader::source::stream::STDIN_NAME;

use cli::HarvesterCli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = HarvesterCli::parse();

    let overrides = Overrides {
        log_level: cli.log_level.clone(),
        log_format: cli.log_format.clone(),
    };
    let config = settings::load(cli.config.as_deref(), &overrides).await?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    logging::init_tracing(&config.general)?;

    let path = cli.path.context("a file path or '-' is required")?;
    let input = Input::from_arg(&path);
    let options = FollowOptions {
        reader: ReaderConfig::from_core(&config.reader),
        buffer_size: config.reader.buffer_size,
        from_end: cli.from_end,
    };

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    tracing::info!(input = %path.display(), "harvester starting");

    let mut stdout = tokio::io::stdout();
    let report = match &input {
        Input::Stdin => {
            follow::follow_stream(
                STDIN_NAME,
                tokio::io::stdin(),
                &options,
                &mut stdout,
                cancel,
            )
            .await?
        }
        Input::File(path) => follow::follow_file(path, &options, &mut stdout, cancel).await?,
    };

    tracing::info!(
        bytes = report.bytes,
        reopens = report.reopens,
        completion = ?report.completion,
        "harvester shut down"
    );

    // tokio's stdin reader thread would block runtime shutdown
    if input == Input::Stdin && report.completion == Completion::Cancelled {
        std::process::exit(0);
    }

    Ok(())
}
