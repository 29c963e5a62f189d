use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Builder;
use tracing::debug;

use m365ctl::{cli::Cli, commands, context::CommandContext, output};

fn main() {
    // Logs go to stderr so stdout only carries command output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Commands issue one request at a time
    let runtime = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = cli.config();
    debug!("Using Graph at {}", config.graph_url);
    let output_format = config.output;

    let ctx = CommandContext::new(config, cli.access_token.clone())?;
    let result = commands::run(&cli.command, &ctx).await?;

    if let Some(rendered) = output::render(&result, output_format)? {
        println!("{}", rendered);
    }
    Ok(())
}
