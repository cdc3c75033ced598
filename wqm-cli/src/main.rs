//! WQM CLI - Command line tool for reservoir water-quality monitoring data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "wqm-cli",
    version,
    about = "Reservoir water-quality monitoring toolkit"
)]
struct Cli {
    #[command(flatten)]
    source: wqm_cmd::SourceArgs,

    #[command(subcommand)]
    command: wqm_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("data base {:?}, image base {:?}", cli.source.data, cli.source.images);
    wqm_cmd::run(&cli.source, cli.command).await
}
