use clap::Parser;
use schoolsite_media_lib::cli::{self, Cli};
use schoolsite_media_lib::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logger(cli.config.log_level)?;
    cli::run(cli).await
}
