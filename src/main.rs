use clap::Parser;
use comicgen::config::{ComicConfig, setup_logging};
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = comicgen::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let config = ComicConfig::from(&cli.services);
    if let Err(err) = comicgen::web::setup_server(&cli.listen_address, cli.port, &config).await {
        error!("Application error: {}", err);
    }
}
