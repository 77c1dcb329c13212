//! Process entry point: parse CLI configuration, install the logger, bring
//! the server up.

use clap::Parser;
use sorng_ftpd::config::{Cli, ServerConfig};
use sorng_ftpd::server::Server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ServerConfig::from(cli);

    log::info!("serving {} as /", config.root.display());
    let server = Server::bind(&config).await?;
    server.run().await
}
