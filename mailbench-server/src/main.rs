use clap::Parser;
use mailbench_common::DEFAULT_PORT;
use mailbench_server::config::{DEFAULT_HOST, DEFAULT_LOG_DIRECTIVE};
use mailbench_server::{Server, ServerConfig};
use std::net::{IpAddr, SocketAddr};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mailbench-server", about = "Mail service used as the MailBench target")]
struct Args {
    /// Interface to bind.
    #[arg(long, default_value = DEFAULT_HOST)]
    host: IpAddr,

    /// TCP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
        )
        .init();

    let config = ServerConfig {
        address: SocketAddr::new(args.host, args.port),
    };

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

    // Print "Listening on <addr>" once the server signals it is bound.
    tokio::spawn(async move {
        if let Ok(addr) = ready_rx.await {
            println!("Listening on {}", addr);
        }
    });

    Server::new(config).run(ready_tx).await?;
    Ok(())
}
