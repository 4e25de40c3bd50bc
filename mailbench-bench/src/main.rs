use clap::error::ErrorKind;
use clap::Parser;
use mailbench_bench::cli::Args;
use mailbench_bench::payload::build_body;
use mailbench_bench::{report, runner};
use mailbench_client::{Client, ClientConfig};
use mailbench_common::Message;
use std::process;
use tracing_subscriber::EnvFilter;

// Exit codes: 1 usage, 2 connection failure, 3 send failure during the run.
const EXIT_USAGE: i32 = 1;
const EXIT_CONNECT: i32 = 2;
const EXIT_SEND: i32 = 3;

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            e.print().ok();
            process::exit(EXIT_USAGE);
        }
    };

    // Default to warn so log lines do not interleave with the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let body = build_body(&args.body, args.body_mode).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(EXIT_USAGE);
    });
    let message = Message::new(args.to.clone(), args.from.clone(), body);

    let client = Client::connect(ClientConfig { server_addr: args.server_addr() })
        .await
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(EXIT_CONNECT);
        });
    println!("Client built, connected to {}", client.config.server_addr);

    let outcome = runner::run(&client, &message, args.count).await;
    // Release the connection before any exit below.
    drop(client);

    match outcome {
        Ok(outcome) => print!("{}", report::render(&outcome, args.buckets as usize, args.filter())),
        Err(e) => {
            eprintln!("{e}");
            process::exit(EXIT_SEND);
        }
    }
}
