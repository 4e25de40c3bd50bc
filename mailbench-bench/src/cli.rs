use clap::Parser;
use mailbench_common::{resolve_server_addr, DEFAULT_PORT};

use crate::payload::BodyMode;
use crate::stats::SampleFilter;

pub const DEFAULT_BUCKETS: u16 = 6;

#[derive(Parser, Debug)]
#[command(name = "mailbench", version, about = "Mail service latency microbenchmark")]
pub struct Args {
    /// Mail service address: `host` or `host:port` (port defaults to 65111)
    pub server_address: String,

    /// Number of messages to send
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub count: u64,

    /// Recipient
    pub to: String,

    /// Sender
    pub from: String,

    /// Body size in bytes, or the body text itself with `--body-mode literal`.
    /// Text starting with `-` is taken as the body; use `--` before it if it matches an option name
    #[arg(allow_hyphen_values = true)]
    pub body: String,

    /// How to interpret <BODY>
    #[arg(long, value_enum, default_value_t = BodyMode::Size)]
    pub body_mode: BodyMode,

    /// Number of standard-deviation buckets in the percentile table
    #[arg(long, default_value_t = DEFAULT_BUCKETS, value_parser = clap::value_parser!(u16).range(1..=64))]
    pub buckets: u16,

    /// Keep zero-duration samples in the statistics
    #[arg(long)]
    pub include_non_positive: bool,
}

impl Args {
    pub fn server_addr(&self) -> String {
        resolve_server_addr(&self.server_address, DEFAULT_PORT)
    }

    pub fn filter(&self) -> SampleFilter {
        SampleFilter::from_include_non_positive(self.include_non_positive)
    }
}
