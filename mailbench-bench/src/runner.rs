use mailbench_client::{Client, PreparedMessage};
use mailbench_common::{Ack, MailError, Message};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::stats::{SampleRecorder, SampleSet};

/// Upper bound on how many sample slots are reserved before the run starts.
const PREALLOC_LIMIT: u64 = 1 << 20;

/// The single RPC a run exercises.
///
/// `prepare` runs once before timing starts; `send` is the timed round trip.
pub trait MailTransport {
    type Prepared;

    fn prepare(&self, message: &Message) -> mailbench_common::Result<Self::Prepared>;

    fn send(&self, prepared: &Self::Prepared) -> impl Future<Output = mailbench_common::Result<Ack>>;
}

impl MailTransport for Client {
    type Prepared = PreparedMessage;

    fn prepare(&self, message: &Message) -> mailbench_common::Result<PreparedMessage> {
        PreparedMessage::new(message)
    }

    fn send(&self, prepared: &PreparedMessage) -> impl Future<Output = mailbench_common::Result<Ack>> {
        self.send_prepared(prepared)
    }
}

/// Everything a completed run measured.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub samples: SampleSet,
    /// Wall-clock time from the first send to the last acknowledgement.
    pub elapsed: Duration,
    /// Body bytes sent across all calls.
    pub bytes_sent: u64,
}

impl RunOutcome {
    pub fn operations(&self) -> u64 {
        self.samples.len() as u64
    }

    /// Completed operations per second; 0 when no time elapsed.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.operations() as f64 / secs
        } else {
            0.0
        }
    }
}

#[derive(Debug, Error)]
#[error("Message {} of {requested} failed: {source}", .completed + 1)]
pub struct RunError {
    /// Calls acknowledged before the failure.
    pub completed: u64,
    pub requested: u64,
    pub source: MailError,
}

/// Send `message` `count` times, one call at a time, timing each round trip.
/// The first failed call ends the run; a message that cannot be prepared fails before any call.
pub async fn run<T: MailTransport>(transport: &T, message: &Message, count: u64) -> Result<RunOutcome, RunError> {
    let prepared = transport
        .prepare(message)
        .map_err(|source| RunError { completed: 0, requested: count, source })?;
    let mut recorder = SampleRecorder::with_capacity(count.min(PREALLOC_LIMIT) as usize);
    info!(count, body_bytes = message.body.len(), "starting run");

    let run_start = Instant::now();
    for i in 0..count {
        let op_start = Instant::now();
        if let Err(source) = transport.send(&prepared).await {
            warn!(completed = i, error = %source, "send failed, aborting run");
            return Err(RunError { completed: i, requested: count, source });
        }
        let op_elapsed = op_start.elapsed();
        trace!(call = i, ns = op_elapsed.as_nanos() as u64, "call complete");
        recorder.record(op_elapsed);
    }
    let elapsed = run_start.elapsed();

    info!(count, elapsed_ms = elapsed.as_secs_f64() * 1_000.0, "run finished");
    Ok(RunOutcome {
        samples: recorder.freeze(),
        elapsed,
        bytes_sent: count.saturating_mul(message.body.len() as u64),
    })
}
