use crate::runner::RunOutcome;
use crate::stats::{percentile_buckets, SampleFilter, StatsError, SummaryStats};

pub fn ns_to_ms(ns: f64) -> f64 {
    ns / 1_000_000.0
}

pub fn bytes_to_kb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Render the console report for a finished run.
pub fn render(outcome: &RunOutcome, buckets: usize, filter: SampleFilter) -> String {
    let mut lines = Vec::new();
    let elapsed_secs = outcome.elapsed.as_secs_f64();

    lines.push("MailBench Results".to_string());
    lines.push("=================".to_string());
    lines.push(format!("Elapsed time:          {:.3} ms", elapsed_secs * 1_000.0));
    lines.push(format!("Messages:              {}", outcome.operations()));
    lines.push(format!("Throughput:            {:.1} entries/sec", outcome.throughput()));
    lines.push(String::new());

    let samples = outcome.samples.as_slice();
    match SummaryStats::from_samples(samples, filter) {
        Ok(summary) => {
            render_latency(&mut lines, &summary, samples.len(), filter);
            lines.push(String::new());
            render_buckets(&mut lines, samples, buckets, filter);
        }
        Err(StatsError::EmptySamples) => {
            lines.push(match filter {
                SampleFilter::PositiveOnly => "No positive samples recorded; latency statistics unavailable.",
                SampleFilter::All => "No samples recorded; latency statistics unavailable.",
            }
            .to_string());
        }
    }
    lines.push(String::new());

    let mb_per_sec = if elapsed_secs > 0.0 {
        bytes_to_mb(outcome.bytes_sent) / elapsed_secs
    } else {
        0.0
    };
    lines.push(format!(
        "Bandwidth:             {:.1} KB ({:.2} MB) at {:.2} MB/sec",
        bytes_to_kb(outcome.bytes_sent),
        bytes_to_mb(outcome.bytes_sent),
        mb_per_sec,
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn render_latency(lines: &mut Vec<String>, summary: &SummaryStats, total: usize, filter: SampleFilter) {
    match filter {
        SampleFilter::PositiveOnly => {
            lines.push(format!("Per-call latency ({} of {} samples positive)", summary.count, total))
        }
        SampleFilter::All => lines.push(format!("Per-call latency ({} samples)", summary.count)),
    }
    lines.push(format!("  Average:             {:.3} ms", ns_to_ms(summary.mean)));
    lines.push(format!("  Min:                 {:.3} ms", ns_to_ms(summary.min as f64)));
    lines.push(format!("  Max:                 {:.3} ms", ns_to_ms(summary.max as f64)));
    lines.push(format!("  Stddev:              {:.3} ms", ns_to_ms(summary.stddev)));
}

fn render_buckets(lines: &mut Vec<String>, samples: &[u64], n: usize, filter: SampleFilter) {
    let buckets = match percentile_buckets(samples, n, filter) {
        Ok(b) => b,
        Err(StatsError::EmptySamples) => return,
    };

    lines.push("Percentile    Response time".to_string());
    for (i, cumulative) in buckets.cumulative.iter().enumerate() {
        let k = i + 1;
        lines.push(format!(
            "  {:>7.3}%   <= {:.3} ms  (±{}σ)",
            cumulative,
            ns_to_ms(buckets.upper_bound_ns(k)),
            k,
        ));
    }
    lines.push(format!("  {:>7.3}%   exceeding {}σ", buckets.exceeding(), buckets.len()));
}
