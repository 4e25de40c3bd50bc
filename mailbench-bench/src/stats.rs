//! Latency statistics over per-call samples.
//!
//! Samples are round-trip durations in nanoseconds. Every statistic is a
//! population statistic over the whole (filtered) set; an empty set is an
//! error rather than a division by zero.

use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    #[error("no samples to summarize")]
    EmptySamples,
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// Which samples take part in a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFilter {
    /// Drop zero-duration samples before computing anything.
    #[default]
    PositiveOnly,
    All,
}

impl SampleFilter {
    pub fn from_include_non_positive(include: bool) -> Self {
        if include {
            SampleFilter::All
        } else {
            SampleFilter::PositiveOnly
        }
    }

    /// Borrow `samples` unchanged, or copy out only the positive ones.
    pub fn apply<'a>(&self, samples: &'a [u64]) -> Cow<'a, [u64]> {
        match self {
            SampleFilter::All => Cow::Borrowed(samples),
            SampleFilter::PositiveOnly if samples.iter().all(|&s| s > 0) => Cow::Borrowed(samples),
            SampleFilter::PositiveOnly => Cow::Owned(samples.iter().copied().filter(|&s| s > 0).collect()),
        }
    }
}

/// Collects one sample per call while a run is in progress.
#[derive(Debug, Default)]
pub struct SampleRecorder {
    samples: Vec<u64>,
}

impl SampleRecorder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { samples: Vec::with_capacity(capacity) }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.record_ns(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));
    }

    pub fn record_ns(&mut self, ns: u64) {
        self.samples.push(ns);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stop recording; the returned set cannot be modified.
    pub fn freeze(self) -> SampleSet {
        SampleSet { samples: self.samples }
    }
}

/// Immutable, ordered per-call samples of one run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleSet {
    samples: Vec<u64>,
}

impl SampleSet {
    pub fn as_slice(&self) -> &[u64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<u64>> for SampleSet {
    fn from(samples: Vec<u64>) -> Self {
        Self { samples }
    }
}

pub fn sum(samples: &[u64]) -> f64 {
    samples.iter().map(|&s| s as f64).sum()
}

pub fn mean(samples: &[u64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(StatsError::EmptySamples);
    }
    Ok(sum(samples) / samples.len() as f64)
}

pub fn min(samples: &[u64]) -> Result<u64> {
    samples.iter().copied().min().ok_or(StatsError::EmptySamples)
}

pub fn max(samples: &[u64]) -> Result<u64> {
    samples.iter().copied().max().ok_or(StatsError::EmptySamples)
}

/// Population standard deviation: `sqrt(sum((s - mean)^2) / n)`.
pub fn stddev(samples: &[u64]) -> Result<f64> {
    let avg = mean(samples)?;
    Ok(stddev_around(samples, avg))
}

fn stddev_around(samples: &[u64], avg: f64) -> f64 {
    let squared: f64 = samples
        .iter()
        .map(|&s| {
            let d = s as f64 - avg;
            d * d
        })
        .sum();
    (squared / samples.len() as f64).sqrt()
}

/// Summary of one run's samples after filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: u64,
    pub max: u64,
    pub stddev: f64,
}

impl SummaryStats {
    pub fn from_samples(samples: &[u64], filter: SampleFilter) -> Result<Self> {
        let samples = filter.apply(samples);
        let avg = mean(&samples)?;
        Ok(Self {
            count: samples.len(),
            sum: sum(&samples),
            mean: avg,
            min: min(&samples)?,
            max: max(&samples)?,
            stddev: stddev_around(&samples, avg),
        })
    }
}

/// Cumulative share of samples within `k` standard deviations of the mean.
///
/// Index `i` describes bucket `k = i + 1`. Each sample belongs to the
/// narrowest bucket whose closed interval `[mean - k*stddev, mean + k*stddev]`
/// contains it; samples outside every interval belong to no bucket and show
/// up only in [`PercentileBuckets::exceeding`].
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileBuckets {
    pub mean: f64,
    pub stddev: f64,
    /// Number of samples after filtering; the percentage denominator.
    pub count: usize,
    /// Percentage of samples assigned to each bucket on its own.
    pub per_bucket: Vec<f64>,
    /// Running totals of `per_bucket`, in percent.
    pub cumulative: Vec<f64>,
}

impl PercentileBuckets {
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Lower edge of bucket `k` (1-based), in nanoseconds.
    pub fn lower_bound_ns(&self, k: usize) -> f64 {
        self.mean - k as f64 * self.stddev
    }

    /// Upper edge of bucket `k` (1-based), in nanoseconds.
    pub fn upper_bound_ns(&self, k: usize) -> f64 {
        self.mean + k as f64 * self.stddev
    }

    /// Percentage of samples outside the widest bucket.
    pub fn exceeding(&self) -> f64 {
        (100.0 - self.cumulative.last().copied().unwrap_or(0.0)).max(0.0)
    }
}

/// Bucket `samples` by distance from the mean in whole standard deviations, `n` buckets wide.
pub fn percentile_buckets(samples: &[u64], n: usize, filter: SampleFilter) -> Result<PercentileBuckets> {
    let samples = filter.apply(samples);
    let avg = mean(&samples)?;
    let sd = stddev_around(&samples, avg);

    let bounds: Vec<(f64, f64)> = (1..=n)
        .map(|k| (avg - k as f64 * sd, avg + k as f64 * sd))
        .collect();

    let mut counts = vec![0usize; n];
    for &sample in samples.iter() {
        let value = sample as f64;
        // First match wins; a sample outside every interval is not counted.
        if let Some(i) = bounds.iter().position(|&(lo, hi)| value >= lo && value <= hi) {
            counts[i] += 1;
        }
    }

    let total = samples.len() as f64;
    let per_bucket = counts.iter().map(|&c| c as f64 * 100.0 / total).collect();
    let cumulative = counts
        .iter()
        .scan(0usize, |running, &c| {
            *running += c;
            Some(*running as f64 * 100.0 / total)
        })
        .collect();

    Ok(PercentileBuckets {
        mean: avg,
        stddev: sd,
        count: samples.len(),
        per_bucket,
        cumulative,
    })
}
