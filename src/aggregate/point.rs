use crate::{
    ingest::{layout::Configuration, record::Sample},
    stats::Stats,
    style::BackendId,
};

/// Reduction of the trials of one (backend, configuration). Only
/// exists if at least one trial was read; series built from these
/// are sparse, never zero-filled.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AggregatePoint {
    pub backend_id: BackendId,
    pub configuration: Configuration,
    pub num_trials: usize,
    /// microseconds, `None` if no trial carried a latency
    pub mean_latency_us: Option<f64>,
    /// ops/s
    pub mean_throughput: Option<f64>,
    /// Population standard deviation of the throughput, ops/s
    pub stddev_throughput: Option<f64>,
}

impl AggregatePoint {
    /// Throughput in thousands of operations per second.
    pub fn mean_kops(&self) -> Option<f64> {
        self.mean_throughput.map(|t| t / 1000.)
    }

    pub fn stddev_kops(&self) -> Option<f64> {
        self.stddev_throughput.map(|t| t / 1000.)
    }
}

/// Mean latency and mean/standard deviation of the throughput over
/// `samples`, which must all belong to the same (backend,
/// configuration). `None` for an empty slice.
pub fn aggregate_configuration(samples: &[Sample]) -> Option<AggregatePoint> {
    let first = samples.first()?;
    debug_assert!(samples
        .iter()
        .all(|s| s.backend_id == first.backend_id && s.configuration == first.configuration));

    let latencies: Vec<f64> = samples.iter().filter_map(|s| s.latency_us).collect();
    let throughputs: Vec<f64> = samples.iter().filter_map(|s| s.throughput).collect();
    let latency = Stats::from_values(&latencies).ok();
    let throughput = Stats::from_values(&throughputs).ok();

    Some(AggregatePoint {
        backend_id: first.backend_id.clone(),
        configuration: first.configuration,
        num_trials: samples.len(),
        mean_latency_us: latency.map(|s| s.average),
        mean_throughput: throughput.map(|s| s.average),
        stddev_throughput: throughput.map(|s| s.standard_deviation()),
    })
}
