//! Reducing ingested trials into the series the charts draw.

pub mod point;
pub mod range;
pub mod recovery;
pub mod size_series;

use crate::{
    ingest::{
        ingest_phase_deltas, ingest_size_rows, ingest_trials,
        layout::{Configuration, RawKind, ResultLayout, TrialPhase, Workload},
        outcome::IngestReport,
        record::RawRowFormat,
        TrialQuery,
    },
    style::BackendId,
};

use self::{
    point::{aggregate_configuration, AggregatePoint},
    range::ConfigRange,
    recovery::{reconstruct_recovery, RecoveryTrace},
    size_series::{bucket_by_size, SizeSeries},
};

/// A sparse series of aggregate points of one backend, plus what was
/// skipped while reading it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PointSeries {
    pub backend_id: BackendId,
    pub points: Vec<AggregatePoint>,
    pub report: IngestReport,
}

fn sweep(
    layout: &ResultLayout,
    database: &str,
    phase: TrialPhase,
    backend: &BackendId,
    configurations: impl Iterator<Item = Configuration>,
    trial_count: u32,
) -> PointSeries {
    let mut report = IngestReport::default();
    let points = configurations
        .filter_map(|configuration| {
            let query = TrialQuery {
                database,
                phase,
                backend,
                configuration,
                trial_count,
            };
            let (samples, r) = ingest_trials(layout, &query);
            report.add(r);
            aggregate_configuration(&samples)
        })
        .collect();
    PointSeries {
        backend_id: backend.clone(),
        points,
        report,
    }
}

/// Load-phase points over thread counts. Thread counts outside
/// `range` are not read at all.
pub fn thread_sweep(
    layout: &ResultLayout,
    database: &str,
    backend: &BackendId,
    threads: &[u32],
    range: Option<ConfigRange>,
    trial_count: u32,
) -> PointSeries {
    let selected: Vec<u32> = match range {
        Some(range) => range.filter(threads).collect(),
        None => threads.to_vec(),
    };
    sweep(
        layout,
        database,
        TrialPhase::Load,
        backend,
        selected.into_iter().map(Configuration::Threads),
        trial_count,
    )
}

/// Run-phase points over workloads; workloads without any readable
/// trial have no point.
pub fn workload_sweep(
    layout: &ResultLayout,
    database: &str,
    backend: &BackendId,
    workloads: &[Workload],
    trial_count: u32,
) -> PointSeries {
    sweep(
        layout,
        database,
        TrialPhase::Run,
        backend,
        workloads.iter().copied().map(Configuration::Workload),
        trial_count,
    )
}

pub fn size_sweep(
    layout: &ResultLayout,
    source: &BackendId,
    kind: RawKind,
    format: RawRowFormat,
) -> Option<SizeSeries> {
    let rows = ingest_size_rows(layout, source, kind, format)?;
    Some(bucket_by_size(&rows.rows))
}

pub fn recovery_trace(
    layout: &ResultLayout,
    database: &str,
    backend: &BackendId,
) -> Option<RecoveryTrace> {
    let deltas = ingest_phase_deltas(layout, database, backend)?;
    Some(reconstruct_recovery(&deltas))
}
