//! Reading per-trial records from a results directory. Nothing in
//! here fails because of a single bad or missing input file: such
//! files are skipped (see `outcome`), and only what was read
//! successfully is handed on to aggregation.

pub mod layout;
pub mod outcome;
pub mod record;

use kstring::KString;

use crate::{info, style::BackendId};

use self::{
    layout::{Configuration, RawKind, ResultLayout, TrialPhase},
    outcome::{IngestReport, ReadOutcome},
    record::{
        parse_load_record, parse_phase_deltas, parse_run_record, parse_size_rows, PhaseDeltas,
        RawRowFormat, Sample, SizeRows,
    },
};

/// What to read for one (database, phase, backend, configuration).
#[derive(Debug, Clone)]
pub struct TrialQuery<'t> {
    pub database: &'t str,
    pub phase: TrialPhase,
    /// The backend directory / file name part
    pub backend: &'t BackendId,
    pub configuration: Configuration,
    /// Trials are numbered 1..=trial_count
    pub trial_count: u32,
}

fn read_trial(
    layout: &ResultLayout,
    query: &TrialQuery,
    trial_index: u32,
    report: &mut IngestReport,
) -> Option<Sample> {
    let TrialQuery {
        database,
        phase,
        backend,
        configuration,
        trial_count: _,
    } = query;
    let path = match layout.trial_path(
        database,
        *phase,
        backend.as_str(),
        *configuration,
        trial_index,
    ) {
        Ok(path) => path,
        Err(e) => {
            report.malformed += 1;
            crate::warn!("{database} {backend} {configuration}: {e:#}");
            return None;
        }
    };
    let outcome = ReadOutcome::read(&path, |s| {
        Ok(match phase {
            TrialPhase::Load => {
                let r = parse_load_record(s)?;
                (Some(r.insert.avg), Some(r.throughput))
            }
            TrialPhase::Run => {
                let r = parse_run_record(s)?;
                (None, Some(r.throughput))
            }
        })
    });
    report.record(&outcome);
    let (latency_us, throughput) = outcome.logged(
        format_args!("{database} {phase} {backend} {configuration} trial {trial_index}"),
        &path,
    )?;
    Some(Sample {
        backend_id: (*backend).clone(),
        database: KString::from_ref(database),
        configuration: *configuration,
        trial_index,
        latency_us,
        throughput,
    })
}

/// All successfully read trials of one (database, phase, backend,
/// configuration), in trial order.
pub fn ingest_trials(layout: &ResultLayout, query: &TrialQuery) -> (Vec<Sample>, IngestReport) {
    let mut report = IngestReport::default();
    let samples = (1..=query.trial_count)
        .filter_map(|i| read_trial(layout, query, i, &mut report))
        .collect();
    if report.skipped() > 0 {
        info!(
            "{} {} {} {}: {report}",
            query.database, query.phase, query.backend, query.configuration
        );
    }
    (samples, report)
}

/// The rows of one size-sweep file, `None` if it is absent or
/// unreadable.
pub fn ingest_size_rows(
    layout: &ResultLayout,
    backend: &BackendId,
    kind: RawKind,
    format: RawRowFormat,
) -> Option<SizeRows> {
    let path = layout.raw_path(backend.as_str(), kind);
    let rows = ReadOutcome::read(&path, |s| parse_size_rows(s, format))
        .logged(format_args!("raw {kind} {backend}"), &path)?;
    if rows.malformed_rows > 0 {
        info!(
            "raw {kind} {backend}: {} rows used, {} malformed rows skipped",
            rows.rows.len(),
            rows.malformed_rows
        );
    }
    Some(rows)
}

/// The raw phase durations of one (backend, database) recovery.
pub fn ingest_phase_deltas(
    layout: &ResultLayout,
    database: &str,
    backend: &BackendId,
) -> Option<PhaseDeltas> {
    let path = layout.recovery_path(database, backend.as_str());
    ReadOutcome::read(&path, parse_phase_deltas)
        .logged(format_args!("recovery {backend} {database}"), &path)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use anyhow::Result;

    use super::*;

    fn write(path: &Path, contents: &str) -> Result<()> {
        std::fs::create_dir_all(path.parent().expect("has parent"))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    #[test]
    fn t_ingest_skips_missing_and_malformed() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = ResultLayout::new(dir.path());
        let backend = BackendId::new("sync");
        let conf = Configuration::Threads(4);
        let path = |i| layout.trial_path("rocksdb", TrialPhase::Load, "sync", conf, i);
        write(&path(1)?, "throughput: 1000\nINSERT:\n  avg: 10\n")?;
        // trial 2 missing
        write(&path(3)?, "throughput: [oops\n")?;
        write(&path(4)?, "throughput: 3000\nINSERT:\n  avg: 30\n")?;

        let query = TrialQuery {
            database: "rocksdb",
            phase: TrialPhase::Load,
            backend: &backend,
            configuration: conf,
            trial_count: 4,
        };
        let (samples, report) = ingest_trials(&layout, &query);
        assert_eq!(
            report,
            IngestReport {
                loaded: 2,
                absent: 1,
                malformed: 1
            }
        );
        assert_eq!(
            samples.iter().map(|s| s.trial_index).collect::<Vec<_>>(),
            [1, 4]
        );
        assert_eq!(samples[1].latency_us, Some(30.0));
        assert_eq!(samples[1].throughput, Some(3000.0));
        Ok(())
    }

    #[test]
    fn t_ingest_run_records() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = ResultLayout::new(dir.path());
        let backend = BackendId::new("cephfs");
        let conf = Configuration::Workload("a".parse()?);
        write(
            &layout.trial_path("redis", TrialPhase::Run, "cephfs", conf, 1)?,
            "throughput: 500\n",
        )?;
        let query = TrialQuery {
            database: "redis",
            phase: TrialPhase::Run,
            backend: &backend,
            configuration: conf,
            trial_count: 3,
        };
        let (samples, report) = ingest_trials(&layout, &query);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].latency_us, None);
        assert_eq!(report.absent, 2);
        Ok(())
    }

    #[test]
    fn t_ingest_raw_and_recovery() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = ResultLayout::new(dir.path());
        let backend = BackendId::new("sync");
        assert!(ingest_size_rows(&layout, &backend, RawKind::Write, RawRowFormat::Plain).is_none());
        write(&layout.raw_path("sync", RawKind::Write), "100,5\n")?;
        let rows = ingest_size_rows(&layout, &backend, RawKind::Write, RawRowFormat::Plain)
            .expect("present");
        assert_eq!(rows.rows.len(), 1);

        assert!(ingest_phase_deltas(&layout, "redis", &backend).is_none());
        write(&layout.recovery_path("redis", "sync"), "connect,5\n")?;
        let d = ingest_phase_deltas(&layout, "redis", &backend).expect("present");
        assert_eq!(d.get(record::RawPhase::Connect), Some(5));
        Ok(())
    }
}
