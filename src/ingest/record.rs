//! Parsers for the three record kinds the drivers write.

use std::{collections::BTreeMap, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use kstring::KString;

use crate::{style::BackendId, warn};

use super::layout::Configuration;

/// Latency statistics of one operation type as written by the YCSB
/// driver; only the average is used.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OperationLatency {
    /// microseconds
    pub avg: f64,
}

/// One `load` phase record (other keys in the file are ignored).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoadRecord {
    /// ops/s
    pub throughput: f64,
    #[serde(rename = "INSERT")]
    pub insert: OperationLatency,
}

/// One `run` phase record.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RunRecord {
    /// ops/s
    pub throughput: f64,
}

/// YAML accepts `.nan` and `.inf`; a measurement must be finite.
fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        bail!("{name} is not a finite number: {value}")
    }
}

pub fn parse_load_record(s: &str) -> Result<LoadRecord> {
    let record: LoadRecord =
        serde_yml::from_str(s).map_err(|e| anyhow!("decoding load record YAML: {e}"))?;
    finite("throughput", record.throughput)?;
    finite("INSERT.avg", record.insert.avg)?;
    Ok(record)
}

pub fn parse_run_record(s: &str) -> Result<RunRecord> {
    let record: RunRecord =
        serde_yml::from_str(s).map_err(|e| anyhow!("decoding run record YAML: {e}"))?;
    finite("throughput", record.throughput)?;
    Ok(record)
}

/// One trial's measurement; immutable once read.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Sample {
    pub backend_id: BackendId,
    pub database: KString,
    pub configuration: Configuration,
    pub trial_index: u32,
    /// microseconds; not all record kinds carry one
    pub latency_us: Option<f64>,
    /// ops/s
    pub throughput: Option<f64>,
}

/// One row of a size-sweep file, with the effective latency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRow {
    pub size: u64,
    pub latency_us: f64,
}

/// Column layout of size-sweep rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawRowFormat {
    /// `size, latency`
    #[default]
    Plain,
    /// `size, recovery_ns, op_count, latency`: the backend also
    /// accounts time spent in recovery, which is amortized over the
    /// operations, `latency + recovery_ns / op_count`.
    RecoveryAccounted,
}

fn field<T: FromStr>(record: &csv::StringRecord, i: usize, name: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s = record
        .get(i)
        .ok_or_else(|| anyhow!("missing column {i} ({name})"))?;
    s.parse()
        .with_context(|| anyhow!("column {i} ({name}): {s:?}"))
}

impl RawRowFormat {
    fn parse_row(self, record: &csv::StringRecord) -> Result<SizeRow> {
        match self {
            RawRowFormat::Plain => Ok(SizeRow {
                size: field(record, 0, "size")?,
                latency_us: finite("latency", field(record, 1, "latency")?)?,
            }),
            RawRowFormat::RecoveryAccounted => {
                let size = field(record, 0, "size")?;
                let recovery_ns: u64 = field(record, 1, "recovery_ns")?;
                let op_count: u64 = field(record, 2, "op_count")?;
                let latency = finite("latency", field(record, 3, "latency")?)?;
                if op_count == 0 {
                    bail!("op_count is 0")
                }
                Ok(SizeRow {
                    size,
                    latency_us: finite(
                        "corrected latency",
                        latency + recovery_ns as f64 / op_count as f64,
                    )?,
                })
            }
        }
    }
}

/// Size-sweep rows in file order; malformed rows are dropped (and
/// counted), the rest are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeRows {
    pub rows: Vec<SizeRow>,
    pub malformed_rows: usize,
}

pub fn parse_size_rows(s: &str, format: RawRowFormat) -> Result<SizeRows> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(s.as_bytes());
    let mut out = SizeRows::default();
    for (i, record) in reader.records().enumerate() {
        let linenum = i + 1;
        let record = record.with_context(|| anyhow!("reading CSV line {linenum}"))?;
        match format.parse_row(&record) {
            Ok(row) => out.rows.push(row),
            Err(e) => {
                warn!("skipping size-sweep line {linenum}: {e:#}");
                out.malformed_rows += 1;
            }
        }
    }
    Ok(out)
}

/// The labels the recovery instrumentation writes, one row each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawPhase {
    GetPeer,
    Connect,
    /// Remote data read
    Recover,
    SyncPeers,
    EndRecover,
}

impl FromStr for RawPhase {
    type Err = anyhow::Error;

    /// Accepts both "get peer" and "get_peer" spellings.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(' ', "_");
        Ok(match normalized.as_str() {
            "get_peer" => RawPhase::GetPeer,
            "connect" => RawPhase::Connect,
            "recover" => RawPhase::Recover,
            "sync_peers" => RawPhase::SyncPeers,
            "end_recover" => RawPhase::EndRecover,
            _ => bail!("unknown recovery phase label {s:?}"),
        })
    }
}

/// Raw per-phase durations of one recovery, in nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct PhaseDeltas {
    deltas: BTreeMap<RawPhase, u64>,
}

impl PhaseDeltas {
    /// Builder-style: a later value for the same phase replaces the
    /// earlier one.
    pub fn with(mut self, phase: RawPhase, duration_ns: u64) -> Self {
        self.deltas.insert(phase, duration_ns);
        self
    }

    pub fn get(&self, phase: RawPhase) -> Option<u64> {
        self.deltas.get(&phase).copied()
    }
}

/// Rows `phase_label, duration_ns`. Unknown labels are ignored; a
/// row with a non-numeric duration makes the whole file malformed.
pub fn parse_phase_deltas(s: &str) -> Result<PhaseDeltas> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(s.as_bytes());
    let mut deltas = PhaseDeltas::default();
    for (i, record) in reader.records().enumerate() {
        let linenum = i + 1;
        let record = record.with_context(|| anyhow!("reading CSV line {linenum}"))?;
        let label = record
            .get(0)
            .ok_or_else(|| anyhow!("line {linenum}: empty row"))?;
        let duration_ns: u64 = field(&record, 1, "duration_ns")
            .with_context(|| anyhow!("line {linenum}"))?;
        match label.parse::<RawPhase>() {
            Ok(phase) => deltas = deltas.with(phase, duration_ns),
            Err(e) => crate::debug!("line {linenum}: ignoring: {e}"),
        }
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn t_load_record() -> Result<()> {
        let yml = "throughput: 12345.5\nruntime: 10\nINSERT:\n  avg: 81.25\n  p99: 300\n";
        let r = parse_load_record(yml)?;
        assert_eq!(r.throughput, 12345.5);
        assert_eq!(r.insert.avg, 81.25);
        assert!(parse_load_record("throughput: 1\n").is_err());
        assert!(parse_run_record("throughput: 7\nREAD:\n  avg: 1\n").is_ok());
        assert!(parse_run_record("throughput: [\n").is_err());
        assert!(parse_run_record("throughput: .nan\n").is_err());
        assert!(parse_load_record("throughput: 1\nINSERT:\n  avg: .inf\n").is_err());
        Ok(())
    }

    #[test]
    fn t_plain_rows() -> Result<()> {
        let rows = parse_size_rows("100,5\n100, 7\nbad,1\n200,9\n", RawRowFormat::Plain)?;
        assert_eq!(rows.malformed_rows, 1);
        assert_eq!(
            rows.rows,
            [
                SizeRow { size: 100, latency_us: 5.0 },
                SizeRow { size: 100, latency_us: 7.0 },
                SizeRow { size: 200, latency_us: 9.0 },
            ]
        );
        Ok(())
    }

    #[test]
    fn t_non_finite_latency_is_malformed() -> Result<()> {
        let rows = parse_size_rows("100,5\n100,NaN\n100,7\n200,inf\n", RawRowFormat::Plain)?;
        assert_eq!(rows.malformed_rows, 2);
        assert_eq!(
            rows.rows,
            [
                SizeRow { size: 100, latency_us: 5.0 },
                SizeRow { size: 100, latency_us: 7.0 },
            ]
        );
        let rows = parse_size_rows("128,1000,10,nan\n", RawRowFormat::RecoveryAccounted)?;
        assert_eq!(rows.malformed_rows, 1);
        Ok(())
    }

    #[test]
    fn t_recovery_accounted_rows() -> Result<()> {
        let rows = parse_size_rows(
            "128,1000,10,2.5\n128,0,0,1.0\n256,500\n",
            RawRowFormat::RecoveryAccounted,
        )?;
        assert_eq!(rows.rows.len(), 1);
        assert_eq!(rows.malformed_rows, 2);
        assert_relative_eq!(rows.rows[0].latency_us, 102.5);
        Ok(())
    }

    #[test]
    fn t_phase_deltas() -> Result<()> {
        let d = parse_phase_deltas(
            "get peer,1000000\nconnect,500000\nrecover,2000000\nsync peers,300000\n\
             end recover,400000\nsomething else,1\n",
        )?;
        assert_eq!(d.get(RawPhase::GetPeer), Some(1_000_000));
        assert_eq!(d.get(RawPhase::SyncPeers), Some(300_000));
        assert_eq!(d.get(RawPhase::EndRecover), Some(400_000));
        assert!(parse_phase_deltas("connect,fast\n").is_err());
        assert_eq!("end_recover".parse::<RawPhase>()?, RawPhase::EndRecover);
        Ok(())
    }
}
