//! Watching the sizes of the log files in a directory while a
//! benchmark runs, and charting them afterwards.

use std::{
    collections::BTreeMap,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};

use crate::{
    config_file::ConfigBackend,
    debug, info,
    render::{
        timeseries::{draw_time_series, TimeSeries},
        write_svg, CanvasSize, Pen,
    },
    warn,
};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Parallel sequences: `size[i]` bytes at `time[i]` milliseconds
/// after monitoring started.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSeries {
    pub time: Vec<u64>,
    pub size: Vec<u64>,
}

/// Log file name -> observations.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MonitorRecord(pub BTreeMap<String, LogSeries>);

impl MonitorRecord {
    /// One polling tick. A directory that can't be listed means no
    /// observation this tick; an entry that can't be stat'ed is
    /// skipped. Every seen name gets a series, but only non-zero
    /// sizes are recorded.
    pub fn poll_once(&mut self, dir: &Path, elapsed_ms: u64) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("listing {dir:?}: {e}");
                return;
            }
        };
        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let series = self.0.entry(name).or_default();
            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    debug!("stat of {:?}: {e}", entry.path());
                    continue;
                }
            };
            if size > 0 {
                series.time.push(elapsed_ms);
                series.size.push(size);
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigBackend::Yaml.save_config_file(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        ConfigBackend::Yaml.load_config_file(path)
    }

    /// Size in MB over time in seconds, one line per log.
    pub fn time_series(&self) -> Vec<TimeSeries> {
        self.0
            .iter()
            .map(|(name, LogSeries { time, size })| {
                if time.len() != size.len() {
                    warn!(
                        "{name}: {} times but {} sizes, using the common prefix",
                        time.len(),
                        size.len()
                    );
                }
                TimeSeries {
                    name: name.clone(),
                    points: time
                        .iter()
                        .zip(size)
                        .map(|(t, s)| (*t as f64 / 1000., *s as f64 / 1024. / 1024.))
                        .collect(),
                }
            })
            .collect()
    }
}

/// Poll `dir` every `interval` until `stop` is set (checked once per
/// tick), then return what was seen.
pub fn monitor(dir: &Path, stop: &AtomicBool, interval: Duration) -> MonitorRecord {
    let start = Instant::now();
    let mut record = MonitorRecord::default();
    let mut ticks: u64 = 0;
    while !stop.load(Ordering::Relaxed) {
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        record.poll_once(dir, elapsed_ms);
        ticks += 1;
        std::thread::sleep(interval);
    }
    info!(
        "stopped after {ticks} ticks, {} logs seen",
        record.0.len()
    );
    record
}

pub fn draw_record(record: &MonitorRecord, output: &Path, canvas: CanvasSize) -> Result<()> {
    let series = record.time_series();
    write_svg(output, canvas, |root| {
        draw_time_series(root, "time (s)", "size (MB)", &series, &Pen::default())
    })
    .with_context(|| anyhow!("drawing log sizes to {output:?}"))
}
