//! What figures to produce from which results, and how they look.
//! `FigureConfig::default()` is the set of figures of the paper.

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Result;
use kstring::KString;

use crate::{
    aggregate::{range::ConfigRange, recovery::RecoveryPhase},
    config_file::LoadConfigFile,
    ingest::{layout::Workload, record::RawRowFormat},
    render::{geometry::AxisRange, CanvasSize, Pen},
    style::{BackendId, BackendStyle, Hatch, StyleRegistry},
};

fn ids(ids: &[&str]) -> Vec<BackendId> {
    ids.iter().map(|s| BackendId::new(s)).collect()
}

/// The y-ranges of the two panels of a broken-axis chart.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokenAxisRanges {
    pub lower: AxisRange,
    pub upper: AxisRange,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertOnlyConfig {
    pub backends: Vec<BackendId>,
    /// Configured but never drawn in this figure
    pub skipped_backends: Vec<BackendId>,
    pub threads: Vec<u32>,
    /// Backends without an entry are read for all of `threads`
    pub thread_ranges: BTreeMap<BackendId, ConfigRange>,
    /// Database name -> panel ranges; one figure per entry
    pub databases: BTreeMap<KString, BrokenAxisRanges>,
    pub canvas: CanvasSize,
}

impl Default for InsertOnlyConfig {
    fn default() -> Self {
        let range = |min, max| ConfigRange { min, max };
        let upper = AxisRange::new(4000., 5200.);
        Self {
            backends: ids(&["sync", "cephfs", "sync_ncl"]),
            skipped_backends: ids(&["ext4"]),
            threads: vec![1, 2, 4, 8, 12, 16, 20, 24, 32, 48],
            thread_ranges: [
                ("ncl", range(1, 16)),
                ("cephfs", range(1, 16)),
                ("cephfs_sync", range(2, 32)),
                ("ext4", range(1, 16)),
                ("sync", range(2, 24)),
                ("sync_ncl", range(1, 16)),
            ]
            .into_iter()
            .map(|(id, r)| (BackendId::new(id), r))
            .collect(),
            databases: [
                (
                    "rocksdb",
                    BrokenAxisRanges {
                        lower: AxisRange::new(1., 100.),
                        upper,
                    },
                ),
                (
                    "redis",
                    BrokenAxisRanges {
                        lower: AxisRange::new(1., 200.),
                        upper,
                    },
                ),
            ]
            .into_iter()
            .map(|(db, r)| (KString::from_static(db), r))
            .collect(),
            canvas: CanvasSize::new(400, 700),
        }
    }
}

/// Single-thread insert-only bars (throughput and latency side by
/// side), for the database whose latencies don't fit the broken-axis
/// chart.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteInsertConfig {
    pub database: KString,
    pub backends: Vec<BackendId>,
    pub threads: u32,
    /// x position per backend
    pub positions: Vec<f64>,
    pub x_range: AxisRange,
    pub bar_width: f64,
    /// Log scale
    pub latency_range: AxisRange,
    pub canvas: CanvasSize,
}

impl Default for SqliteInsertConfig {
    fn default() -> Self {
        Self {
            database: KString::from_static("sqlite"),
            backends: ids(&["sync", "cephfs", "sync_ncl"]),
            threads: 1,
            positions: vec![1., 3., 5.],
            x_range: AxisRange::new(0., 6.),
            bar_width: 0.8,
            latency_range: AxisRange::new(1., 1e4),
            canvas: CanvasSize::new(640, 360),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YcsbDatabase {
    pub database: KString,
    /// Index into `YcsbConfig::backends` of the only backend whose
    /// bars are labelled in this figure's legend (the figures are
    /// shown next to each other, sharing their legends)
    pub legend_position: usize,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YcsbConfig {
    pub backends: Vec<BackendId>,
    pub workloads: Vec<Workload>,
    pub databases: Vec<YcsbDatabase>,
    pub bar_width: f64,
    pub canvas: CanvasSize,
}

impl Default for YcsbConfig {
    fn default() -> Self {
        let db = |database, legend_position| YcsbDatabase {
            database: KString::from_static(database),
            legend_position,
        };
        Self {
            backends: ids(&["sync", "cephfs", "sync_ncl"]),
            workloads: "abcdf"
                .chars()
                .filter_map(|c| c.to_string().parse().ok())
                .collect(),
            databases: vec![db("rocksdb", 0), db("redis", 1), db("sqlite", 2)],
            bar_width: 0.2,
            canvas: CanvasSize::new(640, 420),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawWriteConfig {
    pub backends: Vec<BackendId>,
    pub size_window: AxisRange,
    pub ranges: BrokenAxisRanges,
    pub canvas: CanvasSize,
}

impl Default for RawWriteConfig {
    fn default() -> Self {
        Self {
            backends: ids(&["sync", "cephfs", "sync_ncl"]),
            size_window: AxisRange::new(1e2, 1e4),
            ranges: BrokenAxisRanges {
                lower: AxisRange::new(0., 20.),
                upper: AxisRange::new(1800., 2200.),
            },
            canvas: CanvasSize::new(640, 560),
        }
    }
}

/// One line of the raw read figure: drawn with `style`, read from
/// the raw files of backend `source`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawReadSeries {
    pub style: BackendId,
    pub source: BackendId,
    #[serde(default)]
    pub format: RawRowFormat,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawReadConfig {
    pub series: Vec<RawReadSeries>,
    pub size_window: AxisRange,
    pub canvas: CanvasSize,
}

impl Default for RawReadConfig {
    fn default() -> Self {
        let series = |backend: &str, format| RawReadSeries {
            style: BackendId::new(&format!("rd_{backend}")),
            source: BackendId::new(backend),
            format,
        };
        Self {
            series: vec![
                series("cephfs", RawRowFormat::Plain),
                series("sync_ncl", RawRowFormat::Plain),
                series("ncl", RawRowFormat::RecoveryAccounted),
                series("cephfs_sync", RawRowFormat::Plain),
            ],
            size_window: AxisRange::new(1e2, 1e4),
            canvas: CanvasSize::new(640, 480),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecoveryConfig {
    pub backends: Vec<BackendId>,
    pub databases: Vec<KString>,
    /// Phase legend order and hatches
    pub phase_hatches: Vec<(RecoveryPhase, Hatch)>,
    pub bar_width: f64,
    pub canvas: CanvasSize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            backends: ids(&["ncl", "cephfs", "ext4"]),
            databases: ["rocksdb", "redis", "sqlite"]
                .into_iter()
                .map(KString::from_static)
                .collect(),
            phase_hatches: vec![
                (RecoveryPhase::GetPeer, Hatch::new("\\\\\\")),
                (RecoveryPhase::Connect, Hatch::new("///")),
                (RecoveryPhase::RdmaRead, Hatch::new("xxx")),
                (RecoveryPhase::SyncPeer, Hatch::new("||")),
                (RecoveryPhase::Parse, Hatch::none()),
            ],
            bar_width: 0.2,
            canvas: CanvasSize::new(700, 340),
        }
    }
}

/// Direct representation of the bench-figures config file; missing
/// sections take their defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FigureConfig {
    /// Trials 1..=trial_count are read per configuration
    pub trial_count: u32,
    pub pen: Pen,
    /// Replaces the built-in style table if given
    pub styles: Option<Vec<BackendStyle>>,
    pub insert_only: InsertOnlyConfig,
    pub sqlite_insert: SqliteInsertConfig,
    pub ycsb: YcsbConfig,
    pub raw_write: RawWriteConfig,
    pub raw_read: RawReadConfig,
    pub recovery: RecoveryConfig,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            trial_count: 3,
            pen: Pen::default(),
            styles: None,
            insert_only: Default::default(),
            sqlite_insert: Default::default(),
            ycsb: Default::default(),
            raw_write: Default::default(),
            raw_read: Default::default(),
            recovery: Default::default(),
        }
    }
}

impl FigureConfig {
    pub fn style_registry(&self) -> Result<StyleRegistry> {
        match &self.styles {
            Some(entries) => Ok(StyleRegistry::from_entries(entries.iter().cloned())?),
            None => Ok(StyleRegistry::standard()),
        }
    }
}

impl LoadConfigFile for FigureConfig {
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>> {
        Ok(Some(PathBuf::from("bench-figures")))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::config_file::ConfigBackend;

    use super::*;

    #[test]
    fn t_defaults() -> Result<()> {
        let config = FigureConfig::default();
        assert_eq!(config.trial_count, 3);
        let styles = config.style_registry()?;
        styles.lookup_all(&config.insert_only.backends)?;
        styles.lookup_all(config.raw_read.series.iter().map(|s| &s.style))?;
        assert_eq!(
            config.insert_only.databases["rocksdb"].lower,
            AxisRange::new(1., 100.)
        );
        assert_eq!(config.ycsb.workloads.len(), 5);
        assert_eq!(
            config.raw_read.series[2].format,
            RawRowFormat::RecoveryAccounted
        );
        Ok(())
    }

    #[test]
    fn t_partial_yaml() -> Result<()> {
        let config: FigureConfig = ConfigBackend::Yaml.from_str_config(
            "trial_count: 5\nraw_write:\n  backends: [sync]\n  size_window: {min: 10, max: 1000}\n  ranges: {lower: {min: 0, max: 5}, upper: {min: 10, max: 20}}\n  canvas: {width: 100, height: 100}\n",
        )?;
        assert_eq!(config.trial_count, 5);
        assert_eq!(config.raw_write.backends, vec![BackendId::new("sync")]);
        assert_eq!(config.ycsb, YcsbConfig::default());
        Ok(())
    }

    #[test]
    fn t_unknown_field() {
        let res: Result<FigureConfig> = ConfigBackend::Json5.from_str_config("{ trials: 3 }");
        assert!(res.is_err());
    }

    #[test]
    fn t_round_trip_json5() -> Result<()> {
        let config = FigureConfig::default();
        let s = ConfigBackend::Json5.to_config_string(&config)?;
        let back: FigureConfig = ConfigBackend::Json5.from_str_config(&s)?;
        assert_eq!(back, config);
        Ok(())
    }
}
