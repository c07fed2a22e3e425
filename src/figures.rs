//! The figures: for each kind, which series to read and how to draw
//! them. Every figure resolves all of its backend ids before reading
//! anything, so an unknown id fails that figure only, without a
//! partial artifact.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use kstring::KString;
use strum::IntoEnumIterator;

use crate::{
    aggregate::{
        point::AggregatePoint, recovery::RecoveryTrace, recovery_trace, size_sweep,
        size_series::SizeSeries, thread_sweep, workload_sweep, PointSeries,
    },
    config::FigureConfig,
    info,
    ingest::{
        layout::{Configuration, RawKind, ResultLayout},
        record::RawRowFormat,
    },
    render::{
        bars::{
            draw_grouped_bars, draw_side_by_side_bars, Bar, BarPanel, BarSeries, GroupedBarChart,
            SideBySideChart,
        },
        geometry::Scale,
        line::{draw_broken_line_chart, BrokenAxisChart},
        loglog::{draw_loglog_chart, SweepChart},
        stacked::{draw_stacked_chart, StackedChart, StackedGroup},
        write_svg, BackendLine,
    },
    style::{BackendId, BackendStyle, StyleRegistry},
};

const LATENCY_DESC: &str = "Latency (μs)";
const THROUGHPUT_DESC: &str = "Throughput (KOps/s)";
const SIZE_DESC: &str = "Size (bytes)";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumString,
)]
pub enum FigureKind {
    #[strum(serialize = "insert-only")]
    InsertOnly,
    #[strum(serialize = "sqlite-insert")]
    SqliteInsert,
    #[strum(serialize = "ycsb")]
    Ycsb,
    #[strum(serialize = "raw-write")]
    RawWrite,
    #[strum(serialize = "raw-read")]
    RawRead,
    #[strum(serialize = "recovery")]
    Recovery,
}

/// The aggregated series of one database's figure.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DatabaseSeries {
    pub database: KString,
    pub series: Vec<PointSeries>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NamedSizeSeries {
    pub backend_id: BackendId,
    /// None if the raw file was absent or unreadable
    pub series: Option<SizeSeries>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RecoveryEntry {
    pub backend_id: BackendId,
    pub database: KString,
    pub trace: Option<RecoveryTrace>,
}

/// What a figure is drawn from; also what `summary` prints.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureData {
    InsertOnly(Vec<DatabaseSeries>),
    SqliteInsert(DatabaseSeries),
    Ycsb(Vec<DatabaseSeries>),
    RawWrite(Vec<NamedSizeSeries>),
    RawRead(Vec<NamedSizeSeries>),
    Recovery(Vec<RecoveryEntry>),
}

fn log_report(what: &str, series: &PointSeries) {
    info!(
        "{what} {}: {} points, {}",
        series.backend_id,
        series.points.len(),
        series.report
    );
}

/// Points with both coordinates, (throughput KOps/s, latency µs).
fn throughput_latency(points: &[AggregatePoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|p| Some((p.mean_kops()?, p.mean_latency_us?)))
        .collect()
}

pub struct Figures<'a> {
    pub layout: &'a ResultLayout,
    pub config: &'a FigureConfig,
    pub styles: &'a StyleRegistry,
}

impl<'a> Figures<'a> {
    fn output_path(&self, file_name: &str) -> PathBuf {
        self.layout.figure_dir().join(file_name)
    }

    fn insert_only_backends(&self) -> impl Iterator<Item = &'a BackendId> {
        let c = &self.config.insert_only;
        c.backends
            .iter()
            .filter(move |b| !c.skipped_backends.contains(b))
    }

    /// Read and aggregate the series of `kind`. Fails if one of the
    /// configured backend ids has no style.
    pub fn data(&self, kind: FigureKind) -> Result<FigureData> {
        let Self {
            layout,
            config,
            styles,
        } = self;
        let trial_count = config.trial_count;
        Ok(match kind {
            FigureKind::InsertOnly => {
                let c = &config.insert_only;
                styles.lookup_all(self.insert_only_backends())?;
                let data = c
                    .databases
                    .keys()
                    .map(|database| DatabaseSeries {
                        database: database.clone(),
                        series: self
                            .insert_only_backends()
                            .map(|backend| {
                                let range = c.thread_ranges.get(backend).copied();
                                let s = thread_sweep(
                                    layout,
                                    database,
                                    backend,
                                    &c.threads,
                                    range,
                                    trial_count,
                                );
                                log_report(database, &s);
                                s
                            })
                            .collect(),
                    })
                    .collect();
                FigureData::InsertOnly(data)
            }
            FigureKind::SqliteInsert => {
                let c = &config.sqlite_insert;
                styles.lookup_all(&c.backends)?;
                let series = c
                    .backends
                    .iter()
                    .map(|backend| {
                        let s = thread_sweep(
                            layout,
                            &c.database,
                            backend,
                            &[c.threads],
                            None,
                            trial_count,
                        );
                        log_report(&c.database, &s);
                        s
                    })
                    .collect();
                FigureData::SqliteInsert(DatabaseSeries {
                    database: c.database.clone(),
                    series,
                })
            }
            FigureKind::Ycsb => {
                let c = &config.ycsb;
                styles.lookup_all(&c.backends)?;
                let data = c
                    .databases
                    .iter()
                    .map(|db| DatabaseSeries {
                        database: db.database.clone(),
                        series: c
                            .backends
                            .iter()
                            .map(|backend| {
                                let s = workload_sweep(
                                    layout,
                                    &db.database,
                                    backend,
                                    &c.workloads,
                                    trial_count,
                                );
                                log_report(&db.database, &s);
                                s
                            })
                            .collect(),
                    })
                    .collect();
                FigureData::Ycsb(data)
            }
            FigureKind::RawWrite => {
                let c = &config.raw_write;
                styles.lookup_all(&c.backends)?;
                FigureData::RawWrite(
                    c.backends
                        .iter()
                        .map(|backend| NamedSizeSeries {
                            backend_id: backend.clone(),
                            series: size_sweep(
                                layout,
                                backend,
                                RawKind::Write,
                                RawRowFormat::Plain,
                            ),
                        })
                        .collect(),
                )
            }
            FigureKind::RawRead => {
                let c = &config.raw_read;
                styles.lookup_all(c.series.iter().map(|s| &s.style))?;
                FigureData::RawRead(
                    c.series
                        .iter()
                        .map(|s| NamedSizeSeries {
                            backend_id: s.style.clone(),
                            series: size_sweep(layout, &s.source, RawKind::Read, s.format),
                        })
                        .collect(),
                )
            }
            FigureKind::Recovery => {
                let c = &config.recovery;
                styles.lookup_all(&c.backends)?;
                let mut entries = Vec::new();
                for backend in &c.backends {
                    for database in &c.databases {
                        entries.push(RecoveryEntry {
                            backend_id: backend.clone(),
                            database: database.clone(),
                            trace: recovery_trace(layout, database, backend),
                        });
                    }
                }
                FigureData::Recovery(entries)
            }
        })
    }

    /// Read, aggregate and draw `kind`, returning the written files.
    pub fn render(&self, kind: FigureKind) -> Result<Vec<PathBuf>> {
        let data = self.data(kind)?;
        let written = match &data {
            FigureData::InsertOnly(dbs) => self.render_insert_only(dbs)?,
            FigureData::SqliteInsert(db) => vec![self.render_sqlite_insert(db)?],
            FigureData::Ycsb(dbs) => self.render_ycsb(dbs)?,
            FigureData::RawWrite(series) => vec![self.render_raw_write(series)?],
            FigureData::RawRead(series) => vec![self.render_raw_read(series)?],
            FigureData::Recovery(entries) => vec![self.render_recovery(entries)?],
        };
        for path in &written {
            info!("{kind}: wrote {path:?}");
        }
        Ok(written)
    }

    /// Render every figure kind; a failing kind does not stop the
    /// others.
    pub fn render_all(&self) -> Vec<(FigureKind, Result<Vec<PathBuf>>)> {
        FigureKind::iter()
            .map(|kind| {
                let res = self
                    .render(kind)
                    .with_context(|| anyhow!("rendering figure {kind}"));
                (kind, res)
            })
            .collect()
    }

    fn render_insert_only(&self, dbs: &[DatabaseSeries]) -> Result<Vec<PathBuf>> {
        let c = &self.config.insert_only;
        let mut written = Vec::new();
        for db in dbs {
            let Some(ranges) = c.databases.get(&db.database) else {
                continue;
            };
            let series = db
                .series
                .iter()
                .map(|s| -> Result<BackendLine> {
                    let style = self.styles.lookup(&s.backend_id)?;
                    Ok(BackendLine {
                        style,
                        label: style.display_name.to_string(),
                        points: throughput_latency(&s.points),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let chart = BrokenAxisChart {
                x_desc: THROUGHPUT_DESC.into(),
                y_desc: LATENCY_DESC.into(),
                x_scale: Scale::Linear,
                x_range: None,
                lower: ranges.lower,
                upper: ranges.upper,
            };
            let path = self.output_path(&format!("{}_lattput.svg", db.database));
            write_svg(&path, c.canvas, |root| {
                draw_broken_line_chart(root, &chart, &series, &self.config.pen)
            })?;
            written.push(path);
        }
        Ok(written)
    }

    fn render_sqlite_insert(&self, db: &DatabaseSeries) -> Result<PathBuf> {
        let c = &self.config.sqlite_insert;
        let mut throughput = Vec::new();
        let mut latency = Vec::new();
        for s in &db.series {
            let style = self.styles.lookup(&s.backend_id)?;
            let point = s.points.first();
            throughput.push((style, point.and_then(|p| p.mean_kops())));
            latency.push((style, point.and_then(|p| p.mean_latency_us)));
        }
        let chart = SideBySideChart {
            positions: c.positions.clone(),
            x_range: c.x_range,
            bar_width: c.bar_width,
            panels: vec![
                BarPanel {
                    y_desc: THROUGHPUT_DESC.into(),
                    y_scale: Scale::Linear,
                    y_range: None,
                    bars: throughput,
                },
                BarPanel {
                    y_desc: LATENCY_DESC.into(),
                    y_scale: Scale::Log,
                    y_range: Some(c.latency_range),
                    bars: latency,
                },
            ],
        };
        let path = self.output_path(&format!("{}_lattput.svg", db.database));
        write_svg(&path, c.canvas, |root| {
            draw_side_by_side_bars(root, &chart, &self.config.pen)
        })?;
        Ok(path)
    }

    fn render_ycsb(&self, dbs: &[DatabaseSeries]) -> Result<Vec<PathBuf>> {
        let c = &self.config.ycsb;
        let mut written = Vec::new();
        for (db, db_config) in dbs.iter().zip(&c.databases) {
            let series = db
                .series
                .iter()
                .enumerate()
                .map(|(i, s)| -> Result<BarSeries> {
                    let style = self.styles.lookup(&s.backend_id)?;
                    let bars = c
                        .workloads
                        .iter()
                        .map(|w| {
                            let p = s
                                .points
                                .iter()
                                .find(|p| p.configuration == Configuration::Workload(*w))?;
                            Some(Bar {
                                value: p.mean_kops()?,
                                error: p.stddev_kops(),
                            })
                        })
                        .collect();
                    Ok(BarSeries {
                        style,
                        legend_label: (i == db_config.legend_position)
                            .then(|| style.display_name.to_string()),
                        bars,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let chart = GroupedBarChart {
                categories: c.workloads.iter().map(|w| w.to_string()).collect(),
                x_desc: "Workload".into(),
                y_desc: THROUGHPUT_DESC.into(),
                bar_width: c.bar_width,
                y_range: None,
            };
            let path = self.output_path(&format!("{}_ycsb.svg", db.database));
            write_svg(&path, c.canvas, |root| {
                draw_grouped_bars(root, &chart, &series, &self.config.pen)
            })?;
            written.push(path);
        }
        Ok(written)
    }

    fn size_line_series<'s>(
        &'s self,
        series: &[NamedSizeSeries],
        label: impl Fn(&'s BackendStyle) -> &'s str,
    ) -> Result<Vec<BackendLine<'s>>> {
        let mut lines = Vec::new();
        for s in series {
            let style = self.styles.lookup(&s.backend_id)?;
            let Some(sizes) = s.series.as_ref().filter(|sizes| !sizes.is_empty()) else {
                continue;
            };
            lines.push(BackendLine {
                style,
                label: label(style).to_string(),
                points: sizes.points().collect(),
            });
        }
        Ok(lines)
    }

    fn render_raw_write(&self, series: &[NamedSizeSeries]) -> Result<PathBuf> {
        let c = &self.config.raw_write;
        let lines = self.size_line_series(series, |style| style.sweep_label())?;
        let chart = BrokenAxisChart {
            x_desc: SIZE_DESC.into(),
            y_desc: LATENCY_DESC.into(),
            x_scale: Scale::Log,
            x_range: Some(c.size_window),
            lower: c.ranges.lower,
            upper: c.ranges.upper,
        };
        let path = self.output_path("write_lat.svg");
        write_svg(&path, c.canvas, |root| {
            draw_broken_line_chart(root, &chart, &lines, &self.config.pen)
        })?;
        Ok(path)
    }

    fn render_raw_read(&self, series: &[NamedSizeSeries]) -> Result<PathBuf> {
        let c = &self.config.raw_read;
        let lines = self.size_line_series(series, |style| style.display_name.as_str())?;
        let chart = SweepChart {
            x_desc: SIZE_DESC.into(),
            y_desc: LATENCY_DESC.into(),
            x_range: c.size_window,
            y_range: None,
        };
        let path = self.output_path("read_lat.svg");
        write_svg(&path, c.canvas, |root| {
            draw_loglog_chart(root, &chart, &lines, &self.config.pen)
        })?;
        Ok(path)
    }

    fn render_recovery(&self, entries: &[RecoveryEntry]) -> Result<PathBuf> {
        let c = &self.config.recovery;
        let groups = c
            .backends
            .iter()
            .map(|backend| -> Result<StackedGroup> {
                let style = self.styles.lookup(backend)?;
                let traces = c
                    .databases
                    .iter()
                    .map(|database| {
                        entries
                            .iter()
                            .find(|e| &e.backend_id == backend && &e.database == database)
                            .and_then(|e| e.trace.clone())
                            .filter(|t| !t.is_empty())
                    })
                    .collect();
                Ok(StackedGroup { style, traces })
            })
            .collect::<Result<Vec<_>>>()?;
        let chart = StackedChart {
            categories: c.databases.iter().map(|d| d.to_string()).collect(),
            y_desc: "Recovery time (ms)".into(),
            bar_width: c.bar_width,
            phase_hatches: c.phase_hatches.clone(),
        };
        let path = self.output_path("recovery-time.svg");
        write_svg(&path, c.canvas, |root| {
            draw_stacked_chart(root, &chart, &groups, &self.config.pen)
        })?;
        Ok(path)
    }
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
    fn t_throughput_latency_skips_partial() {
        let p = |throughput, latency| AggregatePoint {
            backend_id: "sync".into(),
            configuration: Configuration::Threads(1),
            num_trials: 1,
            mean_latency_us: latency,
            mean_throughput: throughput,
            stddev_throughput: Some(0.),
        };
        let points = [p(Some(2000.), Some(5.)), p(None, Some(5.)), p(Some(1.), None)];
        assert_eq!(throughput_latency(&points), [(2., 5.)]);
    }

    #[test]
    fn t_kind_names() {
        let names: Vec<String> = FigureKind::iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            ["insert-only", "sqlite-insert", "ycsb", "raw-write", "raw-read", "recovery"]
        );
        assert_eq!("raw-read".parse::<FigureKind>().ok(), Some(FigureKind::RawRead));
        assert!("rawread".parse::<FigureKind>().is_err());
    }

    #[test]
    fn t_insert_only_skips_ext4() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = ResultLayout::new(dir.path());
        let mut config = FigureConfig::default();
        config.insert_only.backends.push("ext4".into());
        let styles = config.style_registry()?;
        let figures = Figures {
            layout: &layout,
            config: &config,
            styles: &styles,
        };
        let FigureData::InsertOnly(dbs) = figures.data(FigureKind::InsertOnly)? else {
            panic!("wrong data kind")
        };
        assert_eq!(dbs.len(), 2);
        for db in &dbs {
            assert!(db.series.iter().all(|s| s.backend_id.as_str() != "ext4"));
            assert_eq!(db.series.len(), 3);
        }
        Ok(())
    }

    #[test]
    fn t_recovery_figure() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = ResultLayout::new(dir.path());
        write(
            &layout.recovery_path("redis", "ncl"),
            "get_peer,1000000\nconnect,500000\nrecover,2000000\nsync_peers,300000\nend_recover,400000\n",
        )?;
        let config = FigureConfig::default();
        let styles = config.style_registry()?;
        let figures = Figures {
            layout: &layout,
            config: &config,
            styles: &styles,
        };
        let written = figures.render(FigureKind::Recovery)?;
        assert_eq!(written, [layout.figure_dir().join("recovery-time.svg")]);
        let svg = std::fs::read_to_string(&written[0])?;
        assert!(svg.contains("rdma read"));
        Ok(())
    }
}
