//! Stacked recovery-phase bars, grouped by database with one bar per
//! backend. A band above the plot carries two legends: one for the
//! backends (colors) and one for the phases (hatches).

use anyhow::Result;
use plotters::prelude::*;

use crate::{
    aggregate::recovery::{RecoveryPhase, RecoveryTrace},
    style::{BackendStyle, Hatch, Rgb},
};

use super::{
    frame,
    geometry::{group_offset, AxisRange},
    paint::{self, font, tick_label, HatchedRect},
    Pen, Root,
};

/// One backend's traces, indexed by category (database).
#[derive(Debug, Clone)]
pub struct StackedGroup<'s> {
    pub style: &'s BackendStyle,
    pub traces: Vec<Option<RecoveryTrace>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StackedChart {
    pub categories: Vec<String>,
    pub y_desc: String,
    pub bar_width: f64,
    /// Phases in legend order with their hatch; phases missing here
    /// are drawn without hatch
    pub phase_hatches: Vec<(RecoveryPhase, Hatch)>,
}

impl StackedChart {
    fn hatch_of(&self, phase: RecoveryPhase) -> Hatch {
        self.phase_hatches
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, h)| h.clone())
            .unwrap_or_else(Hatch::none)
    }
}

const MARGIN_TOP: u32 = 8;
const X_LABEL_AREA: u32 = 40;

/// A legend entry drawn as a patch.
struct Swatch {
    label: String,
    fill: Option<Rgb>,
    hatch: Hatch,
    edge: Option<Rgb>,
}

/// The highest stacked value over all traces.
fn max_top(groups: &[StackedGroup]) -> Option<f64> {
    groups
        .iter()
        .flat_map(|g| g.traces.iter().flatten())
        .flat_map(|t| t.segments())
        .map(|s| s.top)
        .reduce(f64::max)
}

/// Height of the legend band over a canvas of `height` pixels: room
/// for `rows` legend rows, and at least a fifth of the plot height
/// (1:4).
fn band_height(height: u32, rows: usize, pen: &Pen) -> u32 {
    let legend = MARGIN_TOP * 2 + rows as u32 * (pen.font_size * 5 / 4 + 4);
    let plot = height.saturating_sub(MARGIN_TOP + X_LABEL_AREA);
    legend.max(plot / 5)
}

/// A legend on its own in `area`, held by a chart without axes whose
/// series are empty.
fn draw_legend(area: &Root, swatches: Vec<Swatch>, pen: &Pen) -> Result<()> {
    if swatches.is_empty() {
        return Ok(());
    }
    let mut holder = ChartBuilder::on(area)
        .margin(MARGIN_TOP)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;
    for Swatch {
        label,
        fill,
        hatch,
        edge,
    } in swatches
    {
        holder
            .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())?
            .label(label)
            .legend(move |(x, y)| HatchedRect::new([(x, y - 6), (x + 18, y + 6)], fill, &hatch, edge));
    }
    holder
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(font(pen))
        .draw()?;
    Ok(())
}

pub fn draw_stacked_chart(
    root: &Root,
    chart: &StackedChart,
    groups: &[StackedGroup],
    pen: &Pen,
) -> Result<()> {
    let (width, height) = root.dim_in_pixel();
    let rows = groups.len().max(chart.phase_hatches.len());
    let (band, main) = root.split_vertically(band_height(height, rows, pen));
    let (backend_band, phase_band) = band.split_horizontally(width / 2);
    draw_legend(
        &backend_band,
        groups
            .iter()
            .map(|g| Swatch {
                label: g.style.display_name.to_string(),
                fill: Some(g.style.color),
                hatch: Hatch::none(),
                edge: None,
            })
            .collect(),
        pen,
    )?;
    draw_legend(
        &phase_band,
        chart
            .phase_hatches
            .iter()
            .map(|(phase, hatch)| Swatch {
                label: phase.to_string(),
                fill: Some(Rgb::WHITE),
                hatch: hatch.clone(),
                edge: Some(Rgb::BLACK),
            })
            .collect(),
        pen,
    )?;

    let n = chart.categories.len();
    let x_range = AxisRange::new(-0.5, n.max(1) as f64 - 0.5);
    let y_range = match max_top(groups) {
        Some(max) if max > 0. => AxisRange::new(0., max * 1.05),
        _ => AxisRange::new(0., 1.),
    };
    let mut plot = ChartBuilder::on(&main)
        .margin_right(20)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range.min..x_range.max, y_range.min..y_range.max)?;
    plot.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .x_label_formatter(&|_| String::new())
        .y_labels(5)
        .label_style(font(pen))
        .axis_desc_style(font(pen))
        .y_label_formatter(&tick_label)
        .y_desc(chart.y_desc.as_str())
        .draw()?;

    let half = chart.bar_width / 2.;
    for (i, group) in groups.iter().enumerate() {
        let offset = group_offset(i, groups.len(), chart.bar_width);
        let segments = group
            .traces
            .iter()
            .take(n)
            .enumerate()
            .filter_map(|(category, trace)| Some((category as f64 + offset, trace.as_ref()?)))
            .flat_map(|(x, trace)| trace.segments().into_iter().map(move |s| (x, s)));
        plot.draw_series(segments.map(|(x, segment)| {
            HatchedRect::new(
                [(x - half, segment.bottom), (x + half, segment.top)],
                Some(group.style.color),
                &chart.hatch_of(segment.phase),
                Some(Rgb::BLACK),
            )
        }))?;
    }

    frame(&mut plot, x_range, y_range)?;
    for (i, category) in chart.categories.iter().enumerate() {
        paint::label_below(
            &main,
            category,
            plot.backend_coord(&(i as f64, y_range.min)),
            pen,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::{
        aggregate::recovery::reconstruct_recovery,
        ingest::record::{PhaseDeltas, RawPhase},
        render::{write_svg, CanvasSize},
        style::StyleRegistry,
    };

    use super::*;

    fn trace() -> RecoveryTrace {
        reconstruct_recovery(
            &PhaseDeltas::default()
                .with(RawPhase::GetPeer, 1_000_000)
                .with(RawPhase::Connect, 500_000)
                .with(RawPhase::Recover, 2_000_000)
                .with(RawPhase::SyncPeers, 300_000)
                .with(RawPhase::EndRecover, 400_000),
        )
    }

    #[test]
    fn t_max_top() -> Result<()> {
        let styles = StyleRegistry::standard();
        let groups = [StackedGroup {
            style: styles.lookup(&"ncl".into())?,
            traces: vec![Some(trace()), None],
        }];
        let max = max_top(&groups).unwrap();
        assert!((max - 3.8).abs() < 1e-9);
        assert_eq!(max_top(&[]), None);
        Ok(())
    }

    #[test]
    fn t_band_height() {
        let pen = Pen::default();
        // A fifth of the plot unless the legend needs more
        assert_eq!(band_height(548, 1, &pen), 100);
        assert_eq!(band_height(548, 10, &pen), 16 + 10 * 24);
    }

    #[test]
    fn t_draw() -> Result<()> {
        let styles = StyleRegistry::standard();
        let groups: Vec<StackedGroup> = ["ncl", "cephfs", "ext4"]
            .iter()
            .map(|id| -> Result<StackedGroup> {
                Ok(StackedGroup {
                    style: styles.lookup(&(*id).into())?,
                    traces: vec![Some(trace()), None, Some(trace())],
                })
            })
            .collect::<Result<_>>()?;
        let chart = StackedChart {
            categories: vec!["RocksDB".into(), "Redis".into(), "SQLite".into()],
            y_desc: "Recovery time (ms)".into(),
            bar_width: 0.2,
            phase_hatches: vec![
                (RecoveryPhase::GetPeer, Hatch::new("\\\\\\")),
                (RecoveryPhase::Parse, Hatch::none()),
            ],
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("recovery.svg");
        write_svg(&path, CanvasSize::new(640, 480), |root| {
            draw_stacked_chart(root, &chart, &groups, &Pen::default())
        })?;
        let svg = std::fs::read_to_string(&path)?;
        assert!(svg.contains("get peer"));
        assert!(svg.contains("SplitFT"));
        Ok(())
    }
}
