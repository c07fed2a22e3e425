//! Bar charts: grouped, hatched bars with error bars (one group per
//! category, one bar per backend), and single bars side by side in
//! several panels.

use anyhow::Result;
use plotters::{
    coord::ranged1d::{AsRangedCoord, ValueFormatter},
    prelude::*,
};

use crate::style::{BackendStyle, Rgb};

use super::{
    frame,
    geometry::{group_offset, padded_extent, AxisRange, Scale},
    paint::{self, font, rgb, tick_label, HatchedRect},
    Pen, Root,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub value: f64,
    /// Half length of the error bar
    pub error: Option<f64>,
}

/// One backend's bars, indexed by category; missing bars leave a gap.
#[derive(Debug, Clone)]
pub struct BarSeries<'s> {
    pub style: &'s BackendStyle,
    /// Only labelled series appear in the legend
    pub legend_label: Option<String>,
    pub bars: Vec<Option<Bar>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBarChart {
    pub categories: Vec<String>,
    pub x_desc: String,
    pub y_desc: String,
    /// In category units
    pub bar_width: f64,
    /// From zero to the data maximum if not given
    pub y_range: Option<AxisRange>,
}

/// Width of the error bar caps, in pixels
const CAP_WIDTH: u32 = 6;

fn zero_based(max: Option<f64>) -> AxisRange {
    match max {
        Some(max) if max > 0. => AxisRange::new(0., max * 1.05),
        _ => AxisRange::new(0., 1.),
    }
}

pub fn draw_grouped_bars(
    root: &Root,
    chart: &GroupedBarChart,
    series: &[BarSeries],
    pen: &Pen,
) -> Result<()> {
    let n = chart.categories.len();
    let x_range = AxisRange::new(-0.5, n.max(1) as f64 - 0.5);
    let y_range = chart.y_range.unwrap_or_else(|| {
        zero_based(
            series
                .iter()
                .flat_map(|s| s.bars.iter().flatten())
                .map(|b| b.value + b.error.unwrap_or(0.))
                .reduce(f64::max),
        )
    });

    let mut plot = ChartBuilder::on(root)
        .margin(10)
        .margin_right(20)
        .x_label_area_size(64)
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
        .x_desc(chart.x_desc.as_str())
        .y_desc(chart.y_desc.as_str())
        .draw()?;

    let half = chart.bar_width / 2.;
    for (i, s) in series.iter().enumerate() {
        let offset = group_offset(i, series.len(), chart.bar_width);
        let bars: Vec<(f64, Bar)> = s
            .bars
            .iter()
            .take(n)
            .enumerate()
            .filter_map(|(category, bar)| Some((category as f64 + offset, (*bar)?)))
            .collect();
        let anno = plot.draw_series(bars.iter().map(|(x, bar)| {
            HatchedRect::new(
                [(x - half, 0.), (x + half, bar.value)],
                Some(s.style.color),
                &s.style.hatch,
                Some(Rgb::BLACK),
            )
        }))?;
        if let Some(label) = &s.legend_label {
            let (color, hatch) = (s.style.color, s.style.hatch.clone());
            anno.label(label.clone()).legend(move |(x, y)| {
                HatchedRect::new(
                    [(x, y - 6), (x + 18, y + 6)],
                    Some(color),
                    &hatch,
                    Some(Rgb::BLACK),
                )
            });
        }
        plot.draw_series(bars.iter().filter_map(|(x, bar)| {
            let error = bar.error?;
            Some(ErrorBar::new_vertical(
                *x,
                bar.value - error,
                bar.value,
                bar.value + error,
                BLACK.stroke_width(1),
                CAP_WIDTH,
            ))
        }))?;
    }

    frame(&mut plot, x_range, y_range)?;
    for (i, category) in chart.categories.iter().enumerate() {
        paint::label_below(
            root,
            category,
            plot.backend_coord(&(i as f64, y_range.min)),
            pen,
        )?;
    }
    if series.iter().any(|s| s.legend_label.is_some()) {
        plot.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font(font(pen))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

/// One panel of a side-by-side bar chart: one bar per backend at the
/// chart's positions.
#[derive(Debug, Clone)]
pub struct BarPanel<'s> {
    pub y_desc: String,
    pub y_scale: Scale,
    /// Taken from the data if not given
    pub y_range: Option<AxisRange>,
    pub bars: Vec<(&'s BackendStyle, Option<f64>)>,
}

#[derive(Debug, Clone)]
pub struct SideBySideChart<'s> {
    /// x position of each bar (same order as `BarPanel::bars`)
    pub positions: Vec<f64>,
    pub x_range: AxisRange,
    pub bar_width: f64,
    pub panels: Vec<BarPanel<'s>>,
}

/// Bars from the axis bottom up, one panel per entry of
/// `chart.panels`, each bar labelled with its backend's bar label.
pub fn draw_side_by_side_bars(root: &Root, chart: &SideBySideChart, pen: &Pen) -> Result<()> {
    let label_lines = chart
        .panels
        .iter()
        .flat_map(|p| p.bars.iter().map(|(s, _)| s.bar_label().lines().count()))
        .max()
        .unwrap_or(1);
    let label_area = 24 + label_lines as u32 * pen.font_size * 6 / 5;

    let areas = root.split_evenly((1, chart.panels.len().max(1)));
    for (panel, area) in chart.panels.iter().zip(&areas) {
        let values = panel.bars.iter().filter_map(|(_, v)| *v);
        let y_range = panel.y_range.unwrap_or_else(|| match panel.y_scale {
            Scale::Linear => zero_based(values.reduce(f64::max)),
            Scale::Log => padded_extent(values, Scale::Log).unwrap_or(AxisRange::new(1., 10.)),
        });
        let y = y_range.min..y_range.max;
        match panel.y_scale {
            Scale::Linear => draw_bar_panel(area, chart, panel, y_range, label_area, pen, y),
            Scale::Log => {
                draw_bar_panel(area, chart, panel, y_range, label_area, pen, y.log_scale())
            }
        }?;
    }
    Ok(())
}

fn draw_bar_panel<YS>(
    area: &Root,
    chart: &SideBySideChart,
    panel: &BarPanel,
    y_range: AxisRange,
    label_area: u32,
    pen: &Pen,
    y_spec: YS,
) -> Result<()>
where
    YS: AsRangedCoord<Value = f64>,
    YS::CoordDescType: ValueFormatter<f64>,
{
    let x_range = chart.x_range;
    let mut plot = ChartBuilder::on(area)
        .margin(10)
        .margin_top(10 + pen.font_size)
        .margin_right(20)
        .x_label_area_size(label_area)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range.min..x_range.max, y_spec)?;
    plot.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .x_label_formatter(&|_| String::new())
        .y_labels(5)
        .label_style(font(pen))
        .axis_desc_style(font(pen))
        .y_label_formatter(&tick_label)
        .y_desc(panel.y_desc.as_str())
        .draw()?;

    let half = chart.bar_width / 2.;
    plot.draw_series(panel.bars.iter().zip(&chart.positions).filter_map(
        |((style, value), x)| {
            Some(Rectangle::new(
                [(x - half, y_range.min), (x + half, (*value)?)],
                rgb(style.color).filled(),
            ))
        },
    ))?;
    frame(&mut plot, x_range, y_range)?;
    for ((style, _), x) in panel.bars.iter().zip(&chart.positions) {
        paint::label_below(
            area,
            style.bar_label(),
            plot.backend_coord(&(*x, y_range.min)),
            pen,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::{
        render::{write_svg, CanvasSize},
        style::StyleRegistry,
    };

    use super::*;

    #[test]
    fn t_zero_based() {
        assert!((zero_based(Some(10.)).max - 10.5).abs() < 1e-9);
        assert_eq!(zero_based(Some(-1.)), AxisRange::new(0., 1.));
        assert_eq!(zero_based(None), AxisRange::new(0., 1.));
    }

    #[test]
    fn t_draw_grouped() -> Result<()> {
        let styles = StyleRegistry::standard();
        let series: Vec<BarSeries> = ["sync", "cephfs", "sync_ncl"]
            .iter()
            .enumerate()
            .map(|(i, id)| -> Result<BarSeries> {
                let style = styles.lookup(&(*id).into())?;
                Ok(BarSeries {
                    style,
                    legend_label: (i == 1).then(|| style.display_name.to_string()),
                    bars: vec![
                        Some(Bar {
                            value: 10. + i as f64,
                            error: Some(1.),
                        }),
                        None,
                    ],
                })
            })
            .collect::<Result<_>>()?;
        let chart = GroupedBarChart {
            categories: vec!["a".into(), "b".into()],
            x_desc: "Workload".into(),
            y_desc: "Throughput (KOps/s)".into(),
            bar_width: 0.2,
            y_range: None,
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bars.svg");
        write_svg(&path, CanvasSize::new(640, 360), |root| {
            draw_grouped_bars(root, &chart, &series, &Pen::default())
        })?;
        let svg = std::fs::read_to_string(&path)?;
        assert!(svg.contains("weak-app DFT"));
        assert!(!svg.contains("strong-app DFT"));
        assert!(svg.contains("Workload"));
        Ok(())
    }

    #[test]
    fn t_draw_side_by_side() -> Result<()> {
        let styles = StyleRegistry::standard();
        let sync = styles.lookup(&"sync".into())?;
        let ncl = styles.lookup(&"sync_ncl".into())?;
        let chart = SideBySideChart {
            positions: vec![0., 1.],
            x_range: AxisRange::new(-0.6, 1.6),
            bar_width: 0.6,
            panels: vec![
                BarPanel {
                    y_desc: "Throughput (KOps/s)".into(),
                    y_scale: Scale::Linear,
                    y_range: None,
                    bars: vec![(sync, Some(10.)), (ncl, None)],
                },
                BarPanel {
                    y_desc: "Latency (μs)".into(),
                    y_scale: Scale::Log,
                    y_range: None,
                    bars: vec![(sync, Some(5.)), (ncl, Some(500.))],
                },
            ],
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("side.svg");
        write_svg(&path, CanvasSize::new(800, 360), |root| {
            draw_side_by_side_bars(root, &chart, &Pen::default())
        })?;
        let svg = std::fs::read_to_string(&path)?;
        assert!(svg.contains("Latency (μs)"));
        for line in ncl.bar_label().lines() {
            assert!(svg.contains(line));
        }
        Ok(())
    }
}
