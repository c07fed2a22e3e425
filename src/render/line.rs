//! Line chart with a broken y-axis: two stacked panels sharing the
//! x-axis, the upper one showing an outlier band, the lower one the
//! typical band. Every series is drawn into both panels, each cut to
//! its own range.

use anyhow::Result;
use plotters::{
    coord::ranged1d::{AsRangedCoord, ValueFormatter},
    prelude::*,
};

use crate::debug;

use super::{
    geometry::{padded_extent, AxisRange, Scale, Window},
    paint::{self, font, tick_label},
    BackendLine, Chart, Pen, Root,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BrokenAxisChart {
    pub x_desc: String,
    pub y_desc: String,
    pub x_scale: Scale,
    /// Taken from the data if not given
    pub x_range: Option<AxisRange>,
    pub lower: AxisRange,
    pub upper: AxisRange,
}

const MARGIN_TOP: u32 = 10;
const MARGIN_RIGHT: u32 = 24;
const X_LABEL_AREA: u32 = 64;
const Y_LABEL_AREA: u32 = 70;
/// Vertical distance between the panels
const GAP: u32 = 14;

fn default_x_range(scale: Scale) -> AxisRange {
    match scale {
        Scale::Linear => AxisRange::new(0., 1.),
        Scale::Log => AxisRange::new(1., 10.),
    }
}

/// Where the canvas of `height` pixels is split so that both plotting
/// areas come out equally high.
fn split_height(height: u32) -> u32 {
    let panel = height.saturating_sub(MARGIN_TOP + GAP + X_LABEL_AREA) / 2;
    MARGIN_TOP + panel + GAP / 2
}

/// Draw the series whose style has `group_side == 0`; the others are
/// meant for a secondary axis, which this chart does not have.
pub fn draw_broken_line_chart(
    root: &Root,
    chart: &BrokenAxisChart,
    series: &[BackendLine],
    pen: &Pen,
) -> Result<()> {
    let drawn: Vec<&BackendLine> = series
        .iter()
        .filter(|s| {
            let primary = s.style.is_primary_side();
            if !primary {
                debug!(
                    "not drawing {} (group side {})",
                    s.style.id, s.style.group_side
                );
            }
            primary
        })
        .collect();

    let x_range = chart
        .x_range
        .or_else(|| {
            padded_extent(
                drawn.iter().flat_map(|s| s.points.iter().map(|(x, _)| *x)),
                chart.x_scale,
            )
        })
        .unwrap_or_else(|| default_x_range(chart.x_scale));
    let x = x_range.min..x_range.max;
    match chart.x_scale {
        Scale::Linear => draw_panels(root, chart, &drawn, pen, x_range, x),
        Scale::Log => draw_panels(root, chart, &drawn, pen, x_range, x.log_scale()),
    }
}

fn draw_panels<XS>(
    root: &Root,
    chart: &BrokenAxisChart,
    drawn: &[&BackendLine],
    pen: &Pen,
    x_range: AxisRange,
    x_spec: XS,
) -> Result<()>
where
    XS: AsRangedCoord<Value = f64> + Clone,
    XS::CoordDescType: ValueFormatter<f64>,
{
    let (_, height) = root.dim_in_pixel();
    let (upper_area, lower_area) = root.split_vertically(split_height(height));

    let mut upper = ChartBuilder::on(&upper_area)
        .margin_top(MARGIN_TOP)
        .margin_bottom(GAP / 2)
        .margin_right(MARGIN_RIGHT)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_spec.clone(), chart.upper.min..chart.upper.max)?;
    upper
        .configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(3)
        .label_style(font(pen))
        .y_label_formatter(&tick_label)
        .draw()?;

    let mut lower = ChartBuilder::on(&lower_area)
        .margin_top(GAP / 2)
        .margin_right(MARGIN_RIGHT)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(x_spec, chart.lower.min..chart.lower.max)?;
    lower
        .configure_mesh()
        .disable_mesh()
        .x_labels(6)
        .y_labels(3)
        .label_style(font(pen))
        .axis_desc_style(font(pen))
        .x_label_formatter(&tick_label)
        .y_label_formatter(&tick_label)
        .x_desc(chart.x_desc.as_str())
        .draw()?;

    let window = |y: AxisRange| Window {
        x: x_range,
        x_scale: chart.x_scale,
        y,
        y_scale: Scale::Linear,
    };
    for s in drawn {
        s.draw(&mut upper, &window(chart.upper), pen, true)?;
        s.draw(&mut lower, &window(chart.lower), pen, false)?;
    }
    upper
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(font(pen))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    frame(&mut upper, x_range, chart.upper, true)?;
    frame(&mut lower, x_range, chart.lower, false)?;
    let (upper_x, upper_y) = upper.plotting_area().get_pixel_range();
    let (lower_x, lower_y) = lower.plotting_area().get_pixel_range();
    paint::break_marks(root, upper_x, upper_y.end)?;
    paint::break_marks(root, lower_x, lower_y.start)?;

    paint::vertical_text(
        root,
        &chart.y_desc,
        (18, (upper_y.start + lower_y.end) / 2),
        pen,
    )?;
    Ok(())
}

/// The right spine, and the top one for the upper panel; plotters
/// draws the left and bottom axes itself.
fn frame<X, Y>(chart: &mut Chart<X, Y>, x: AxisRange, y: AxisRange, top: bool) -> Result<()>
where
    X: Ranged<ValueType = f64>,
    Y: Ranged<ValueType = f64>,
{
    let area = chart.plotting_area();
    area.draw(&PathElement::new(
        vec![(x.max, y.min), (x.max, y.max)],
        BLACK,
    ))?;
    if top {
        area.draw(&PathElement::new(
            vec![(x.min, y.max), (x.max, y.max)],
            BLACK,
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::{render::write_svg, render::CanvasSize, style::StyleRegistry};

    use super::*;

    #[test]
    fn t_split_height() {
        let split = split_height(720);
        let upper_panel = split - MARGIN_TOP - GAP / 2;
        let lower_panel = 720 - split - GAP / 2 - X_LABEL_AREA;
        assert_eq!(upper_panel, lower_panel);
        assert_eq!(split_height(0), MARGIN_TOP + GAP / 2);
    }

    #[test]
    fn t_draw() -> Result<()> {
        let styles = StyleRegistry::standard();
        let mut secondary = styles.lookup(&"ext4".into())?.clone();
        secondary.group_side = 1;
        let sync = styles.lookup(&"sync".into())?;
        let series = [
            BackendLine {
                style: sync,
                label: sync.display_name.to_string(),
                points: vec![(10., 20.), (40., 60.), (80., 4500.)],
            },
            BackendLine {
                style: &secondary,
                label: "hidden".into(),
                points: vec![(10., 20.)],
            },
        ];
        let chart = BrokenAxisChart {
            x_desc: "Throughput (KOps/s)".into(),
            y_desc: "Latency (μs)".into(),
            x_scale: Scale::Linear,
            x_range: None,
            lower: AxisRange::new(1., 100.),
            upper: AxisRange::new(4000., 5200.),
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lat.svg");
        write_svg(&path, CanvasSize::new(480, 720), |root| {
            draw_broken_line_chart(root, &chart, &series, &Pen::default())
        })?;
        let svg = std::fs::read_to_string(&path)?;
        assert!(svg.contains("strong-app DFT"));
        assert!(svg.contains("Throughput (KOps/s)"));
        assert!(!svg.contains("hidden"));
        Ok(())
    }

    #[test]
    fn t_draw_log_x() -> Result<()> {
        let styles = StyleRegistry::standard();
        let ncl = styles.lookup(&"sync_ncl".into())?;
        let series = [BackendLine {
            style: ncl,
            label: ncl.sweep_label().to_string(),
            points: vec![(64., 5.), (128., 6.), (1024., 2000.), (8192., 9.)],
        }];
        let chart = BrokenAxisChart {
            x_desc: "Size (bytes)".into(),
            y_desc: "Latency (μs)".into(),
            x_scale: Scale::Log,
            x_range: Some(AxisRange::new(1e2, 1e4)),
            lower: AxisRange::new(0., 20.),
            upper: AxisRange::new(1800., 2200.),
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("write_lat.svg");
        write_svg(&path, CanvasSize::new(640, 480), |root| {
            draw_broken_line_chart(root, &chart, &series, &Pen::default())
        })?;
        assert!(std::fs::read_to_string(&path)?.contains("NCL"));
        Ok(())
    }
}
