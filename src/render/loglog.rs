//! Size sweeps: latency over payload size, both axes logarithmic.

use anyhow::Result;
use plotters::prelude::*;

use super::{
    geometry::{padded_extent, AxisRange, Scale, Window},
    paint::{font, tick_label},
    BackendLine, Pen, Root,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SweepChart {
    pub x_desc: String,
    pub y_desc: String,
    /// The size window; the lines are cut at its ends
    pub x_range: AxisRange,
    /// Taken from the points inside the size window if not given
    pub y_range: Option<AxisRange>,
}

pub fn draw_loglog_chart(
    root: &Root,
    chart: &SweepChart,
    series: &[BackendLine],
    pen: &Pen,
) -> Result<()> {
    let y_range = chart
        .y_range
        .or_else(|| {
            padded_extent(
                series
                    .iter()
                    .flat_map(|s| s.points.iter())
                    .filter(|(x, _)| chart.x_range.contains(*x))
                    .map(|(_, y)| *y),
                Scale::Log,
            )
        })
        .unwrap_or(AxisRange::new(1., 10.));
    let AxisRange { min, max } = chart.x_range;

    let mut plot = ChartBuilder::on(root)
        .margin(10)
        .margin_right(24)
        .x_label_area_size(64)
        .y_label_area_size(80)
        .build_cartesian_2d((min..max).log_scale(), (y_range.min..y_range.max).log_scale())?;
    plot.configure_mesh()
        .disable_mesh()
        .label_style(font(pen))
        .axis_desc_style(font(pen))
        .x_label_formatter(&tick_label)
        .y_label_formatter(&tick_label)
        .x_desc(chart.x_desc.as_str())
        .y_desc(chart.y_desc.as_str())
        .draw()?;

    let window = Window {
        x: chart.x_range,
        x_scale: Scale::Log,
        y: y_range,
        y_scale: Scale::Log,
    };
    for s in series {
        s.draw(&mut plot, &window, pen, true)?;
    }
    plot.configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(font(pen))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
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
    fn t_draw() -> Result<()> {
        let styles = StyleRegistry::standard();
        let ncl = styles.lookup(&"rd_ncl".into())?;
        let dfs = styles.lookup(&"rd_cephfs".into())?;
        let series = [
            BackendLine {
                style: ncl,
                label: ncl.display_name.to_string(),
                points: vec![(64., 1.), (128., 2.), (1024., 3.), (8192., 12.)],
            },
            BackendLine {
                style: dfs,
                label: dfs.display_name.to_string(),
                points: vec![(128., 40.), (0., 50.)],
            },
        ];
        let chart = SweepChart {
            x_desc: "Read size (B)".into(),
            y_desc: "Latency (μs)".into(),
            x_range: AxisRange::new(1e2, 1e4),
            y_range: None,
        };
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("read_lat.svg");
        write_svg(&path, CanvasSize::new(640, 480), |root| {
            draw_loglog_chart(root, &chart, &series, &Pen::default())
        })?;
        let svg = std::fs::read_to_string(&path)?;
        assert!(svg.contains("DFS"));
        assert!(svg.contains("NCL"));
        assert!(svg.contains("Read size (B)"));
        Ok(())
    }
}
