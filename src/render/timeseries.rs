//! Plain line chart of several time series, colored by the default
//! color cycle, without legend.

use anyhow::Result;
use plotters::prelude::*;

use crate::style::Rgb;

use super::{
    geometry::{padded_extent, AxisRange, Scale},
    paint::{font, rgb, tick_label},
    Pen, Root,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

fn extent(series: &[TimeSeries], coord: impl Fn(&(f64, f64)) -> f64) -> AxisRange {
    padded_extent(
        series.iter().flat_map(|s| s.points.iter()).map(coord),
        Scale::Linear,
    )
    .unwrap_or(AxisRange::new(0., 1.))
}

pub fn draw_time_series(
    root: &Root,
    x_desc: &str,
    y_desc: &str,
    series: &[TimeSeries],
    pen: &Pen,
) -> Result<()> {
    let x = extent(series, |p| p.0);
    let y = extent(series, |p| p.1);
    let mut chart = ChartBuilder::on(root)
        .margin(16)
        .margin_right(20)
        .x_label_area_size(56)
        .y_label_area_size(80)
        .build_cartesian_2d(x.min..x.max, y.min..y.max)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(6)
        .y_labels(6)
        .label_style(font(pen))
        .axis_desc_style(font(pen))
        .x_label_formatter(&tick_label)
        .y_label_formatter(&tick_label)
        .x_desc(x_desc)
        .y_desc(y_desc)
        .draw()?;
    for (i, s) in series.iter().enumerate() {
        chart.draw_series(LineSeries::new(
            s.points.iter().copied(),
            rgb(Rgb::cycle(i)).stroke_width(pen.line_width),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::render::{write_svg, CanvasSize};

    use super::*;

    #[test]
    fn t_extent() {
        let series = [
            TimeSeries {
                name: "a".into(),
                points: vec![(0., 1.), (10., 3.)],
            },
            TimeSeries {
                name: "b".into(),
                points: vec![],
            },
        ];
        let r = extent(&series, |p| p.0);
        assert!(r.min < 0. && r.max > 10.);
        assert_eq!(extent(&[], |p| p.0), AxisRange::new(0., 1.));
    }

    #[test]
    fn t_draw() -> Result<()> {
        let series = [TimeSeries {
            name: "wal.log".into(),
            points: vec![(0., 0.5), (0.1, 1.5), (0.2, 4.)],
        }];
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("mon.svg");
        write_svg(&path, CanvasSize::new(640, 480), |root| {
            draw_time_series(root, "time (s)", "size (MB)", &series, &Pen::default())
        })?;
        assert!(std::fs::read_to_string(&path)?.contains("size (MB)"));
        Ok(())
    }
}
