//! Chart rendering. Every chart kind draws onto an SVG canvas that is
//! only written to its output path once drawing succeeded; charts
//! never return data.

pub mod bars;
pub mod geometry;
pub mod line;
pub mod loglog;
pub mod paint;
pub mod stacked;
pub mod timeseries;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use plotters::{coord::Shift, element::DashedPathElement, prelude::*};

use crate::style::BackendStyle;

use self::{
    geometry::{marker_outline, AxisRange, Window},
    paint::rgb,
};

pub type Root<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// A chart with two numeric axes on the SVG canvas.
pub type Chart<'a, 'b, X, Y> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<X, Y>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Pixel sizes of lines, markers and text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pen {
    pub line_width: u32,
    pub marker_size: u32,
    pub font_size: u32,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            line_width: 3,
            marker_size: 9,
            font_size: 16,
        }
    }
}

/// Length of the line in a legend swatch.
const SWATCH_LENGTH: i32 = 24;

/// One backend's line in a line chart.
#[derive(Debug, Clone)]
pub struct BackendLine<'s> {
    pub style: &'s BackendStyle,
    pub label: String,
    /// Data coordinates, in drawing order
    pub points: Vec<(f64, f64)>,
}

impl BackendLine<'_> {
    /// Draw the line cut to `window` and markers at the points inside
    /// of it; with `legend`, the series gets an entry in the chart's
    /// series labels.
    pub fn draw<'a, 'b: 'a, X, Y>(
        &self,
        chart: &mut Chart<'a, 'b, X, Y>,
        window: &Window,
        pen: &Pen,
        legend: bool,
    ) -> Result<()>
    where
        X: Ranged<ValueType = f64>,
        Y: Ranged<ValueType = f64>,
    {
        let color = rgb(self.style.color);
        let line = color.stroke_width(pen.line_width);
        let dash = self.style.linestyle.dash(pen.line_width);
        for run in window.clip_line(&self.points) {
            match dash {
                None => chart.draw_series(LineSeries::new(run, line))?,
                Some((size, spacing)) => {
                    chart.draw_series(DashedLineSeries::new(run, size, spacing, line))?
                }
            };
        }

        let outline = marker_outline(self.style.marker, pen.marker_size);
        let anno = chart.draw_series(
            self.points
                .iter()
                .filter(|p| window.contains(**p))
                .map(|p| EmptyElement::at(*p) + Polygon::new(outline.clone(), color.filled())),
        )?;
        if legend {
            // A dash as long as the swatch draws it solid
            let (size, spacing) = dash.unwrap_or((SWATCH_LENGTH as u32, 1));
            let outline: Vec<(i32, i32)> = outline
                .iter()
                .map(|(dx, dy)| (dx + SWATCH_LENGTH / 2, *dy))
                .collect();
            anno.label(self.label.clone()).legend(move |(x, y)| {
                EmptyElement::at((x, y))
                    + DashedPathElement::new(vec![(0, 0), (SWATCH_LENGTH, 0)], size, spacing, line)
                    + Polygon::new(outline.clone(), color.filled())
            });
        }
        Ok(())
    }
}

/// A box around the plotting area of `chart`, spanning `x` by `y`.
pub fn frame<X, Y>(chart: &mut Chart<X, Y>, x: AxisRange, y: AxisRange) -> Result<()>
where
    X: Ranged<ValueType = f64>,
    Y: Ranged<ValueType = f64>,
{
    chart.plotting_area().draw(&PathElement::new(
        vec![
            (x.min, y.min),
            (x.max, y.min),
            (x.max, y.max),
            (x.min, y.max),
            (x.min, y.min),
        ],
        BLACK,
    ))?;
    Ok(())
}

/// Render via `draw` into an SVG document and write it to `path`
/// (creating the parent directory). Nothing is written if `draw`
/// fails.
pub fn write_svg(
    path: &Path,
    size: CanvasSize,
    draw: impl FnOnce(&Root) -> Result<()>,
) -> Result<()> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (size.width, size.height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()
            .with_context(|| anyhow!("finishing SVG document for {path:?}"))?;
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| anyhow!("creating directory {dir:?}"))?;
    }
    std::fs::write(path, svg).with_context(|| anyhow!("writing chart to {path:?}"))
}
