//! Styles and elements shared by the charts. Plotters fills
//! rectangles but has no hatching, so `HatchedRect` is an element of
//! its own; it draws bars as well as legend swatches.

use std::ops::Range;

use anyhow::Result;
use plotters::{
    element::{Drawable, PointCollection},
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use plotters_backend::{BackendCoord, DrawingErrorKind};

use crate::style::{Hatch, HatchStroke, Marker, Rgb};

use super::{
    geometry::{break_mark, hatch_points, hatch_segments, marker_outline, PixelRect, Pt},
    Pen, Root,
};

pub fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn px((x, y): Pt) -> BackendCoord {
    (x.round() as i32, y.round() as i32)
}

const FONT_FAMILY: &str = "sans-serif";

/// Tick labels, axis descriptions and legends.
pub fn font(pen: &Pen) -> FontDesc<'static> {
    (FONT_FAMILY, pen.font_size).into_font()
}

/// Labels along an axis: integers without decimals, other values
/// with at most three significant decimals.
pub fn tick_label(v: &f64) -> String {
    if v.fract() == 0. || v.abs() >= 100. {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// A rectangle with optional fill, the hatch drawn in `ink`, and an
/// optional outline. Works in data coordinates on a chart (plotters
/// moves corners outside of the plotting area onto its edge) as
/// well as in pixels for legend swatches.
pub struct HatchedRect<C> {
    corners: [C; 2],
    fill: Option<RGBColor>,
    hatch: Hatch,
    ink: RGBColor,
    edge: Option<RGBColor>,
}

impl<C> HatchedRect<C> {
    pub fn new(corners: [C; 2], fill: Option<Rgb>, hatch: &Hatch, edge: Option<Rgb>) -> Self {
        Self {
            corners,
            fill: fill.map(rgb),
            hatch: hatch.clone(),
            ink: rgb(edge.unwrap_or(Rgb::BLACK)),
            edge: edge.map(rgb),
        }
    }
}

impl<'a, C> PointCollection<'a, C> for &'a HatchedRect<C> {
    type Point = &'a C;
    type IntoIter = &'a [C];
    fn point_iter(self) -> &'a [C] {
        &self.corners
    }
}

impl<C, DB: DrawingBackend> Drawable<DB> for HatchedRect<C> {
    fn draw<I: Iterator<Item = BackendCoord>>(
        &self,
        mut points: I,
        backend: &mut DB,
        _: (u32, u32),
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        let (Some(a), Some(b)) = (points.next(), points.next()) else {
            return Ok(());
        };
        let rect = PixelRect::spanning(a, b);
        let (upper_left, lower_right) = (px((rect.left, rect.top)), px((rect.right, rect.bottom)));
        if let Some(fill) = &self.fill {
            backend.draw_rect(upper_left, lower_right, fill, true)?;
        }
        for (stroke, density) in self.hatch.strokes() {
            match stroke {
                HatchStroke::Dots => {
                    for p in hatch_points(&rect, density) {
                        backend.draw_circle(px(p), 1, &self.ink, true)?;
                    }
                }
                HatchStroke::Stars => {
                    for (x, y) in hatch_points(&rect, density) {
                        let star = marker_outline(Marker::Star, 5)
                            .into_iter()
                            .map(|(dx, dy)| (x.round() as i32 + dx, y.round() as i32 + dy));
                        backend.fill_polygon(star, &self.ink)?;
                    }
                }
                _ => {
                    for (p, q) in hatch_segments(&rect, stroke, density) {
                        backend.draw_line(px(p), px(q), &self.ink)?;
                    }
                }
            }
        }
        if let Some(edge) = &self.edge {
            backend.draw_rect(upper_left, lower_right, edge, false)?;
        }
        Ok(())
    }
}

/// Position of `p` (absolute backend pixels) on `area`.
fn on_area(area: &Root, (x, y): BackendCoord) -> BackendCoord {
    let (x0, y0) = area.get_base_pixel();
    (x - x0, y - y0)
}

/// The "//" marks at both ends of the edge at height `y` (absolute
/// backend pixels) where an axis is broken.
pub fn break_marks(area: &Root, x: Range<i32>, y: i32) -> Result<()> {
    for x in [x.start, x.end] {
        let (a, b) = break_mark((x as f64, y as f64), 6.);
        area.draw(&PathElement::new(
            vec![on_area(area, px(a)), on_area(area, px(b))],
            BLACK.stroke_width(1),
        ))?;
    }
    Ok(())
}

/// A label centered under `at` (absolute backend pixels), one text
/// line per line of `s`.
pub fn label_below(area: &Root, s: &str, at: BackendCoord, pen: &Pen) -> Result<()> {
    let style = TextStyle::from(font(pen)).pos(Pos::new(HPos::Center, VPos::Top));
    let (x, y) = on_area(area, at);
    let line_height = (pen.font_size as f64 * 1.2).round() as i32;
    for (i, line) in s.lines().enumerate() {
        area.draw(&Text::new(
            line.to_string(),
            (x, y + 6 + i as i32 * line_height),
            style.clone(),
        ))?;
    }
    Ok(())
}

/// An axis description rotated by 270 degrees, centered on `at`
/// (pixels of `area`).
pub fn vertical_text(area: &Root, s: &str, at: BackendCoord, pen: &Pen) -> Result<()> {
    let style = TextStyle::from(font(pen).transform(FontTransform::Rotate270))
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(s.to_string(), at, style))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_tick_label() {
        assert_eq!(tick_label(&4000.), "4000");
        assert_eq!(tick_label(&0.5), "0.5");
        assert_eq!(tick_label(&0.125), "0.125");
        assert_eq!(tick_label(&1e-4), "0");
        assert_eq!(tick_label(&2.50), "2.5");
        assert_eq!(tick_label(&123.4), "123");
    }
}
