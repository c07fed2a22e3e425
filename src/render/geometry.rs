//! Geometry plotters has no element for: data extents, cutting a
//! line at a panel's window, hatch strokes, marker outlines and the
//! marks of a broken axis. Nothing in here draws.

use itertools::{Itertools, MinMaxResult};

use crate::style::{HatchStroke, Marker};

/// A point, in pixels unless stated otherwise.
pub type Pt = (f64, f64);

/// Inclusive value range of an axis.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    Log,
}

impl Scale {
    /// Position of `v` along an axis of this scale; None where it has
    /// none (non-positive values on a log axis).
    fn position(self, v: f64) -> Option<f64> {
        match self {
            Scale::Linear => v.is_finite().then_some(v),
            Scale::Log => (v > 0. && v.is_finite()).then(|| v.log10()),
        }
    }

    fn value(self, position: f64) -> f64 {
        match self {
            Scale::Linear => position,
            Scale::Log => 10f64.powf(position),
        }
    }
}

/// The range covering `values` with a 5% margin on both ends (in
/// log space for `Scale::Log`, ignoring non-positive values there).
/// None if there is no usable value.
pub fn padded_extent(values: impl IntoIterator<Item = f64>, scale: Scale) -> Option<AxisRange> {
    let (lo, hi) = match values
        .into_iter()
        .filter_map(|v| scale.position(v))
        .minmax_by(f64::total_cmp)
    {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };
    let pad = if hi > lo {
        (hi - lo) * 0.05
    } else {
        match scale {
            Scale::Linear => (lo.abs() * 0.05).max(0.5),
            Scale::Log => 0.1,
        }
    };
    Some(AxisRange::new(scale.value(lo - pad), scale.value(hi + pad)))
}

/// Parameters `(t0, t1)` of the part of the segment `a`-`b` inside
/// the box from `lo` to `hi` (Liang-Barsky).
fn clip_params(a: Pt, b: Pt, lo: Pt, hi: Pt) -> Option<(f64, f64)> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let mut t0: f64 = 0.;
    let mut t1: f64 = 1.;
    for (p, q) in [
        (-dx, a.0 - lo.0),
        (dx, hi.0 - a.0),
        (-dy, a.1 - lo.1),
        (dy, hi.1 - a.1),
    ] {
        if p == 0. {
            if q < 0. {
                return None;
            }
        } else {
            let t = q / p;
            if p < 0. {
                if t > t1 {
                    return None;
                }
                t0 = t0.max(t);
            } else {
                if t < t0 {
                    return None;
                }
                t1 = t1.min(t);
            }
        }
    }
    Some((t0, t1))
}

/// What a panel shows, in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub x: AxisRange,
    pub x_scale: Scale,
    pub y: AxisRange,
    pub y_scale: Scale,
}

impl Window {
    pub fn contains(&self, (x, y): (f64, f64)) -> bool {
        self.x.contains(x) && self.y.contains(y)
    }

    fn position(&self, (x, y): (f64, f64)) -> Option<Pt> {
        Some((self.x_scale.position(x)?, self.y_scale.position(y)?))
    }

    /// The runs of the line through `points` that lie inside the
    /// window, each with at least two points. Cut points are
    /// interpolated along the axes' scales; points inside are kept
    /// as they are. Plotters moves coordinates outside of a plotting
    /// area onto its edge, so a line has to be cut before drawing.
    pub fn clip_line(&self, points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
        let (Some(lo), Some(hi)) = (
            self.position((self.x.min, self.y.min)),
            self.position((self.x.max, self.y.max)),
        ) else {
            return Vec::new();
        };
        let value = |(x, y): Pt| (self.x_scale.value(x), self.y_scale.value(y));

        let mut runs = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        let mut flush = |current: &mut Vec<(f64, f64)>| {
            if current.len() >= 2 {
                runs.push(std::mem::take(current));
            }
            current.clear();
        };
        for w in points.windows(2) {
            let (Some(a), Some(b)) = (self.position(w[0]), self.position(w[1])) else {
                flush(&mut current);
                continue;
            };
            let Some((t0, t1)) = clip_params(a, b, lo, hi) else {
                flush(&mut current);
                continue;
            };
            let at = |t: f64| value((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1)));
            if t0 > 0. || current.is_empty() {
                flush(&mut current);
                current.push(if t0 > 0. { at(t0) } else { w[0] });
            }
            if t1 < 1. {
                current.push(at(t1));
                flush(&mut current);
            } else {
                current.push(w[1]);
            }
        }
        flush(&mut current);
        runs
    }
}

/// A rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PixelRect {
    /// The rectangle spanned by two corners in backend coordinates.
    pub fn spanning((x0, y0): (i32, i32), (x1, y1): (i32, i32)) -> Self {
        Self {
            left: x0.min(x1) as f64,
            top: y0.min(y1) as f64,
            right: x0.max(x1) as f64,
            bottom: y0.max(y1) as f64,
        }
    }

    #[cfg(test)]
    fn contains(&self, (x, y): Pt) -> bool {
        self.left <= x && x <= self.right && self.top <= y && y <= self.bottom
    }
}

/// Base distance between hatch lines, in pixels.
const HATCH_SPACING: f64 = 8.;

/// The line segments of one hatch stroke kind filling `rect`;
/// `density` is how often the stroke was given. Lines are anchored
/// to the pixel grid, so adjacent rectangles line up. Dots and stars
/// are not lines; see `hatch_points`.
pub fn hatch_segments(rect: &PixelRect, stroke: HatchStroke, density: u32) -> Vec<(Pt, Pt)> {
    let spacing = HATCH_SPACING / density.max(1) as f64;
    let steps = |from: f64, to: f64, step: f64| {
        let first = (from / step).ceil() as i64;
        let last = (to / step).floor() as i64;
        (first..=last).map(move |k| k as f64 * step)
    };
    let PixelRect {
        left,
        top,
        right,
        bottom,
    } = *rect;
    let lines: Vec<(Pt, Pt)> = match stroke {
        HatchStroke::Vertical => steps(left, right, spacing)
            .map(|x| ((x, top), (x, bottom)))
            .collect(),
        HatchStroke::Horizontal => steps(top, bottom, spacing)
            .map(|y| ((left, y), (right, y)))
            .collect(),
        // x + y = c, rising to the right on screen
        HatchStroke::Forward => steps(left + top, right + bottom, spacing * 2f64.sqrt())
            .map(|c| ((c - bottom, bottom), (c - top, top)))
            .collect(),
        // y - x = c
        HatchStroke::Back => steps(top - right, bottom - left, spacing * 2f64.sqrt())
            .map(|c| ((left, left + c), (right, right + c)))
            .collect(),
        HatchStroke::Dots | HatchStroke::Stars => Vec::new(),
    };
    let (lo, hi) = ((left, top), (right, bottom));
    lines
        .into_iter()
        .filter_map(|(a, b)| {
            let (t0, t1) = clip_params(a, b, lo, hi)?;
            let at = |t: f64| (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1));
            Some((at(t0), at(t1)))
        })
        .collect()
}

/// Centers for dot or star hatching, on a staggered grid.
pub fn hatch_points(rect: &PixelRect, density: u32) -> Vec<Pt> {
    let spacing = HATCH_SPACING / density.max(1) as f64;
    let mut points = Vec::new();
    let first_row = (rect.top / spacing).ceil() as i64;
    let last_row = (rect.bottom / spacing).floor() as i64;
    for row in first_row..=last_row {
        let y = row as f64 * spacing;
        let offset = if row % 2 == 0 { 0. } else { spacing / 2. };
        let first = ((rect.left - offset) / spacing).ceil() as i64;
        let last = ((rect.right - offset) / spacing).floor() as i64;
        for col in first..=last {
            points.push((col as f64 * spacing + offset, y));
        }
    }
    points
}

/// Outline of a filled marker of (roughly) `size` pixels diameter,
/// relative to its center. Circles are approximated by a 16-gon so
/// that every marker is a `Polygon`.
pub fn marker_outline(marker: Marker, size: u32) -> Vec<(i32, i32)> {
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

    let r = size as f64 / 2.;
    let ring = |n: usize, radius: &dyn Fn(usize) -> f64| -> Vec<(f64, f64)> {
        (0..n)
            .map(|i| {
                let angle = -FRAC_PI_2 + i as f64 * 2. * PI / n as f64;
                (radius(i) * angle.cos(), radius(i) * angle.sin())
            })
            .collect()
    };
    let plus = vec![
        (-1. / 3., -1.),
        (1. / 3., -1.),
        (1. / 3., -1. / 3.),
        (1., -1. / 3.),
        (1., 1. / 3.),
        (1. / 3., 1. / 3.),
        (1. / 3., 1.),
        (-1. / 3., 1.),
        (-1. / 3., 1. / 3.),
        (-1., 1. / 3.),
        (-1., -1. / 3.),
        (-1. / 3., -1. / 3.),
    ];
    let h = 3f64.sqrt() / 2.;
    let unit: Vec<(f64, f64)> = match marker {
        Marker::Circle => ring(16, &|_| 1.),
        Marker::TriangleUp => vec![(0., -1.), (h, 0.5), (-h, 0.5)],
        Marker::TriangleDown => vec![(0., 1.), (h, -0.5), (-h, -0.5)],
        Marker::Square => vec![(-0.8, -0.8), (0.8, -0.8), (0.8, 0.8), (-0.8, 0.8)],
        Marker::Star => ring(10, &|i| if i % 2 == 0 { 1.1 } else { 0.45 }),
        Marker::Plus => plus,
        Marker::Cross => plus
            .iter()
            .map(|(x, y)| (FRAC_1_SQRT_2 * (x - y), FRAC_1_SQRT_2 * (x + y)))
            .collect(),
    };
    unit.into_iter()
        .map(|(x, y)| ((x * r).round() as i32, (y * r).round() as i32))
        .collect()
}

/// One stroke of the diagonal "//" drawn where an axis is broken.
pub fn break_mark((x, y): Pt, size: f64) -> (Pt, Pt) {
    ((x - size, y + size / 2.), (x + size, y - size / 2.))
}

/// Horizontal offset of member `index` of a group of `count` bars of
/// `width`, so that the group is centered on its category.
pub fn group_offset(index: usize, count: usize, width: f64) -> f64 {
    (index as f64 - (count as f64 - 1.) / 2.) * width
}
