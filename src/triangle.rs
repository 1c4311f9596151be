//! Triangular fold of the dot plot.
//!
//! Hits are canonical (`a <= b`), so all of them sit on or above the
//! diagonal of the square `[0, ymax]²`. Rotating that square by -45° puts
//! the diagonal on the horizontal axis and the populated half above it,
//! which gives a triangle of width `2·sqrt(ymax²/2)` and height
//! `sqrt(ymax²/2)`.

use crate::coords::CoordinateTable;
use crate::error::{DotplotError, Result};
use crate::hits::{ColorClass, PairwiseHit};
use log::debug;

pub const FOLD_DEGREES: f64 = -45.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Rotate `p` counter-clockwise around the origin.
pub fn rotate(p: Point, degrees: f64) -> Point {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point {
        x: p.x * cos - p.y * sin,
        y: p.x * sin + p.y * cos,
    }
}

/// Plot-space position of the canonical pair `(a, b)`.
pub fn fold(a: f64, b: f64) -> Point {
    rotate(Point::new(a, b), FOLD_DEGREES)
}

/// Inverse of [`fold`].
pub fn unfold(p: Point) -> Point {
    rotate(p, -FOLD_DEGREES)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    fn folded(from: (f64, f64), to: (f64, f64)) -> Self {
        Segment {
            from: fold(from.0, from.1),
            to: fold(to.0, to.1),
        }
    }
}

/// Analytic plot limits; both axes start at 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn from_ymax(ymax: f64) -> Self {
        let height = (ymax * ymax / 2.0).sqrt();
        Extent {
            width: 2.0 * height,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub at: Point,
    pub color: ColorClass,
}

/// Everything a plotting back end needs to draw one triangle plot.
#[derive(Debug, Clone)]
pub struct Projection {
    /// All accepted hits, drawn translucent.
    pub points: Vec<ProjectedPoint>,
    /// Anchor hits again, drawn opaque on top.
    pub anchors: Vec<ProjectedPoint>,
    /// Element boundaries, vertical and horizontal in the unrotated frame.
    pub gridlines: Vec<Segment>,
    pub baseline: Segment,
    pub bounds: Vec<u64>,
    pub extent: Extent,
}

/// Distinct element bounds followed by the largest coord2, ascending.
pub fn grid_bounds(coords: &CoordinateTable) -> Vec<u64> {
    let mut bounds: Vec<u64> = coords.elements().iter().map(|e| e.bound()).collect();
    bounds.extend(coords.max_coord2());
    bounds.sort_unstable();
    bounds.dedup();
    bounds
}

/// Lines at every bound, clipped to the upper half of the square so that
/// after the fold they stay inside the triangle.
fn gridlines(bounds: &[u64]) -> Vec<Segment> {
    let (Some(&lo), Some(&hi)) = (bounds.first(), bounds.last()) else {
        return Vec::new();
    };
    let (lo, hi) = (lo as f64, hi as f64);
    let mut lines = Vec::with_capacity(bounds.len() * 2);
    for &c in bounds {
        let c = c as f64;
        // x = c, visible for y >= c
        if c < hi {
            lines.push(Segment::folded((c, c.max(lo)), (c, hi)));
        }
        // y = c, visible for x <= c
        if c > lo {
            lines.push(Segment::folded((lo, c), (c, c)));
        }
    }
    lines
}

/// Fold the accepted hits and derive gridlines and extents from the
/// (filtered) coordinate table.
pub fn project(hits: &[PairwiseHit], coords: &CoordinateTable) -> Result<Projection> {
    if coords.is_empty() {
        return Err(DotplotError::EmptyInput(
            "no genomic elements left to draw".to_string(),
        ));
    }
    let bounds = grid_bounds(coords);
    let ymax = match bounds.last() {
        Some(&m) if m > 0 => m as f64,
        _ => {
            return Err(DotplotError::EmptyInput(
                "genomic axis has zero length".to_string(),
            ))
        }
    };
    let extent = Extent::from_ymax(ymax);

    let to_point = |h: &PairwiseHit| ProjectedPoint {
        at: fold(h.a as f64, h.b as f64),
        color: h.color,
    };
    let points: Vec<ProjectedPoint> = hits.iter().map(to_point).collect();
    let anchors: Vec<ProjectedPoint> = hits.iter().filter(|h| h.is_anchor).map(to_point).collect();

    let gridlines = gridlines(&bounds);
    debug!(
        "Projected {} points ({} anchors), {} gridlines, extent {:.1} x {:.1}",
        points.len(),
        anchors.len(),
        gridlines.len(),
        extent.width,
        extent.height
    );

    Ok(Projection {
        points,
        anchors,
        gridlines,
        baseline: Segment {
            from: Point::new(0.0, 0.0),
            to: Point::new(extent.width, 0.0),
        },
        bounds,
        extent,
    })
}
