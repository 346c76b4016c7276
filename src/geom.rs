//! Scaled fixed-point 2D geometry primitives.
//!
//! Island coordinates come in as sub-micron integer coordinates (the same
//! `coord_t` convention the slicer uses internally), which keeps edge/edge
//! intersection tests exact and hands `boostvoronoi` the integer inputs it
//! wants. Floating point only appears once we need transcendental math
//! (parabola sampling, relaxation, distances) -- at that boundary we convert
//! through `glam::DVec2`, and at the polygon-boolean/offset boundary we
//! convert through `geo::Polygon<f64>`.

mod line;
mod parabola;
mod polygon;

pub use line::Line;
pub use parabola::{Parabola, ParabolaSegment};
pub use polygon::{ExPolygon, Polygon};

/// One sub-micron integer unit. All island coordinates are expressed in this
/// scale, matching the slicer's internal `coord_t`.
pub const SCALE_FACTOR: f64 = 1_000_000.0;

pub fn scale(mm: f64) -> i64 {
    (mm * SCALE_FACTOR).round() as i64
}

pub fn unscale(coord: i64) -> f64 {
    coord as f64 / SCALE_FACTOR
}

/// A point in scaled integer island coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> glam::DVec2 {
        glam::DVec2::new(self.x as f64, self.y as f64)
    }

    pub fn from_vec2(v: glam::DVec2) -> Self {
        Self {
            x: v.x.round() as i64,
            y: v.y.round() as i64,
        }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        self.to_vec2().distance(other.to_vec2())
    }

    /// Perpendicular of the vector from the origin to `self`, i.e. `(-y, x)`.
    pub fn perp(self) -> Point {
        Point::new(-self.y, self.x)
    }

    pub fn dot(self, other: Point) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }

    pub fn cross(self, other: Point) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    pub fn is_majority_x(self) -> bool {
        self.x.abs() >= self.y.abs()
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// True when `dir1` and `dir2` point into the same half-plane, i.e. the
/// angle between them is within +/- 90 degrees.
pub fn is_same_direction(dir1: Point, dir2: Point) -> bool {
    dir1.dot(dir2) >= 0
}

/// Convert an island `Point` list into a `geo` ring, closing it if needed.
/// Used at the boundary with `geo`'s boolean/buffer algorithms.
pub fn points_to_geo_ring(points: &[Point]) -> geo::LineString<f64> {
    let mut coords: Vec<geo::Coord<f64>> = points
        .iter()
        .map(|p| geo::Coord {
            x: p.x as f64,
            y: p.y as f64,
        })
        .collect();
    if coords.first() != coords.last() {
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
    }
    geo::LineString::new(coords)
}

pub fn geo_ring_to_points(ring: &geo::LineString<f64>) -> Vec<Point> {
    let coords = ring.0.as_slice();
    let n = if coords.len() > 1 && coords.first() == coords.last() {
        coords.len() - 1
    } else {
        coords.len()
    };
    coords[..n]
        .iter()
        .map(|c| Point::new(c.x.round() as i64, c.y.round() as i64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_roundtrip() {
        let c = scale(1.5);
        assert!((unscale(c) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn perp_is_perpendicular() {
        let p = Point::new(3, 4);
        assert_eq!(p.dot(p.perp()), 0);
    }

    #[test]
    fn same_direction() {
        assert!(is_same_direction(Point::new(1, 0), Point::new(1, 1)));
        assert!(!is_same_direction(Point::new(1, 0), Point::new(-1, 1)));
    }
}
