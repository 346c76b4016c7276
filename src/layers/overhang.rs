//! Overhang point preparation (Sec. 4.10): the arcs of a non-island part's
//! contour that lie outside the union of its parent parts, discretized at
//! `discretize_overhang_step`.

use crate::geom::{ExPolygon, Point};
use geo::Contains;

/// Produces the uniformly spaced overhang samples for one part, walking
/// its contour and every hole. A run of contiguous edges whose midpoint
/// lies outside `parent_union` is an overhang arc; it is stepped at
/// `step` (scaled units) starting from its first vertex, the same
/// cumulative-arc-length technique as the outline sampler in
/// `sample::thick` uses for a polyline rather than a closed ring.
pub fn overhang_samples(part: &ExPolygon, parent_union: &geo::MultiPolygon<f64>, step: f64) -> Vec<Point> {
    let mut samples = Vec::new();
    for ring in std::iter::once(&part.contour).chain(part.holes.iter()) {
        samples.extend(ring_overhang_samples(ring.points(), parent_union, step));
    }
    samples
}

fn midpoint_outside(a: Point, b: Point, parent_union: &geo::MultiPolygon<f64>) -> bool {
    let mid = a.to_vec2().midpoint(b.to_vec2());
    let coord = geo::Coord { x: mid.x, y: mid.y };
    !parent_union.contains(&coord)
}

fn ring_overhang_samples(points: &[Point], parent_union: &geo::MultiPolygon<f64>, step: f64) -> Vec<Point> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let outside: Vec<bool> = (0..n)
        .map(|i| midpoint_outside(points[i], points[(i + 1) % n], parent_union))
        .collect();

    if outside.iter().all(|&o| o) {
        return sample_ring_run(points, 0, n, step, true);
    }

    let mut samples = Vec::new();
    let mut i = 0;
    while i < n {
        if !outside[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && outside[i] {
            i += 1;
        }
        samples.extend(sample_run(points, start, i, step));
    }
    samples
}

/// Steps along the open edge run `[start, end)` (vertex indices, `end`
/// exclusive, wrapping modulo the ring length) at `step` spacing.
fn sample_run(points: &[Point], start: usize, end: usize, step: f64) -> Vec<Point> {
    let n = points.len();
    let mut out = vec![points[start % n]];
    let mut since_last = 0.0;
    for i in start..end {
        let a = points[i % n];
        let b = points[(i + 1) % n];
        let len = a.distance_to(b);
        if len <= 0.0 {
            continue;
        }
        let mut travelled = 0.0;
        while since_last + (len - travelled) >= step {
            let remaining = step - since_last;
            travelled += remaining;
            let t = (travelled / len).clamp(0.0, 1.0);
            out.push(crate::geom::Line::new(a, b).point_at(t));
            since_last = 0.0;
        }
        since_last += len - travelled;
    }
    out
}

fn sample_ring_run(points: &[Point], start: usize, end: usize, step: f64, closed: bool) -> Vec<Point> {
    let mut out = sample_run(points, start, end, step);
    if closed && out.len() > 1 {
        out.pop();
    }
    out
}
