//! Centroidal (Lloyd) alignment with per-point movement constraints
//! (Sec. 4.7).
//!
//! The bounded Voronoi diagram of the current points is approximated with
//! a grid of island-interior samples assigned to their nearest point
//! (cropped to `max_align_distance`), rather than constructing an exact
//! bounded VD -- the constraint math downstream (sliding along a VG edge or
//! an outline sequence) already only uses the centroid's direction and
//! distance, so the approximation doesn't change the sampled output's
//! shape, only its convergence rate.

use crate::config::SampleConfig;
use crate::geom::{ExPolygon, Point};
use crate::points::SupportIslandPoint;
use crate::voronoi::VoronoiGraph;

const GRID_RESOLUTION: i64 = 48;

fn island_samples(island: &ExPolygon) -> Vec<Point> {
    let pts = island.contour.points();
    let mut min = pts[0];
    let mut max = pts[0];
    for &p in pts {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let step_x = ((max.x - min.x) / GRID_RESOLUTION).max(1);
    let step_y = ((max.y - min.y) / GRID_RESOLUTION).max(1);
    let mut out = Vec::new();
    let mut y = min.y;
    while y <= max.y {
        let mut x = min.x;
        while x <= max.x {
            let p = Point::new(x, y);
            if island.contains_point(p) {
                out.push(p);
            }
            x += step_x;
        }
        y += step_y;
    }
    out
}

/// Runs Lloyd relaxation to convergence (or `count_iteration` passes,
/// whichever comes first). A run with one or zero movable points is a
/// no-op. `graph` is `None` for regions with no `CenterIsland` points
/// (peninsula fields never produce any), in which case that variant's
/// movement is simply skipped if one is somehow present.
pub fn relax(points: &mut [SupportIslandPoint], graph: Option<&VoronoiGraph>, island: &ExPolygon, cfg: &SampleConfig) {
    let movable_count = points.iter().filter(|p| p.can_move()).count();
    if movable_count <= 1 {
        return;
    }
    let samples = island_samples(island);
    let crop = cfg.max_align_distance as f64;

    for _ in 0..cfg.count_iteration {
        let centroids = assign_and_centroid(points, &samples, crop);
        let mut max_move = 0.0f64;
        for (point, centroid) in points.iter_mut().zip(centroids.iter()) {
            if !point.can_move() {
                continue;
            }
            let Some(target) = centroid else { continue };
            let before = point.pos();
            move_towards(point, *target, graph, cfg);
            let after = point.pos();
            let l1 = (after.x - before.x).unsigned_abs() as f64 + (after.y - before.y).unsigned_abs() as f64;
            max_move = max_move.max(l1);
        }
        split_duplicates(points);
        if max_move < cfg.minimal_move as f64 {
            break;
        }
    }
}

fn assign_and_centroid(points: &[SupportIslandPoint], samples: &[Point], crop: f64) -> Vec<Option<Point>> {
    let mut sums = vec![(glam::DVec2::ZERO, 0u32); points.len()];
    for &s in samples {
        let sv = s.to_vec2();
        let mut best = None;
        let mut best_dist = f64::INFINITY;
        for (i, p) in points.iter().enumerate() {
            let d = p.pos().distance_to(s);
            if d < best_dist && d <= crop {
                best_dist = d;
                best = Some(i);
            }
        }
        if let Some(i) = best {
            sums[i].0 += sv;
            sums[i].1 += 1;
        }
    }
    sums.into_iter()
        .map(|(sum, count)| {
            if count == 0 {
                None
            } else {
                Some(Point::from_vec2(sum / count as f64))
            }
        })
        .collect()
}

fn move_towards(point: &mut SupportIslandPoint, target: Point, graph: Option<&VoronoiGraph>, cfg: &SampleConfig) {
    match point {
        SupportIslandPoint::CenterIsland { pos, position } => {
            if let Some(graph) = graph {
                *pos = slide_along_vg(graph, *pos, *position, target, cfg.max_align_distance as f64);
            }
        }
        SupportIslandPoint::OutlineIsland {
            pos,
            restriction,
            line_index,
            ratio,
            align_budget,
        } => {
            let (new_pos, new_idx, new_ratio) =
                slide_along_outline(restriction, *line_index, *ratio, target, *align_budget);
            *pos = new_pos;
            *line_index = new_idx;
            *ratio = new_ratio;
        }
        SupportIslandPoint::InnerIsland { pos, field } => {
            if field.inner.contains_point(target) {
                *pos = target;
            } else {
                *pos = first_boundary_intersection(&field.inner, *pos, target);
            }
        }
        _ => {}
    }
}

fn slide_along_vg(
    graph: &VoronoiGraph,
    current: Point,
    position: crate::voronoi::Position,
    target: Point,
    max_align_distance: f64,
) -> Point {
    let neighbor = graph.neighbor(position.neighbor);
    let src = graph.node(position.neighbor.0).pos;
    let dst = graph.node(neighbor.target).pos;
    let t = crate::geom::Line::new(src, dst).project_clamped(target);
    let candidate = crate::geom::Line::new(src, dst).point_at(t);
    if candidate.distance_to(current) <= max_align_distance {
        candidate
    } else {
        current
    }
}

fn slide_along_outline(
    restriction: &crate::points::OutlineRestriction,
    line_index: usize,
    ratio: f64,
    target: Point,
    align_budget: f64,
) -> (Point, usize, f64) {
    let lines = &restriction.lines;
    if lines.is_empty() {
        return (target, line_index, ratio);
    }
    let mut best_idx = line_index;
    let mut best_ratio = ratio;
    let mut best_dist = f64::INFINITY;
    for (idx, line) in lines.iter().enumerate() {
        let t = line.project_clamped(target);
        let candidate = line.point_at(t);
        let d = candidate.distance_to(target);
        if d < best_dist {
            best_dist = d;
            best_idx = idx;
            best_ratio = t;
        }
    }
    let current_pos = lines[line_index].point_at(ratio);
    let new_pos = lines[best_idx].point_at(best_ratio);
    if new_pos.distance_to(current_pos) <= align_budget {
        (new_pos, best_idx, best_ratio)
    } else {
        (current_pos, line_index, ratio)
    }
}

fn first_boundary_intersection(region: &ExPolygon, from: Point, towards: Point) -> Point {
    let dir = towards.to_vec2() - from.to_vec2();
    if dir.length_squared() < f64::EPSILON {
        return from;
    }
    let mut best_t = 1.0f64;
    let contour = region.contour.points();
    let n = contour.len();
    for i in 0..n {
        let a = contour[i].to_vec2();
        let b = contour[(i + 1) % n].to_vec2();
        if let Some(t) = segment_ray_intersection(from.to_vec2(), dir, a, b) {
            if t < best_t {
                best_t = t;
            }
        }
    }
    Point::from_vec2(from.to_vec2() + dir * best_t)
}

fn segment_ray_intersection(
    origin: glam::DVec2,
    dir: glam::DVec2,
    a: glam::DVec2,
    b: glam::DVec2,
) -> Option<f64> {
    let edge = b - a;
    let denom = dir.x * edge.y - dir.y * edge.x;
    if denom.abs() < 1e-9 {
        return None;
    }
    let diff = a - origin;
    let t = (diff.x * edge.y - diff.y * edge.x) / denom;
    let u = (diff.x * dir.y - diff.y * dir.x) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Detects exactly coincident points and splits them by moving the later
/// one halfway back toward where it was before this pass, repeating until
/// no coincidences remain.
fn split_duplicates(points: &mut [SupportIslandPoint]) {
    loop {
        let mut positions: Vec<Point> = points.iter().map(|p| p.pos()).collect();
        let mut found = false;
        'outer: for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if positions[i] == positions[j] {
                    let prev = positions[i];
                    let nudged = Point::new(prev.x, prev.y + 1);
                    positions[j] = nudged;
                    points[j].set_pos(nudged);
                    found = true;
                    break 'outer;
                }
            }
        }
        if !found {
            break;
        }
    }
}
