//! Shortcut policies for small islands (Sec. 4.6), tried before the full
//! skeleton pipeline.

use crate::config::SampleConfig;
use crate::geom::{ExPolygon, Line, Point};
use crate::path::ExPath;
use crate::points::SupportIslandPoint;
use crate::voronoi::{NodeId, VoronoiGraph};

/// If the whole contour fits in a `head_radius`-sided box, emit a single
/// immovable center point and skip everything else.
pub fn bounding_box_shortcut(island: &ExPolygon, cfg: &SampleConfig) -> Option<SupportIslandPoint> {
    let pts = island.contour.points();
    if pts.is_empty() {
        return None;
    }
    let mut min = pts[0];
    let mut max = pts[0];
    for &p in pts {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let side = cfg.head_radius;
    if (max.x - min.x) <= side && (max.y - min.y) <= side {
        let center = Point::new((min.x + max.x) / 2, (min.y + max.y) / 2);
        Some(SupportIslandPoint::OneBbCenter { pos: center })
    } else {
        None
    }
}

pub fn bad_shape_point(island: &ExPolygon) -> SupportIslandPoint {
    let pts = island.contour.points();
    let (mut min, mut max) = (pts[0], pts[0]);
    for &p in pts {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    SupportIslandPoint::BadShape {
        pos: Point::new((min.x + max.x) / 2, (min.y + max.y) / 2),
    }
}

/// If the longest path is shorter than the one-support threshold, emit one
/// immovable point at its midpoint.
pub fn one_center_shortcut(
    graph: &VoronoiGraph,
    ex_path: &ExPath,
    cfg: &SampleConfig,
) -> Option<Vec<SupportIslandPoint>> {
    if ex_path.path.length >= cfg.max_length_for_one_support_point as f64 {
        return None;
    }
    let mid = path_midpoint(graph, ex_path)?;
    Some(vec![SupportIslandPoint::OneCenter { pos: mid }])
}

/// If the path is slender (max width under `thin_max_width`) and shorter
/// than the two-support threshold, emit two immovable `TwoPoints`, each
/// placed walking in from its end until the local width reaches
/// `2 * head_radius`, clamped by `maximal_distance_from_outline` and by
/// `max_length_ratio_for_two_support_points`.
pub fn two_points_shortcut(
    graph: &VoronoiGraph,
    ex_path: &ExPath,
    cfg: &SampleConfig,
) -> Option<Vec<SupportIslandPoint>> {
    if ex_path.path.length >= cfg.max_length_for_two_support_points as f64 {
        return None;
    }
    let max_width = path_max_width(graph, ex_path);
    if max_width >= cfg.thin_max_width as f64 {
        return None;
    }
    let (a, b) = two_points_positions(graph, ex_path, cfg);
    Some(vec![
        SupportIslandPoint::TwoPoints { pos: a },
        SupportIslandPoint::TwoPoints { pos: b },
    ])
}

/// Walks a path from both ends, placing each point where the local width
/// first reaches `2 * head_radius`, each capped at
/// `min(maximal_distance_from_outline, max_length_ratio_for_two_support_points * path.length)`
/// travelled from its end.
fn two_points_positions(graph: &VoronoiGraph, ex_path: &ExPath, cfg: &SampleConfig) -> (Point, Point) {
    let target_width = 2.0 * cfg.head_radius as f64;
    let limit = (cfg.maximal_distance_from_outline as f64)
        .min(cfg.max_length_ratio_for_two_support_points * ex_path.path.length);
    let nodes = &ex_path.path.nodes;
    let forward = point_at_width(graph, nodes.iter().copied(), target_width, limit);
    let backward = point_at_width(graph, nodes.iter().rev().copied(), target_width, limit);
    (forward, backward)
}

/// Walks `nodes` (already oriented from the end of interest) accumulating
/// travelled distance, returning the point where `max_width` first reaches
/// `target_width` (interpolated within that edge) or, failing that, the
/// point `limit` distance along the path, or the far end if the path is
/// shorter than `limit`.
fn point_at_width(
    graph: &VoronoiGraph,
    nodes: impl Iterator<Item = NodeId>,
    target_width: f64,
    limit: f64,
) -> Point {
    let nodes: Vec<NodeId> = nodes.collect();
    let Some(&last) = nodes.last() else {
        return Point::new(0, 0);
    };
    let mut travelled = 0.0;
    for w in nodes.windows(2) {
        let Some(edge) = graph.node(w[0]).neighbors.iter().find(|n| n.target == w[1]) else {
            continue;
        };
        let a = graph.node(w[0]).pos;
        let b = graph.node(w[1]).pos;
        if travelled + edge.length > limit {
            let remaining = (limit - travelled).max(0.0);
            let ratio = if edge.length > 0.0 { remaining / edge.length } else { 0.0 };
            return Line::new(a, b).point_at(ratio);
        }
        if edge.max_width >= target_width {
            let span = (edge.max_width - edge.min_width).max(f64::EPSILON);
            let ratio = ((target_width - edge.min_width) / span).clamp(0.0, 1.0);
            return Line::new(a, b).point_at(ratio);
        }
        travelled += edge.length;
    }
    graph.node(last).pos
}

/// Two points near the path ends, used both as the Sec. 4.6 `TwoPoints`
/// shortcut and as the `TwoPointsBackup` fallback when full sampling
/// under-produces.
pub fn two_points_backup(ex_path: &ExPath, graph: &VoronoiGraph) -> Vec<SupportIslandPoint> {
    let nodes = &ex_path.path.nodes;
    if nodes.is_empty() {
        return Vec::new();
    }
    if nodes.len() == 1 {
        return vec![SupportIslandPoint::TwoPointsBackup {
            pos: graph.node(nodes[0]).pos,
        }];
    }
    let a = graph.node(nodes[0]).pos;
    let b = graph.node(*nodes.last().unwrap()).pos;
    vec![
        SupportIslandPoint::TwoPointsBackup { pos: a },
        SupportIslandPoint::TwoPointsBackup { pos: b },
    ]
}

fn path_midpoint(graph: &VoronoiGraph, ex_path: &ExPath) -> Option<Point> {
    let nodes = &ex_path.path.nodes;
    if nodes.is_empty() {
        return None;
    }
    let target = ex_path.path.length / 2.0;
    let mut travelled = 0.0;
    for w in nodes.windows(2) {
        let edge_len = graph
            .node(w[0])
            .neighbors
            .iter()
            .find(|n| n.target == w[1])
            .map(|n| n.length)
            .unwrap_or(0.0);
        if travelled + edge_len >= target {
            let t = if edge_len > 0.0 {
                (target - travelled) / edge_len
            } else {
                0.0
            };
            let a = graph.node(w[0]).pos;
            let b = graph.node(w[1]).pos;
            return Some(crate::geom::Line::new(a, b).point_at(t));
        }
        travelled += edge_len;
    }
    Some(graph.node(*nodes.last().unwrap()).pos)
}

fn path_max_width(graph: &VoronoiGraph, ex_path: &ExPath) -> f64 {
    ex_path
        .path
        .nodes
        .windows(2)
        .map(|w| {
            graph
                .node(w[0])
                .neighbors
                .iter()
                .find(|n| n.target == w[1])
                .map(|n| n.max_width)
                .unwrap_or(0.0)
        })
        .fold(0.0, f64::max)
}
