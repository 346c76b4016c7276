//! Thin-part centerline sampling (Sec. 4.4).

use crate::config::SampleConfig;
use crate::partition::IslandPart;
use crate::path::ExPath;
use crate::points::SupportIslandPoint;
use crate::voronoi::{NeighborId, Position, VoronoiGraph};

/// Walks a thin part's span of the main path, dropping a `CenterIsland`
/// point every `thin_max_distance` of arc length, never within a
/// half-spacing of the previous one.
pub fn sample_thin_part(
    graph: &VoronoiGraph,
    ex_path: &ExPath,
    part: &IslandPart,
    cfg: &SampleConfig,
) -> Vec<SupportIslandPoint> {
    let nodes = &ex_path.path.nodes[part.start..=part.end];
    if nodes.len() < 2 {
        return nodes
            .first()
            .map(|&n| {
                vec![SupportIslandPoint::CenterIsland {
                    pos: graph.node(n).pos,
                    position: Position::new(
                        NeighborId(n, 0),
                        0.0,
                    ),
                }]
            })
            .unwrap_or_default();
    }

    let spacing = cfg.thin_max_distance as f64;
    let half_spacing = spacing / 2.0;
    let mut points = Vec::new();
    let mut since_last_point = spacing; // force a point near the start
    let mut last_emitted_at: Option<f64> = None;
    let mut travelled = 0.0;

    for w in nodes.windows(2) {
        let a = w[0];
        let b = w[1];
        let Some((idx, neighbor)) = graph
            .node(a)
            .neighbors
            .iter()
            .enumerate()
            .find(|(_, n)| n.target == b)
        else {
            continue;
        };
        let edge_len = neighbor.length;
        if edge_len <= 0.0 {
            continue;
        }
        since_last_point += edge_len;
        while since_last_point >= spacing {
            let overshoot = since_last_point - spacing;
            let ratio = ((edge_len - overshoot) / edge_len).clamp(0.0, 1.0);
            let position = Position::new(NeighborId(a, idx), ratio);
            let pos = graph.position_to_point(position);
            if last_emitted_at
                .map(|t| (travelled + edge_len * ratio) - t >= half_spacing)
                .unwrap_or(true)
            {
                points.push(SupportIslandPoint::CenterIsland { pos, position });
                last_emitted_at = Some(travelled + edge_len * ratio);
            }
            since_last_point -= spacing;
        }
        travelled += edge_len;
    }

    if points.is_empty() {
        // part shorter than one full spacing: drop a single point at its
        // remaining-budget boundary rather than nothing at all.
        let mid = nodes[nodes.len() / 2];
        points.push(SupportIslandPoint::CenterIsland {
            pos: graph.node(mid).pos,
            position: Position::new(NeighborId(mid, 0), 0.0),
        });
    }

    points
}
