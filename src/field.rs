//! Thick-region `Field` construction (Sec. 4.5 steps 1-2): the inner-offset
//! polygon a thick part's outline and interior samples are placed on.

use crate::config::SampleConfig;
use crate::geom::{ExPolygon, Line, Point, Polygon};
use crate::partition::IslandPart;
use crate::voronoi::{NodeId, VoronoiGraph};
use geo::algorithm::buffer::Buffer;

/// Distance below which an outline segment is considered to be the segment
/// a contour node sits on (mirrors `voronoi::graph::on_boundary`'s epsilon).
const CONTOUR_EPS: f64 = 1.0;

/// One edge of a `Field`'s boundary, tagged with whether it originated
/// from the island's real outer boundary (`true`, supports may be placed
/// on it) or from a synthetic wide-to-thin cut (`false`).
#[derive(Clone, Copy, Debug)]
pub struct FieldEdge {
    pub line: Line,
    pub is_inner_outline: bool,
}

/// The inner offset of a thick region, plus per-edge outline provenance.
#[derive(Clone, Debug)]
pub struct Field {
    pub inner: ExPolygon,
    pub edges: Vec<FieldEdge>,
}

/// Assembles a thick part's outline from the source segments its VD cells
/// touch, walks it, offsets inward by `minimal_distance_from_outline`, and
/// propagates the inner/outer-outline flag onto the offset edges.
pub fn build_field(
    graph: &VoronoiGraph,
    part: &IslandPart,
    outline: &[Line],
    cfg: &SampleConfig,
) -> Field {
    let raw_edges = assemble_outline(graph, part, outline);
    let outer = ExPolygon::new(
        Polygon::new(raw_edges.iter().map(|e| e.line.a).collect()),
        Vec::new(),
    );

    let offset = -(cfg.minimal_distance_from_outline as f64);
    let geo_poly = outer.to_geo();
    let buffered = geo_poly.buffer(offset);

    let inner = buffered
        .0
        .first()
        .map(ExPolygon::from_geo)
        .unwrap_or_else(|| outer.clone());

    let edges = propagate_outline_flags(&raw_edges, &inner);

    Field { inner, edges }
}

/// Walks the part's outline, marking edges that came from the island's
/// real boundary vs. synthetic wide-to-thin chords inserted at transitions
/// into a thin neighbour part.
///
/// A part's contour nodes sit on the stretch of `outline` its own VD cells
/// touch; segments nowhere near one of this part's contour nodes belong to
/// another part (e.g. the other lobe of a dumbbell island) and are dropped,
/// with a single synthetic chord bridging each gap they leave behind.
fn assemble_outline(graph: &VoronoiGraph, part: &IslandPart, outline: &[Line]) -> Vec<FieldEdge> {
    let contour_positions: Vec<Point> = part
        .nodes
        .iter()
        .map(|&id: &NodeId| graph.node(id))
        .filter(|n| n.is_contour())
        .map(|n| n.pos)
        .collect();

    let n = outline.len();
    let belongs: Vec<bool> = outline
        .iter()
        .map(|seg| contour_positions.iter().any(|&p| seg.distance_to_point(p) < CONTOUR_EPS))
        .collect();

    let touches_any = belongs.iter().any(|&b| b);
    let touches_all = belongs.iter().all(|&b| b);
    if contour_positions.is_empty() || !touches_any || touches_all {
        return outline
            .iter()
            .map(|&line| FieldEdge {
                line,
                is_inner_outline: true,
            })
            .collect();
    }

    let start = belongs.iter().position(|&b| b).unwrap();
    let mut edges = Vec::new();
    let mut i = 0;
    while i < n {
        let idx = (start + i) % n;
        if belongs[idx] {
            edges.push(FieldEdge {
                line: outline[idx],
                is_inner_outline: true,
            });
            i += 1;
            continue;
        }
        let gap_start = idx;
        let mut j = i;
        while j < n && !belongs[(start + j) % n] {
            j += 1;
        }
        let gap_end = (start + j) % n;
        let from = outline[(gap_start + n - 1) % n].b;
        let to = outline[gap_end].a;
        edges.push(FieldEdge {
            line: Line::new(from, to),
            is_inner_outline: false,
        });
        i = j;
    }
    edges
}

/// Matches each inner-offset edge back to the nearest original edge by
/// direction + signed distance (rejecting unrelated overlapping edges via
/// an interval test along the edge's major axis), then sweeps any
/// still-unknown runs: a run between two `yes` neighbours from the same
/// outer polygon inherits `yes`, otherwise `no`.
fn propagate_outline_flags(original: &[FieldEdge], inner: &ExPolygon) -> Vec<FieldEdge> {
    let points = inner.contour.points();
    let n = points.len();
    let mut flags: Vec<Option<bool>> = vec![None; n];

    for i in 0..n {
        let edge = Line::new(points[i], points[(i + 1) % n]);
        flags[i] = match_original_edge(edge, original);
    }

    // connectivity sweep over unknowns
    let mut resolved = flags.clone();
    for i in 0..n {
        if resolved[i].is_some() {
            continue;
        }
        let mut j = i;
        let mut run = Vec::new();
        while resolved[j].is_none() {
            run.push(j);
            j = (j + 1) % n;
            if j == i {
                break;
            }
        }
        let before = resolved[(i + n - 1) % n];
        let after = resolved[j % n];
        let value = matches!((before, after), (Some(true), Some(true)));
        for idx in run {
            resolved[idx] = Some(value);
        }
    }

    (0..n)
        .map(|i| FieldEdge {
            line: Line::new(points[i], points[(i + 1) % n]),
            is_inner_outline: resolved[i].unwrap_or(false),
        })
        .collect()
}

fn match_original_edge(edge: Line, original: &[FieldEdge]) -> Option<bool> {
    let dir = edge.direction().to_vec2().normalize_or_zero();
    for orig in original {
        let odir = orig.line.direction().to_vec2().normalize_or_zero();
        if dir.dot(odir).abs() < 0.98 {
            continue;
        }
        // majority-axis interval overlap test, to reject overlapping but
        // unrelated parallel edges from elsewhere in the outline
        let (a0, a1, b0, b1) = if dir.x.abs() >= dir.y.abs() {
            (edge.a.x, edge.b.x, orig.line.a.x, orig.line.b.x)
        } else {
            (edge.a.y, edge.b.y, orig.line.a.y, orig.line.b.y)
        };
        let (lo_a, hi_a) = (a0.min(a1), a0.max(a1));
        let (lo_b, hi_b) = (b0.min(b1), b0.max(b1));
        const MAX_MATCH_DISTANCE: f64 = 1_000_000.0; // 1mm in scaled units
        if lo_a <= hi_b && lo_b <= hi_a {
            let perp_dist = orig.line.distance_to_point(edge.a).min(orig.line.distance_to_point(edge.b));
            if perp_dist < MAX_MATCH_DISTANCE {
                return Some(orig.is_inner_outline);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_edges_default_to_not_outline() {
        let original = vec![FieldEdge {
            line: Line::new(Point::new(0, 0), Point::new(1000, 0)),
            is_inner_outline: true,
        }];
        let result = match_original_edge(Line::new(Point::new(0, 500_000), Point::new(1000, 500_000)), &original);
        assert_eq!(result, None);
    }
}
