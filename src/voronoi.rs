//! Voronoi diagram construction and the derived Voronoi Graph (VG).
//!
//! The diagram itself comes straight from `boostvoronoi`, the same way
//! `voronoi_utils`/`cmd_voronoi_diagram` drive it for mesh-edge input; what's
//! new here is restricting the diagram to the island interior and deriving
//! the arc-length / width-annotated graph the rest of the crate samples.

pub mod graph;

pub use graph::{Neighbor, NeighborId, Node, NodeId, Position, VoronoiGraph};

use crate::geom::{ExPolygon, Line, Point};
use crate::SlaError;
use boostvoronoi as bv;

/// Flattens an island's contour and holes into the segment list
/// `boostvoronoi` builds a diagram over.
fn island_segments(island: &ExPolygon) -> Vec<Line> {
    let mut segments = Vec::new();
    let mut push_ring = |points: &[Point]| {
        let n = points.len();
        for i in 0..n {
            segments.push(Line::new(points[i], points[(i + 1) % n]));
        }
    };
    push_ring(island.contour.points());
    for hole in &island.holes {
        push_ring(hole.points());
    }
    segments
}

/// Builds the Voronoi Graph for one island. Returns `Err` only for
/// structural Voronoi-construction failures (degenerate input); callers
/// treat that as the `BadShape` fallback of Sec. 4.1, not as a fatal error.
pub fn build_voronoi_graph(island: &ExPolygon) -> Result<VoronoiGraph, SlaError> {
    let segments = island_segments(island);
    if segments.len() < 3 {
        return Err(SlaError::InvalidInputData(
            "island has fewer than 3 boundary edges".to_string(),
        ));
    }

    let bv_segments: Vec<bv::Line<i64>> = segments
        .iter()
        .map(|l| bv::Line {
            start: bv::Point { x: l.a.x, y: l.a.y },
            end: bv::Point { x: l.b.x, y: l.b.y },
        })
        .collect();

    let diagram = bv::Builder::<i64, f64>::default()
        .with_segments(bv_segments.iter())
        .map_err(|e| SlaError::Internal(format!("voronoi builder rejected segments: {e}")))?
        .build()
        .map_err(|e| SlaError::Internal(format!("voronoi construction failed: {e}")))?;

    graph::VoronoiGraph::from_diagram(&diagram, &segments, island)
}
