use crate::geom::{ExPolygon, Line, Parabola, ParabolaSegment, Point};
use crate::SlaError;
use ahash::AHashMap;
use boostvoronoi as bv;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Index of a [`Neighbor`]: the node it originates from plus its position
/// in that node's adjacency list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NeighborId(pub NodeId, pub usize);

/// A VG vertex: a Voronoi-diagram vertex known to lie inside or on the
/// island contour.
#[derive(Clone, Debug)]
pub struct Node {
    pub pos: Point,
    /// Distance from this node to the nearest island boundary edge. Zero
    /// for contour nodes.
    pub dist_to_edge: f64,
    /// Cached during longest-path extraction (Sec. 4.2); `None` until then.
    pub longest_distance: Option<f64>,
    pub neighbors: Vec<Neighbor>,
}

impl Node {
    /// A contour node has exactly one incident edge with `min_width == 0`.
    pub fn is_contour(&self) -> bool {
        self.neighbors.len() == 1 && self.neighbors[0].min_width <= f64::EPSILON
    }
}

/// A directed edge from its owning [`Node`] to `target`.
#[derive(Clone, Debug)]
pub struct Neighbor {
    pub target: NodeId,
    pub length: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub twin: NeighborId,
    /// `None` for a straight bisector, `Some` for a parabolic one --
    /// carried so that `Position::to_point` can sample the true curve
    /// rather than a chord.
    pub arc: Option<ParabolaSegment>,
}

/// A location on the VG: the neighbor it lies along, and how far along it
/// (`0.0` at the neighbor's source node, `1.0` at `neighbor.target`).
#[derive(Clone, Copy, Debug)]
pub struct Position {
    pub neighbor: NeighborId,
    pub ratio: f64,
}

impl Position {
    pub fn new(neighbor: NeighborId, ratio: f64) -> Self {
        Self {
            neighbor,
            ratio: ratio.clamp(0.0, 1.0),
        }
    }
}

/// A filtered Voronoi Diagram restricted to the island interior: nodes and
/// arc-length/width-annotated directed edges.
#[derive(Debug, Default)]
pub struct VoronoiGraph {
    pub nodes: Vec<Node>,
}

impl VoronoiGraph {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn neighbor(&self, id: NeighborId) -> &Neighbor {
        &self.nodes[id.0 .0].neighbors[id.1]
    }

    pub fn position_to_point(&self, position: Position) -> Point {
        let neighbor = self.neighbor(position.neighbor);
        match &neighbor.arc {
            Some(arc) => {
                let pts = arc.discretize(1.0);
                let idx = ((pts.len() - 1) as f64 * position.ratio).round() as usize;
                pts[idx.min(pts.len() - 1)]
            }
            None => {
                let src = self.node(position.neighbor.0).pos;
                let dst = self.node(neighbor.target).pos;
                Line::new(src, dst).point_at(position.ratio)
            }
        }
    }

    /// Any node with exactly one contour-touching neighbor; the usual
    /// starting point for longest-path extraction (Sec. 4.2).
    pub fn any_contour_node(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.is_contour())
            .map(NodeId)
    }

    /// Builds a VG from a constructed `boostvoronoi` diagram, keeping only
    /// finite primary edges whose endpoints lie inside or on the island
    /// (Sec. 4.1). `segments` is the generating segment list in the same
    /// order passed to the builder, used to recover each cell's site.
    pub fn from_diagram(
        diagram: &bv::Diagram<f64>,
        segments: &[Line],
        island: &ExPolygon,
    ) -> Result<Self, SlaError> {
        let mut node_index: AHashMap<(i64, i64), NodeId> = AHashMap::new();
        let mut nodes: Vec<Node> = Vec::new();
        let mut get_or_insert = |p: Point, nodes: &mut Vec<Node>| -> NodeId {
            let key = (p.x, p.y);
            if let Some(id) = node_index.get(&key) {
                return *id;
            }
            let id = NodeId(nodes.len());
            let dist = island.distance_to_boundary(p);
            nodes.push(Node {
                pos: p,
                dist_to_edge: dist,
                longest_distance: None,
                neighbors: Vec::new(),
            });
            node_index.insert(key, id);
            id
        };

        let mut processed = vob::Vob::<u32>::fill_with_false(diagram.edges().len());

        for edge in diagram.edges() {
            let edge_id = edge.get().id();
            if processed.get(edge_id.0).unwrap_or(false) {
                continue;
            }
            let Ok(true) = diagram.edge_is_primary(edge_id) else {
                continue;
            };
            let twin_id = diagram
                .edge_get_twin(edge_id)
                .map_err(|e| SlaError::Internal(format!("voronoi edge twin: {e}")))?;

            let start = match diagram.edge_get_vertex0(edge_id) {
                Ok(Some(v)) => v,
                _ => {
                    let _ = processed.set(edge_id.0, true);
                    let _ = processed.set(twin_id.0, true);
                    continue;
                }
            };
            let end = match diagram.edge_get_vertex1(edge_id) {
                Ok(Some(v)) => v,
                _ => {
                    let _ = processed.set(edge_id.0, true);
                    let _ = processed.set(twin_id.0, true);
                    continue;
                }
            };
            let v0 = diagram
                .vertex_get(start)
                .map_err(|e| SlaError::Internal(format!("voronoi vertex: {e}")))?
                .get();
            let v1 = diagram
                .vertex_get(end)
                .map_err(|e| SlaError::Internal(format!("voronoi vertex: {e}")))?
                .get();
            let p0 = Point::new(v0.x().round() as i64, v0.y().round() as i64);
            let p1 = Point::new(v1.x().round() as i64, v1.y().round() as i64);

            let _ = processed.set(edge_id.0, true);
            let _ = processed.set(twin_id.0, true);

            if !(island.contains_point(p0) || on_boundary(island, p0))
                || !(island.contains_point(p1) || on_boundary(island, p1))
            {
                continue;
            }

            let cell_id = edge
                .get()
                .cell()
                .ok_or_else(|| SlaError::Internal("voronoi edge missing cell".to_string()))?;
            let cell = diagram
                .get_cell(cell_id)
                .map_err(|e| SlaError::Internal(format!("voronoi cell: {e}")))?
                .get();
            let is_curved = diagram
                .edge_is_curved(edge_id)
                .map_err(|e| SlaError::Internal(format!("voronoi edge curved: {e}")))?;

            let site_segment = cell
                .source_index()
                .map(|idx| segments[idx % segments.len()]);

            let (arc, length, min_width, max_width) = if is_curved {
                let directrix = site_segment.unwrap_or(Line::new(p0, p1));
                let focus_segments = segments;
                let focus = nearest_site_point(focus_segments, p0, p1);
                let parabola = Parabola::new(directrix, focus);
                let seg = ParabolaSegment::new(parabola, p0, p1);
                let len = seg.length();
                let w0 = 2.0 * p0.distance_to(focus);
                let w1 = 2.0 * p1.distance_to(focus);
                (Some(seg), len, w0.min(w1), w0.max(w1))
            } else {
                let len = p0.distance_to(p1);
                let (w0, w1) = match site_segment {
                    Some(seg) => (
                        2.0 * seg.distance_to_point(p0),
                        2.0 * seg.distance_to_point(p1),
                    ),
                    None => {
                        let site = nearest_site_point(segments, p0, p1);
                        (2.0 * p0.distance_to(site), 2.0 * p1.distance_to(site))
                    }
                };
                (None, len, w0.min(w1), w0.max(w1))
            };

            let n0 = get_or_insert(p0, &mut nodes);
            let n1 = get_or_insert(p1, &mut nodes);

            let idx_fwd = nodes[n0.0].neighbors.len();
            nodes[n0.0].neighbors.push(Neighbor {
                target: n1,
                length,
                min_width,
                max_width,
                twin: NeighborId(n1, 0), // patched below
                arc,
            });
            let idx_bwd = nodes[n1.0].neighbors.len();
            nodes[n1.0].neighbors.push(Neighbor {
                target: n0,
                length,
                min_width,
                max_width,
                twin: NeighborId(n0, idx_fwd),
                arc,
            });
            nodes[n0.0].neighbors[idx_fwd].twin = NeighborId(n1, idx_bwd);
        }

        if nodes.is_empty() {
            return Err(SlaError::Internal(
                "voronoi graph has no interior nodes".to_string(),
            ));
        }
        Ok(VoronoiGraph { nodes })
    }
}

fn on_boundary(island: &ExPolygon, p: Point) -> bool {
    island.distance_to_boundary(p) < 1.0
}

fn nearest_site_point(segments: &[Line], p0: Point, p1: Point) -> Point {
    let mid = Point::from_vec2(p0.to_vec2().midpoint(p1.to_vec2()));
    segments
        .iter()
        .flat_map(|l| [l.a, l.b])
        .min_by(|a, b| {
            a.distance_to(mid)
                .partial_cmp(&b.distance_to(mid))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polygon;

    fn square(side: i64) -> ExPolygon {
        ExPolygon::new(
            Polygon::new(vec![
                Point::new(0, 0),
                Point::new(side, 0),
                Point::new(side, side),
                Point::new(0, side),
            ]),
            vec![],
        )
    }

    #[test]
    fn square_has_a_centered_skeleton() {
        let island = square(crate::geom::scale(4.0));
        let graph = crate::voronoi::build_voronoi_graph(&island).expect("build graph");
        assert!(!graph.nodes.is_empty());
        assert!(graph.any_contour_node().is_some() || graph.nodes.iter().any(|n| !n.neighbors.is_empty()));
    }
}
