//! Peninsula detection (Sec. 4.9): the portion of a non-island part that
//! projects far enough beyond the previous layer's shapes to need its own
//! outline supports, as opposed to being carried by the overhang sampler
//! alone.

use crate::config::PrepareSupportConfig;
use crate::field::FieldEdge;
use crate::geom::{ExPolygon, Line};
use geo::algorithm::buffer::Buffer;
use geo::BooleanOps;

pub struct Peninsula {
    pub region: ExPolygon,
    pub edges: Vec<FieldEdge>,
}

/// Detects peninsulas on `current`, given `previous_union` (the union of
/// every shape on the layer below). See Sec. 4.9 and the "expand returning
/// empty" open question resolved in DESIGN.md: when the self-supported
/// offset swallows the whole part, every edge is treated as coast rather
/// than propagating an error.
pub fn detect_peninsulas(
    current: &ExPolygon,
    previous_union: &geo::MultiPolygon<f64>,
    cfg: &PrepareSupportConfig,
) -> Vec<Peninsula> {
    let current_geo = current.to_geo();
    let candidate_boundary = previous_union.buffer(cfg.peninsula_min_width as f64);
    let self_supported = previous_union.buffer(cfg.peninsula_self_supported_width as f64);

    let candidates = current_geo.difference(&candidate_boundary);
    if candidates.0.is_empty() {
        return Vec::new();
    }

    let outside_self_supported = current_geo.difference(&self_supported);
    // When the self-supported offset swallows nothing, spec.md's "proceeds
    // as if every edge were a coast" applies: skip geometric classification
    // and force every edge of every candidate to coast.
    let (peninsula_polys, all_coast): (Vec<geo::Polygon<f64>>, bool) = if outside_self_supported.0.is_empty() {
        (candidates.0, true)
    } else {
        (
            outside_self_supported
                .0
                .into_iter()
                .filter(|poly| !poly.intersection(&candidates).0.is_empty())
                .collect(),
            false,
        )
    };

    peninsula_polys
        .into_iter()
        .map(|poly| {
            let region = ExPolygon::from_geo(&poly);
            let edges = if all_coast {
                all_coast_edges(&region)
            } else {
                classify_edges(&region, &self_supported)
            };
            Peninsula { region, edges }
        })
        .collect()
}

/// Every edge of `region` marked coast (Sec. 4.9's "expand returning empty"
/// fallback: no edge can be confirmed land, so every edge needs its own
/// outline support).
fn all_coast_edges(region: &ExPolygon) -> Vec<FieldEdge> {
    let mut edges = Vec::new();
    for ring in std::iter::once(&region.contour).chain(region.holes.iter()) {
        let pts = ring.points();
        let n = pts.len();
        for i in 0..n {
            edges.push(FieldEdge {
                line: Line::new(pts[i], pts[(i + 1) % n]),
                is_inner_outline: true,
            });
        }
    }
    edges
}

const MAX_COAST_MATCH_DISTANCE: f64 = 1_000_000.0;

/// An edge is "land" (already supported by the previous layer) if a
/// parallel, near-coincident edge exists on `self_supported`'s boundary;
/// otherwise it is "coast" and needs its own outline support.
fn classify_edges(region: &ExPolygon, self_supported: &geo::MultiPolygon<f64>) -> Vec<FieldEdge> {
    let reference_lines = boundary_lines(self_supported);
    let mut edges = Vec::new();
    for ring in std::iter::once(&region.contour).chain(region.holes.iter()) {
        let pts = ring.points();
        let n = pts.len();
        for i in 0..n {
            let line = Line::new(pts[i], pts[(i + 1) % n]);
            let is_land = matches_any(line, &reference_lines);
            edges.push(FieldEdge {
                line,
                is_inner_outline: !is_land,
            });
        }
    }
    edges
}

fn boundary_lines(poly: &geo::MultiPolygon<f64>) -> Vec<Line> {
    use crate::geom::Point;
    let mut out = Vec::new();
    for p in &poly.0 {
        for ring in std::iter::once(p.exterior()).chain(p.interiors().iter()) {
            let coords = ring.0.as_slice();
            let n = coords.len();
            if n < 2 {
                continue;
            }
            for i in 0..n - 1 {
                let a = Point::new(coords[i].x.round() as i64, coords[i].y.round() as i64);
                let b = Point::new(coords[i + 1].x.round() as i64, coords[i + 1].y.round() as i64);
                out.push(Line::new(a, b));
            }
        }
    }
    out
}

fn matches_any(edge: Line, reference: &[Line]) -> bool {
    let dir = edge.direction().to_vec2().normalize_or_zero();
    for r in reference {
        let rdir = r.direction().to_vec2().normalize_or_zero();
        if dir.dot(rdir).abs() < 0.98 {
            continue;
        }
        let d = r.distance_to_point(edge.a).min(r.distance_to_point(edge.b));
        if d < MAX_COAST_MATCH_DISTANCE {
            return true;
        }
    }
    false
}
