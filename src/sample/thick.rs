//! Thick-part field + outline + interior-grid sampling (Sec. 4.5 steps 3-5).

use crate::config::SampleConfig;
use crate::field::{self, Field, FieldEdge};
use crate::geom::{Line, Point};
use crate::partition::IslandPart;
use crate::points::SupportIslandPoint;
use crate::voronoi::VoronoiGraph;
use std::rc::Rc;

pub fn sample_thick_part(
    graph: &VoronoiGraph,
    part: &IslandPart,
    outline: &[Line],
    cfg: &SampleConfig,
) -> Vec<SupportIslandPoint> {
    let field = field::build_field(graph, part, outline, cfg);
    let mut points = sample_outline(&field, cfg);
    points.extend(sample_interior_grid(&field, cfg));
    points
}

/// Walks each inner contour; contiguous runs of `is_inner_outline == true`
/// are sampled at `thick_outline_max_distance` spacing, either as a
/// circular sequence (if the whole contour is outline) or a linear
/// sequence per run otherwise.
pub(crate) fn sample_outline(field: &Field, cfg: &SampleConfig) -> Vec<SupportIslandPoint> {
    if field.edges.is_empty() {
        return Vec::new();
    }
    let all_outline = field.edges.iter().all(|e| e.is_inner_outline);
    let spacing = cfg.thick_outline_max_distance as f64;

    let mut points = Vec::new();
    if all_outline {
        sample_sequence(&field.edges, spacing, true, &mut points);
        return points;
    }

    let n = field.edges.len();
    let mut i = 0;
    while i < n {
        if !field.edges[i].is_inner_outline {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && field.edges[i].is_inner_outline {
            i += 1;
        }
        sample_sequence(&field.edges[start..i], spacing, false, &mut points);
    }
    points
}

fn sample_sequence(edges: &[FieldEdge], spacing: f64, closed: bool, out: &mut Vec<SupportIslandPoint>) {
    if edges.is_empty() {
        return;
    }
    let lines: Rc<Vec<Line>> = Rc::new(edges.iter().map(|e| e.line).collect());
    let restriction = crate::points::OutlineRestriction {
        lines: lines.clone(),
        closed,
    };
    let mut since_last = spacing; // emit near the sequence start
    for (idx, edge) in lines.iter().enumerate() {
        let len = edge.length();
        since_last += len;
        while since_last >= spacing && len > 0.0 {
            let overshoot = since_last - spacing;
            let ratio = ((len - overshoot) / len).clamp(0.0, 1.0);
            let pos = edge.point_at(ratio);
            out.push(SupportIslandPoint::OutlineIsland {
                pos,
                restriction: restriction.clone(),
                line_index: idx,
                ratio,
                align_budget: spacing,
            });
            since_last -= spacing;
        }
    }
}

/// Samples the field's inner region with a triangular (hex-centred) grid,
/// centred on the contour centroid and rotated so the farthest contour
/// vertex aligns with +X, making repeated-shape islands sample identically
/// regardless of input orientation.
pub(crate) fn sample_interior_grid(field: &Field, cfg: &SampleConfig) -> Vec<SupportIslandPoint> {
    let contour = field.inner.contour.points();
    if contour.len() < 3 {
        return Vec::new();
    }
    let centroid = polygon_centroid(contour);
    let farthest = contour
        .iter()
        .copied()
        .max_by(|a, b| {
            a.distance_to(centroid)
                .partial_cmp(&b.distance_to(centroid))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(centroid);
    let to_farthest = farthest.to_vec2() - centroid.to_vec2();
    let angle = to_farthest.y.atan2(to_farthest.x);

    let spacing = cfg.thick_inner_max_distance as f64;
    let row_height = spacing * (3f64.sqrt() / 2.0);

    let mut min = contour[0];
    let mut max = contour[0];
    for &p in contour {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let diag = Point::new(max.x - min.x, max.y - min.y).to_vec2().length();
    let rows = (diag / row_height).ceil() as i64 + 2;
    let cols = (diag / spacing).ceil() as i64 + 2;

    let field_rc = Rc::new(field.clone());
    let mut points = Vec::new();
    let c = centroid.to_vec2();
    let rot = glam::DMat2::from_angle(-angle);
    for row in -rows..=rows {
        let y = row as f64 * row_height;
        let x_offset = if row % 2 == 0 { 0.0 } else { spacing / 2.0 };
        for col in -cols..=cols {
            let x = col as f64 * spacing + x_offset;
            let local = glam::DVec2::new(x, y);
            let world = c + rot.inverse() * local;
            let candidate = Point::from_vec2(world);
            if field.inner.contains_point(candidate) {
                points.push(SupportIslandPoint::InnerIsland {
                    pos: candidate,
                    field: field_rc.clone(),
                });
            }
        }
    }
    points
}

fn polygon_centroid(points: &[Point]) -> Point {
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold(glam::DVec2::ZERO, |acc, p| acc + p.to_vec2());
    Point::from_vec2(sum / n)
}

