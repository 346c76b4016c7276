//! Per-island support sampling: shortcut policies (Sec. 4.6), or the full
//! skeleton -> partition -> thin/thick sampling pipeline (Sec. 4.1-4.5).

pub mod shortcuts;
pub mod thick;
pub mod thin;

use crate::config::SampleConfig;
use crate::geom::{ExPolygon, Line, Point};
use crate::partition::{self, PartKind};
use crate::path;
use crate::points::SupportIslandPoint;
use crate::relax;
use crate::voronoi;
use log::{debug, warn};

fn island_outline_segments(island: &ExPolygon) -> Vec<Line> {
    let mut segments = Vec::new();
    let n = island.contour.points().len();
    let pts = island.contour.points();
    for i in 0..n {
        segments.push(Line::new(pts[i], pts[(i + 1) % n]));
    }
    segments
}

/// Samples one island's support points, following the shortcut policies of
/// Sec. 4.6 before falling back to the full pipeline.
pub fn sample_island(island: &ExPolygon, cfg: &SampleConfig) -> Vec<SupportIslandPoint> {
    if let Some(point) = shortcuts::bounding_box_shortcut(island, cfg) {
        return vec![point];
    }

    let graph = match voronoi::build_voronoi_graph(island) {
        Ok(g) => g,
        Err(err) => {
            warn!("voronoi construction failed, falling back to BadShape: {err}");
            return vec![shortcuts::bad_shape_point(island)];
        }
    };

    let Some(root) = graph.any_contour_node() else {
        warn!("voronoi graph has no contour node, falling back to BadShape");
        return vec![shortcuts::bad_shape_point(island)];
    };

    let ex_path = path::longest_path(&graph, root);

    if let Some(points) = shortcuts::one_center_shortcut(&graph, &ex_path, cfg) {
        return points;
    }
    if let Some(points) = shortcuts::two_points_shortcut(&graph, &ex_path, cfg) {
        return points;
    }

    let parts = partition::partition(&graph, &ex_path, cfg);
    debug!("thin/thick partition produced {} parts", parts.len());

    let outline = island_outline_segments(island);
    let mut points = Vec::new();
    for part in &parts {
        match part.kind {
            PartKind::Thin => points.extend(thin::sample_thin_part(&graph, &ex_path, part, cfg)),
            PartKind::Thick => points.extend(thick::sample_thick_part(&graph, part, &outline, cfg)),
        }
    }

    if points.len() < 3 {
        warn!(
            "full sampling produced only {} points, falling back to TwoPointsBackup",
            points.len()
        );
        return shortcuts::two_points_backup(&ex_path, &graph);
    }

    relax::relax(&mut points, Some(&graph), island, cfg);
    points
}

fn bounding_box_of(points: &[Point]) -> (Point, Point) {
    let mut min = points[0];
    let mut max = points[0];
    for &p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

pub(crate) fn centroid(points: &[Point]) -> Point {
    let (min, max) = bounding_box_of(points);
    Point::new((min.x + max.x) / 2, (min.y + max.y) / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{scale, Polygon};

    fn square(side_mm: f64) -> ExPolygon {
        let s = scale(side_mm);
        ExPolygon::new(
            Polygon::new(vec![
                Point::new(0, 0),
                Point::new(s, 0),
                Point::new(s, s),
                Point::new(0, s),
            ]),
            Vec::new(),
        )
    }

    fn rectangle(width_mm: f64, height_mm: f64) -> ExPolygon {
        let w = scale(width_mm);
        let h = scale(height_mm);
        ExPolygon::new(
            Polygon::new(vec![
                Point::new(0, 0),
                Point::new(w, 0),
                Point::new(w, h),
                Point::new(0, h),
            ]),
            Vec::new(),
        )
    }

    fn contains_all(island: &ExPolygon, points: &[SupportIslandPoint]) -> bool {
        points.iter().all(|p| island.contains_point(p.pos()))
    }

    #[test]
    fn small_square_yields_a_single_centered_point() {
        let cfg = SampleConfig::for_head_diameter(0.4);
        let island = square(4.0);
        let points = sample_island(&island, &cfg);
        assert_eq!(points.len(), 1);
        assert!(matches!(points[0], SupportIslandPoint::OneCenter { .. }));
        assert!(contains_all(&island, &points));
    }

    #[test]
    fn slender_rectangle_yields_multiple_points_all_inside() {
        let cfg = SampleConfig::for_head_diameter(0.4);
        let island = rectangle(30.0, 1.5);
        let points = sample_island(&island, &cfg);
        assert!(points.len() >= 2, "non-micro island must yield >= 2 points");
        assert!(contains_all(&island, &points));
    }

    #[test]
    fn large_square_yields_outline_and_inner_points() {
        let cfg = SampleConfig::for_head_diameter(0.4);
        let island = square(30.0);
        let points = sample_island(&island, &cfg);
        assert!(points.iter().any(|p| matches!(p, SupportIslandPoint::OutlineIsland { .. })));
        assert!(points.iter().any(|p| matches!(p, SupportIslandPoint::InnerIsland { .. })));
        assert!(contains_all(&island, &points));
    }
}
