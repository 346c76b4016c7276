use super::{geo_ring_to_points, points_to_geo_ring, Point};

/// A single closed ring, outer boundaries counter-clockwise and holes
/// clockwise, matching the slicer convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.len() < 3
    }

    /// Twice the signed area; positive for CCW winding.
    pub fn signed_area_x2(&self) -> i128 {
        let n = self.points.len();
        if n < 3 {
            return 0;
        }
        let mut sum: i128 = 0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128;
        }
        sum
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area_x2() > 0
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn make_ccw(&mut self) {
        if !self.is_ccw() {
            self.reverse();
        }
    }

    pub fn make_cw(&mut self) {
        if self.is_ccw() {
            self.reverse();
        }
    }

    pub fn lowest_point(&self) -> Option<Point> {
        self.points.iter().copied().min_by(|a, b| a.y.cmp(&b.y).then(a.x.cmp(&b.x)))
    }

    pub fn to_geo(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(points_to_geo_ring(&self.points), vec![])
    }

    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.points[i].distance_to(self.points[(i + 1) % n]))
            .sum()
    }

    /// Even-odd ray-cast point-in-polygon test against this ring alone
    /// (ignores winding direction).
    pub fn contains_point(&self, p: Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x_at_y = a.x as f64
                    + (p.y - a.y) as f64 / (b.y - a.y) as f64 * (b.x - a.x) as f64;
                if (p.x as f64) < x_at_y {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Minimum perpendicular distance from `p` to this ring's boundary.
    pub fn distance_to_boundary(&self, p: Point) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| {
                super::Line::new(self.points[i], self.points[(i + 1) % n]).distance_to_point(p)
            })
            .fold(f64::INFINITY, f64::min)
    }
}

/// An outer boundary together with zero or more holes, the unit the
/// partitioning/sampling passes operate on.
#[derive(Clone, Debug)]
pub struct ExPolygon {
    pub contour: Polygon,
    pub holes: Vec<Polygon>,
}

impl ExPolygon {
    /// Builds an `ExPolygon`, normalizing winding (CCW contour, CW holes)
    /// and ordering holes deterministically: by descending area, then by
    /// lexicographic order of each hole's lowest point. Layer input arrives
    /// from an external slicer whose hole enumeration order is not
    /// guaranteed, so every downstream pass that iterates `holes` relies on
    /// this having already been normalized here.
    pub fn new(mut contour: Polygon, mut holes: Vec<Polygon>) -> Self {
        contour.make_ccw();
        for hole in &mut holes {
            hole.make_cw();
        }
        holes.sort_by(|a, b| {
            let area_a = a.signed_area_x2().unsigned_abs();
            let area_b = b.signed_area_x2().unsigned_abs();
            area_b
                .cmp(&area_a)
                .then_with(|| a.lowest_point().cmp(&b.lowest_point()))
        });
        Self { contour, holes }
    }

    pub fn is_empty(&self) -> bool {
        self.contour.is_empty()
    }

    pub fn to_geo(&self) -> geo::Polygon<f64> {
        let exterior = points_to_geo_ring(self.contour.points());
        let interiors = self
            .holes
            .iter()
            .map(|h| points_to_geo_ring(h.points()))
            .collect();
        geo::Polygon::new(exterior, interiors)
    }

    pub fn from_geo(poly: &geo::Polygon<f64>) -> Self {
        let contour = Polygon::new(geo_ring_to_points(poly.exterior()));
        let holes = poly.interiors().iter().map(|r| Polygon::new(geo_ring_to_points(r))).collect();
        Self::new(contour, holes)
    }

    /// True when `p` is inside the contour and outside every hole
    /// (boundary-inclusive via the underlying ray cast).
    pub fn contains_point(&self, p: Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }

    /// Minimum perpendicular distance from `p` to the nearest boundary edge,
    /// over the contour and all holes.
    pub fn distance_to_boundary(&self, p: Point) -> f64 {
        std::iter::once(&self.contour)
            .chain(self.holes.iter())
            .map(|ring| ring.distance_to_boundary(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Area of the contour minus the area of its holes, in scaled units
    /// squared.
    pub fn area(&self) -> f64 {
        let outer = self.contour.signed_area_x2().unsigned_abs() as f64 / 2.0;
        let holes: f64 = self
            .holes
            .iter()
            .map(|h| h.signed_area_x2().unsigned_abs() as f64 / 2.0)
            .sum();
        outer - holes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: i64, y0: i64, side: i64) -> Polygon {
        Polygon::new(vec![
            Point::new(x0, y0),
            Point::new(x0 + side, y0),
            Point::new(x0 + side, y0 + side),
            Point::new(x0, y0 + side),
        ])
    }

    #[test]
    fn winding_normalized() {
        let mut hole = square(1, 1, 2);
        hole.make_ccw();
        let ex = ExPolygon::new(square(0, 0, 10), vec![hole]);
        assert!(ex.contour.is_ccw());
        assert!(!ex.holes[0].is_ccw());
    }

    #[test]
    fn hole_order_deterministic() {
        let small = square(1, 1, 1);
        let big = square(5, 5, 3);
        let ex1 = ExPolygon::new(square(0, 0, 20), vec![small.clone(), big.clone()]);
        let ex2 = ExPolygon::new(square(0, 0, 20), vec![big, small]);
        assert_eq!(ex1.holes[0].points(), ex2.holes[0].points());
    }

    #[test]
    fn area_subtracts_holes() {
        let ex = ExPolygon::new(square(0, 0, 10), vec![square(2, 2, 2)]);
        assert!((ex.area() - (100.0 - 4.0)).abs() < 1e-9);
    }
}
