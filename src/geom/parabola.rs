use super::{Line, Point};

/// A parabola given by its focus-directrix definition: the locus of points
/// equidistant from `focus` and the infinite line through `directrix`.
///
/// This is how `boostvoronoi` hands back curved (point/segment-site) edges:
/// the directrix is the generating segment and the focus is the generating
/// point of the opposite cell.
#[derive(Clone, Copy, Debug)]
pub struct Parabola {
    pub directrix: Line,
    pub focus: Point,
}

impl Parabola {
    pub fn new(directrix: Line, focus: Point) -> Self {
        Self { directrix, focus }
    }

    /// Local frame: `origin` is the foot of the perpendicular from `focus`
    /// onto the directrix, `u` runs along the directrix, `v` runs from
    /// `origin` toward `focus`, and `half_latus` is the focus-directrix
    /// distance (the classic parabola constant `d`, with `y = x^2/(2d) + d/2`
    /// in this frame).
    fn local_frame(&self) -> (glam::DVec2, glam::DVec2, glam::DVec2, f64) {
        let a = self.directrix.a.to_vec2();
        let b = self.directrix.b.to_vec2();
        let dir = (b - a).normalize_or_zero();
        let focus = self.focus.to_vec2();
        let t = (focus - a).dot(dir);
        let origin = a + dir * t;
        let to_focus = focus - origin;
        let d = to_focus.length();
        let v = if d > f64::EPSILON {
            to_focus / d
        } else {
            glam::DVec2::new(-dir.y, dir.x)
        };
        (origin, dir, v, d.max(f64::EPSILON))
    }

    fn to_local(&self, p: Point, origin: glam::DVec2, u: glam::DVec2, v: glam::DVec2) -> glam::DVec2 {
        let rel = p.to_vec2() - origin;
        glam::DVec2::new(rel.dot(u), rel.dot(v))
    }

    fn from_local(&self, x: f64, origin: glam::DVec2, u: glam::DVec2, v: glam::DVec2, d: f64) -> Point {
        let y = x * x / (2.0 * d) + d / 2.0;
        Point::from_vec2(origin + u * x + v * y)
    }

    fn arc_length_from_zero(x: f64, d: f64) -> f64 {
        let r = (1.0 + (x / d) * (x / d)).sqrt();
        0.5 * x * r + 0.5 * d * (x / d).asinh()
    }
}

/// A bounded stretch of a [`Parabola`] between two points that lie on it.
#[derive(Clone, Copy, Debug)]
pub struct ParabolaSegment {
    pub parabola: Parabola,
    pub from: Point,
    pub to: Point,
}

impl ParabolaSegment {
    pub fn new(parabola: Parabola, from: Point, to: Point) -> Self {
        Self { parabola, from, to }
    }

    /// Arc length of the segment.
    pub fn length(&self) -> f64 {
        let (origin, u, v, d) = self.parabola.local_frame();
        let x0 = self.parabola.to_local(self.from, origin, u, v).x;
        let x1 = self.parabola.to_local(self.to, origin, u, v).x;
        (Parabola::arc_length_from_zero(x1, d) - Parabola::arc_length_from_zero(x0, d)).abs()
    }

    /// Discretize into a polyline approximating the curve to within
    /// `max_sagitta` (the maximum distance between the chord and the true
    /// curve), recursively bisecting in local-`x` space.
    pub fn discretize(&self, max_sagitta: f64) -> Vec<Point> {
        let (origin, u, v, d) = self.parabola.local_frame();
        let x0 = self.parabola.to_local(self.from, origin, u, v).x;
        let x1 = self.parabola.to_local(self.to, origin, u, v).x;
        let mut out = vec![self.from];
        self.subdivide(x0, x1, max_sagitta, origin, u, v, d, &mut out, 0);
        out.push(self.to);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn subdivide(
        &self,
        x0: f64,
        x1: f64,
        max_sagitta: f64,
        origin: glam::DVec2,
        u: glam::DVec2,
        v: glam::DVec2,
        d: f64,
        out: &mut Vec<Point>,
        depth: u32,
    ) {
        let xm = (x0 + x1) * 0.5;
        let p0 = self.parabola.from_local(x0, origin, u, v, d).to_vec2();
        let p1 = self.parabola.from_local(x1, origin, u, v, d).to_vec2();
        let pm = self.parabola.from_local(xm, origin, u, v, d).to_vec2();
        let chord_mid = (p0 + p1) * 0.5;
        let sagitta = (pm - chord_mid).length();
        if sagitta <= max_sagitta || depth >= 24 {
            return;
        }
        self.subdivide(x0, xm, max_sagitta, origin, u, v, d, out, depth + 1);
        out.push(Point::from_vec2(pm));
        self.subdivide(xm, x1, max_sagitta, origin, u, v, d, out, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_on_parabola_is_equidistant() {
        let directrix = Line::new(Point::new(-1_000_000, 0), Point::new(1_000_000, 0));
        let focus = Point::new(0, 500_000);
        let parabola = Parabola::new(directrix, focus);
        let (origin, u, v, d) = parabola.local_frame();
        let p = parabola.from_local(250_000.0, origin, u, v, d);
        let dist_focus = p.distance_to(focus);
        let dist_line = directrix.distance_to_point(p);
        assert!((dist_focus - dist_line).abs() < 1.0);
    }

    #[test]
    fn discretize_brackets_endpoints() {
        let directrix = Line::new(Point::new(-1_000_000, 0), Point::new(1_000_000, 0));
        let focus = Point::new(0, 500_000);
        let parabola = Parabola::new(directrix, focus);
        let (origin, u, v, d) = parabola.local_frame();
        let from = parabola.from_local(-400_000.0, origin, u, v, d);
        let to = parabola.from_local(400_000.0, origin, u, v, d);
        let seg = ParabolaSegment::new(parabola, from, to);
        let pts = seg.discretize(1000.0);
        assert_eq!(pts.first().copied(), Some(from));
        assert_eq!(pts.last().copied(), Some(to));
        assert!(pts.len() >= 2);
    }
}
