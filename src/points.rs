//! The support-point sum type (Sec. 3 `SupportIslandPoint`/`LayerSupportPoint`)
//! and the global append-only point store (Sec. 3 "Lifetimes and ownership",
//! Sec. 9 "Per-layer trees sharing a global store").

use crate::field::Field;
use crate::geom::Point;
use crate::voronoi::Position;
use std::rc::Rc;

/// A restriction sequence an `OutlineIsland` point slides along: a chain of
/// line segments, either open (linear) or closed (the whole contour is
/// outline).
#[derive(Clone, Debug)]
pub struct OutlineRestriction {
    pub lines: Rc<Vec<crate::geom::Line>>,
    pub closed: bool,
}

/// A 2D island-local support point and its movement-constraint payload.
/// Replaces the original class hierarchy with a sum type: each variant
/// carries exactly the state its `move_towards` needs (Sec. 9 "Polymorphic
/// support points").
#[derive(Clone, Debug)]
pub enum SupportIslandPoint {
    /// Whole island fits in one head-radius bounding box.
    OneBbCenter { pos: Point },
    /// Whole island's longest path is shorter than the one-point threshold.
    OneCenter { pos: Point },
    /// Two end-stretch points for a slender island.
    TwoPoints { pos: Point },
    /// Fallback end-stretch points when full sampling under-produced.
    TwoPointsBackup { pos: Point },
    /// Voronoi construction failed; the one point this island gets.
    BadShape { pos: Point },
    /// Slides along VG edges, within `max_align_distance` of its origin.
    CenterIsland { pos: Point, position: Position },
    /// Slides along an outline restriction sequence.
    OutlineIsland {
        pos: Point,
        restriction: OutlineRestriction,
        line_index: usize,
        ratio: f64,
        align_budget: f64,
    },
    /// Restricted to remain inside a shared inner field region.
    InnerIsland { pos: Point, field: Rc<Field> },
    /// User-pinned; never moves.
    Permanent { pos: Point },
    /// An overhang/peninsula-arc sample placed directly in 3D (Sec. 4.8,
    /// 4.10); never relaxed.
    Overhang { pos: Point },
}

impl SupportIslandPoint {
    pub fn pos(&self) -> Point {
        match self {
            Self::OneBbCenter { pos }
            | Self::OneCenter { pos }
            | Self::TwoPoints { pos }
            | Self::TwoPointsBackup { pos }
            | Self::BadShape { pos }
            | Self::CenterIsland { pos, .. }
            | Self::OutlineIsland { pos, .. }
            | Self::InnerIsland { pos, .. }
            | Self::Permanent { pos }
            | Self::Overhang { pos } => *pos,
        }
    }

    pub fn set_pos(&mut self, p: Point) {
        match self {
            Self::OneBbCenter { pos }
            | Self::OneCenter { pos }
            | Self::TwoPoints { pos }
            | Self::TwoPointsBackup { pos }
            | Self::BadShape { pos }
            | Self::CenterIsland { pos, .. }
            | Self::OutlineIsland { pos, .. }
            | Self::InnerIsland { pos, .. }
            | Self::Permanent { pos }
            | Self::Overhang { pos } => *pos = p,
        }
    }

    pub fn can_move(&self) -> bool {
        !matches!(
            self,
            Self::OneBbCenter { .. }
                | Self::OneCenter { .. }
                | Self::TwoPoints { .. }
                | Self::TwoPointsBackup { .. }
                | Self::BadShape { .. }
                | Self::Permanent { .. }
                | Self::Overhang { .. }
        )
    }
}

/// Which 3D relationship produced a `LayerSupportPoint`, used only to tag
/// output (Sec. 6 "a type tag (island, slope, or permanent)").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupportKind {
    Island,
    Slope,
    Permanent,
}

/// A caller-supplied, user-pinned support that must appear in the output
/// verbatim and influences sampling of nearby islands (Sec. 6 input,
/// Sec. 9 "Permanent support"). Callers must sort a batch of these
/// ascending by `position.z`.
#[derive(Clone, Copy, Debug)]
pub struct PermanentSupport {
    pub position: glam::DVec3,
    pub head_radius: f64,
}

/// One entry of the final flat output (Sec. 6): a 3D position, the head
/// radius it was placed with, and which kind of support produced it.
#[derive(Clone, Copy, Debug)]
pub struct SupportPoint {
    pub position: glam::DVec3,
    pub head_radius: f64,
    pub kind: SupportKind,
}

/// A `SupportIslandPoint` placed in 3D on a specific layer, with its
/// current influence radius and progress along the support-radius curve.
#[derive(Clone, Debug)]
pub struct LayerSupportPoint {
    pub island_point: SupportIslandPoint,
    pub world_xyz: glam::DVec3,
    pub layer_index: usize,
    pub current_radius: f64,
    pub radius_curve_index: usize,
    pub kind: SupportKind,
    pub is_permanent: bool,
}

/// Index into the global, append-only [`PointStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointIndex(pub usize);

/// The single growing buffer every `LayerSupportPoint` for a whole
/// generation run lives in. Per-layer/per-part indices (`NearPoints`) hold
/// only `PointIndex`es into it; nothing is ever removed, so indices
/// remain valid for the run's whole lifetime (Sec. 3, Sec. 9).
#[derive(Default)]
pub struct PointStore {
    points: Vec<LayerSupportPoint>,
}

impl PointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: LayerSupportPoint) -> PointIndex {
        let idx = PointIndex(self.points.len());
        self.points.push(point);
        idx
    }

    pub fn get(&self, idx: PointIndex) -> &LayerSupportPoint {
        &self.points[idx.0]
    }

    pub fn get_mut(&mut self, idx: PointIndex) -> &mut LayerSupportPoint {
        &mut self.points[idx.0]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointIndex, &LayerSupportPoint)> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (PointIndex(i), p))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LayerSupportPoint> {
        self.points.iter_mut()
    }
}
