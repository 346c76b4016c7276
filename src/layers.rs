//! Per-layer parts, cross-layer linking, and the propagation pass that
//! inherits/filters/extends support coverage layer by layer (Sec. 3,
//! Sec. 4.8-4.11).

pub mod near_points;
pub mod overhang;
pub mod peninsula;
pub mod prune;
pub mod radius_curve;

pub use near_points::NearPoints;
pub use radius_curve::SupportRadiusCurve;

use crate::config::{PrepareSupportConfig, SampleConfig};
use crate::field::Field;
use crate::geom::{scale, unscale, ExPolygon, Point};
use crate::points::{LayerSupportPoint, PermanentSupport, PointStore, SupportIslandPoint, SupportKind};
use crate::sample;
use crate::SlaError;
use geo::algorithm::buffer::Buffer;
use geo::BooleanOps;
use log::{debug, info};
use rayon::prelude::*;

/// One printed slice: its Z height and the parts carved out of it.
pub struct Layer {
    pub print_z: f64,
    pub parts: Vec<LayerPart>,
}

/// One connected region on a layer, linked to its overlapping parents and
/// children on the adjacent layers (Sec. 3).
pub struct LayerPart {
    pub island: ExPolygon,
    pub bbox: (Point, Point),
    pub extend_shape: ExPolygon,
    pub prev_parts: Vec<usize>,
    pub next_parts: Vec<usize>,
    pub overhang_samples: Vec<Point>,
    pub peninsulas: Vec<peninsula::Peninsula>,
    pub near_points: Option<NearPoints>,
}

impl LayerPart {
    pub fn is_island(&self) -> bool {
        self.prev_parts.is_empty()
    }
}

/// The whole layer stack, prepared (linked, bbox/extend_shape computed,
/// overhang/peninsula candidates precomputed) but not yet propagated.
pub struct LayerSet {
    pub layers: Vec<Layer>,
}

pub(crate) fn bounding_box(island: &ExPolygon) -> (Point, Point) {
    let pts = island.contour.points();
    let mut min = pts[0];
    let mut max = pts[0];
    for &p in pts {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

fn union_of(polys: &[ExPolygon]) -> geo::MultiPolygon<f64> {
    let mut union = geo::MultiPolygon::<f64>::new(Vec::new());
    for p in polys {
        union = union.union(&p.to_geo());
    }
    union
}

fn overlaps_2d(a: &ExPolygon, b: &ExPolygon) -> bool {
    !a.to_geo().intersection(&b.to_geo()).0.is_empty()
}

/// Builds the full `LayerSet` from raw `(print_z, islands)` input: per-layer
/// bbox/extend_shape construction runs in parallel (Sec. 5's "independent
/// passes" over layers); cross-layer linking and the overhang/peninsula
/// prep that depends on the previous layer's shapes follow as two more
/// parallel-then-apply passes, each reading layer k and k-1 only.
pub fn prepare_layers(
    raw: Vec<(f64, Vec<ExPolygon>)>,
    sample_cfg: &SampleConfig,
    prep_cfg: &PrepareSupportConfig,
) -> LayerSet {
    let mut layers: Vec<Layer> = raw
        .into_par_iter()
        .map(|(print_z, islands)| {
            let parts = islands
                .into_iter()
                .map(|island| {
                    let bbox = bounding_box(&island);
                    let offset = prep_cfg.removing_delta as f64;
                    let buffered = island.to_geo().buffer(offset);
                    let extend_shape = buffered
                        .0
                        .first()
                        .map(ExPolygon::from_geo)
                        .unwrap_or_else(|| island.clone());
                    LayerPart {
                        island,
                        bbox,
                        extend_shape,
                        prev_parts: Vec::new(),
                        next_parts: Vec::new(),
                        overhang_samples: Vec::new(),
                        peninsulas: Vec::new(),
                        near_points: None,
                    }
                })
                .collect();
            Layer { print_z, parts }
        })
        .collect();

    if layers.len() > 1 {
        let overlaps: Vec<Vec<(usize, usize)>> = (1..layers.len())
            .into_par_iter()
            .map(|k| {
                let mut pairs = Vec::new();
                for (j_prev, prev_part) in layers[k - 1].parts.iter().enumerate() {
                    for (j_cur, cur_part) in layers[k].parts.iter().enumerate() {
                        if overlaps_2d(&prev_part.island, &cur_part.island) {
                            pairs.push((j_cur, j_prev));
                        }
                    }
                }
                pairs
            })
            .collect();

        for (offset, pairs) in overlaps.into_iter().enumerate() {
            let k = offset + 1;
            for (j_cur, j_prev) in pairs {
                layers[k].parts[j_cur].prev_parts.push(j_prev);
                layers[k - 1].parts[j_prev].next_parts.push(j_cur);
            }
        }
    }

    let overhang_and_peninsula: Vec<Vec<(Vec<Point>, Vec<peninsula::Peninsula>)>> = (0..layers.len())
        .into_par_iter()
        .map(|k| {
            if k == 0 {
                return layers[0].parts.iter().map(|_| (Vec::new(), Vec::new())).collect();
            }
            let previous_islands: Vec<ExPolygon> =
                layers[k - 1].parts.iter().map(|p| p.island.clone()).collect();
            let previous_union = union_of(&previous_islands);
            layers[k]
                .parts
                .iter()
                .map(|part| {
                    if part.prev_parts.is_empty() {
                        return (Vec::new(), Vec::new());
                    }
                    let samples = overhang::overhang_samples(
                        &part.island,
                        &previous_union,
                        scale(prep_cfg.discretize_overhang_step) as f64,
                    );
                    let peninsulas = peninsula::detect_peninsulas(&part.island, &previous_union, prep_cfg);
                    (samples, peninsulas)
                })
                .collect()
        })
        .collect();

    for (k, per_part) in overhang_and_peninsula.into_iter().enumerate() {
        for (j, (samples, peninsulas)) in per_part.into_iter().enumerate() {
            layers[k].parts[j].overhang_samples = samples;
            layers[k].parts[j].peninsulas = peninsulas;
        }
    }

    LayerSet { layers }
}

fn near_points_for(part: &LayerPart, prev_layer: Option<&Layer>, store: &PointStore) -> NearPoints {
    match prev_layer {
        None => NearPoints::new(),
        Some(prev) => {
            let parents: Vec<&NearPoints> = part
                .prev_parts
                .iter()
                .filter_map(|&idx| prev.parts[idx].near_points.as_ref())
                .collect();
            if parents.is_empty() {
                NearPoints::new()
            } else {
                NearPoints::merged(&parents, store)
            }
        }
    }
}

fn filter_near_points(tree: &NearPoints, part: &LayerPart, current_z: f64, store: &PointStore) -> NearPoints {
    tree.filtered(store, |idx| {
        let p = store.get(idx);
        if p.is_permanent && p.world_xyz.z < current_z {
            return true;
        }
        let pt = Point::new(scale(p.world_xyz.x), scale(p.world_xyz.y));
        part.extend_shape.contains_point(pt)
    })
}

fn island_support_point(
    island_point: SupportIslandPoint,
    layer_index: usize,
    print_z: f64,
    curve: &SupportRadiusCurve,
) -> LayerSupportPoint {
    let pos = island_point.pos();
    LayerSupportPoint {
        island_point,
        world_xyz: glam::DVec3::new(unscale(pos.x), unscale(pos.y), print_z),
        layer_index,
        current_radius: curve.initial_radius(),
        radius_curve_index: 0,
        kind: SupportKind::Island,
        is_permanent: false,
    }
}

/// Runs the Sec. 4.8 propagation pass. Layers are visited strictly in
/// ascending Z; within a layer, parts are visited in order and always
/// merge parents in their stored appearance order, for determinism
/// (Sec. 5 "Ordering"). `cancel` is polled every `cancel_poll_every`
/// layers. `permanent` must already be sorted ascending by `position.z`
/// (Sec. 6); each is injected into the store, and into the `near_points`
/// of every part on its bracket layer whose island contains its 2D
/// projection, the first layer at or above its Z.
pub fn propagate(
    layer_set: &mut LayerSet,
    store: &mut PointStore,
    sample_cfg: &SampleConfig,
    curve: &SupportRadiusCurve,
    cancel_poll_every: usize,
    cancel: &dyn Fn() -> bool,
    permanent: &[PermanentSupport],
) -> Result<(), SlaError> {
    let mut bad_shape_count = 0usize;
    let mut permanent_cursor = 0usize;

    for k in 0..layer_set.layers.len() {
        if cancel_poll_every > 0 && k % cancel_poll_every == 0 && cancel() {
            return Err(SlaError::Cancelled);
        }
        let print_z = layer_set.layers[k].print_z;
        let part_count = layer_set.layers[k].parts.len();
        advance_radii(store, curve, print_z);

        let (before, after) = layer_set.layers.split_at_mut(k);
        let prev_layer: Option<&Layer> = before.last().map(|layer| &*layer);
        let current_layer = &mut after[0];

        for j in 0..part_count {
            let part = &mut current_layer.parts[j];
            let inherited = near_points_for(part, prev_layer, store);
            let mut near = filter_near_points(&inherited, part, print_z, store);

            if part.is_island() {
                let mut points = sample::sample_island(&part.island, sample_cfg);
                if points.len() == 1 && matches!(points[0], SupportIslandPoint::BadShape { .. }) {
                    bad_shape_count += 1;
                }
                for p in points.drain(..) {
                    let lsp = island_support_point(p, k, print_z, curve);
                    let idx = store.push(lsp);
                    near = near.with_added(idx, store);
                }
            } else {
                for pen in &part.peninsulas {
                    let field = Field {
                        inner: pen.region.clone(),
                        edges: pen.edges.clone(),
                    };
                    let mut points = crate::sample::thick::sample_outline(&field, sample_cfg);
                    points.extend(crate::sample::thick::sample_interior_grid(&field, sample_cfg));
                    crate::relax::relax(&mut points, None, &pen.region, sample_cfg);
                    for p in points.drain(..) {
                        let lsp = island_support_point(p, k, print_z, curve);
                        let idx = store.push(lsp);
                        near = near.with_added(idx, store);
                    }
                }

                for &sample_pt in &part.overhang_samples {
                    let x = unscale(sample_pt.x);
                    let y = unscale(sample_pt.y);
                    if near.any_covering(x, y, store) {
                        continue;
                    }
                    let lsp = LayerSupportPoint {
                        island_point: SupportIslandPoint::Overhang { pos: sample_pt },
                        world_xyz: glam::DVec3::new(x, y, print_z),
                        layer_index: k,
                        current_radius: curve.initial_radius(),
                        radius_curve_index: 0,
                        kind: SupportKind::Slope,
                        is_permanent: false,
                    };
                    let idx = store.push(lsp);
                    near = near.with_added(idx, store);
                }
            }

            part.near_points = Some(near);
        }

        while permanent_cursor < permanent.len() && permanent[permanent_cursor].position.z <= print_z {
            let perm = permanent[permanent_cursor];
            let xy = Point::new(scale(perm.position.x), scale(perm.position.y));
            let idx = store.push(LayerSupportPoint {
                island_point: SupportIslandPoint::Permanent { pos: xy },
                world_xyz: perm.position,
                layer_index: k,
                current_radius: perm.head_radius,
                radius_curve_index: 0,
                kind: SupportKind::Permanent,
                is_permanent: true,
            });
            for part in current_layer.parts.iter_mut() {
                if part.island.contains_point(xy) {
                    let near = part.near_points.take().unwrap_or_default();
                    part.near_points = Some(near.with_added(idx, store));
                }
            }
            permanent_cursor += 1;
        }

        debug!("layer {k} (z={print_z:.3}mm) propagated, {part_count} parts");
    }

    let last_z = layer_set.layers.last().map(|l| l.print_z).unwrap_or(0.0);
    for perm in &permanent[permanent_cursor..] {
        let _ = store.push(LayerSupportPoint {
            island_point: SupportIslandPoint::Permanent {
                pos: Point::new(scale(perm.position.x), scale(perm.position.y)),
            },
            world_xyz: perm.position,
            layer_index: layer_set.layers.len().saturating_sub(1),
            current_radius: perm.head_radius,
            radius_curve_index: 0,
            kind: SupportKind::Permanent,
            is_permanent: true,
        });
    }
    if permanent_cursor < permanent.len() {
        debug!(
            "{} permanent support(s) above the top layer (z={last_z:.3}mm) carried through unlinked",
            permanent.len() - permanent_cursor
        );
    }

    info!(
        "propagation done: {} layers, {} points in store, {} BadShape islands",
        layer_set.layers.len(),
        store.len(),
        bad_shape_count
    );

    Ok(())
}

/// Advances every live (non-permanent) point's radius-curve position for
/// the current layer's Δz. Call once per layer, after placing that
/// layer's new points but before filtering the next layer's `NearPoints`.
pub fn advance_radii(store: &mut PointStore, curve: &SupportRadiusCurve, current_z: f64) {
    for p in store.iter_mut() {
        if p.is_permanent {
            p.current_radius = curve.permanent_radius_at(current_z - p.world_xyz.z);
        } else {
            let dz = (current_z - p.world_xyz.z).max(0.0);
            let (radius, idx) = curve.advance(p.radius_curve_index, dz);
            p.current_radius = radius;
            p.radius_curve_index = idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Polygon;
    use crate::points::SupportKind;

    fn square(x0_mm: f64, y0_mm: f64, side_mm: f64) -> ExPolygon {
        let x0 = scale(x0_mm);
        let y0 = scale(y0_mm);
        let s = scale(side_mm);
        ExPolygon::new(
            Polygon::new(vec![
                Point::new(x0, y0),
                Point::new(x0 + s, y0),
                Point::new(x0 + s, y0 + s),
                Point::new(x0, y0 + s),
            ]),
            Vec::new(),
        )
    }

    #[test]
    fn offset_stacked_islands_emit_a_slope_support_on_the_overhang() {
        let sample_cfg = SampleConfig::for_head_diameter(0.4);
        let prep_cfg = PrepareSupportConfig::default();
        let raw = vec![
            (0.1, vec![square(0.0, 0.0, 3.0)]),
            (0.2, vec![square(1.0, 1.0, 3.0)]),
        ];
        let mut layer_set = prepare_layers(raw, &sample_cfg, &prep_cfg);
        assert_eq!(layer_set.layers[1].parts[0].prev_parts, vec![0]);
        assert!(!layer_set.layers[1].parts[0].overhang_samples.is_empty());

        let curve = SupportRadiusCurve::new(vec![(0.0, 0.2), (1.0, 0.4)]);
        let mut store = PointStore::new();
        propagate(&mut layer_set, &mut store, &sample_cfg, &curve, 0, &|| false, &[]).expect("propagation succeeds");

        assert!(store.iter().any(|(_, p)| p.layer_index == 0 && p.kind == SupportKind::Island));
        assert!(store.iter().any(|(_, p)| p.layer_index == 1 && p.kind == SupportKind::Slope));
    }

    #[test]
    fn small_pillar_layers_are_pruned_before_propagation() {
        let sample_cfg = SampleConfig::for_head_diameter(0.4);
        let mut prep_cfg = PrepareSupportConfig::default();
        prep_cfg.minimal_bounding_sphere_radius = scale(2.0) as f64;
        let raw = vec![
            (0.1, vec![square(0.0, 0.0, 1.0)]),
            (0.2, vec![square(0.0, 0.0, 1.0)]),
        ];
        let mut layer_set = prepare_layers(raw, &sample_cfg, &prep_cfg);
        let erased = prune::prune_small_parts(&mut layer_set, 0.1, &prep_cfg);
        assert_eq!(erased, 2);
        assert!(layer_set.layers[0].parts.is_empty());
        assert!(layer_set.layers[1].parts.is_empty());
    }
}
