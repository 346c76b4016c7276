//! Small-part pruning (Sec. 4.11): whole connected subgraphs of layer
//! parts that fit inside a single support-head sphere are deleted rather
//! than sampled, since whatever touches them would be self-supporting.

use super::{Layer, LayerPart, LayerSet};
use crate::config::PrepareSupportConfig;
use crate::geom::{unscale, Point, SCALE_FACTOR};
use ahash::AHashSet;

fn bbox_diag(bbox: (Point, Point)) -> f64 {
    let (min, max) = bbox;
    let dx = (max.x - min.x) as f64;
    let dy = (max.y - min.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

fn bbox_center_mm(bbox: (Point, Point)) -> (f64, f64) {
    let (min, max) = bbox;
    (unscale((min.x + max.x) / 2), unscale((min.y + max.y) / 2))
}

fn all_vertices_within_sphere(
    part: &LayerPart,
    center_x_mm: f64,
    center_y_mm: f64,
    center_z_mm: f64,
    part_z_mm: f64,
    r_mm: f64,
) -> bool {
    let dz = part_z_mm - center_z_mm;
    std::iter::once(&part.island.contour)
        .chain(part.island.holes.iter())
        .all(|ring| {
            ring.points().iter().all(|p| {
                let dx = unscale(p.x) - center_x_mm;
                let dy = unscale(p.y) - center_y_mm;
                dx * dx + dy * dy + dz * dz <= r_mm * r_mm
            })
        })
}

/// Walks every bottom island whose bbox fits in `2 * minimal_bounding_sphere_radius`,
/// flood-fills through `next_parts`/`prev_parts` (explicit stack, bounded by
/// depth and by the bbox test on every visited part), and erases the whole
/// subgraph when every visited part's vertices lie within the 3D sphere
/// centred on the candidate. Returns the number of parts erased.
pub fn prune_small_parts(layer_set: &mut LayerSet, layer_height_mm: f64, prep_cfg: &PrepareSupportConfig) -> usize {
    let r_scaled = prep_cfg.minimal_bounding_sphere_radius;
    let two_r = 2.0 * r_scaled;
    let r_mm = r_scaled / SCALE_FACTOR;
    let depth_bound = if layer_height_mm > 0.0 {
        (r_mm / layer_height_mm).ceil() as usize + 1
    } else {
        1
    };

    let mut already_erased: AHashSet<(usize, usize)> = AHashSet::new();
    let mut to_erase: Vec<(usize, usize)> = Vec::new();

    for layer_idx in 0..layer_set.layers.len() {
        for part_idx in 0..layer_set.layers[layer_idx].parts.len() {
            if already_erased.contains(&(layer_idx, part_idx)) {
                continue;
            }
            let candidate = &layer_set.layers[layer_idx].parts[part_idx];
            if !candidate.prev_parts.is_empty() || bbox_diag(candidate.bbox) > two_r {
                continue;
            }
            let (cx, cy) = bbox_center_mm(candidate.bbox);
            let cz = layer_set.layers[layer_idx].print_z;

            let mut visited: AHashSet<(usize, usize)> = AHashSet::new();
            visited.insert((layer_idx, part_idx));
            let mut stack = vec![(layer_idx, part_idx, 0usize)];
            let mut prunable = true;

            while let Some((li, pi, depth)) = stack.pop() {
                let part = &layer_set.layers[li].parts[pi];
                if bbox_diag(part.bbox) > two_r {
                    prunable = false;
                    continue;
                }
                let part_z = layer_set.layers[li].print_z;
                if !all_vertices_within_sphere(part, cx, cy, cz, part_z, r_mm) {
                    prunable = false;
                }
                if depth >= depth_bound {
                    continue;
                }
                for &next in &part.next_parts {
                    if visited.insert((li + 1, next)) {
                        stack.push((li + 1, next, depth + 1));
                    }
                }
                if li > 0 {
                    for &prev in &part.prev_parts {
                        if visited.insert((li - 1, prev)) {
                            stack.push((li - 1, prev, depth + 1));
                        }
                    }
                }
            }

            if prunable {
                already_erased.extend(visited.iter().copied());
                to_erase.extend(visited);
            }
        }
    }

    let count = to_erase.len();
    if count > 0 {
        erase_parts(layer_set, &to_erase);
    }
    count
}

fn erase_parts(layer_set: &mut LayerSet, erase: &[(usize, usize)]) {
    let erase_set: AHashSet<(usize, usize)> = erase.iter().copied().collect();

    let remaps: Vec<Vec<Option<usize>>> = layer_set
        .layers
        .iter()
        .enumerate()
        .map(|(li, layer)| {
            let mut next = 0usize;
            (0..layer.parts.len())
                .map(|pi| {
                    if erase_set.contains(&(li, pi)) {
                        None
                    } else {
                        let idx = next;
                        next += 1;
                        Some(idx)
                    }
                })
                .collect()
        })
        .collect();

    let layer_count = layer_set.layers.len();
    for (li, layer) in layer_set.layers.iter_mut().enumerate() {
        let old_parts: Vec<LayerPart> = std::mem::take(&mut layer.parts);
        let mut kept = Vec::with_capacity(old_parts.len());
        for (pi, mut part) in old_parts.into_iter().enumerate() {
            if erase_set.contains(&(li, pi)) {
                continue;
            }
            part.prev_parts = if li > 0 {
                part.prev_parts
                    .iter()
                    .filter_map(|&p| remaps[li - 1][p])
                    .collect()
            } else {
                Vec::new()
            };
            part.next_parts = if li + 1 < layer_count {
                part.next_parts
                    .iter()
                    .filter_map(|&p| remaps[li + 1][p])
                    .collect()
            } else {
                Vec::new()
            };
            kept.push(part);
        }
        layer.parts = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{scale, ExPolygon, Polygon};

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

    fn lone_part(island: ExPolygon) -> LayerPart {
        LayerPart {
            bbox: crate::layers::bounding_box(&island),
            island,
            extend_shape: square(0.0),
            prev_parts: Vec::new(),
            next_parts: Vec::new(),
            overhang_samples: Vec::new(),
            peninsulas: Vec::new(),
            near_points: None,
        }
    }

    #[test]
    fn small_pillar_is_pruned_to_empty() {
        let mut prep_cfg = PrepareSupportConfig::default();
        prep_cfg.minimal_bounding_sphere_radius = scale(2.0) as f64;
        let mut layer_set = LayerSet {
            layers: vec![
                Layer {
                    print_z: 0.1,
                    parts: vec![lone_part(square(1.0))],
                },
                Layer {
                    print_z: 0.2,
                    parts: vec![lone_part(square(1.0))],
                },
            ],
        };
        layer_set.layers[1].parts[0].prev_parts = vec![0];
        layer_set.layers[0].parts[0].next_parts = vec![0];

        let erased = prune_small_parts(&mut layer_set, 0.1, &prep_cfg);
        assert_eq!(erased, 2);
        assert!(layer_set.layers[0].parts.is_empty());
        assert!(layer_set.layers[1].parts.is_empty());
    }
}
