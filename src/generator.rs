//! The top-level orchestration entry point (Sec. 6): turns an ordered
//! layer stack plus optional permanent supports into a flat list of
//! `SupportPoint`s.

use crate::config::{PrepareSupportConfig, SampleConfig};
use crate::geom::ExPolygon;
use crate::layers::{self, SupportRadiusCurve};
use crate::points::{PermanentSupport, PointStore, SupportPoint};
use crate::SlaError;
use log::info;

/// Owns the configuration for one generation run and exposes [`generate`](Self::generate)
/// as the single external entry point, mirroring how the rest of the crate
/// threads `SampleConfig`/`PrepareSupportConfig` through explicitly rather
/// than through ambient global state.
pub struct SupportGenerator {
    sample_cfg: SampleConfig,
    prep_cfg: PrepareSupportConfig,
    curve: SupportRadiusCurve,
    cancel_poll_every: usize,
}

impl SupportGenerator {
    pub fn new(sample_cfg: SampleConfig, prep_cfg: PrepareSupportConfig, curve: SupportRadiusCurve) -> Self {
        Self {
            sample_cfg,
            prep_cfg,
            curve,
            cancel_poll_every: 32,
        }
    }

    /// Overrides how often (in layers) the cancel predicate is polled
    /// (Sec. 5: "N=16-128 per pass"). Defaults to 32.
    pub fn with_cancel_poll_every(mut self, layers: usize) -> Self {
        self.cancel_poll_every = layers.max(1);
        self
    }

    /// Runs a full generation pass: prepares the layer stack, prunes
    /// small self-supported islands (Sec. 4.11), then propagates support
    /// coverage bottom to top (Sec. 4.8). `layers` must be sorted
    /// ascending by Z; `permanent` must be sorted ascending by
    /// `position.z`. `cancel` is polled periodically and aborts the run
    /// with `SlaError::Cancelled` if it returns `true`.
    pub fn generate(
        &self,
        layers: Vec<(f64, Vec<ExPolygon>)>,
        permanent: &[PermanentSupport],
        cancel: &dyn Fn() -> bool,
    ) -> Result<Vec<SupportPoint>, SlaError> {
        if layers.is_empty() {
            return Err(SlaError::NoData("no layers supplied".to_string()));
        }
        for pair in layers.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(SlaError::InvalidInputData(
                    "layers must be sorted strictly ascending by z".to_string(),
                ));
            }
        }
        for pair in permanent.windows(2) {
            if pair[1].position.z < pair[0].position.z {
                return Err(SlaError::InvalidInputData(
                    "permanent supports must be sorted ascending by z".to_string(),
                ));
            }
        }

        let layer_height_mm = if layers.len() > 1 {
            (layers[layers.len() - 1].0 - layers[0].0) / (layers.len() - 1) as f64
        } else {
            layers[0].0
        };

        let mut layer_set = layers::prepare_layers(layers, &self.sample_cfg, &self.prep_cfg);
        if cancel() {
            return Err(SlaError::Cancelled);
        }

        let pruned = layers::prune::prune_small_parts(&mut layer_set, layer_height_mm, &self.prep_cfg);
        if pruned > 0 {
            info!("pruned {pruned} small self-supported part(s) before propagation");
        }

        let mut store = PointStore::new();
        layers::propagate(
            &mut layer_set,
            &mut store,
            &self.sample_cfg,
            &self.curve,
            self.cancel_poll_every,
            cancel,
            permanent,
        )?;

        Ok(store
            .iter()
            .map(|(_, p)| SupportPoint {
                position: p.world_xyz,
                head_radius: p.current_radius,
                kind: p.kind,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{scale, Point, Polygon};

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

    #[test]
    fn rejects_unsorted_layers() {
        let generator = SupportGenerator::new(
            SampleConfig::for_head_diameter(0.4),
            PrepareSupportConfig::default(),
            SupportRadiusCurve::new(vec![(0.0, 0.2), (1.0, 0.4)]),
        );
        let layers = vec![(0.2, vec![square(4.0)]), (0.1, vec![square(4.0)])];
        let result = generator.generate(layers, &[], &|| false);
        assert!(matches!(result, Err(SlaError::InvalidInputData(_))));
    }

    #[test]
    fn small_square_produces_one_center_point() {
        let generator = SupportGenerator::new(
            SampleConfig::for_head_diameter(0.4),
            PrepareSupportConfig::default(),
            SupportRadiusCurve::new(vec![(0.0, 0.2), (1.0, 0.4)]),
        );
        let layers = vec![(0.1, vec![square(4.0)])];
        let points = generator.generate(layers, &[], &|| false).expect("generation succeeds");
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn cancel_predicate_aborts_the_run() {
        let generator = SupportGenerator::new(
            SampleConfig::for_head_diameter(0.4),
            PrepareSupportConfig::default(),
            SupportRadiusCurve::new(vec![(0.0, 0.2), (1.0, 0.4)]),
        );
        let layers = vec![(0.1, vec![square(4.0)]), (0.2, vec![square(4.0)])];
        let result = generator.generate(layers, &[], &|| true);
        assert!(matches!(result, Err(SlaError::Cancelled)));
    }
}
