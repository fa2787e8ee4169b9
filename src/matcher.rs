use ndarray::prelude::*;

use crate::cluster::{AgglomerativeClustering, Linkage};
use crate::error::{Error, Result};
use crate::metric::DistanceMetric;
use crate::registry::TrackRegistry;
use crate::track::TrackKey;

/// Groups tracks from different cameras that show the same identity.
pub struct CrossCameraMatcher {
    clustering: AgglomerativeClustering,
}

impl CrossCameraMatcher {
    pub fn new(distance_threshold: f32, linkage: Linkage) -> Self {
        Self {
            clustering: AgglomerativeClustering::new(distance_threshold, linkage),
        }
    }

    /// One `mean_feat` row per key.
    pub fn feature_matrix(registry: &TrackRegistry, keys: &[TrackKey]) -> Result<Array2<f32>> {
        let dim = keys
            .first()
            .and_then(|k| registry.get(k))
            .map_or(0, |t| t.mean_feat.len());
        let mut feats = Array2::<f32>::zeros((keys.len(), dim));

        for (mut row, key) in feats.outer_iter_mut().zip(keys) {
            let track = registry
                .get(key)
                .ok_or_else(|| Error::InvalidConfig(format!("{} is not registered", key)))?;

            if track.mean_feat.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    got: track.mean_feat.len(),
                });
            }
            row.assign(&track.mean_feat);
        }

        Ok(feats)
    }

    /// Cosine similarity of every key against every key, with same-camera
    /// pairs and the diagonal zeroed.
    pub fn similarity_matrix(registry: &TrackRegistry, keys: &[TrackKey]) -> Result<Array2<f32>> {
        let feats = Self::feature_matrix(registry, keys)?;
        let mut sim = DistanceMetric::Cosine.compute(feats.view(), feats.view())?;

        intracam_ignore(&mut sim, keys);
        sim.diag_mut().fill(0.0);

        Ok(sim)
    }

    /// `1 - similarity`, so same-camera pairs sit at distance 1.
    pub fn cost_matrix(registry: &TrackRegistry, keys: &[TrackKey]) -> Result<Array2<f32>> {
        let sim = Self::similarity_matrix(registry, keys)?;

        Ok(sim.mapv(|s| 1.0 - s))
    }

    /// Index groups over `keys`, ordered by their smallest index.
    pub fn get_labels(&self, registry: &TrackRegistry, keys: &[TrackKey]) -> Result<Vec<Vec<usize>>> {
        let cost = Self::cost_matrix(registry, keys)?;
        let clustering = self.clustering.fit_predict(cost.view())?;

        log::info!(
            "clustered {} tracks into {} identities",
            keys.len(),
            clustering.n_clusters
        );

        Ok(clustering.groups())
    }
}

impl Default for CrossCameraMatcher {
    fn default() -> Self {
        Self::new(0.5, Linkage::Complete)
    }
}

/// Zeroes every entry whose row and column keys share a camera.
pub fn intracam_ignore(mat: &mut Array2<f32>, keys: &[TrackKey]) {
    for (i, ki) in keys.iter().enumerate() {
        for (j, kj) in keys.iter().enumerate() {
            if ki.same_camera(kj) {
                mat[[i, j]] = 0.0;
            }
        }
    }
}
