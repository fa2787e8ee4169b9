use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::track::{Observation, PerCameraTrack};

/// Which observations are trusted to carry a clean appearance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AreaFilter {
    /// Upstream predicate `area and (xmax > xmin) > 2000`. It compares a
    /// boolean with 2000 and never holds, so every track ends up using all of
    /// its observations. Kept as default for output parity.
    #[default]
    Legacy,
    /// Keep observations whose box area exceeds the given value.
    MinArea(f32),
}

impl AreaFilter {
    #[inline]
    fn accepts(&self, obs: &Observation<'_>) -> bool {
        match *self {
            AreaFilter::Legacy => false,
            AreaFilter::MinArea(min) => obs.bbox.area() > min,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DistillerConfig {
    pub area_filter: AreaFilter,
    /// Candidates are thinned by stride 2 above this count.
    pub stride_threshold: usize,
    pub quality_threshold: f32,
    pub top_k: usize,
}

impl Default for DistillerConfig {
    fn default() -> Self {
        Self {
            area_filter: AreaFilter::Legacy,
            stride_threshold: 20,
            quality_threshold: 0.6,
            top_k: 5,
        }
    }
}

/// Reduces a track to one representative appearance feature.
pub struct FeatureDistiller {
    config: DistillerConfig,
}

impl FeatureDistiller {
    pub fn new(config: DistillerConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &DistillerConfig {
        &self.config
    }

    pub fn distill(&self, track: &PerCameraTrack) -> Array1<f32> {
        let observations: Vec<Observation<'_>> = track.observations().collect();
        let mut candidates: Vec<&Observation<'_>> = observations
            .iter()
            .filter(|obs| self.config.area_filter.accepts(obs))
            .collect();

        if candidates.len() < 2 {
            log::trace!(
                "{} of {} observations pass the area filter, using all",
                candidates.len(),
                observations.len()
            );
            candidates = observations.iter().collect();
        }

        if candidates.len() > self.config.stride_threshold {
            candidates = candidates.into_iter().step_by(2).collect();
        }

        candidates.sort_by(|a, b| b.quality.total_cmp(&a.quality));

        let threshold = self.config.quality_threshold;
        let high = candidates.iter().filter(|obs| obs.quality > threshold).count();

        if high > 1 {
            candidates.retain(|obs| obs.quality > threshold);
        }

        candidates.truncate(self.config.top_k);

        let mut mean = Array1::<f32>::zeros(track.feature_dim());
        if candidates.is_empty() {
            return mean;
        }

        for obs in &candidates {
            mean += &ArrayView1::from(obs.feature);
        }
        mean /= candidates.len() as f32;

        mean
    }
}

impl Default for FeatureDistiller {
    fn default() -> Self {
        Self::new(DistillerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_feat(mean: Array1<f32>, expected: &[f32]) {
        assert_eq!(mean.len(), expected.len());
        for (got, want) in mean.iter().zip(expected) {
            assert_relative_eq!(*got, *want, epsilon = 1e-5);
        }
    }

    fn track(rects: Vec<[f32; 5]>, qualities: Vec<f32>, features: Vec<Vec<f32>>) -> PerCameraTrack {
        PerCameraTrack {
            frames: (0..rects.len() as u32).collect(),
            rects,
            qualities,
            features,
        }
    }

    fn small_box() -> [f32; 5] {
        [0.9, 0.0, 0.0, 10.0, 10.0]
    }

    fn big_box() -> [f32; 5] {
        [0.9, 0.0, 0.0, 100.0, 100.0]
    }

    #[test]
    fn low_quality_track_averages_sorted_top_k() {
        let t = track(
            vec![big_box(); 3],
            vec![0.3, 0.5, 0.1],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![2.0, 2.0]],
        );
        let mean = FeatureDistiller::default().distill(&t);

        assert_feat(mean, &[1.0, 1.0]);
    }

    #[test]
    fn takes_at_most_top_k() {
        let qualities = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.05];
        let features = (0..6).map(|i| vec![i as f32]).collect();
        let t = track(vec![small_box(); 6], qualities, features);
        let mean = FeatureDistiller::default().distill(&t);

        // indices 4, 3, 2, 1, 0 by quality
        assert_feat(mean, &[2.0]);
    }

    #[test]
    fn restricts_to_high_quality_subset() {
        let t = track(
            vec![small_box(); 4],
            vec![0.9, 0.1, 0.7, 0.2],
            vec![vec![10.0], vec![-100.0], vec![20.0], vec![-100.0]],
        );
        let mean = FeatureDistiller::default().distill(&t);

        assert_feat(mean, &[15.0]);
    }

    #[test]
    fn single_high_quality_does_not_restrict() {
        let t = track(
            vec![small_box(); 3],
            vec![0.9, 0.1, 0.2],
            vec![vec![9.0], vec![0.0], vec![3.0]],
        );
        let mean = FeatureDistiller::default().distill(&t);

        assert_feat(mean, &[4.0]);
    }

    #[test]
    fn long_track_is_strided() {
        let n = 22;
        // odd indices carry the best quality but are dropped by the stride
        let qualities = (0..n).map(|i| if i % 2 == 1 { 0.5 } else { 0.1 }).collect();
        let features = (0..n).map(|i| vec![(i % 2) as f32]).collect();
        let t = track(vec![small_box(); n], qualities, features);
        let mean = FeatureDistiller::default().distill(&t);

        assert_feat(mean, &[0.0]);
    }

    #[test]
    fn min_area_filter_keeps_large_boxes() {
        let t = track(
            vec![small_box(), big_box(), big_box(), small_box()],
            vec![0.5, 0.1, 0.2, 0.4],
            vec![vec![-50.0], vec![2.0], vec![4.0], vec![-50.0]],
        );
        let distiller = FeatureDistiller::new(DistillerConfig {
            area_filter: AreaFilter::MinArea(2000.0),
            ..Default::default()
        });

        assert_feat(distiller.distill(&t), &[3.0]);
        assert_feat(FeatureDistiller::default().distill(&t), &[-23.5]);
    }

    #[test]
    fn min_area_filter_falls_back_when_too_few_pass() {
        let t = track(
            vec![small_box(), big_box(), small_box()],
            vec![0.5, 0.1, 0.4],
            vec![vec![3.0], vec![6.0], vec![0.0]],
        );
        let distiller = FeatureDistiller::new(DistillerConfig {
            area_filter: AreaFilter::MinArea(2000.0),
            ..Default::default()
        });

        assert_feat(distiller.distill(&t), &[3.0]);
    }
}
