use std::collections::HashMap;

use ndarray::Array1;

use crate::distill::FeatureDistiller;
use crate::error::Result;
use crate::track::{CameraTracks, PerCameraTrack, TrackKey};

#[derive(Debug, Clone)]
pub struct DistilledTrack {
    pub key: TrackKey,
    pub track: PerCameraTrack,
    pub mean_feat: Array1<f32>,
}

/// Tracks that survived the length filter, in insertion order.
#[derive(Debug, Default)]
pub struct TrackRegistry {
    tracks: Vec<DistilledTrack>,
    index: HashMap<TrackKey, usize>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera ids are positions in `cameras`.
    pub fn build(
        cameras: &[CameraTracks],
        distiller: &FeatureDistiller,
        min_track_len: usize,
    ) -> Result<Self> {
        let mut registry = Self::new();
        let mut skipped = 0;

        for (camera, tracks) in cameras.iter().enumerate() {
            for (&track_id, track) in tracks {
                let key = TrackKey::new(camera, track_id);

                if track.is_empty() || track.len() < min_track_len {
                    log::trace!("{}: {} observations, skipped", key, track.len());
                    skipped += 1;
                    continue;
                }

                registry.insert(key, track.clone(), distiller)?;
            }
        }

        log::info!(
            "registered {} tracks from {} cameras, {} too short",
            registry.len(),
            cameras.len(),
            skipped
        );

        Ok(registry)
    }

    /// Registers `track` under `key`. A key that is already present keeps its
    /// first track.
    pub fn insert(
        &mut self,
        key: TrackKey,
        track: PerCameraTrack,
        distiller: &FeatureDistiller,
    ) -> Result<bool> {
        if self.index.contains_key(&key) {
            return Ok(false);
        }

        track.validate(key)?;
        let mean_feat = distiller.distill(&track);

        self.index.insert(key, self.tracks.len());
        self.tracks.push(DistilledTrack {
            key,
            track,
            mean_feat,
        });

        Ok(true)
    }

    #[inline]
    pub fn get(&self, key: &TrackKey) -> Option<&DistilledTrack> {
        self.index.get(key).map(|&idx| &self.tracks[idx])
    }

    #[inline]
    pub fn contains(&self, key: &TrackKey) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DistilledTrack> {
        self.tracks.iter()
    }

    /// Keys ordered lexicographically by their `c{camera}_t{track}` form.
    pub fn sorted_keys(&self) -> Vec<TrackKey> {
        let mut keys: Vec<TrackKey> = self.tracks.iter().map(|t| t.key).collect();
        keys.sort_by_cached_key(|k| k.to_string());
        keys
    }
}
