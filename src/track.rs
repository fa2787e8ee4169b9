use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::error::{Error, Result};

/// Tracks of one camera keyed by single-camera track id.
pub type CameraTracks = BTreeMap<u32, PerCameraTrack>;

/// Identifies a per-camera track, rendered as `c{camera}_t{track}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackKey {
    pub camera: usize,
    pub track: u32,
}

impl TrackKey {
    #[inline]
    pub fn new(camera: usize, track: u32) -> Self {
        Self { camera, track }
    }

    #[inline]
    pub fn same_camera(&self, other: &TrackKey) -> bool {
        self.camera == other.camera
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}_t{}", self.camera, self.track)
    }
}

/// Single-camera tracker output for one track, stored as parallel sequences.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PerCameraTrack {
    /// `[confidence, xmin, ymin, xmax, ymax]`
    pub rects: Vec<[f32; 5]>,
    pub frames: Vec<u32>,
    pub qualities: Vec<f32>,
    pub features: Vec<Vec<f32>>,
}

/// One detection within a track.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub bbox: BBox<Ltrb>,
    pub frame: u32,
    pub quality: f32,
    pub feature: &'a [f32],
}

impl PerCameraTrack {
    #[inline]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    #[inline]
    pub fn bbox(&self, idx: usize) -> BBox<Ltrb> {
        let [_, x1, y1, x2, y2] = self.rects[idx];
        BBox::ltrb(x1, y1, x2, y2)
    }

    #[inline]
    pub fn feature_dim(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    pub fn observations(&self) -> impl Iterator<Item = Observation<'_>> {
        (0..self.len()).map(move |idx| Observation {
            bbox: self.bbox(idx),
            frame: self.frames[idx],
            quality: self.qualities[idx],
            feature: &self.features[idx],
        })
    }

    /// Checks that the parallel sequences line up and that every feature
    /// has the same width.
    pub fn validate(&self, key: TrackKey) -> Result<()> {
        let expected = self.len();
        let lens = [
            ("frames", self.frames.len()),
            ("qualities", self.qualities.len()),
            ("features", self.features.len()),
        ];

        for (field, got) in lens {
            if got != expected {
                return Err(Error::TrackShape {
                    key,
                    field,
                    expected,
                    got,
                });
            }
        }

        let dim = self.feature_dim();
        if let Some(bad) = self.features.iter().find(|f| f.len() != dim) {
            return Err(Error::TrackShape {
                key,
                field: "feature width",
                expected: dim,
                got: bad.len(),
            });
        }

        Ok(())
    }
}

/// Reads per-camera tracking results: a JSON array with one
/// `{track_id: track}` object per camera.
pub fn load_tracks<P: AsRef<Path>>(path: P) -> Result<Vec<CameraTracks>> {
    let file = std::fs::File::open(path)?;
    let cameras = serde_json::from_reader(std::io::BufReader::new(file))?;

    Ok(cameras)
}
