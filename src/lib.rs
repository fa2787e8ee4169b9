//! Multi-target multi-camera tracking post-processing.
//!
//! Per-camera tracks are reduced to one appearance feature each, clustered
//! across cameras by cosine distance with complete linkage, relabelled with
//! global ids and written out as `mtmct_result.txt`. Optionally the source
//! videos are rendered with the global ids drawn on.

pub mod bbox;
pub mod cluster;
pub mod config;
pub mod distill;
pub mod error;
pub mod labels;
pub mod matcher;
pub mod metric;
pub mod pipeline;
pub mod registry;
pub mod results;
pub mod track;
pub mod visualize;
pub mod writer;

#[cfg(feature = "opencv")]
pub mod video;

pub use config::{MtmctConfig, Verbosity};
pub use distill::{AreaFilter, FeatureDistiller};
pub use error::{Error, Result};
pub use labels::GlobalLabelMap;
pub use matcher::CrossCameraMatcher;
pub use metric::DistanceMetric;
pub use pipeline::{MtmctOutput, MtmctPipeline};
pub use registry::{DistilledTrack, TrackRegistry};
pub use track::{CameraTracks, PerCameraTrack, TrackKey};
pub use writer::{ResultRow, ResultWriter};
