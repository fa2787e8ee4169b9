use std::path::{Path, PathBuf};

use serde_derive::{Deserialize, Serialize};

use crate::cluster::Linkage;
use crate::distill::DistillerConfig;
use crate::error::{Error, Result};

/// How chatty the host should be. The library itself only emits `log`
/// records; whoever installs the logger maps this through
/// [`level_filter`](Verbosity::level_filter).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Debug,
}

impl Verbosity {
    pub fn level_filter(&self) -> log::LevelFilter {
        match self {
            Verbosity::Quiet => log::LevelFilter::Error,
            Verbosity::Normal => log::LevelFilter::Info,
            Verbosity::Debug => log::LevelFilter::Debug,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MtmctConfig {
    /// Tracks with fewer observations are not matched.
    pub min_track_len: usize,
    pub distance_threshold: f32,
    pub linkage: Linkage,
    pub distiller: DistillerConfig,
    pub output_dir: PathBuf,
    pub visualize: bool,
    pub secs_interval: f32,
    pub video_fps: f32,
    pub verbosity: Verbosity,
}

impl Default for MtmctConfig {
    fn default() -> Self {
        Self {
            min_track_len: 10,
            distance_threshold: 0.5,
            linkage: Linkage::Complete,
            distiller: DistillerConfig::default(),
            output_dir: PathBuf::from("output"),
            visualize: true,
            secs_interval: 0.5,
            video_fps: 20.0,
            verbosity: Verbosity::Normal,
        }
    }
}

impl MtmctConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_track_len == 0 {
            return Err(Error::InvalidConfig("min_track_len must be at least 1".into()));
        }

        if !(self.distance_threshold > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "distance_threshold must be positive, got {}",
                self.distance_threshold
            )));
        }

        if self.distiller.top_k == 0 {
            return Err(Error::InvalidConfig("distiller.top_k must be at least 1".into()));
        }

        if !(self.secs_interval > 0.0 && self.video_fps > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "secs_interval and video_fps must be positive, got {} and {}",
                self.secs_interval, self.video_fps
            )));
        }

        if self.secs_interval * self.video_fps < 1.0 {
            return Err(Error::InvalidConfig(format!(
                "matching interval of {}s at {} fps is shorter than one frame",
                self.secs_interval, self.video_fps
            )));
        }

        Ok(())
    }
}
