use std::path::PathBuf;

use crate::config::MtmctConfig;
use crate::distill::FeatureDistiller;
use crate::error::Result;
use crate::labels::GlobalLabelMap;
use crate::matcher::CrossCameraMatcher;
use crate::registry::TrackRegistry;
use crate::results::{CameraResults, MatchingWindows};
use crate::track::CameraTracks;
use crate::visualize::{VideoBackend, VisSummary, Visualizer};
use crate::writer::{ResultWriter, RESULT_FILE_NAME};

#[derive(Debug)]
pub struct MtmctOutput {
    pub registry: TrackRegistry,
    pub labels: GlobalLabelMap,
    pub result_file: PathBuf,
    pub rows: usize,
    pub visualized: Vec<VisSummary>,
}

/// Batch cross-camera identity assignment over complete per-camera tracks.
pub struct MtmctPipeline {
    config: MtmctConfig,
    distiller: FeatureDistiller,
    matcher: CrossCameraMatcher,
}

impl MtmctPipeline {
    pub fn new(config: MtmctConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            distiller: FeatureDistiller::new(config.distiller.clone()),
            matcher: CrossCameraMatcher::new(config.distance_threshold, config.linkage),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &MtmctConfig {
        &self.config
    }

    /// Registers, matches and labels the tracks without touching the disk.
    pub fn assign(&self, cameras: &[CameraTracks]) -> Result<(TrackRegistry, GlobalLabelMap)> {
        let registry = TrackRegistry::build(cameras, &self.distiller, self.config.min_track_len)?;
        let keys = registry.sorted_keys();
        let groups = self.matcher.get_labels(&registry, &keys)?;
        let labels = GlobalLabelMap::from_clusters(&groups, &keys);

        Ok((registry, labels))
    }

    /// Assigns global ids and writes `mtmct_result.txt` into the output dir.
    pub fn run(&self, cameras: &[CameraTracks]) -> Result<MtmctOutput> {
        let (registry, labels) = self.assign(cameras)?;

        std::fs::create_dir_all(&self.config.output_dir)?;
        let result_file = self.config.output_dir.join(RESULT_FILE_NAME);
        let rows = ResultWriter::new(&registry, &labels).write(&result_file)?;

        Ok(MtmctOutput {
            registry,
            labels,
            result_file,
            rows,
            visualized: Vec::new(),
        })
    }

    /// [`run`](Self::run), then renders `videos` (camera order) from the
    /// written result file when visualization is enabled.
    pub fn run_with_visualizer<B: VideoBackend>(
        &self,
        cameras: &[CameraTracks],
        videos: &[PathBuf],
        visualizer: &Visualizer<B>,
    ) -> Result<MtmctOutput> {
        let mut output = self.run(cameras)?;

        if self.config.visualize {
            let results = CameraResults::load(&output.result_file)?;
            let windows = MatchingWindows::build(&results, self.config.secs_interval, self.config.video_fps)?;
            log::debug!(
                "{} identities seen by every camera, window of {} frames",
                windows.common_ids.len(),
                windows.interval
            );

            output.visualized = visualizer.run(&results, videos, &self.config.output_dir)?;
        }

        Ok(output)
    }
}
