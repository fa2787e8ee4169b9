use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use mtmct::{MtmctConfig, MtmctPipeline, Verbosity};

#[derive(Parser, Debug)]
#[command(author, version, about = "Cross-camera identity matching of per-camera tracks", long_about = None)]
struct Args {
    /// Per-camera tracking results (JSON)
    #[arg(short, long)]
    input: PathBuf,

    /// Source video of each camera, in camera order
    #[arg(long = "video")]
    videos: Vec<PathBuf>,

    /// Output directory, overrides the config
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip rendering the visualization videos
    #[arg(long)]
    no_vis: bool,

    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => MtmctConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => MtmctConfig::default(),
    };

    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if args.no_vis {
        config.visualize = false;
    }
    if args.verbose {
        config.verbosity = Verbosity::Debug;
    } else if args.quiet {
        config.verbosity = Verbosity::Quiet;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.verbosity.level_filter().as_str()),
    )
    .init();

    let cameras = mtmct::track::load_tracks(&args.input)
        .with_context(|| format!("failed to read tracks {}", args.input.display()))?;
    log::info!("loaded {} cameras from {}", cameras.len(), args.input.display());

    let pipeline = MtmctPipeline::new(config)?;
    let output = run(&pipeline, &cameras, &args.videos)?;

    log::info!(
        "{} global identities, {} rows in {}",
        output.labels.n_identities(),
        output.rows,
        output.result_file.display()
    );
    for vis in &output.visualized {
        log::info!("camera {}: {} frames -> {}", vis.camera, vis.frames, vis.output.display());
    }

    Ok(())
}

#[cfg(feature = "opencv")]
fn run(
    pipeline: &MtmctPipeline,
    cameras: &[mtmct::CameraTracks],
    videos: &[PathBuf],
) -> Result<mtmct::MtmctOutput> {
    let visualizer = mtmct::visualize::Visualizer::new(mtmct::video::OpenCvBackend);

    Ok(pipeline.run_with_visualizer(cameras, videos, &visualizer)?)
}

#[cfg(not(feature = "opencv"))]
fn run(
    pipeline: &MtmctPipeline,
    cameras: &[mtmct::CameraTracks],
    videos: &[PathBuf],
) -> Result<mtmct::MtmctOutput> {
    if pipeline.config().visualize && !videos.is_empty() {
        log::warn!("built without the `opencv` feature, visualization skipped");
    }

    Ok(pipeline.run(cameras)?)
}
