use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::results::CameraResults;
use crate::writer::ResultRow;

pub const VIS_DIR_NAME: &str = "mtmct_vis";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: i32,
    pub height: i32,
    pub fps: f64,
    pub frame_count: i64,
}

pub trait FrameReader {
    type Frame;

    fn info(&self) -> VideoInfo;

    /// `None` once the stream is exhausted.
    fn read(&mut self) -> Result<Option<Self::Frame>>;
}

pub trait FrameWriter {
    type Frame;

    fn write(&mut self, frame: &Self::Frame) -> Result<()>;
    fn release(&mut self) -> Result<()>;
}

/// Video decode, encode and overlay drawing.
pub trait VideoBackend {
    type Frame;
    type Reader: FrameReader<Frame = Self::Frame>;
    type Writer: FrameWriter<Frame = Self::Frame>;

    fn open(&self, path: &Path) -> Result<Self::Reader>;
    fn create(&self, path: &Path, info: &VideoInfo) -> Result<Self::Writer>;
    fn draw(&self, frame: &mut Self::Frame, rows: &[ResultRow], frame_id: u32, fps: f64) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisSummary {
    pub camera: u32,
    pub frames: u32,
    pub output: PathBuf,
}

pub struct Visualizer<B: VideoBackend> {
    backend: B,
}

impl<B: VideoBackend> Visualizer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Renders `videos[i]` with the rows of camera `i + 1` into
    /// `<output_dir>/mtmct_vis/vis_<name>`. The directory is recreated.
    /// Videos that are missing or fail to open are skipped.
    pub fn run(&self, results: &CameraResults, videos: &[PathBuf], output_dir: &Path) -> Result<Vec<VisSummary>> {
        let save_dir = output_dir.join(VIS_DIR_NAME);
        if save_dir.exists() {
            std::fs::remove_dir_all(&save_dir)?;
        }
        std::fs::create_dir_all(&save_dir)?;

        let mut summaries = Vec::with_capacity(videos.len());

        for (idx, video) in videos.iter().enumerate() {
            let camera = idx as u32 + 1;

            if !video.is_file() {
                log::warn!("camera {}: video {} not found, skipped", camera, video.display());
                continue;
            }

            let name = match video.file_name() {
                Some(name) => name.to_string_lossy(),
                None => {
                    log::warn!("camera {}: bad video path {}", camera, video.display());
                    continue;
                }
            };
            let out_path = save_dir.join(format!("vis_{}", name));

            match self.render(results, camera, video, &out_path) {
                Ok(frames) => summaries.push(VisSummary {
                    camera,
                    frames,
                    output: out_path,
                }),
                Err(err) => log::warn!("camera {}: {}, skipped", camera, err),
            }
        }

        Ok(summaries)
    }

    fn render(&self, results: &CameraResults, camera: u32, video: &Path, out_path: &Path) -> Result<u32> {
        let mut reader = self.backend.open(video)?;
        let info = reader.info();
        let mut writer = self.backend.create(out_path, &info)?;

        log::info!("visualizing {} into {}", video.display(), out_path.display());

        let mut frame_id = 0u32;
        loop {
            if frame_id % 50 == 0 {
                log::debug!("camera {}: frame {}/{}", camera, frame_id, info.frame_count);
            }

            let mut frame = match reader.read()? {
                Some(frame) => frame,
                None => break,
            };
            frame_id += 1;

            let rows = results.frame_rows(camera, frame_id);
            self.backend.draw(&mut frame, &rows, frame_id, info.fps)?;
            writer.write(&frame)?;
        }

        if frame_id == 0 {
            log::warn!("camera {}: video read failed", camera);
        }

        writer.release()?;

        Ok(frame_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Drawn = Rc<RefCell<Vec<(u32, Vec<u32>)>>>;

    struct MockReader {
        left: u32,
    }

    impl FrameReader for MockReader {
        type Frame = Vec<u32>;

        fn info(&self) -> VideoInfo {
            VideoInfo {
                width: 64,
                height: 48,
                fps: 25.0,
                frame_count: self.left as i64,
            }
        }

        fn read(&mut self) -> Result<Option<Vec<u32>>> {
            if self.left == 0 {
                return Ok(None);
            }
            self.left -= 1;
            Ok(Some(Vec::new()))
        }
    }

    struct MockWriter {
        frame: u32,
        drawn: Drawn,
    }

    impl FrameWriter for MockWriter {
        type Frame = Vec<u32>;

        fn write(&mut self, frame: &Vec<u32>) -> Result<()> {
            self.frame += 1;
            self.drawn.borrow_mut().push((self.frame, frame.clone()));
            Ok(())
        }

        fn release(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct MockBackend {
        frames: u32,
        drawn: Drawn,
    }

    impl VideoBackend for MockBackend {
        type Frame = Vec<u32>;
        type Reader = MockReader;
        type Writer = MockWriter;

        fn open(&self, path: &Path) -> Result<MockReader> {
            if path.extension().map_or(false, |e| e == "broken") {
                return Err(Error::Video("cannot open".into()));
            }
            Ok(MockReader { left: self.frames })
        }

        fn create(&self, path: &Path, _info: &VideoInfo) -> Result<MockWriter> {
            std::fs::write(path, b"")?;
            Ok(MockWriter {
                frame: 0,
                drawn: self.drawn.clone(),
            })
        }

        fn draw(&self, frame: &mut Vec<u32>, rows: &[ResultRow], _frame_id: u32, _fps: f64) -> Result<()> {
            frame.extend(rows.iter().map(|r| r.id));
            Ok(())
        }
    }

    fn row(camera: u32, id: u32, frame: u32) -> ResultRow {
        ResultRow {
            camera,
            id,
            frame,
            x: 0,
            y: 0,
            w: 1,
            h: 1,
        }
    }

    #[test]
    fn draws_rows_on_matching_frames() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("cam0.mp4");
        std::fs::write(&video, b"stub").unwrap();

        let drawn = Drawn::default();
        let vis = Visualizer::new(MockBackend {
            frames: 3,
            drawn: drawn.clone(),
        });
        let results = CameraResults::from_rows(vec![row(1, 7, 1), row(1, 8, 3), row(2, 9, 1)]);

        let summaries = vis.run(&results, &[video], dir.path()).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].frames, 3);
        assert_eq!(summaries[0].output, dir.path().join("mtmct_vis").join("vis_cam0.mp4"));
        assert!(summaries[0].output.exists());

        let expected: Vec<(u32, Vec<u32>)> = vec![(1, vec![7]), (2, vec![]), (3, vec![8])];
        assert_eq!(*drawn.borrow(), expected);
    }

    #[test]
    fn missing_and_broken_videos_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("cam1.broken");
        std::fs::write(&broken, b"stub").unwrap();
        let good = dir.path().join("cam2.mp4");
        std::fs::write(&good, b"stub").unwrap();

        let vis = Visualizer::new(MockBackend {
            frames: 1,
            drawn: Drawn::default(),
        });
        let videos = vec![dir.path().join("missing.mp4"), broken, good];
        let summaries = vis.run(&CameraResults::default(), &videos, dir.path()).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].camera, 3);
    }

    #[test]
    fn empty_video_still_produces_output() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("empty.mp4");
        std::fs::write(&video, b"").unwrap();

        let vis = Visualizer::new(MockBackend {
            frames: 0,
            drawn: Drawn::default(),
        });
        let summaries = vis.run(&CameraResults::default(), &[video], dir.path()).unwrap();

        assert_eq!(summaries[0].frames, 0);
    }

    #[test]
    fn output_dir_is_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(VIS_DIR_NAME).join("stale.mp4");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"old").unwrap();

        let vis = Visualizer::new(MockBackend {
            frames: 0,
            drawn: Drawn::default(),
        });
        vis.run(&CameraResults::default(), &[], dir.path()).unwrap();

        assert!(!stale.exists());
        assert!(dir.path().join(VIS_DIR_NAME).is_dir());
    }
}
