use std::path::Path;

use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio,
};

use crate::error::{Error, Result};
use crate::visualize::{FrameReader, FrameWriter, VideoBackend, VideoInfo};
use crate::writer::ResultRow;

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| Error::Video(format!("non utf-8 path {}", path.display())))
}

fn id_color(id: u32) -> core::Scalar {
    let idx = id as f64 * 3.0;
    core::Scalar::new(
        (37.0 * idx) % 255.0,
        (17.0 * idx) % 255.0,
        (29.0 * idx) % 255.0,
        0.0,
    )
}

pub struct OpenCvReader {
    cap: videoio::VideoCapture,
    info: VideoInfo,
}

impl FrameReader for OpenCvReader {
    type Frame = Mat;

    #[inline]
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        if !self.cap.read(&mut frame)? {
            return Ok(None);
        }

        if frame.cols() == 0 || frame.rows() == 0 {
            return Ok(None);
        }

        Ok(Some(frame))
    }
}

pub struct OpenCvWriter {
    writer: Option<videoio::VideoWriter>,
}

impl FrameWriter for OpenCvWriter {
    type Frame = Mat;

    fn write(&mut self, frame: &Mat) -> Result<()> {
        if let Some(w) = self.writer.as_mut() {
            w.write(frame)?;
        }

        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        if let Some(mut w) = self.writer.take() {
            w.release()?;
        }

        Ok(())
    }
}

impl Drop for OpenCvWriter {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            log::warn!("video writer release failed: {}", err);
        }
    }
}

/// Decodes with `VideoCapture`, encodes mp4v with `VideoWriter`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenCvBackend;

impl VideoBackend for OpenCvBackend {
    type Frame = Mat;
    type Reader = OpenCvReader;
    type Writer = OpenCvWriter;

    fn open(&self, path: &Path) -> Result<OpenCvReader> {
        let cap = videoio::VideoCapture::from_file(path_str(path)?, videoio::CAP_ANY)?;
        if !videoio::VideoCapture::is_opened(&cap)? {
            return Err(Error::Video(format!("unable to open {}", path.display())));
        }

        let info = VideoInfo {
            width: cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32,
            height: cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32,
            fps: cap.get(videoio::CAP_PROP_FPS)?.trunc(),
            frame_count: cap.get(videoio::CAP_PROP_FRAME_COUNT)? as i64,
        };

        Ok(OpenCvReader { cap, info })
    }

    fn create(&self, path: &Path, info: &VideoInfo) -> Result<OpenCvWriter> {
        let writer = videoio::VideoWriter::new(
            path_str(path)?,
            videoio::VideoWriter::fourcc(b'm' as _, b'p' as _, b'4' as _, b'v' as _)?,
            info.fps,
            core::Size::new(info.width, info.height),
            true,
        )?;

        Ok(OpenCvWriter {
            writer: Some(writer),
        })
    }

    fn draw(&self, frame: &mut Mat, rows: &[ResultRow], frame_id: u32, fps: f64) -> Result<()> {
        let scale = (frame.cols() as f64 / 1600.0).max(1.0);
        let thickness = scale.round() as i32;

        opencv::imgproc::put_text(
            frame,
            &format!("frame: {} fps: {:.2} num: {}", frame_id, fps, rows.len()),
            core::Point::new(0, (15.0 * scale) as i32),
            opencv::imgproc::FONT_HERSHEY_PLAIN,
            scale,
            core::Scalar::new(0.0, 0.0, 255.0, 0.0),
            thickness,
            opencv::imgproc::LINE_8,
            false,
        )?;

        for row in rows {
            let color = id_color(row.id);
            let rect = core::Rect::new(row.x as i32, row.y as i32, row.w as i32, row.h as i32);

            opencv::imgproc::rectangle(
                frame,
                rect,
                color,
                thickness * 2,
                opencv::imgproc::LINE_8,
                0,
            )?;

            opencv::imgproc::put_text(
                frame,
                &format!("ID: {}", row.id),
                core::Point::new(row.x as i32, (row.y as f64 - 10.0 * scale).max(0.0) as i32),
                opencv::imgproc::FONT_HERSHEY_PLAIN,
                scale,
                color,
                thickness,
                opencv::imgproc::LINE_AA,
                false,
            )?;
        }

        Ok(())
    }
}
