use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::labels::GlobalLabelMap;
use crate::registry::TrackRegistry;

pub const RESULT_FILE_NAME: &str = "mtmct_result.txt";

/// One line of the result file: camera and frame are 1-based, the box is
/// left-top-width-height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultRow {
    pub camera: u32,
    pub id: u32,
    pub frame: u32,
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.camera, self.id, self.frame, self.x, self.y, self.w, self.h
        )
    }
}

/// Serializes labelled tracks to the result text format.
pub struct ResultWriter<'a> {
    registry: &'a TrackRegistry,
    labels: &'a GlobalLabelMap,
}

impl<'a> ResultWriter<'a> {
    pub fn new(registry: &'a TrackRegistry, labels: &'a GlobalLabelMap) -> Self {
        Self { registry, labels }
    }

    /// Registry order, then track order. Tracks without a global id are
    /// left out.
    pub fn rows(&self) -> Vec<ResultRow> {
        let mut rows = Vec::new();

        for distilled in self.registry.iter() {
            let id = match self.labels.get(&distilled.key) {
                Some(id) => id,
                None => continue,
            };
            let camera = distilled.key.camera as u32 + 1;

            for obs in distilled.track.observations() {
                let [x, y, w, h] = obs.bbox.as_ltwh().to_clamped_ints();
                rows.push(ResultRow {
                    camera,
                    id,
                    frame: obs.frame + 1,
                    x,
                    y,
                    w,
                    h,
                });
            }
        }

        rows
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> Result<usize> {
        let rows = self.rows();
        for row in &rows {
            writeln!(out, "{}", row)?;
        }
        out.flush()?;

        Ok(rows.len())
    }

    /// Writes the result file at `path`, returning the number of rows.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let count = self.write_to(BufWriter::new(File::create(path)?))?;

        log::info!("wrote {} rows to {}", count, path.display());

        Ok(count)
    }
}
