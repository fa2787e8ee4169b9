//! Re-reading a written result file: per-camera rows for visualization and
//! frame windows of identities seen by every camera.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::writer::ResultRow;

/// Rows of a result file grouped by 1-based camera id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraResults {
    cameras: BTreeMap<u32, Vec<ResultRow>>,
}

impl CameraResults {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse(BufReader::new(File::open(path)?))
    }

    /// Expects `cid tid fid x y w h` per line; trailing columns are ignored.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut results = Self::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let row = parse_row(&line).map_err(|msg| Error::Parse { line: idx + 1, msg })?;
            results.push(row);
        }

        Ok(results)
    }

    pub fn from_rows<I: IntoIterator<Item = ResultRow>>(rows: I) -> Self {
        let mut results = Self::default();
        for row in rows {
            results.push(row);
        }

        results
    }

    #[inline]
    fn push(&mut self, row: ResultRow) {
        self.cameras.entry(row.camera).or_default().push(row);
    }

    /// Ascending.
    pub fn camera_ids(&self) -> Vec<u32> {
        self.cameras.keys().copied().collect()
    }

    #[inline]
    pub fn rows(&self, camera: u32) -> &[ResultRow] {
        self.cameras.get(&camera).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn frame_rows(&self, camera: u32, frame: u32) -> Vec<ResultRow> {
        self.rows(camera)
            .iter()
            .filter(|r| r.frame == frame)
            .copied()
            .collect()
    }

    pub fn track_ids(&self, camera: u32) -> BTreeSet<u32> {
        self.rows(camera).iter().map(|r| r.id).collect()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

fn parse_row(line: &str) -> std::result::Result<ResultRow, String> {
    let mut values = [0f64; 7];
    let mut fields = line.split_whitespace();

    for (i, value) in values.iter_mut().enumerate() {
        let field = fields
            .next()
            .ok_or_else(|| format!("expected 7 columns, got {}", i))?;
        *value = field
            .parse()
            .map_err(|_| format!("column {} is not a number: {:?}", i + 1, field))?;
    }

    Ok(ResultRow {
        camera: values[0] as u32,
        id: values[1] as u32,
        frame: values[2] as u32,
        x: values[3] as i64,
        y: values[4] as i64,
        w: values[5] as i64,
        h: values[6] as i64,
    })
}

type TrackWindows = BTreeMap<u32, Vec<ResultRow>>;

/// For every camera and every identity present in all cameras, the rows
/// falling in `[f, f + interval)` for each sampled frame `f`.
#[derive(Debug, Clone, Default)]
pub struct MatchingWindows {
    pub interval: u32,
    pub common_ids: Vec<u32>,
    windows: BTreeMap<u32, BTreeMap<u32, TrackWindows>>,
}

impl MatchingWindows {
    /// Frames are sampled every `trunc(secs_interval * video_fps)` frames.
    pub fn build(results: &CameraResults, secs_interval: f32, video_fps: f32) -> Result<Self> {
        let interval = (secs_interval * video_fps) as u32;
        if interval == 0 {
            return Err(Error::InvalidConfig(format!(
                "matching interval is zero ({}s at {} fps)",
                secs_interval, video_fps
            )));
        }

        let camera_ids = results.camera_ids();
        let common_ids: Vec<u32> = camera_ids
            .iter()
            .map(|&c| results.track_ids(c))
            .reduce(|acc, ids| acc.intersection(&ids).copied().collect())
            .unwrap_or_default()
            .into_iter()
            .collect();

        if common_ids.is_empty() {
            log::debug!("no identity is shared by all {} cameras", camera_ids.len());
        }

        let mut windows = BTreeMap::new();
        for &camera in &camera_ids {
            let per_track: &mut BTreeMap<u32, TrackWindows> = windows.entry(camera).or_default();

            for &id in &common_ids {
                let rows: Vec<ResultRow> = results
                    .rows(camera)
                    .iter()
                    .filter(|r| r.id == id)
                    .copied()
                    .collect();

                let starts: BTreeSet<u32> = rows
                    .iter()
                    .map(|r| r.frame)
                    .filter(|f| f % interval == 0)
                    .collect();

                let track = per_track.entry(id).or_default();
                for start in starts {
                    let end = start + interval;
                    let window = rows
                        .iter()
                        .filter(|r| r.frame >= start && r.frame < end)
                        .copied()
                        .collect();
                    track.insert(start, window);
                }
            }
        }

        Ok(Self {
            interval,
            common_ids,
            windows,
        })
    }

    /// Window start frames of `id` in `camera`, ascending.
    pub fn sampled_frames(&self, camera: u32, id: u32) -> Vec<u32> {
        self.windows
            .get(&camera)
            .and_then(|t| t.get(&id))
            .map(|w| w.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn window(&self, camera: u32, id: u32, start: u32) -> Option<&[ResultRow]> {
        self.windows
            .get(&camera)?
            .get(&id)?
            .get(&start)
            .map(Vec::as_slice)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.common_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(camera: u32, id: u32, frame: u32) -> ResultRow {
        ResultRow {
            camera,
            id,
            frame,
            x: 1,
            y: 2,
            w: 3,
            h: 4,
        }
    }

    #[test]
    fn parse_ignores_trailing_columns() {
        let text = "1 2 3 4 5 6 7 -1 -1\n\n2 1 10 0 0 5 5\n";
        let results = CameraResults::parse(text.as_bytes()).unwrap();

        assert_eq!(results.camera_ids(), vec![1, 2]);
        assert_eq!(
            results.rows(1),
            &[ResultRow {
                camera: 1,
                id: 2,
                frame: 3,
                x: 4,
                y: 5,
                w: 6,
                h: 7
            }]
        );
        assert_eq!(results.frame_rows(2, 10).len(), 1);
        assert!(results.frame_rows(2, 11).is_empty());
    }

    #[test]
    fn parse_accepts_float_columns() {
        let results = CameraResults::parse("1.0 2.0 3.0 4.5 5.0 6.0 7.0".as_bytes()).unwrap();
        assert_eq!(results.rows(1)[0].x, 4);
    }

    #[test]
    fn parse_reports_line() {
        let err = CameraResults::parse("1 2 3 4 5 6 7\n1 2 3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));

        let err = CameraResults::parse("1 2 x 4 5 6 7\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn windows_cover_common_ids_only() {
        let rows = vec![
            row(1, 1, 10),
            row(1, 1, 12),
            row(1, 1, 20),
            row(1, 2, 10),
            row(2, 1, 30),
            row(2, 1, 39),
            row(2, 1, 40),
            row(2, 3, 10),
        ];
        let results = CameraResults::from_rows(rows);
        let windows = MatchingWindows::build(&results, 0.5, 20.0).unwrap();

        assert_eq!(windows.interval, 10);
        assert_eq!(windows.common_ids, vec![1]);
        assert_eq!(windows.sampled_frames(1, 1), vec![10, 20]);
        assert_eq!(windows.window(1, 1, 10).unwrap().len(), 2);
        assert_eq!(windows.sampled_frames(2, 1), vec![30, 40]);
        assert_eq!(windows.window(2, 1, 30).unwrap().len(), 2);
        assert!(windows.window(1, 2, 10).is_none());
    }

    #[test]
    fn no_common_ids_gives_empty_windows() {
        let results = CameraResults::from_rows(vec![row(1, 1, 10), row(2, 2, 10)]);
        let windows = MatchingWindows::build(&results, 0.5, 20.0).unwrap();

        assert!(windows.is_empty());
        assert!(windows.sampled_frames(1, 1).is_empty());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let results = CameraResults::from_rows(vec![row(1, 1, 10)]);
        assert!(matches!(
            MatchingWindows::build(&results, 0.01, 20.0),
            Err(Error::InvalidConfig(_))
        ));
    }
}
