//! Directory-backed frame source
//!
//! Plays `.bin` files in byte-wise name order. Each file is a headerless run
//! of little-endian `f32` records `(x, y, z, intensity)`. Timestamps come from
//! an optional `timestamps.txt` manifest (one integer ns per line, aligned with
//! the sorted files) or are synthesized from a frame rate.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Buf;
use contracts::{
    hz_to_period_ns, ContractError, DurationNs, Frame, FrameSource, InputConfig, PointXyzi,
    TimestampNs, POINT_STRIDE_BYTES,
};
use metrics::counter;
use tracing::{debug, info};

/// Extension of frame files
pub const FRAME_EXTENSION: &str = "bin";

/// Manifest file name inside the frame directory
pub const MANIFEST_FILE: &str = "timestamps.txt";

/// Directory source configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDirSourceConfig {
    pub path: PathBuf,
    /// Rate for synthesized timestamps; non-positive falls back to 10 Hz
    pub fps: f64,
}

impl FrameDirSourceConfig {
    pub fn new(path: impl Into<PathBuf>, fps: f64) -> Self {
        Self {
            path: path.into(),
            fps,
        }
    }

    pub fn from_input(input: &InputConfig) -> Self {
        Self::new(&input.frame_dir.path, input.effective_frame_dir_fps())
    }
}

struct FrameFile {
    name: OsString,
    path: PathBuf,
}

/// Directory frame source
pub struct FrameDirSource {
    config: FrameDirSourceConfig,
    period_ns: DurationNs,
    files: Vec<FrameFile>,
    manifest: Option<Vec<i64>>,
    /// Next file to play
    idx: usize,
    /// Frames emitted since open, across passes
    emitted: i64,
    /// Shift applied to manifest timestamps after each rewind
    loop_offset_ns: i64,
    opened: bool,
}

impl FrameDirSource {
    pub fn new(config: FrameDirSourceConfig) -> Self {
        Self {
            period_ns: hz_to_period_ns(config.fps),
            config,
            files: Vec::new(),
            manifest: None,
            idx: 0,
            emitted: 0,
            loop_offset_ns: 0,
            opened: false,
        }
    }

    /// Number of frame files found at open
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn has_manifest(&self) -> bool {
        self.manifest.is_some()
    }

    fn list_frame_files(dir: &Path) -> Result<Vec<FrameFile>, ContractError> {
        let meta = match fs::metadata(dir) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContractError::not_found(format!(
                    "frame directory not found: {}",
                    dir.display()
                )));
            }
            Err(e) => return Err(ContractError::io_at(dir, e)),
        };
        if !meta.is_dir() {
            return Err(ContractError::invalid_argument(format!(
                "frame path is not a directory: {}",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| ContractError::io_at(dir, e))? {
            let entry = entry.map_err(|e| ContractError::io_at(dir, e))?;
            let path = entry.path();
            let is_file = entry
                .file_type()
                .map_err(|e| ContractError::io_at(&path, e))?
                .is_file();
            if !is_file || path.extension().and_then(|e| e.to_str()) != Some(FRAME_EXTENSION) {
                continue;
            }
            files.push(FrameFile {
                name: entry.file_name(),
                path,
            });
        }

        files.sort_by(|a, b| a.name.as_encoded_bytes().cmp(b.name.as_encoded_bytes()));

        if files.is_empty() {
            return Err(ContractError::not_found(format!(
                "no .{FRAME_EXTENSION} files in {}",
                dir.display()
            )));
        }
        Ok(files)
    }

    fn load_manifest(dir: &Path, expected: usize) -> Result<Option<Vec<i64>>, ContractError> {
        let path = dir.join(MANIFEST_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ContractError::io_at(&path, e)),
        };

        let timestamps = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(lineno, line)| {
                line.trim().parse::<i64>().map_err(|e| {
                    ContractError::parse(format!(
                        "{}:{}: invalid timestamp {:?}: {e}",
                        path.display(),
                        lineno + 1,
                        line.trim()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if timestamps.len() != expected {
            return Err(ContractError::corrupt_data(format!(
                "{} lists {} timestamps for {} frame files",
                path.display(),
                timestamps.len(),
                expected
            )));
        }
        Ok(Some(timestamps))
    }

    fn read_points(path: &Path) -> Result<Vec<PointXyzi>, ContractError> {
        let data = fs::read(path).map_err(|e| ContractError::io_at(path, e))?;
        if data.is_empty() || data.len() % POINT_STRIDE_BYTES != 0 {
            return Err(ContractError::corrupt_data(format!(
                "{}: size {} is not a positive multiple of {POINT_STRIDE_BYTES} bytes",
                path.display(),
                data.len()
            )));
        }
        counter!("wm_node_frame_bytes_read_total").increment(data.len() as u64);

        let mut buf = data.as_slice();
        let mut points = Vec::with_capacity(data.len() / POINT_STRIDE_BYTES);
        while buf.has_remaining() {
            points.push(PointXyzi::new(
                buf.get_f32_le(),
                buf.get_f32_le(),
                buf.get_f32_le(),
                buf.get_f32_le(),
            ));
        }
        Ok(points)
    }

    fn timestamp_for(&self, idx: usize) -> i64 {
        match &self.manifest {
            Some(manifest) => manifest[idx].saturating_add(self.loop_offset_ns),
            None => self.emitted.saturating_mul(self.period_ns),
        }
    }
}

impl FrameSource for FrameDirSource {
    fn name(&self) -> &str {
        "frame_dir"
    }

    fn open(&mut self) -> Result<(), ContractError> {
        self.close();
        if self.config.path.as_os_str().is_empty() {
            return Err(ContractError::invalid_argument("frame directory path is empty"));
        }

        let files = Self::list_frame_files(&self.config.path)?;
        let manifest = Self::load_manifest(&self.config.path, files.len())?;

        info!(
            path = %self.config.path.display(),
            frames = files.len(),
            manifest = manifest.is_some(),
            period_ns = self.period_ns,
            "frame directory opened"
        );

        self.files = files;
        self.manifest = manifest;
        self.opened = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, ContractError> {
        if !self.opened {
            return Err(ContractError::invalid_argument("frame directory source is not open"));
        }
        let Some(file) = self.files.get(self.idx) else {
            return Ok(None);
        };

        let points = Self::read_points(&file.path)?;
        let frame = Frame::new(
            TimestampNs::from_nanos(self.timestamp_for(self.idx)),
            file.name.to_string_lossy(),
            points,
        );

        self.idx += 1;
        self.emitted += 1;
        Ok(Some(frame))
    }

    /// Rewind to the first file. Timestamps keep increasing across passes.
    fn reset(&mut self) -> Result<(), ContractError> {
        if !self.opened {
            return Err(ContractError::invalid_argument("frame directory source is not open"));
        }
        if let (Some(manifest), Some(last)) = (&self.manifest, self.idx.checked_sub(1)) {
            let span = manifest[last].saturating_sub(manifest[0]);
            self.loop_offset_ns = self
                .loop_offset_ns
                .saturating_add(span)
                .saturating_add(self.period_ns);
        }
        debug!(emitted = self.emitted, "frame directory rewound");
        self.idx = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
        self.files.clear();
        self.manifest = None;
        self.idx = 0;
        self.emitted = 0;
        self.loop_offset_ns = 0;
    }
}

impl Drop for FrameDirSource {
    fn drop(&mut self) {
        self.close();
    }
}
