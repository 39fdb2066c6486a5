//! Frame directory writer
//!
//! Produces the layout `FrameDirSource` reads: `NNNNNN.bin` files plus a
//! `timestamps.txt` manifest.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::{BufMut, BytesMut};
use contracts::{ContractError, Frame, POINT_STRIDE_BYTES};
use tracing::debug;

use crate::frame_dir::{FRAME_EXTENSION, MANIFEST_FILE};

/// Six-digit names only sort correctly below this count
pub const MAX_FRAMES: usize = 1_000_000;

/// Frame directory writer
pub struct FrameDirWriter {
    dir: PathBuf,
    timestamps: Vec<i64>,
    buf: BytesMut,
}

impl FrameDirWriter {
    /// Create (or reuse) `dir`.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, ContractError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ContractError::io_at(&dir, e))?;
        Ok(Self {
            dir,
            timestamps: Vec::new(),
            buf: BytesMut::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frames written so far
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Append one frame as the next numbered file. Empty frames cannot be
    /// represented on disk.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<PathBuf, ContractError> {
        if frame.is_empty() {
            return Err(ContractError::invalid_argument(format!(
                "frame {} has no points",
                frame.frame_id
            )));
        }

        if self.timestamps.len() >= MAX_FRAMES {
            return Err(ContractError::invalid_argument(format!(
                "frame directory is limited to {MAX_FRAMES} frames"
            )));
        }

        self.buf.clear();
        self.buf.reserve(frame.len() * POINT_STRIDE_BYTES);
        for p in &frame.points {
            self.buf.put_f32_le(p.x);
            self.buf.put_f32_le(p.y);
            self.buf.put_f32_le(p.z);
            self.buf.put_f32_le(p.intensity);
        }

        let path = self
            .dir
            .join(format!("{:06}.{FRAME_EXTENSION}", self.timestamps.len()));
        fs::write(&path, &self.buf).map_err(|e| ContractError::io_at(&path, e))?;
        self.timestamps.push(frame.t_ns.as_nanos());

        debug!(path = %path.display(), points = frame.len(), "frame written");
        Ok(path)
    }

    /// Write the manifest and return the number of frames.
    pub fn finish(self) -> Result<usize, ContractError> {
        let path = self.dir.join(MANIFEST_FILE);
        let mut out = String::with_capacity(self.timestamps.len() * 12);
        for t in &self.timestamps {
            out.push_str(&t.to_string());
            out.push('\n');
        }
        let mut file = fs::File::create(&path).map_err(|e| ContractError::io_at(&path, e))?;
        file.write_all(out.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| ContractError::io_at(&path, e))?;
        Ok(self.timestamps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameDirSource, FrameDirSourceConfig};
    use contracts::{FrameSource, PointXyzi, TimestampNs};
    use tempfile::TempDir;

    fn frame(t_ns: i64, n: usize) -> Frame {
        let points = (0..n)
            .map(|i| PointXyzi::new(i as f32, -(i as f32), 0.5, 0.2))
            .collect();
        Frame::new(TimestampNs::from_nanos(t_ns), format!("f{t_ns}"), points)
    }

    #[test]
    fn written_directory_plays_back() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("frames");
        let mut writer = FrameDirWriter::create(&out).unwrap();
        let expected = vec![frame(0, 3), frame(40_000_000, 5), frame(90_000_000, 1)];
        for f in &expected {
            writer.write_frame(f).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), 3);

        let mut src = FrameDirSource::new(FrameDirSourceConfig::new(&out, 10.0));
        src.open().unwrap();
        assert!(src.has_manifest());
        for (i, want) in expected.iter().enumerate() {
            let played = src.next_frame().unwrap().unwrap();
            assert_eq!(played.frame_id, format!("{i:06}.bin"));
            assert_eq!(played.t_ns, want.t_ns);
            assert_eq!(played.points, want.points);
        }
        assert!(src.next_frame().unwrap().is_none());
    }

    #[test]
    fn frame_limit_is_enforced() {
        let dir = TempDir::new().unwrap();
        let mut writer = FrameDirWriter::create(dir.path()).unwrap();
        writer.timestamps = vec![0; MAX_FRAMES - 1];

        let last = writer.write_frame(&frame(1, 1)).unwrap();
        assert_eq!(last.file_name().unwrap(), "999999.bin");

        let err = writer.write_frame(&frame(2, 1)).unwrap_err();
        assert_eq!(err.kind(), contracts::ErrorKind::InvalidArgument);
        assert!(!dir.path().join("1000000.bin").exists());
        assert_eq!(writer.len(), MAX_FRAMES);
    }

    #[test]
    fn empty_frame_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut writer = FrameDirWriter::create(dir.path()).unwrap();
        assert!(writer.write_frame(&frame(0, 0)).is_err());
        assert!(writer.is_empty());
    }
}
