//! Frame - frame source output
//!
//! One timestamped point-cloud sample.

use serde::{Deserialize, Serialize};

use crate::TimestampNs;

/// Bytes per point in binary frame files (x, y, z, intensity as LE f32).
pub const POINT_STRIDE_BYTES: usize = 16;

/// LiDAR return
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointXyzi {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
}

impl PointXyzi {
    pub const fn new(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self { x, y, z, intensity }
    }
}

/// Point-cloud frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Logical time of the frame (run-relative or dataset time)
    pub t_ns: TimestampNs,

    /// Frame identifier (file name for directory playback)
    pub frame_id: String,

    /// Points in sensor frame, in source order
    pub points: Vec<PointXyzi>,
}

impl Frame {
    pub fn new(t_ns: TimestampNs, frame_id: impl Into<String>, points: Vec<PointXyzi>) -> Self {
        Self {
            t_ns,
            frame_id: frame_id.into(),
            points,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
