//! FNV-1a 64-bit streaming hasher with fixed little-endian encodings.

use std::path::Path;

use contracts::{Aabb, Fingerprint, TransformSe3, Vec3f};

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

const CANONICAL_NAN_F32: u32 = 0x7fc0_0000;
const CANONICAL_NAN_F64: u64 = 0x7ff8_0000_0000_0000;

/// FNV-1a 64. Not cryptographic.
///
/// Every `write_*` method absorbs a fixed-width little-endian encoding, so the
/// same sequence of calls produces the same digest on every host.
#[derive(Debug, Clone)]
pub struct Fnv1a64 {
    state: u64,
}

impl Default for Fnv1a64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Fnv1a64 {
    pub const fn new() -> Self {
        Self {
            state: OFFSET_BASIS,
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= u64::from(b);
            self.state = self.state.wrapping_mul(PRIME);
        }
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i64(&mut self, v: i64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.write_bytes(&[u8::from(v)]);
    }

    /// NaN payloads collapse to one quiet NaN; signed zeros stay distinct.
    pub fn write_f32(&mut self, v: f32) {
        let bits = if v.is_nan() {
            CANONICAL_NAN_F32
        } else {
            v.to_bits()
        };
        self.write_u32(bits);
    }

    pub fn write_f64(&mut self, v: f64) {
        let bits = if v.is_nan() {
            CANONICAL_NAN_F64
        } else {
            v.to_bits()
        };
        self.write_u64(bits);
    }

    /// Length-prefixed so that `("ab", "c")` and `("a", "bc")` differ.
    pub fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    pub fn write_path(&mut self, path: &Path) {
        self.write_str(&path.to_string_lossy());
    }

    pub fn write_vec3(&mut self, v: &Vec3f) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    /// Invalid boxes hash too.
    pub fn write_aabb(&mut self, a: &Aabb) {
        self.write_vec3(&a.min);
        self.write_vec3(&a.max);
    }

    /// 16 entries, row-major.
    pub fn write_transform(&mut self, t: &TransformSe3) {
        for &v in &t.m {
            self.write_f32(v);
        }
    }

    pub fn finish(&self) -> Fingerprint {
        Fingerprint(self.state)
    }
}
