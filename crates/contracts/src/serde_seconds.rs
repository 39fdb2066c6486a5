//! Serde adapter: seconds (float) on disk, nanoseconds (`i64`) in memory.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Window {
//!     #[serde(rename = "length_s", with = "contracts::serde_seconds")]
//!     length_ns: i64,
//! }
//! ```

use serde::{Deserialize, Deserializer, Serializer};

use crate::time::{ns_to_seconds, seconds_to_ns, DurationNs};

pub fn serialize<S>(ns: &DurationNs, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(ns_to_seconds(*ns))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DurationNs, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    if !seconds.is_finite() {
        return Err(serde::de::Error::custom(format!(
            "duration must be a finite number of seconds, got {seconds}"
        )));
    }
    Ok(seconds_to_ns(seconds))
}
