//! Serde helper for representing `Duration` as milliseconds on the wire

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    (d.as_millis() as u64).serialize(s)
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let millis = u64::deserialize(d)?;
    Ok(Duration::from_millis(millis))
}
