// src/models/mod.rs

use serde::{Deserialize, Deserializer};

pub mod category;
pub mod question;
pub mod quiz;

/// Maps a present field (even `null`) to `Some`, so that `#[serde(default)]`
/// leaves only missing fields as `None`.
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
