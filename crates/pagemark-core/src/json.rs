//! JSON persistence for the intermediate record sets.
//!
//! Both stages persist their output pretty-printed in UTF-8;
//! `serde_json` leaves non-ASCII characters literal, so the files stay
//! human-readable.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Write `value` to `path` as indented JSON.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<(), JsonError> {
    let rendered = serde_json::to_string_pretty(value)?;
    fs::write(path, rendered)?;
    tracing::info!(path = %path.display(), "saved JSON");
    Ok(())
}

/// Read a JSON value back from `path`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, JsonError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
