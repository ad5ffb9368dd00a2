//! Serde helpers for frame decoding.
//!
//! When the `tracing` feature is enabled, decoding also logs the fields that the target
//! type does not capture, and the path of the field that made decoding fail. This helps
//! detect payload changes on the venue side.

use serde::de::DeserializeOwned;

/// Decode one JSON payload, logging unknown fields and failure paths when tracing is enabled.
///
/// Unknown fields never fail decoding; venue payloads routinely carry fields this crate
/// does not model, so they are reported at `trace` level only.
#[cfg(feature = "tracing")]
pub fn decode_with_warnings<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    use std::any::type_name;

    let mut unknown_paths: Vec<String> = Vec::new();
    let mut de = serde_json::Deserializer::from_slice(bytes);

    let result: T = serde_ignored::deserialize(&mut de, |path| {
        unknown_paths.push(path.to_string());
    })
    .inspect_err(|_| {
        // Re-decode with serde_path_to_error to find where it broke
        let mut de = serde_json::Deserializer::from_slice(bytes);
        let path_result: Result<T, _> = serde_path_to_error::deserialize(&mut de);
        if let Err(path_err) = path_result {
            tracing::warn!(
                type_name = %type_name::<T>(),
                path = %path_err.path(),
                error = %path_err.inner(),
                "frame decoding failed"
            );
        }
    })?;
    de.end()?;

    if !unknown_paths.is_empty() {
        tracing::trace!(
            type_name = %type_name::<T>(),
            fields = ?unknown_paths,
            "unknown fields in frame"
        );
    }

    Ok(result)
}

/// Pass-through decoding when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub fn decode_with_warnings<T: DeserializeOwned>(bytes: &[u8]) -> serde_json::Result<T> {
    serde_json::from_slice(bytes)
}
