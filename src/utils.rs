//! Utility functions

use crate::error::{CubeError, Result};

/// Decode little-endian f32 samples from raw bytes.
pub fn bytes_to_samples(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(CubeError::InvalidFormat(
            "byte length not aligned with sample size".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Encode f32 samples as little-endian bytes.
pub fn samples_to_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}
