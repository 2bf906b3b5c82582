//! Streaming configuration

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;

/// Largest accepted view distance, in chunks
pub const MAX_VIEW_DISTANCE: u32 = 1024;

/// Chunk dimensions and residency limits
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Blocks per chunk side along x and z
    pub chunk_width: u32,
    /// Blocks per chunk along y
    pub chunk_height: u32,
    /// Radius, in chunks, of the circle kept resident around the viewer
    pub view_distance: u32,
    /// Maximum number of evicted chunks kept in the save cache
    pub cache_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_width: 16,
            chunk_height: 64,
            view_distance: 4,
            cache_capacity: 4096,
        }
    }
}

impl StreamingConfig {
    /// Number of blocks in one chunk volume
    pub fn chunk_volume(&self) -> usize {
        let (w, h) = (self.chunk_width as usize, self.chunk_height as usize);
        w * w * h
    }

    /// Reject dimensions the world cannot be built with
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(Error::InvalidConfig(reason));

        if self.chunk_width == 0 || self.chunk_height == 0 {
            return invalid(format!(
                "chunk dimensions must be non-zero, got {}x{}",
                self.chunk_width, self.chunk_height
            ));
        }
        if i32::try_from(self.chunk_width).is_err() || i32::try_from(self.chunk_height).is_err() {
            return invalid(format!(
                "chunk dimensions {}x{} exceed the block coordinate range",
                self.chunk_width, self.chunk_height
            ));
        }
        let (w, h) = (self.chunk_width as usize, self.chunk_height as usize);
        if w.checked_mul(w).and_then(|area| area.checked_mul(h)).is_none() {
            return invalid(format!(
                "chunk volume {}x{}x{} overflows",
                self.chunk_width, self.chunk_height, self.chunk_width
            ));
        }
        if self.view_distance > MAX_VIEW_DISTANCE {
            return invalid(format!(
                "view distance {} exceeds {}",
                self.view_distance, MAX_VIEW_DISTANCE
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StreamingConfig::default();
        assert_eq!(config.chunk_width, 16);
        assert_eq!(config.chunk_height, 64);
        assert_eq!(config.view_distance, 4);
        assert_eq!(config.cache_capacity, 4096);
        assert_eq!(config.chunk_volume(), 16 * 16 * 64);
    }

    #[test]
    fn test_default_is_valid() {
        assert!(StreamingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        for (chunk_width, chunk_height) in [(0, 64), (16, 0), (0, 0)] {
            let config = StreamingConfig {
                chunk_width,
                chunk_height,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let config = StreamingConfig {
            chunk_width: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = StreamingConfig {
            chunk_width: i32::MAX as u32,
            chunk_height: i32::MAX as u32,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_view_distance_limit() {
        let mut config = StreamingConfig {
            view_distance: MAX_VIEW_DISTANCE,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.view_distance += 1;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = StreamingConfig {
            view_distance: 9,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: StreamingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
