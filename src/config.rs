//! Pipeline configuration
//!
//! Capture format, encoder tuning, and queue sizing for the streaming
//! pipeline, with TOML load/save support.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::StreamError;

/// Frame durations (in milliseconds) the Opus encoder accepts per call.
const VALID_FRAME_DURATIONS_MS: [f64; 6] = [2.5, 5.0, 10.0, 20.0, 40.0, 60.0];

/// Streaming pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Capture device name, or `None` for the system default input
    pub device: Option<String>,
    /// Capture and encoder sample rate in Hz (Opus requires 48000)
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Target encoder bitrate in bits per second
    pub bitrate: u32,
    /// Frames per pipeline chunk; one chunk feeds one encoder call, so
    /// this must be a frame size Opus accepts (e.g. 960 for 20ms at 48kHz)
    pub frames_per_chunk: usize,
    /// Capacity of the PCM and encoded queues, in chunks
    pub queue_capacity: usize,
    /// Timeout applied to every blocking queue operation, in milliseconds
    pub queue_timeout_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: 48_000,
            channels: 2,
            bitrate: 128_000,
            frames_per_chunk: 960,
            queue_capacity: 8,
            queue_timeout_ms: 1_000,
        }
    }
}

impl StreamConfig {
    /// Interleaved samples per chunk (`frames_per_chunk` x `channels`)
    pub fn samples_per_chunk(&self) -> usize {
        self.frames_per_chunk * self.channels as usize
    }

    /// Duration of one chunk of audio
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames_per_chunk as f64 / self.sample_rate as f64)
    }

    /// The blocking-queue timeout as a [`Duration`]
    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    /// Validate the configuration against the encoder's constraints
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.sample_rate != 48_000 {
            return Err(StreamError::Config(format!(
                "sample rate must be 48000 Hz for Opus, got {}",
                self.sample_rate
            )));
        }
        if self.channels != 1 && self.channels != 2 {
            return Err(StreamError::Config(format!(
                "channels must be 1 or 2, got {}",
                self.channels
            )));
        }
        if !is_valid_opus_frame_count(self.frames_per_chunk, self.sample_rate) {
            return Err(StreamError::Config(format!(
                "frames_per_chunk {} is not a valid Opus frame size at {} Hz",
                self.frames_per_chunk, self.sample_rate
            )));
        }
        if self.queue_capacity == 0 {
            return Err(StreamError::Config(
                "queue_capacity must be non-zero".to_string(),
            ));
        }
        if self.queue_timeout_ms == 0 {
            return Err(StreamError::Config(
                "queue_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.bitrate == 0 {
            return Err(StreamError::Config("bitrate must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let content = fs::read_to_string(&path)
            .map_err(|e| StreamError::Config(format!("failed to read config file: {}", e)))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| StreamError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StreamError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StreamError::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&path, content)
            .map_err(|e| StreamError::Config(format!("failed to write config file: {}", e)))
    }
}

fn is_valid_opus_frame_count(frames: usize, sample_rate: u32) -> bool {
    VALID_FRAME_DURATIONS_MS
        .iter()
        .any(|&ms| frames == (sample_rate as f64 * ms / 1000.0) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StreamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.samples_per_chunk(), 1920);
        assert_eq!(config.chunk_duration(), Duration::from_millis(20));
    }

    #[test]
    fn test_rejects_non_48khz() {
        let config = StreamConfig {
            sample_rate: 44_100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_channel_count() {
        let config = StreamConfig {
            channels: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_frame_count() {
        let config = StreamConfig {
            frames_per_chunk: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accepts_all_opus_frame_sizes() {
        for frames in [120, 240, 480, 960, 1920, 2880] {
            let config = StreamConfig {
                frames_per_chunk: frames,
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{} frames should be valid", frames);
        }
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = StreamConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.toml");

        let config = StreamConfig {
            device: Some("USB Microphone".to_string()),
            bitrate: 96_000,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = StreamConfig::load(&path).unwrap();
        assert_eq!(loaded.device.as_deref(), Some("USB Microphone"));
        assert_eq!(loaded.bitrate, 96_000);
        assert_eq!(loaded.queue_capacity, config.queue_capacity);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "sample_rate = \"not a number\"").unwrap();
        assert!(StreamConfig::load(&path).is_err());
    }
}
