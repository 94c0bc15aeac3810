//! Synthetic sources and encoders for offline testing
//!
//! Deterministic stand-ins for the hardware-backed components so the
//! pipeline can be exercised without a microphone or codec. Shipped as a
//! regular module so downstream crates can test against the same fakes.

use std::f64::consts::TAU;
use std::time::Duration;

use crate::audio::{CaptureSource, ChunkEncoder};
use crate::config::StreamConfig;
use crate::errors::StreamError;

/// Sine amplitude used by [`SyntheticSource`], comfortably inside i16
/// range to survive sample-format round trips.
const TONE_AMPLITUDE: f64 = 3_000.0;

/// A deterministic sine-wave capture source.
///
/// Generates a continuous tone chunk by chunk, pacing reads to roughly
/// real time. With a chunk budget it runs dry after the budgeted number
/// of reads, which exercises the capture stage's fatal-error path the
/// same way a dead device would.
pub struct SyntheticSource {
    frequency_hz: f64,
    sample_rate: u32,
    channels: u16,
    chunk_duration: Duration,
    position: u64,
    chunks_remaining: Option<usize>,
}

impl SyntheticSource {
    /// Create a 440 Hz tone source matching `config`'s format.
    ///
    /// `chunk_budget` bounds how many chunks the source yields before
    /// failing; `None` streams forever.
    pub fn new(config: &StreamConfig, chunk_budget: Option<usize>) -> Self {
        Self {
            frequency_hz: 440.0,
            sample_rate: config.sample_rate,
            channels: config.channels,
            chunk_duration: config.chunk_duration(),
            position: 0,
            chunks_remaining: chunk_budget,
        }
    }

    /// Override the tone frequency.
    pub fn with_frequency(mut self, frequency_hz: f64) -> Self {
        self.frequency_hz = frequency_hz;
        self
    }
}

impl CaptureSource for SyntheticSource {
    fn read_chunk(&mut self, samples: &mut [i16]) -> Result<(), StreamError> {
        if let Some(remaining) = &mut self.chunks_remaining {
            if *remaining == 0 {
                return Err(StreamError::Capture(
                    "synthetic source exhausted".to_string(),
                ));
            }
            *remaining -= 1;
        }

        let channels = self.channels as usize;
        for frame in samples.chunks_mut(channels) {
            let t = self.position as f64 / self.sample_rate as f64;
            let value = (TAU * self.frequency_hz * t).sin() * TONE_AMPLITUDE;
            frame.fill(value as i16);
            self.position += 1;
        }

        // Pace like a real device so queue timing behaves realistically
        std::thread::sleep(self.chunk_duration);
        Ok(())
    }
}

/// A trivial encoder that emits the PCM bytes unchanged (little-endian).
///
/// Output length is exactly `2 x samples`, which makes framing and
/// timestamp propagation easy to assert in tests.
pub struct PassthroughEncoder {
    samples_per_chunk: usize,
}

impl PassthroughEncoder {
    /// Create an encoder sized for chunks of `samples_per_chunk`
    /// interleaved samples.
    pub fn new(samples_per_chunk: usize) -> Self {
        Self { samples_per_chunk }
    }
}

impl ChunkEncoder for PassthroughEncoder {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, StreamError> {
        let needed = pcm.len() * 2;
        if needed > out.len() {
            return Err(StreamError::Encode(format!(
                "output buffer too small: {} < {}",
                out.len(),
                needed
            )));
        }
        for (sample, slot) in pcm.iter().zip(out.chunks_exact_mut(2)) {
            slot.copy_from_slice(&sample.to_le_bytes());
        }
        Ok(needed)
    }

    fn max_encoded_len(&self) -> usize {
        self.samples_per_chunk * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> StreamConfig {
        StreamConfig {
            channels: 1,
            frames_per_chunk: 120,
            ..Default::default()
        }
    }

    #[test]
    fn test_synthetic_source_is_deterministic() {
        let config = small_config();
        let mut a = SyntheticSource::new(&config, None);
        let mut b = SyntheticSource::new(&config, None);

        let mut chunk_a = vec![0i16; config.samples_per_chunk()];
        let mut chunk_b = vec![0i16; config.samples_per_chunk()];
        a.read_chunk(&mut chunk_a).unwrap();
        b.read_chunk(&mut chunk_b).unwrap();

        assert_eq!(chunk_a, chunk_b);
        assert!(chunk_a.iter().any(|&s| s != 0), "tone is not silence");
    }

    #[test]
    fn test_synthetic_source_budget_exhausts() {
        let config = small_config();
        let mut source = SyntheticSource::new(&config, Some(2));
        let mut chunk = vec![0i16; config.samples_per_chunk()];

        assert!(source.read_chunk(&mut chunk).is_ok());
        assert!(source.read_chunk(&mut chunk).is_ok());
        assert!(source.read_chunk(&mut chunk).is_err());
    }

    #[test]
    fn test_stereo_frames_duplicate_channels() {
        let config = StreamConfig {
            frames_per_chunk: 120,
            ..Default::default()
        };
        let mut source = SyntheticSource::new(&config, None);
        let mut chunk = vec![0i16; config.samples_per_chunk()];
        source.read_chunk(&mut chunk).unwrap();

        for frame in chunk.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn test_passthrough_round_trips() {
        let mut encoder = PassthroughEncoder::new(4);
        let pcm = [100i16, -200, 300, -400];
        let mut out = vec![0u8; encoder.max_encoded_len()];

        let used = encoder.encode(&pcm, &mut out).unwrap();
        assert_eq!(used, 8);

        let decoded: Vec<i16> = out
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(decoded, pcm);
    }
}
