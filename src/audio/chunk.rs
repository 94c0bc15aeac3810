//! Owned audio payloads moved between pipeline stages
//!
//! Both chunk types are immutable after creation and travel through the
//! queues by ownership transfer: created by one stage, consumed by the
//! next, never aliased.

/// A fixed-size block of interleaved 16-bit PCM with its capture timestamp.
///
/// Length is always `frames_per_chunk x channels`; the capture stage
/// fills chunks exactly and the encoder consumes them whole.
#[derive(Debug)]
pub struct PcmChunk {
    samples: Vec<i16>,
    pts_micros: u64,
}

impl PcmChunk {
    /// Wrap captured samples with their monotonic timestamp.
    pub fn new(samples: Vec<i16>, pts_micros: u64) -> Self {
        Self {
            samples,
            pts_micros,
        }
    }

    /// Interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Monotonic capture timestamp in microseconds.
    pub fn pts_micros(&self) -> u64 {
        self.pts_micros
    }

    /// Total sample count (frames x channels).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the chunk holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One encoded frame with the timestamp of the PCM it came from.
#[derive(Debug)]
pub struct EncodedChunk {
    data: Vec<u8>,
    pts_micros: u64,
}

impl EncodedChunk {
    /// Wrap encoder output, carrying forward the source chunk's timestamp.
    pub fn new(data: Vec<u8>, pts_micros: u64) -> Self {
        Self { data, pts_micros }
    }

    /// Encoded bytes (used length only, no spare capacity exposed).
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Monotonic timestamp inherited from the source PCM chunk.
    pub fn pts_micros(&self) -> u64 {
        self.pts_micros
    }

    /// Encoded byte count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the encoder produced no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
