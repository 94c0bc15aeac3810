//! Opus chunk encoder
//!
//! One pipeline chunk in, one Opus packet out. The encoder is tuned for
//! low-latency speech/audio streaming: restricted low-delay application,
//! fullband, in-band FEC with a 10% expected loss rate.

use crate::errors::StreamError;

/// Worst-case Opus packet size in bytes, per the reference encoder
/// documentation. Output buffers of this size can hold any packet the
/// encoder emits for a single frame.
const MAX_OPUS_PACKET_SIZE: usize = 4000;

/// Expected network packet loss percentage fed to the encoder so FEC
/// redundancy is sized accordingly.
const EXPECTED_PACKET_LOSS_PERC: i32 = 10;

/// Turns one PCM chunk into at most one encoded chunk.
///
/// `encode` consumes exactly the samples it is given (one pipeline
/// chunk) and reports the used byte count; zero means the encoder
/// produced nothing for this input. Any error is fatal to the encode
/// stage that owns the encoder.
pub trait ChunkEncoder: Send {
    /// Encode `pcm` (interleaved, one full chunk) into `out`; returns
    /// the number of bytes written.
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, StreamError>;

    /// Worst-case output size for a single chunk; `encode` is always
    /// called with a buffer at least this large.
    fn max_encoded_len(&self) -> usize;
}

/// Opus encoder over the raw libopus FFI
///
/// # Thread Safety
/// This type implements `Send` so the encoder can be moved into the
/// dedicated encode thread. The underlying `libopus` encoder is NOT safe
/// for concurrent access, but IS safe to use from a single thread after
/// being moved there. The pipeline enforces this by moving the encoder
/// into the encode thread at startup; it never escapes that thread until
/// dropped. Do NOT implement `Clone` or `Sync` for this type.
pub struct OpusEncoder {
    encoder: *mut libopus_sys::OpusEncoder,
    sample_rate: u32,
    channels: u16,
}

// SAFETY: the raw pointer targets memory allocated by libopus, which is
// safe to use from any single thread. `Sync` is not implemented, so the
// ownership model keeps access single-threaded.
unsafe impl Send for OpusEncoder {}

impl OpusEncoder {
    /// Create a new Opus encoder
    ///
    /// # Arguments
    /// * `sample_rate` - Must be 48000 (Opus requirement)
    /// * `channels` - 1 for mono, 2 for stereo
    /// * `bitrate` - Target bitrate in bits per second (e.g., 128000)
    pub fn new(sample_rate: u32, channels: u16, bitrate: u32) -> Result<Self, StreamError> {
        if sample_rate != 48_000 {
            return Err(StreamError::Encode(
                "Opus requires a 48000 Hz sample rate".to_string(),
            ));
        }
        if channels != 1 && channels != 2 {
            return Err(StreamError::Encode(
                "Opus supports only mono (1) or stereo (2) channels".to_string(),
            ));
        }

        let mut error: i32 = 0;
        let encoder = unsafe {
            libopus_sys::opus_encoder_create(
                sample_rate as i32,
                channels as i32,
                libopus_sys::OPUS_APPLICATION_RESTRICTED_LOWDELAY as i32,
                &mut error,
            )
        };

        if encoder.is_null() || error != libopus_sys::OPUS_OK as i32 {
            return Err(StreamError::Encode(format!(
                "failed to create Opus encoder: error code {}",
                error
            )));
        }

        let ctls: [(&str, u32, i32); 4] = [
            (
                "bitrate",
                libopus_sys::OPUS_SET_BITRATE_REQUEST,
                bitrate as i32,
            ),
            (
                "max bandwidth",
                libopus_sys::OPUS_SET_MAX_BANDWIDTH_REQUEST,
                libopus_sys::OPUS_BANDWIDTH_FULLBAND as i32,
            ),
            ("in-band FEC", libopus_sys::OPUS_SET_INBAND_FEC_REQUEST, 1),
            (
                "expected packet loss",
                libopus_sys::OPUS_SET_PACKET_LOSS_PERC_REQUEST,
                EXPECTED_PACKET_LOSS_PERC,
            ),
        ];

        for (what, request, value) in ctls {
            let result =
                unsafe { libopus_sys::opus_encoder_ctl(encoder, request as i32, value) };
            if result != libopus_sys::OPUS_OK as i32 {
                unsafe { libopus_sys::opus_encoder_destroy(encoder) };
                return Err(StreamError::Encode(format!(
                    "failed to set {}: error code {}",
                    what, result
                )));
            }
        }

        Ok(Self {
            encoder,
            sample_rate,
            channels,
        })
    }

    /// Get the configured sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the configured channel count
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl ChunkEncoder for OpusEncoder {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize, StreamError> {
        let frame_size = pcm.len() / self.channels as usize;
        let len = unsafe {
            libopus_sys::opus_encode(
                self.encoder,
                pcm.as_ptr(),
                frame_size as i32,
                out.as_mut_ptr(),
                out.len() as i32,
            )
        };
        if len < 0 {
            return Err(StreamError::Encode(format!(
                "opus_encode failed with status {}",
                len
            )));
        }
        Ok(len as usize)
    }

    fn max_encoded_len(&self) -> usize {
        MAX_OPUS_PACKET_SIZE
    }
}

impl Drop for OpusEncoder {
    fn drop(&mut self) {
        if !self.encoder.is_null() {
            unsafe {
                libopus_sys::opus_encoder_destroy(self.encoder);
            }
        }
    }
}
