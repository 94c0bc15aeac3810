//! Capture and encode pipeline
//!
//! Two long-lived worker threads connected by bounded queues:
//!
//! ```text
//! source -> [capture thread] -> PCM queue -> [encode thread] -> encoded queue -> copy_encoded()
//! ```
//!
//! Both stages apply the same backpressure policy: when the downstream
//! queue is full the chunk is dropped, never blocked on. For live audio
//! a short gap beats growing latency: stale audio is worse than missing
//! audio.
//!
//! Cancellation is cooperative through a shared run flag read at the top
//! of each stage loop; a stage blocked in a timed queue wait observes the
//! flag once the wait unblocks, so worst-case shutdown latency is one
//! queue timeout. A fatal source or encoder error terminates only its own
//! stage; the owner notices the silence, not an error value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::chunk::{EncodedChunk, PcmChunk};
use super::encoder::{ChunkEncoder, OpusEncoder};
use super::source::{CaptureSource, CpalSource};
use crate::config::StreamConfig;
use crate::errors::StreamError;
use crate::queue::BoundedQueue;
use crate::timing::PtsClock;

/// Audio capture/encode pipeline
///
/// Owns both queues and both worker threads for its whole lifetime. The
/// transport layer pulls finished frames with [`copy_encoded`]; dropping
/// the pipeline (or calling [`shutdown`]) stops both threads and drains
/// whatever is still queued.
///
/// [`copy_encoded`]: AudioPipeline::copy_encoded
/// [`shutdown`]: AudioPipeline::shutdown
pub struct AudioPipeline {
    pcm_queue: Arc<BoundedQueue<PcmChunk>>,
    encoded_queue: Arc<BoundedQueue<EncodedChunk>>,
    run: Arc<AtomicBool>,
    capture_thread: Option<JoinHandle<()>>,
    encode_thread: Option<JoinHandle<()>>,
    queue_timeout: Duration,
}

impl AudioPipeline {
    /// Open the configured capture device and Opus encoder, then start
    /// the pipeline.
    ///
    /// Any setup failure tears down whatever was already constructed
    /// before returning.
    pub fn open(config: &StreamConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let source = CpalSource::open(config)?;
        let encoder = OpusEncoder::new(config.sample_rate, config.channels, config.bitrate)?;
        Self::start(source, encoder, config)
    }

    /// Start the pipeline over an already-constructed source and encoder.
    ///
    /// The encode thread is spawned first, then the capture thread; both
    /// are gated by the same run flag.
    pub fn start<S, E>(source: S, encoder: E, config: &StreamConfig) -> Result<Self, StreamError>
    where
        S: CaptureSource + 'static,
        E: ChunkEncoder + 'static,
    {
        config.validate()?;

        let pcm_queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let encoded_queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let run = Arc::new(AtomicBool::new(true));
        let clock = PtsClock::new();
        let queue_timeout = config.queue_timeout();
        let samples_per_chunk = config.samples_per_chunk();

        let encode_thread = {
            let pcm_queue = Arc::clone(&pcm_queue);
            let encoded_queue = Arc::clone(&encoded_queue);
            let run = Arc::clone(&run);
            thread::Builder::new()
                .name("crabstream-encode".to_string())
                .spawn(move || encode_loop(encoder, pcm_queue, encoded_queue, run, queue_timeout))
                .map_err(|e| {
                    StreamError::Capture(format!("failed to spawn encode thread: {}", e))
                })?
        };

        let capture_thread = {
            let pcm_queue = Arc::clone(&pcm_queue);
            let run_flag = Arc::clone(&run);
            thread::Builder::new()
                .name("crabstream-capture".to_string())
                .spawn(move || {
                    capture_loop(
                        source,
                        pcm_queue,
                        clock,
                        run_flag,
                        samples_per_chunk,
                        queue_timeout,
                    )
                })
                .map_err(|e| {
                    // The encode thread is already running; stop it before
                    // reporting the failure.
                    run.store(false, Ordering::Relaxed);
                    StreamError::Capture(format!("failed to spawn capture thread: {}", e))
                })?
        };

        Ok(Self {
            pcm_queue,
            encoded_queue,
            run,
            capture_thread: Some(capture_thread),
            encode_thread: Some(encode_thread),
            queue_timeout,
        })
    }

    /// Copy the next encoded frame into `data`.
    ///
    /// Waits up to one queue timeout for a frame, then returns `None`.
    /// Returns the used byte count and the frame's capture timestamp in
    /// microseconds.
    ///
    /// If `data` is smaller than the pending frame, that frame is
    /// discarded and `None` is returned; truncated audio never escapes.
    /// Size the buffer to the encoder's worst case (4000 bytes for Opus)
    /// to avoid the loss.
    pub fn copy_encoded(&self, data: &mut [u8]) -> Option<(usize, u64)> {
        let chunk = self.encoded_queue.pop(self.queue_timeout).ok()?;
        if chunk.len() > data.len() {
            log::warn!(
                "caller buffer too small for encoded frame ({} < {}), discarding",
                data.len(),
                chunk.len()
            );
            return None;
        }
        let used = chunk.len();
        data[..used].copy_from_slice(chunk.data());
        Some((used, chunk.pts_micros()))
    }

    /// Whether the pipeline has not been shut down yet.
    ///
    /// A stage that died from a fatal source/encoder error does not clear
    /// this flag; that failure mode is observable only as `copy_encoded`
    /// ceasing to yield frames.
    pub fn is_running(&self) -> bool {
        self.run.load(Ordering::Relaxed)
    }

    /// Stop both worker threads and drain both queues. Idempotent.
    pub fn shutdown(&mut self) {
        self.run.store(false, Ordering::Relaxed);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.encode_thread.take() {
            let _ = handle.join();
        }
        while self.pcm_queue.try_pop().is_some() {}
        while self.encoded_queue.try_pop().is_some() {}
    }
}

impl Drop for AudioPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn capture_loop<S: CaptureSource>(
    mut source: S,
    pcm_queue: Arc<BoundedQueue<PcmChunk>>,
    clock: PtsClock,
    run: Arc<AtomicBool>,
    samples_per_chunk: usize,
    queue_timeout: Duration,
) {
    let mut scratch = vec![0i16; samples_per_chunk];

    while run.load(Ordering::Relaxed) {
        if let Err(e) = source.read_chunk(&mut scratch) {
            log::error!("capture read failed, stopping capture stage: {}", e);
            break;
        }
        let pts_micros = clock.pts_micros();

        if pcm_queue.free_capacity() == 0 {
            log::warn!("PCM queue is full, dropping chunk");
            continue;
        }
        // A push timeout here means the capacity check raced with a
        // concurrent push; the chunk is dropped like any other
        // backpressure casualty.
        let chunk = PcmChunk::new(scratch.clone(), pts_micros);
        let _ = pcm_queue.push(chunk, queue_timeout);
    }
    log::debug!("capture stage stopped");
}

fn encode_loop<E: ChunkEncoder>(
    mut encoder: E,
    pcm_queue: Arc<BoundedQueue<PcmChunk>>,
    encoded_queue: Arc<BoundedQueue<EncodedChunk>>,
    run: Arc<AtomicBool>,
    queue_timeout: Duration,
) {
    while run.load(Ordering::Relaxed) {
        let pcm = match pcm_queue.pop(queue_timeout) {
            Ok(chunk) => chunk,
            // Nothing to encode yet; re-check the run flag and wait again
            Err(_) => continue,
        };

        let mut out = vec![0u8; encoder.max_encoded_len()];
        let used = match encoder.encode(pcm.samples(), &mut out) {
            Ok(used) => used,
            Err(e) => {
                log::error!("encode failed, stopping encode stage: {}", e);
                break;
            }
        };
        if used == 0 {
            continue;
        }
        out.truncate(used);

        let chunk = EncodedChunk::new(out, pcm.pts_micros());
        if encoded_queue.free_capacity() == 0 {
            log::warn!("encoded queue is full, dropping frame");
            continue;
        }
        let _ = encoded_queue.push(chunk, queue_timeout);
    }
    log::debug!("encode stage stopped");
}
