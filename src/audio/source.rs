//! PCM capture sources
//!
//! The capture stage only needs a blocking "read exactly one chunk of
//! interleaved i16 samples" operation; [`CaptureSource`] is that seam.
//! [`CpalSource`] implements it on top of cpal: the stream callback
//! converts whatever the device delivers to `i16` and feeds a bounded
//! channel, and `read_chunk` performs the blocking exact-fill read on
//! the consumer side.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use super::device::find_audio_device;
use crate::config::StreamConfig;
use crate::errors::StreamError;

/// Maximum callback batches buffered between the stream callback and the
/// capture stage. At the default 20ms chunking this is several seconds
/// of audio; beyond it the callback drops batches rather than block.
const CHANNEL_CAPACITY: usize = 256;

/// How long `read_chunk` waits for the stream to deliver samples before
/// declaring the source dead.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// A blocking source of fixed-size PCM chunks.
///
/// `read_chunk` fills `samples` exactly or fails; there are no short
/// reads. Any error is fatal to the capture stage that owns the source.
pub trait CaptureSource: Send {
    /// Fill `samples` completely with the next interleaved i16 samples.
    fn read_chunk(&mut self, samples: &mut [i16]) -> Result<(), StreamError>;
}

/// Microphone capture via cpal.
///
/// The cpal stream is owned by a dedicated thread (cpal streams are not
/// `Send`); this handle holds the receiving side of the sample channel
/// and is freely movable into the capture stage.
pub struct CpalSource {
    samples_rx: Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    stop_tx: Option<Sender<()>>,
    stream_thread: Option<thread::JoinHandle<()>>,
}

impl CpalSource {
    /// Open the configured input device and start capturing.
    ///
    /// Device resolution and stream construction happen before this
    /// returns, so setup failures surface here synchronously.
    pub fn open(config: &StreamConfig) -> Result<Self, StreamError> {
        let device_name = match config.device.as_deref() {
            None | Some("") | Some("default") => None,
            Some(name) => Some(find_audio_device(name)?.name),
        };

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: SampleRate(config.sample_rate),
            buffer_size: BufferSize::Default,
        };

        let (samples_tx, samples_rx) = bounded(CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = bounded::<Result<(), StreamError>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let stream_thread = thread::Builder::new()
            .name("crabstream-cpal".to_string())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), &stream_config, samples_tx)
                {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Hold the stream until the handle is dropped; it lives
                // and dies on this thread.
                let _ = stop_rx.recv();
                drop(stream);
            })
            .map_err(|e| StreamError::Capture(format!("failed to spawn capture thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                samples_rx,
                pending: VecDeque::new(),
                stop_tx: Some(stop_tx),
                stream_thread: Some(stream_thread),
            }),
            Ok(Err(e)) => {
                let _ = stream_thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = stream_thread.join();
                Err(StreamError::Capture(
                    "capture thread exited during startup".to_string(),
                ))
            }
        }
    }
}

impl CaptureSource for CpalSource {
    fn read_chunk(&mut self, samples: &mut [i16]) -> Result<(), StreamError> {
        let mut filled = 0;
        while filled < samples.len() {
            if let Some(sample) = self.pending.pop_front() {
                samples[filled] = sample;
                filled += 1;
                continue;
            }
            match self.samples_rx.recv_timeout(READ_TIMEOUT) {
                Ok(batch) => self.pending.extend(batch),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(StreamError::Capture(format!(
                        "no samples from capture stream within {:?}",
                        READ_TIMEOUT
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(StreamError::Capture(
                        "capture stream closed".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        // Disconnecting the stop channel wakes the stream thread
        self.stop_tx.take();
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
    }
}

fn open_stream(
    device_name: Option<&str>,
    config: &cpal::StreamConfig,
    samples_tx: Sender<Vec<i16>>,
) -> Result<cpal::Stream, StreamError> {
    let host = cpal::default_host();
    let device = match device_name {
        None => host
            .default_input_device()
            .ok_or_else(|| StreamError::Device("no default audio input device".to_string()))?,
        Some(name) => host
            .input_devices()
            .map_err(|e| StreamError::Device(format!("failed to enumerate inputs: {}", e)))?
            .find(|d| d.name().ok().as_deref() == Some(name))
            .ok_or_else(|| StreamError::Device(format!("audio device not found: {}", name)))?,
    };

    let sample_format = device
        .default_input_config()
        .map_err(|e| StreamError::Capture(format!("no supported input config: {}", e)))?
        .sample_format();

    let stream = match sample_format {
        cpal::SampleFormat::I16 => build_stream::<i16, _>(&device, config, samples_tx, |s| s)?,
        cpal::SampleFormat::U16 => build_stream::<u16, _>(&device, config, samples_tx, |s| {
            (s as i32 - 32_768) as i16
        })?,
        cpal::SampleFormat::F32 => build_stream::<f32, _>(&device, config, samples_tx, |s| {
            (s * 32_767.0).clamp(-32_768.0, 32_767.0) as i16
        })?,
        format => {
            return Err(StreamError::Capture(format!(
                "unsupported sample format: {:?}",
                format
            )));
        }
    };

    stream
        .play()
        .map_err(|e| StreamError::Capture(format!("failed to start stream: {}", e)))?;

    Ok(stream)
}

fn build_stream<T, F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples_tx: Sender<Vec<i16>>,
    convert: F,
) -> Result<cpal::Stream, StreamError>
where
    T: cpal::SizedSample,
    F: Fn(T) -> i16 + Send + 'static,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let batch: Vec<i16> = data.iter().map(|&s| convert(s)).collect();
                // The callback must never block; a full channel means the
                // consumer stalled, so the batch is dropped.
                let _ = samples_tx.try_send(batch);
            },
            move |err| {
                log::error!("audio capture stream error: {}", err);
            },
            None,
        )
        .map_err(|e| StreamError::Capture(format!("failed to build input stream: {}", e)))
}
