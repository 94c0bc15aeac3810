//! Error types for crabstream

use thiserror::Error;

/// Errors surfaced by the streaming pipeline.
///
/// Setup failures (device open, encoder creation, bad configuration) are
/// returned synchronously from constructors. Runtime failures inside the
/// worker threads terminate the affected stage and are only observable as
/// an absence of further output; they never cross the thread boundary as
/// error values.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Audio device enumeration or selection failed.
    #[error("audio device error: {0}")]
    Device(String),

    /// The capture stream could not be opened or stopped yielding samples.
    #[error("capture error: {0}")]
    Capture(String),

    /// Encoder creation, configuration, or encoding failed.
    #[error("encoder error: {0}")]
    Encode(String),

    /// Invalid or unreadable configuration.
    #[error("config error: {0}")]
    Config(String),
}
