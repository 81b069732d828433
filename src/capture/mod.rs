//! Voice recording for drafts.
//!
//! [`CaptureState`] is the pure lifecycle, [`CaptureSession`] drives it
//! against an [`AudioInput`] device and embeds the outcome into a shared
//! draft. [`Playback`] tracks which embedded reference is playing.

#[cfg(feature = "microphone")]
pub mod microphone;
pub mod playback;
pub mod session;
pub mod state;
pub mod wav;

use async_trait::async_trait;
use thiserror::Error;

pub use playback::Playback;
pub use session::{CaptureSession, VoiceOutcome};
pub use state::CaptureState;
pub use wav::{encode_wav, BufferedRecording, WavFileInput};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No input device available")]
    NoDevice,

    #[error("Device error: {0}")]
    Device(String),

    #[error("WAV encoding error: {0}")]
    Encode(#[from] hound::Error),

    #[error("{0}")]
    InvalidTransition(String),
}

impl CaptureError {
    /// Device access problems block the user; everything else is logged.
    pub fn user_alert(&self) -> Option<String> {
        let reason = match self {
            CaptureError::PermissionDenied(reason) => reason.clone(),
            CaptureError::NoDevice => "no input device available".to_string(),
            CaptureError::Device(reason) => reason.clone(),
            CaptureError::Encode(_) | CaptureError::InvalidTransition(_) => return None,
        };
        Some(format!("Error accessing microphone: {}", reason))
    }
}

/// Raw PCM captured between start and stop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved chunks in arrival order.
    pub chunks: Vec<Vec<i16>>,
}

impl CapturedAudio {
    pub fn sample_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }
}

/// Something that can hand out an exclusive recording.
#[async_trait]
pub trait AudioInput: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Recording>, CaptureError>;
}

/// A recording in progress. Dropping or stopping it releases the device.
#[async_trait]
pub trait Recording: Send {
    async fn stop(self: Box<Self>) -> Result<CapturedAudio, CaptureError>;
}
