// Recording lifecycle - pure transitions, no device access
use chrono::{DateTime, Utc};

use super::CaptureError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,

    /// Device acquired, chunks are buffering
    Recording { started_at: DateTime<Utc> },

    /// Stopped by the user, payload being encoded and uploaded
    Finalizing,
}

impl CaptureState {
    /// Get state name for logging
    pub fn state_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Recording { .. } => "Recording",
            Self::Finalizing => "Finalizing",
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Transition: Idle → Recording
    pub fn start(self, now: DateTime<Utc>) -> Result<Self, CaptureError> {
        match self {
            Self::Idle => Ok(Self::Recording { started_at: now }),
            other => Err(invalid("start recording", &other)),
        }
    }

    /// Transition: Recording → Finalizing
    pub fn stop(self) -> Result<Self, CaptureError> {
        match self {
            Self::Recording { .. } => Ok(Self::Finalizing),
            other => Err(invalid("stop recording", &other)),
        }
    }

    /// Transition: Finalizing → Idle
    pub fn finish(self) -> Result<Self, CaptureError> {
        match self {
            Self::Finalizing => Ok(Self::Idle),
            other => Err(invalid("finish recording", &other)),
        }
    }
}

fn invalid(action: &str, state: &CaptureState) -> CaptureError {
    CaptureError::InvalidTransition(format!(
        "Cannot {} from {} state",
        action,
        state.state_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_returns_to_idle() {
        let state = CaptureState::Idle
            .start(Utc::now())
            .unwrap()
            .stop()
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(state, CaptureState::Idle);
    }

    #[test]
    fn cannot_start_twice() {
        let recording = CaptureState::Idle.start(Utc::now()).unwrap();
        let err = recording.start(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("from Recording state"));
    }

    #[test]
    fn cannot_stop_when_idle() {
        assert!(matches!(
            CaptureState::Idle.stop(),
            Err(CaptureError::InvalidTransition(_))
        ));
    }

    #[test]
    fn cannot_finish_while_recording() {
        let recording = CaptureState::Idle.start(Utc::now()).unwrap();
        assert!(recording.finish().is_err());
    }
}
