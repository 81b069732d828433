use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::wav::encode_wav;
use super::{AudioInput, CaptureError, CaptureState, Recording};
use crate::codec::{self, VoiceNotice};
use crate::draft::SharedDraft;
use crate::error::{FeedError, Operation};
use crate::remote::{Bucket, RemoteStore};

const WAV_CONTENT_TYPE: &str = "audio/wav";

/// What a finished recording left in the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    Attached(String),
    Failed(VoiceNotice),
}

impl VoiceOutcome {
    pub fn apply(&self, text: &mut String) {
        match self {
            VoiceOutcome::Attached(url) => codec::append_reference(text, url),
            VoiceOutcome::Failed(notice) => codec::append_notice(text, *notice),
        }
    }
}

/// One recording lifecycle bound to a draft.
pub struct CaptureSession {
    input: Arc<dyn AudioInput>,
    remote: Arc<dyn RemoteStore>,
    draft: SharedDraft,
    file_prefix: String,
    state: CaptureState,
    recording: Option<Box<dyn Recording>>,
}

impl CaptureSession {
    pub fn new(
        input: Arc<dyn AudioInput>,
        remote: Arc<dyn RemoteStore>,
        draft: SharedDraft,
        file_prefix: impl Into<String>,
    ) -> Self {
        Self {
            input,
            remote,
            draft,
            file_prefix: file_prefix.into(),
            state: CaptureState::Idle,
            recording: None,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    /// Acquire the input device. A no-op while already recording.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state.is_recording() {
            debug!("Recording already active, ignoring start");
            return Ok(());
        }
        if self.state == CaptureState::Finalizing {
            // A stop that was dropped before finishing; its recording is gone.
            warn!("Previous recording was abandoned while finalizing");
            self.state = CaptureState::Idle;
        }

        let next = self.state.clone().start(Utc::now())?;
        let recording = self.input.open().await.map_err(|e| {
            warn!(error = %e, "Could not open audio input");
            e
        })?;

        self.recording = Some(recording);
        self.state = next;
        info!("Recording started");
        Ok(())
    }

    /// Stop, encode, upload and embed the result into the draft.
    /// Returns `None` when nothing was recording.
    pub async fn stop(&mut self) -> Result<Option<VoiceOutcome>, CaptureError> {
        let Some(recording) = self.recording.take() else {
            return Ok(None);
        };
        self.state = self.state.clone().stop()?;

        let outcome = self.finalize(recording).await;
        {
            let mut draft = self.draft.lock().await;
            outcome.apply(&mut draft.text);
        }

        self.state = self.state.clone().finish()?;
        info!(outcome = ?outcome, "Recording finalized");
        Ok(Some(outcome))
    }

    async fn finalize(&self, recording: Box<dyn Recording>) -> VoiceOutcome {
        let payload = match recording.stop().await.and_then(|audio| encode_wav(&audio)) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Could not build audio payload");
                return VoiceOutcome::Failed(VoiceNotice::RecordingCompleted);
            }
        };

        let path = format!(
            "{}{}.wav",
            self.file_prefix,
            Utc::now().timestamp_millis()
        );
        match self
            .remote
            .upload_blob(Bucket::Audio, &path, payload, WAV_CONTENT_TYPE)
            .await
        {
            Ok(url) => VoiceOutcome::Attached(url),
            Err(e) => {
                let error = FeedError::remote(Operation::UploadAudio, e);
                warn!(error = %error, path = %path, "Audio upload failed");
                VoiceOutcome::Failed(VoiceNotice::UploadFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{BufferedRecording, CapturedAudio};
    use crate::draft::Draft;
    use crate::remote::{MemoryStore, RemoteError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingInput {
        opened: AtomicUsize,
    }

    #[async_trait]
    impl AudioInput for CountingInput {
        async fn open(&self) -> Result<Box<dyn Recording>, CaptureError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(BufferedRecording::new(CapturedAudio {
                sample_rate: 8000,
                channels: 1,
                chunks: vec![vec![1, 2, 3]],
            })))
        }
    }

    fn session(input: Arc<CountingInput>, remote: Arc<MemoryStore>) -> CaptureSession {
        CaptureSession::new(input, remote, Draft::new("hi").shared(), "voice-")
    }

    #[tokio::test]
    async fn second_start_is_ignored_while_recording() {
        let input = Arc::new(CountingInput {
            opened: AtomicUsize::new(0),
        });
        let mut session = session(input.clone(), Arc::new(MemoryStore::new()));

        session.start().await.unwrap();
        session.start().await.unwrap();
        assert_eq!(input.opened.load(Ordering::SeqCst), 1);
        assert!(session.is_recording());
    }

    #[tokio::test]
    async fn stop_while_idle_does_nothing() {
        let input = Arc::new(CountingInput {
            opened: AtomicUsize::new(0),
        });
        let mut session = session(input, Arc::new(MemoryStore::new()));
        assert_eq!(session.stop().await.unwrap(), None);
        assert_eq!(session.state(), &CaptureState::Idle);
    }

    #[tokio::test]
    async fn upload_lands_in_audio_bucket_with_prefix() {
        let remote = Arc::new(MemoryStore::new());
        let input = Arc::new(CountingInput {
            opened: AtomicUsize::new(0),
        });
        let mut session = session(input, remote.clone());

        session.start().await.unwrap();
        let Some(VoiceOutcome::Attached(url)) = session.stop().await.unwrap() else {
            panic!("expected an attached recording");
        };

        let path = url.rsplit('/').next().unwrap();
        assert!(path.starts_with("voice-") && path.ends_with(".wav"));
        let (_, content_type) = remote.blob(Bucket::Audio, path).await.unwrap();
        assert_eq!(content_type, "audio/wav");
        assert_eq!(session.state(), &CaptureState::Idle);
    }

    /// Upload that never completes.
    struct StalledStore;

    #[async_trait]
    impl RemoteStore for StalledStore {
        async fn query_posts(&self) -> Result<Vec<crate::models::Post>, RemoteError> {
            Ok(Vec::new())
        }

        async fn insert_post(
            &self,
            _post: &crate::models::NewPost,
        ) -> Result<crate::models::Post, RemoteError> {
            Err(RemoteError::Unavailable)
        }

        async fn insert_comment(
            &self,
            _comment: &crate::models::NewComment,
        ) -> Result<(), RemoteError> {
            Err(RemoteError::Unavailable)
        }

        async fn insert_like(&self, _post_id: &crate::models::PostId) -> Result<(), RemoteError> {
            Err(RemoteError::Unavailable)
        }

        async fn link_image(
            &self,
            _post_id: &crate::models::PostId,
            _url: &str,
        ) -> Result<(), RemoteError> {
            Err(RemoteError::Unavailable)
        }

        async fn upload_blob(
            &self,
            _bucket: Bucket,
            _path: &str,
            _bytes: bytes::Bytes,
            _content_type: &str,
        ) -> Result<String, RemoteError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_recovers_after_abandoned_stop() {
        let input = Arc::new(CountingInput {
            opened: AtomicUsize::new(0),
        });
        let draft = Draft::new("hi").shared();
        let mut session =
            CaptureSession::new(input.clone(), Arc::new(StalledStore), draft.clone(), "voice-");

        session.start().await.unwrap();
        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), session.stop()).await;
        assert!(abandoned.is_err());
        assert_eq!(session.state(), &CaptureState::Finalizing);

        session.start().await.unwrap();
        assert!(session.is_recording());
        assert_eq!(input.opened.load(Ordering::SeqCst), 2);
        assert_eq!(draft.lock().await.text, "hi");
    }

    #[test]
    fn failed_outcome_appends_notice() {
        let mut text = "hello".to_string();
        VoiceOutcome::Failed(VoiceNotice::RecordingCompleted).apply(&mut text);
        assert_eq!(text, "hello 🔊 Voice message (recording completed)");
    }
}
