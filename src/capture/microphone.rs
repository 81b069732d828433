// Default input device via cpal. Streams are !Send, so each recording owns a
// dedicated thread that holds the stream until stop is requested.
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use std::sync::mpsc;
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::wav::f32_to_i16;
use super::{AudioInput, CaptureError, CapturedAudio, Recording};

#[derive(Debug, Default)]
pub struct Microphone;

impl Microphone {
    pub fn new() -> Self {
        Self
    }
}

struct StreamInfo {
    sample_rate: u32,
    channels: u16,
}

pub struct MicrophoneRecording {
    info: StreamInfo,
    stop_tx: mpsc::Sender<()>,
    chunks_rx: mpsc::Receiver<Vec<i16>>,
    thread: JoinHandle<()>,
}

#[async_trait]
impl AudioInput for Microphone {
    async fn open(&self) -> Result<Box<dyn Recording>, CaptureError> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (chunks_tx, chunks_rx) = mpsc::channel::<Vec<i16>>();

        let thread = std::thread::spawn(move || {
            let stream = match build_stream(chunks_tx) {
                Ok((stream, info)) => {
                    let _ = ready_tx.send(Ok(info));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            // Blocks until stop is sent or the recording is dropped.
            let _ = stop_rx.recv();
            drop(stream);
        });

        let info = ready_rx
            .await
            .map_err(|_| CaptureError::Device("input thread exited".to_string()))??;
        info!(
            sample_rate = info.sample_rate,
            channels = info.channels,
            "Microphone opened"
        );

        Ok(Box::new(MicrophoneRecording {
            info,
            stop_tx,
            chunks_rx,
            thread,
        }))
    }
}

#[async_trait]
impl Recording for MicrophoneRecording {
    async fn stop(self: Box<Self>) -> Result<CapturedAudio, CaptureError> {
        let MicrophoneRecording {
            info,
            stop_tx,
            chunks_rx,
            thread,
        } = *self;
        let _ = stop_tx.send(());

        let chunks = tokio::task::spawn_blocking(move || {
            if thread.join().is_err() {
                warn!("Microphone thread panicked");
            }
            chunks_rx.try_iter().collect::<Vec<_>>()
        })
        .await
        .map_err(|e| CaptureError::Device(e.to_string()))?;

        Ok(CapturedAudio {
            sample_rate: info.sample_rate,
            channels: info.channels,
            chunks,
        })
    }
}

fn build_stream(
    chunks_tx: mpsc::Sender<Vec<i16>>,
) -> Result<(cpal::Stream, StreamInfo), CaptureError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;
    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let info = StreamInfo {
        sample_rate: config.sample_rate.0,
        channels: config.channels,
    };

    let on_error = |e: cpal::StreamError| warn!(error = %e, "Microphone stream error");
    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = chunks_tx.send(data.iter().copied().map(f32_to_i16).collect());
            },
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let _ = chunks_tx.send(data.to_vec());
            },
            on_error,
            None,
        ),
        other => {
            return Err(CaptureError::Device(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(|e| CaptureError::Device(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::Device(e.to_string()))?;
    Ok((stream, info))
}
