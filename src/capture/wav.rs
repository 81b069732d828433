use async_trait::async_trait;
use bytes::Bytes;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use std::path::PathBuf;

use super::{AudioInput, CaptureError, CapturedAudio, Recording};

/// Encode buffered chunks as one 16-bit PCM WAV payload.
pub fn encode_wav(audio: &CapturedAudio) -> Result<Bytes, CaptureError> {
    if audio.channels == 0 || audio.sample_rate == 0 {
        return Err(CaptureError::Device(
            "recording has no channel layout".to_string(),
        ));
    }

    let spec = WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in audio.chunks.iter().flatten() {
            writer.write_sample(*sample)?;
        }
        writer.finalize()?;
    }
    Ok(Bytes::from(cursor.into_inner()))
}

pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Chunk size used when replaying a file as a recording.
const CHUNK_FRAMES: usize = 4096;

/// Treats an existing WAV file as the audio source.
pub struct WavFileInput {
    path: PathBuf,
}

impl WavFileInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AudioInput for WavFileInput {
    async fn open(&self) -> Result<Box<dyn Recording>, CaptureError> {
        let path = self.path.clone();
        let audio = tokio::task::spawn_blocking(move || read_wav(&path))
            .await
            .map_err(|e| CaptureError::Device(e.to_string()))??;
        Ok(Box::new(BufferedRecording::new(audio)))
    }
}

fn read_wav(path: &std::path::Path) -> Result<CapturedAudio, CaptureError> {
    let mut reader = WavReader::open(path).map_err(|e| match e {
        hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
            CaptureError::PermissionDenied(io.to_string())
        }
        hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            CaptureError::NoDevice
        }
        other => CaptureError::Encode(other),
    })?;
    let spec = reader.spec();

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| s.map(f32_to_i16))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits) if bits <= 16 => {
            reader.samples::<i16>().collect::<Result<_, _>>()?
        }
        (SampleFormat::Int, bits) => {
            let shift = bits - 16;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> shift) as i16))
                .collect::<Result<_, _>>()?
        }
    };

    let chunk_len = CHUNK_FRAMES * spec.channels.max(1) as usize;
    Ok(CapturedAudio {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        chunks: samples.chunks(chunk_len).map(<[i16]>::to_vec).collect(),
    })
}

/// A recording whose audio is already in memory.
pub struct BufferedRecording {
    audio: CapturedAudio,
}

impl BufferedRecording {
    pub fn new(audio: CapturedAudio) -> Self {
        Self { audio }
    }
}

#[async_trait]
impl Recording for BufferedRecording {
    async fn stop(self: Box<Self>) -> Result<CapturedAudio, CaptureError> {
        Ok(self.audio)
    }
}
