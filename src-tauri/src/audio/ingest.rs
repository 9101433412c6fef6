// Audio ingestion module
// Decodes WAV/MP3/FLAC files into normalized interleaved f32 samples

use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// File extensions accepted by the decoder (lowercase)
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["wav", "mp3", "flac"];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open audio file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read WAV file: {0}")]
    Wav(#[from] hound::Error),

    #[error("Failed to decode audio stream: {0}")]
    Codec(#[from] SymphoniaError),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Audio file contains no samples")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct AudioData {
    /// Interleaved samples normalized to f32 in range [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in milliseconds
    pub duration_ms: i64,

    /// Total number of frames (samples / channels)
    pub frame_count: usize,
}

impl AudioData {
    /// Build from interleaved samples, deriving frame count and duration
    pub fn from_interleaved(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.max(1);
        let frame_count = samples.len() / channels as usize;
        let duration_ms = if sample_rate > 0 {
            (frame_count as f64 * 1000.0 / sample_rate as f64) as i64
        } else {
            0
        };

        AudioData {
            samples,
            sample_rate,
            channels,
            duration_ms,
            frame_count,
        }
    }

    /// Get duration in seconds as f64
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    /// Convert to mono by averaging channels
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let channels = self.channels as usize;
        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

/// Lowercased extension of `path` if it is one the decoder accepts
pub fn supported_extension(path: &Path) -> Result<String, DecodeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(DecodeError::UnsupportedFormat(format!(
            "'{}' (expected one of: {})",
            path.display(),
            SUPPORTED_EXTENSIONS.join(", ")
        )))
    }
}

/// Decode an audio file at its native sample rate
pub fn decode_file(path: &Path) -> Result<AudioData, DecodeError> {
    let ext = supported_extension(path)?;
    let file = File::open(path)?;

    let audio = if ext == "wav" {
        ingest_wav(BufReader::new(file))?
    } else {
        decode_compressed(file, &ext)?
    };

    if audio.frame_count == 0 {
        return Err(DecodeError::Empty);
    }

    log::debug!(
        "Decoded {}: {} Hz, {} channels, {:.2} s",
        path.display(),
        audio.sample_rate,
        audio.channels,
        audio.duration_secs()
    );

    Ok(audio)
}

/// Read a WAV stream and normalize its samples
pub fn ingest_wav<R: Read>(reader: R) -> Result<AudioData, DecodeError> {
    let mut reader = WavReader::new(reader)?;

    let spec = reader.spec();
    let bit_depth = spec.bits_per_sample;
    let sample_format = spec.sample_format;

    let samples: Vec<f32> = match (sample_format, bit_depth) {
        (SampleFormat::Int, 8) => {
            // hound yields 8-bit PCM already re-centred to signed
            reader
                .samples::<i8>()
                .map(|s| s.map(|s| s as f32 / 128.0))
                .collect::<Result<_, _>>()?
        }
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|s| s as f32 / 8388608.0))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|s| s as f32 / 2147483648.0))
            .collect::<Result<_, _>>()?,
        (SampleFormat::Float, 32) => reader.samples::<f32>().collect::<Result<_, _>>()?,
        _ => {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{:?} {}-bit WAV",
                sample_format, bit_depth
            )));
        }
    };

    Ok(AudioData::from_interleaved(
        samples,
        spec.sample_rate,
        spec.channels,
    ))
}

/// Decode MP3/FLAC through symphonia's probe and codec registry
fn decode_compressed(source: File, ext: &str) -> Result<AudioData, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(ext);

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::UnsupportedFormat("no decodable audio track".to_string()))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count() as u16).unwrap_or(0);

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    let mut buffer: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt frame: skip it, as players do
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = spec.channels.count() as u16;

        let buf = buffer.get_or_insert_with(|| {
            SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
        });
        if buf.capacity() < decoded.capacity() * spec.channels.count() {
            *buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        }
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    if sample_rate == 0 || channels == 0 {
        return Err(DecodeError::Empty);
    }

    Ok(AudioData::from_interleaved(samples, sample_rate, channels))
}
