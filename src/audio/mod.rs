//! Audio validation and normalization
//!
//! Uploaded audio is sniffed, checked against the supported-format
//! allow-list, and converted to the canonical encoding the transcription
//! providers expect: 16 kHz mono 16-bit PCM WAV. Formats the providers
//! accept natively (ogg, flac, m4a, webm) pass through untouched.

use std::io::Cursor;

use crate::{Error, Result};

/// Canonical sample rate for speech audio (16 kHz)
pub const CANONICAL_SAMPLE_RATE: u32 = 16_000;

/// Audio container formats accepted at the API boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
    M4a,
    Webm,
}

impl AudioFormat {
    /// All supported upload formats, by extension
    pub const SUPPORTED: &'static [Self] = &[
        Self::Wav,
        Self::Mp3,
        Self::Ogg,
        Self::Flac,
        Self::M4a,
        Self::Webm,
    ];

    /// Parse from a file extension (without the dot)
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Some(Self::Wav),
            "mp3" | "mpga" => Some(Self::Mp3),
            "ogg" | "oga" | "opus" => Some(Self::Ogg),
            "flac" => Some(Self::Flac),
            "m4a" | "mp4" => Some(Self::M4a),
            "webm" => Some(Self::Webm),
            _ => None,
        }
    }

    /// Parse from a MIME type
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "audio/wav" | "audio/wave" | "audio/x-wav" => Some(Self::Wav),
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/ogg" | "audio/opus" => Some(Self::Ogg),
            "audio/flac" | "audio/x-flac" => Some(Self::Flac),
            "audio/mp4" | "audio/x-m4a" | "audio/m4a" => Some(Self::M4a),
            "audio/webm" | "video/webm" => Some(Self::Webm),
            _ => None,
        }
    }

    /// Identify the container from magic bytes
    #[must_use]
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE" {
            return Some(Self::Wav);
        }
        if data.starts_with(b"OggS") {
            return Some(Self::Ogg);
        }
        if data.starts_with(b"fLaC") {
            return Some(Self::Flac);
        }
        if data.starts_with(b"ID3") {
            return Some(Self::Mp3);
        }
        if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(Self::Webm);
        }
        if data.len() >= 8 && &data[4..8] == b"ftyp" {
            return Some(Self::M4a);
        }
        // MPEG audio frame sync (11 set bits)
        if data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0 {
            return Some(Self::Mp3);
        }
        None
    }

    /// Canonical file extension
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::M4a => "m4a",
            Self::Webm => "webm",
        }
    }

    /// MIME type for outbound provider uploads
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::M4a => "audio/mp4",
            Self::Webm => "audio/webm",
        }
    }
}

/// A request-scoped audio payload: raw bytes plus their container format
#[derive(Clone, Debug)]
pub struct AudioBlob {
    pub data: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioBlob {
    #[must_use]
    pub const fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    /// Filename to present to providers that infer format from the name
    #[must_use]
    pub fn filename(&self) -> String {
        format!("audio.{}", self.format.extension())
    }
}

/// Determine the format of an uploaded payload
///
/// Magic bytes win over the declared filename/content-type; the declaration
/// is only consulted when the bytes are inconclusive.
///
/// # Errors
///
/// Returns [`Error::Decode`] for an empty payload and
/// [`Error::UnsupportedFormat`] when neither the bytes nor the declaration
/// match the allow-list.
pub fn detect_format(
    filename: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<AudioFormat> {
    if data.is_empty() {
        return Err(Error::Decode("empty audio buffer".to_string()));
    }

    if let Some(format) = AudioFormat::sniff(data) {
        return Ok(format);
    }

    let declared_ext = filename.and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext));
    if let Some(format) = declared_ext.and_then(AudioFormat::from_extension) {
        return Ok(format);
    }
    if let Some(format) = content_type.and_then(AudioFormat::from_mime) {
        return Ok(format);
    }

    let declared = declared_ext
        .map(str::to_string)
        .or_else(|| content_type.map(str::to_string))
        .unwrap_or_else(|| "unrecognized data".to_string());
    Err(Error::UnsupportedFormat(declared))
}

/// Normalize an audio payload to the canonical encoding
///
/// WAV and MP3 inputs are decoded, downmixed to mono, resampled to 16 kHz,
/// and re-encoded as 16-bit PCM WAV. Other supported containers are passed
/// through unchanged; the transcription providers decode them natively.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the payload cannot be decoded.
pub fn normalize(blob: AudioBlob) -> Result<AudioBlob> {
    match blob.format {
        AudioFormat::Wav => {
            let (samples, sample_rate) = wav_to_samples(&blob.data)?;
            let resampled = resample_if_needed(samples, sample_rate)?;
            let data = samples_to_wav(&resampled, CANONICAL_SAMPLE_RATE)?;
            Ok(AudioBlob::new(data, AudioFormat::Wav))
        }
        AudioFormat::Mp3 => {
            let (samples, sample_rate) = mp3_to_samples(&blob.data)?;
            let resampled = resample_if_needed(samples, sample_rate)?;
            let data = samples_to_wav(&resampled, CANONICAL_SAMPLE_RATE)?;
            Ok(AudioBlob::new(data, AudioFormat::Wav))
        }
        AudioFormat::Ogg | AudioFormat::Flac | AudioFormat::M4a | AudioFormat::Webm => Ok(blob),
    }
}

/// Decode WAV bytes into mono f32 samples and the source sample rate
#[allow(clippy::cast_precision_loss)]
fn wav_to_samples(data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::new(Cursor::new(data)).map_err(|e| Error::Decode(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Decode(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = f32::from(i16::MAX);
            match spec.bits_per_sample {
                16 => reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| f32::from(v) / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| Error::Decode(e.to_string()))?,
                24 | 32 => {
                    let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                    reader
                        .samples::<i32>()
                        .map(|s| s.map(|v| v as f32 / scale))
                        .collect::<std::result::Result<_, _>>()
                        .map_err(|e| Error::Decode(e.to_string()))?
                }
                bits => {
                    return Err(Error::Decode(format!("unsupported WAV bit depth: {bits}")));
                }
            }
        }
    };

    if samples.is_empty() {
        return Err(Error::Decode("WAV contains no samples".to_string()));
    }

    Ok((downmix(samples, spec.channels), spec.sample_rate))
}

/// Decode MP3 bytes into mono f32 samples and the source sample rate
#[allow(clippy::cast_sign_loss)]
fn mp3_to_samples(data: &[u8]) -> Result<(Vec<f32>, u32)> {
    let mut decoder = minimp3::Decoder::new(data);
    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = CANONICAL_SAMPLE_RATE;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                sample_rate = frame.sample_rate as u32;
                if frame.channels == 2 {
                    for chunk in frame.data.chunks(2) {
                        let mono = f32::midpoint(f32::from(chunk[0]), f32::from(chunk[1])) / 32768.0;
                        samples.push(mono);
                    }
                } else {
                    for &s in &frame.data {
                        samples.push(f32::from(s) / 32768.0);
                    }
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Decode(format!("MP3 decode error: {e}"))),
        }
    }

    if samples.is_empty() {
        return Err(Error::Decode("no audio frames in MP3 data".to_string()));
    }

    Ok((samples, sample_rate))
}

/// Average interleaved channels down to mono
fn downmix(samples: Vec<f32>, channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples;
    }
    let channels = usize::from(channels);
    samples
        .chunks(channels)
        .map(|frame| {
            #[allow(clippy::cast_precision_loss)]
            let n = frame.len() as f32;
            frame.iter().sum::<f32>() / n
        })
        .collect()
}

fn resample_if_needed(samples: Vec<f32>, sample_rate: u32) -> Result<Vec<f32>> {
    if sample_rate == CANONICAL_SAMPLE_RATE {
        Ok(samples)
    } else {
        resample(&samples, sample_rate, CANONICAL_SAMPLE_RATE)
    }
}

/// Resample audio using rubato
#[allow(clippy::cast_possible_truncation)]
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    use rubato::{FftFixedIn, Resampler};

    let chunk_size = 1024;
    let sub_chunks = 2;

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, chunk_size, sub_chunks, 1)
            .map_err(|e| Error::Decode(format!("resampler init failed: {e}")))?;

    let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();

    let mut output = Vec::new();

    for chunk in input.chunks(chunk_size) {
        // Zero-pad the final partial chunk so the tail is not dropped
        let frame = if chunk.len() == chunk_size {
            chunk.to_vec()
        } else {
            let mut padded = chunk.to_vec();
            padded.resize(chunk_size, 0.0);
            padded
        };
        let result = resampler
            .process(&[frame], None)
            .map_err(|e| Error::Decode(format!("resample failed: {e}")))?;
        output.extend_from_slice(&result[0]);
    }

    Ok(output.iter().map(|&s| s as f32).collect())
}

/// Encode f32 samples as 16-bit PCM WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Decode(e.to_string()))?;

        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Decode(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Decode(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
