//! Canned audio clips and compressed audio decoding
//!
//! Startup and rebuke clips ship as WAV or MP3 files; both decode to the
//! mono f32 samples the playback engine consumes.

use std::io::Cursor;
use std::path::Path;

use crate::{Error, Result};

/// Decoded mono audio ready for playback
#[derive(Debug, Clone)]
pub struct Clip {
    /// Mono PCM samples in `[-1.0, 1.0]`
    pub samples: Vec<f32>,
    /// Sample rate, Hz
    pub sample_rate: u32,
}

/// Load an audio clip from a WAV or MP3 file, picked by extension
///
/// # Errors
///
/// Returns error if the file cannot be read or decoded
pub fn load(path: &Path) -> Result<Clip> {
    let bytes = std::fs::read(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp3") => decode_mp3(&bytes),
        _ => decode_wav(&bytes),
    }
}

/// Decode WAV bytes to mono f32 samples
///
/// Integer and float sample formats are accepted; multi-channel audio is
/// mixed down by averaging each frame.
///
/// # Errors
///
/// Returns error if the bytes are not decodable WAV
#[allow(clippy::cast_precision_loss)]
pub fn decode_wav(bytes: &[u8]) -> Result<Clip> {
    let mut reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Audio(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Audio(e.to_string()))?
        }
    };

    let samples = mix_down(raw, channels);
    Ok(Clip {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Decode MP3 bytes to mono f32 samples
///
/// # Errors
///
/// Returns error if the bytes contain no decodable audio
pub fn decode_mp3(bytes: &[u8]) -> Result<Clip> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(bytes));
    let mut samples = Vec::new();
    let mut sample_rate = 0_u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if sample_rate == 0 {
                    sample_rate = u32::try_from(frame.sample_rate).unwrap_or_default();
                }
                if frame.channels == 2 {
                    // Stereo: average channels
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(Error::Audio("MP3 contained no audio".to_string()));
    }
    Ok(Clip {
        samples,
        sample_rate,
    })
}

/// Average multi-channel frames into mono
#[allow(clippy::cast_precision_loss)]
fn mix_down(raw: Vec<f32>, channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return raw;
    }
    raw.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_wav(channels: u16, sample_rate: u32, samples: &[f32]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    fn int_wav(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_decode_float_wav() {
        let bytes = float_wav(1, 24000, &[0.5, -0.5, 0.25]);

        let clip = decode_wav(&bytes).unwrap();
        assert_eq!(clip.sample_rate, 24000);
        assert_eq!(clip.samples, vec![0.5, -0.5, 0.25]);
    }

    #[test]
    fn test_decode_int_wav_scales_to_unit_range() {
        let bytes = int_wav(16000, &[0, 16384, -16384]);

        let clip = decode_wav(&bytes).unwrap();
        assert_eq!(clip.sample_rate, 16000);
        assert_eq!(clip.samples, vec![0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_decode_stereo_wav_mixes_down() {
        let bytes = float_wav(2, 44100, &[1.0, 0.0, -1.0, 0.0]);

        let clip = decode_wav(&bytes).unwrap();
        assert_eq!(clip.samples, vec![0.5, -0.5]);
    }

    #[test]
    fn test_decode_mp3_rejects_garbage() {
        assert!(decode_mp3(b"definitely not an mp3").is_err());
    }

    #[test]
    fn test_decode_wav_rejects_garbage() {
        assert!(decode_wav(b"definitely not a wav").is_err());
    }
}
