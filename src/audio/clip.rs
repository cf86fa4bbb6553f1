//! Decoding of the WAV clips behind the named channels

use super::resampler::ClipResampler;
use crate::{Result, SeanceError};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Decoded mono audio ready for a mixer voice
#[derive(Clone, Debug)]
pub struct Clip {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
}

impl Clip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Read a WAV file as interleaved f32 samples
///
/// Returns (samples, sample_rate, channels).
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32, u16)> {
    let mut reader = WavReader::open(path.as_ref())
        .map_err(|e| SeanceError::IOError(format!("Failed to open WAV file: {}", e)))?;

    let spec = reader.spec();
    debug!(
        "Reading WAV file {:?}: {} Hz, {} channels, {} bits",
        path.as_ref(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    let read_err = |e: hound::Error| SeanceError::IOError(format!("Failed to read sample: {}", e));

    let samples: Result<Vec<f32>> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader.samples::<f32>().map(|s| s.map_err(read_err)).collect(),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / i8::MAX as f32).map_err(read_err))
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / i16::MAX as f32).map_err(read_err))
            .collect(),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_608.0).map_err(read_err))
            .collect(),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / i32::MAX as f32).map_err(read_err))
            .collect(),
        (SampleFormat::Int, bits) => {
            return Err(SeanceError::AudioProcessingError(format!(
                "Unsupported bit depth: {}",
                bits
            )))
        }
    };

    Ok((samples?, spec.sample_rate, spec.channels))
}

/// Average interleaved frames down to one channel
pub fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Load a clip as mono at `target_rate`
pub fn load_clip<P: AsRef<Path>>(path: P, target_rate: u32) -> Result<Clip> {
    let (samples, sample_rate, channels) = read_wav(&path)?;
    let mono = to_mono(&samples, channels);

    let samples = if sample_rate != target_rate {
        ClipResampler::new(sample_rate, target_rate)?.resample(&mono)?
    } else {
        mono
    };

    let clip = Clip::new(samples, target_rate);
    info!(
        "Loaded clip {:?} ({:.2}s)",
        path.as_ref(),
        clip.duration().as_secs_f32()
    );
    Ok(clip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use std::f32::consts::PI;

    fn write_sine(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let v = (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin() * 0.5;
            for _ in 0..channels {
                writer.write_sample((v * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_clip_same_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("laugh.wav");
        write_sine(&path, 22050, 2, 22050);

        let clip = load_clip(&path, 22050).unwrap();
        assert_eq!(clip.samples.len(), 22050);
        assert!((clip.duration().as_secs_f32() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_load_clip_resamples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chaos.wav");
        write_sine(&path, 16000, 1, 16000);

        let clip = load_clip(&path, 48000).unwrap();
        assert_eq!(clip.sample_rate, 48000);
        assert!((clip.duration().as_secs_f32() - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_clip("/nonexistent/background.wav", 44100),
            Err(SeanceError::IOError(_))
        ));
    }

    #[test]
    fn test_to_mono() {
        let stereo = vec![0.5, 0.3, 0.7, 0.1];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.4).abs() < 0.001);
        assert!((mono[1] - 0.4).abs() < 0.001);
    }
}
