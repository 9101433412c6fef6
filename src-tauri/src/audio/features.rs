// Acoustic feature extraction
// Short-time spectral statistics, energy, zero-crossing rate and tempo
// assembled into the fixed-length vector consumed by the predictors

use realfft::{RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audio::tempo::{self, TempoConfig};
use crate::audio::AudioData;

/// Number of distinct acoustic statistics
pub const STAT_COUNT: usize = 5;

/// Length of the predictor input: the statistics block, twice
pub const FEATURE_LEN: usize = STAT_COUNT * 2;

/// Power floor used when converting to decibels
const AMIN: f32 = 1e-10;

/// Short-time analysis parameters
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// FFT window size in samples (power of 2)
    pub n_fft: usize,

    /// Hop size in samples (advance between frames)
    pub hop_length: usize,

    /// Samples with magnitude at or below this count as zero for ZCR
    pub zcr_threshold: f32,

    /// Number of octave sub-bands above `contrast_fmin`
    pub contrast_bands: usize,

    /// Upper edge of the base contrast band in Hz
    pub contrast_fmin: f32,

    /// Fraction of bins averaged for band peak/valley
    pub contrast_quantile: f32,

    pub tempo: TempoConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            n_fft: 2048,
            hop_length: 512,
            zcr_threshold: 1e-10,
            contrast_bands: 6,
            contrast_fmin: 200.0,
            contrast_quantile: 0.02,
            tempo: TempoConfig::default(),
        }
    }
}

/// The five whole-track statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcousticFeatures {
    /// Estimated tempo in BPM (0 when no periodicity is found)
    pub tempo: f64,

    /// Mean squared amplitude
    pub energy: f64,

    /// Mean spectral centroid in Hz
    pub spectral_centroid: f64,

    /// Mean zero-crossing rate (crossings per sample)
    pub zero_crossing_rate: f64,

    /// Mean spectral contrast in dB
    pub spectral_contrast: f64,
}

impl AcousticFeatures {
    pub fn zero() -> Self {
        AcousticFeatures {
            tempo: 0.0,
            energy: 0.0,
            spectral_centroid: 0.0,
            zero_crossing_rate: 0.0,
            spectral_contrast: 0.0,
        }
    }

    /// Statistics in predictor column order
    pub fn as_array(&self) -> [f64; STAT_COUNT] {
        [
            self.tempo,
            self.energy,
            self.spectral_centroid,
            self.zero_crossing_rate,
            self.spectral_contrast,
        ]
    }
}

/// Predictor input: the statistics block followed by an identical copy
///
/// Both forests were fitted on two concatenated copies of the same block,
/// so the second half is copied, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_LEN]);

impl FeatureVector {
    pub fn from_features(features: &AcousticFeatures) -> Self {
        let block = features.as_array();
        let mut values = [0.0; FEATURE_LEN];
        values[..STAT_COUNT].copy_from_slice(&block);
        values[STAT_COUNT..].copy_from_slice(&block);
        FeatureVector(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The first (independently derived) half
    pub fn stats(&self) -> AcousticFeatures {
        AcousticFeatures {
            tempo: self.0[0],
            energy: self.0[1],
            spectral_centroid: self.0[2],
            zero_crossing_rate: self.0[3],
            spectral_contrast: self.0[4],
        }
    }
}

/// Extract the predictor input from decoded audio
pub fn extract_feature_vector(audio: &AudioData) -> FeatureVector {
    let mono = audio.to_mono();
    let features = extract_features(&mono, audio.sample_rate, &AnalysisConfig::default());
    FeatureVector::from_features(&features)
}

/// Compute the five statistics over a mono signal
pub fn extract_features(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> AcousticFeatures {
    if samples.is_empty() || sample_rate == 0 || config.n_fft == 0 || config.hop_length == 0 {
        return AcousticFeatures::zero();
    }

    let spectral = analyze_spectrum(samples, sample_rate, config);
    let frame_rate = sample_rate as f64 / config.hop_length as f64;
    let tempo = tempo::estimate_tempo(&spectral.onset_envelope, frame_rate, &config.tempo);
    log::debug!("Tempo {:.1} BPM (confidence {:.2})", tempo.bpm, tempo.confidence);

    AcousticFeatures {
        tempo: tempo.bpm,
        energy: calculate_energy(samples),
        spectral_centroid: spectral.mean_centroid,
        zero_crossing_rate: calculate_zcr(samples, config),
        spectral_contrast: spectral.mean_contrast,
    }
}

/// Mean squared amplitude
fn calculate_energy(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    sum / samples.len() as f64
}

/// Calculate mean frame-wise Zero-Crossing Rate
/// Frames are centred with edge padding; each frame's rate is
/// crossings / frame length
fn calculate_zcr(samples: &[f32], config: &AnalysisConfig) -> f64 {
    let frame_length = config.n_fft;
    let hop = config.hop_length;
    let pad = frame_length / 2;

    // Sign per sample after thresholding: true = negative
    let first = samples[0];
    let last = samples[samples.len() - 1];
    let negative = |x: f32| x.abs() > config.zcr_threshold && x < 0.0;

    let padded: Vec<bool> = std::iter::repeat(negative(first))
        .take(pad)
        .chain(samples.iter().map(|&x| negative(x)))
        .chain(std::iter::repeat(negative(last)).take(pad))
        .collect();

    if padded.len() < frame_length {
        return 0.0;
    }

    let num_frames = 1 + (padded.len() - frame_length) / hop;
    let mut total = 0.0;

    for frame_idx in 0..num_frames {
        let frame = &padded[frame_idx * hop..frame_idx * hop + frame_length];
        let crossings = frame.windows(2).filter(|w| w[0] != w[1]).count();
        total += crossings as f64 / frame_length as f64;
    }

    total / num_frames as f64
}

/// Frame-averaged spectral statistics plus the per-frame onset envelope
struct SpectralSummary {
    mean_centroid: f64,
    mean_contrast: f64,
    onset_envelope: Vec<f32>,
}

/// Single pass over centred STFT frames
fn analyze_spectrum(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> SpectralSummary {
    let n_fft = config.n_fft;
    let hop = config.hop_length;
    let pad = n_fft / 2;

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let window = hann_window(n_fft);
    let bands = contrast_bands(n_fft, sample_rate, config);
    let bin_width = sample_rate as f32 / n_fft as f32;

    let padded_len = samples.len() + 2 * pad;
    let num_frames = 1 + (padded_len - n_fft) / hop;

    let mut centroid_sum = 0.0f64;
    let mut contrast_sum = 0.0f64;
    let mut contrast_count = 0usize;
    let mut onset_envelope = Vec::with_capacity(num_frames);
    let mut prev_db: Option<Vec<f32>> = None;

    let mut frame = vec![0.0f32; n_fft];
    let mut spectrum = fft.make_output_vec();

    for frame_idx in 0..num_frames {
        fill_frame(samples, frame_idx * hop, pad, &window, &mut frame);
        let magnitudes = magnitude_spectrum(&fft, &mut frame, &mut spectrum);

        centroid_sum += spectral_centroid(&magnitudes, bin_width) as f64;

        for band in &bands {
            contrast_sum += band_contrast(&magnitudes, band) as f64;
            contrast_count += 1;
        }

        let db: Vec<f32> = magnitudes.iter().map(|m| power_to_db(m * m)).collect();
        let flux = match prev_db {
            Some(ref prev) => {
                let rise: f32 = db
                    .iter()
                    .zip(prev.iter())
                    .map(|(curr, prev)| (curr - prev).max(0.0))
                    .sum();
                rise / db.len() as f32
            }
            None => 0.0,
        };
        onset_envelope.push(flux);
        prev_db = Some(db);
    }

    SpectralSummary {
        mean_centroid: centroid_sum / num_frames as f64,
        mean_contrast: if contrast_count > 0 {
            contrast_sum / contrast_count as f64
        } else {
            0.0
        },
        onset_envelope,
    }
}

/// Copy one zero-padded, windowed frame starting at padded offset `start`
fn fill_frame(samples: &[f32], start: usize, pad: usize, window: &[f32], frame: &mut [f32]) {
    for (i, slot) in frame.iter_mut().enumerate() {
        let pos = start + i;
        let sample = if pos >= pad && pos - pad < samples.len() {
            samples[pos - pad]
        } else {
            0.0
        };
        *slot = sample * window[i];
    }
}

/// Periodic Hann window
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Compute real FFT of a windowed frame and return its magnitude spectrum
fn magnitude_spectrum(
    fft: &Arc<dyn RealToComplex<f32>>,
    frame: &mut [f32],
    spectrum: &mut [realfft::num_complex::Complex<f32>],
) -> Vec<f32> {
    // Lengths come from the same plan, so process cannot fail
    if fft.process(frame, spectrum).is_err() {
        return vec![0.0; spectrum.len()];
    }
    spectrum.iter().map(|c| c.norm()).collect()
}

/// Calculate spectral centroid (center of mass of spectrum) in Hz
fn spectral_centroid(spectrum: &[f32], bin_width: f32) -> f32 {
    let total_magnitude: f32 = spectrum.iter().sum();
    if total_magnitude <= 0.0 {
        return 0.0;
    }

    let weighted_sum: f32 = spectrum
        .iter()
        .enumerate()
        .map(|(i, &magnitude)| i as f32 * bin_width * magnitude)
        .sum();

    weighted_sum / total_magnitude
}

/// Bin layout of one contrast band
#[derive(Debug, Clone)]
struct ContrastBand {
    /// First bin (inclusive)
    start: usize,

    /// Bins whose magnitudes are sorted for peak/valley
    len: usize,

    /// Number of bins averaged at each end
    quantile_bins: usize,
}

/// Octave bands: [0, fmin], [fmin, 2 fmin], ... with the last band
/// extended to Nyquist. Each band above the first also takes the bin just
/// below its lower edge; all but the last drop their top bin.
fn contrast_bands(n_fft: usize, sample_rate: u32, config: &AnalysisConfig) -> Vec<ContrastBand> {
    let n_bins = n_fft / 2 + 1;
    let bin_width = sample_rate as f32 / n_fft as f32;
    let n_bands = config.contrast_bands;

    let mut edges = Vec::with_capacity(n_bands + 2);
    edges.push(0.0f32);
    for k in 0..=n_bands {
        edges.push(config.contrast_fmin * 2f32.powi(k as i32));
    }

    let mut bands = Vec::with_capacity(n_bands + 1);
    for k in 0..=n_bands {
        let (f_low, f_high) = (edges[k], edges[k + 1]);
        let in_band: Vec<usize> = (0..n_bins)
            .filter(|&i| {
                let f = i as f32 * bin_width;
                f >= f_low && f <= f_high
            })
            .collect();

        let (Some(&first), Some(&last)) = (in_band.first(), in_band.last()) else {
            continue;
        };

        let start = if k > 0 && first > 0 { first - 1 } else { first };
        let end = if k == n_bands { n_bins - 1 } else { last };
        let selected = end - start + 1;

        let len = if k < n_bands { selected - 1 } else { selected };
        if len == 0 {
            continue;
        }

        let quantile_bins = ((config.contrast_quantile * selected as f32).round() as usize)
            .max(1)
            .min(len);

        bands.push(ContrastBand {
            start,
            len,
            quantile_bins,
        });
    }

    bands
}

/// Peak-minus-valley level of one band in dB
fn band_contrast(spectrum: &[f32], band: &ContrastBand) -> f32 {
    let mut sorted = spectrum[band.start..band.start + band.len].to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q = band.quantile_bins;
    let valley = sorted[..q].iter().sum::<f32>() / q as f32;
    let peak = sorted[sorted.len() - q..].iter().sum::<f32>() / q as f32;

    power_to_db(peak) - power_to_db(valley)
}

fn power_to_db(power: f32) -> f32 {
    10.0 * power.max(AMIN).log10()
}
