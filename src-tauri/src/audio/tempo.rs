// Tempo Estimation - global BPM from the onset-strength envelope
// Autocorrelation of the envelope weighted by a log-normal tempo prior

use serde::{Deserialize, Serialize};

/// Tempo estimation result
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Estimated beats per minute (0.0 when no periodic structure exists)
    pub bpm: f64,

    /// Normalized autocorrelation at the chosen lag [0.0, 1.0]
    pub confidence: f32,
}

impl TempoEstimate {
    fn none() -> Self {
        TempoEstimate {
            bpm: 0.0,
            confidence: 0.0,
        }
    }
}

/// Configuration for tempo estimation
#[derive(Debug, Clone)]
pub struct TempoConfig {
    /// Minimum BPM to consider
    pub min_bpm: f64,

    /// Maximum BPM to consider
    pub max_bpm: f64,

    /// Centre of the log-normal tempo prior
    pub prior_bpm: f64,

    /// Width of the prior in octaves
    pub prior_octaves: f64,

    /// Moving-average width applied to the envelope (frames)
    pub smoothing_frames: usize,
}

impl Default for TempoConfig {
    fn default() -> Self {
        TempoConfig {
            min_bpm: 30.0,
            max_bpm: 300.0,
            prior_bpm: 120.0,
            prior_octaves: 1.0,
            smoothing_frames: 3,
        }
    }
}

/// Estimate tempo from an onset envelope sampled at `frame_rate` frames/s
///
/// Algorithm:
/// 1. Smooth the envelope
/// 2. Unbiased autocorrelation over lags in the BPM range
/// 3. Weight each lag by the tempo prior
/// 4. Pick the best-scoring lag
pub fn estimate_tempo(envelope: &[f32], frame_rate: f64, config: &TempoConfig) -> TempoEstimate {
    if envelope.len() < 2 || frame_rate <= 0.0 || config.min_bpm <= 0.0 || config.max_bpm <= config.min_bpm {
        return TempoEstimate::none();
    }

    let smoothed = smooth_envelope(envelope, config.smoothing_frames);

    let min_lag = ((60.0 * frame_rate / config.max_bpm).ceil() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / config.min_bpm).floor() as usize).min(smoothed.len() - 1);
    if max_lag <= min_lag {
        return TempoEstimate::none();
    }

    let zero_lag = autocorrelation(&smoothed, 0);
    if zero_lag <= 0.0 || !zero_lag.is_finite() {
        return TempoEstimate::none();
    }

    let mut best: Option<(usize, f64, f64)> = None;
    for lag in min_lag..=max_lag {
        let ac = autocorrelation(&smoothed, lag) / zero_lag;
        let bpm = 60.0 * frame_rate / lag as f64;
        let score = ac * tempo_prior(bpm, config);

        if best.map_or(true, |(_, best_score, _)| score > best_score) {
            best = Some((lag, score, ac));
        }
    }

    match best {
        Some((lag, score, ac)) if score > 0.0 => TempoEstimate {
            bpm: 60.0 * frame_rate / lag as f64,
            confidence: ac.clamp(0.0, 1.0) as f32,
        },
        _ => TempoEstimate::none(),
    }
}

/// Smooth envelope using moving average filter
fn smooth_envelope(envelope: &[f32], window_size: usize) -> Vec<f64> {
    let half_window = window_size / 2;
    let mut smoothed = vec![0.0f64; envelope.len()];

    for i in 0..envelope.len() {
        let start = i.saturating_sub(half_window);
        let end = (i + half_window + 1).min(envelope.len());
        let sum: f64 = envelope[start..end].iter().map(|&v| v as f64).sum();
        smoothed[i] = sum / (end - start) as f64;
    }

    smoothed
}

/// Unbiased autocorrelation at one lag
fn autocorrelation(signal: &[f64], lag: usize) -> f64 {
    if lag >= signal.len() {
        return 0.0;
    }

    let n = signal.len() - lag;
    let sum: f64 = signal[..n]
        .iter()
        .zip(&signal[lag..])
        .map(|(a, b)| a * b)
        .sum();
    sum / n as f64
}

/// Log-normal prior over BPM, 1.0 at `prior_bpm`
fn tempo_prior(bpm: f64, config: &TempoConfig) -> f64 {
    if config.prior_octaves <= 0.0 {
        return 1.0;
    }
    let octaves = (bpm / config.prior_bpm).log2() / config.prior_octaves;
    (-0.5 * octaves * octaves).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::{extract_features, AnalysisConfig};

    /// Envelope with a unit spike every `period` frames
    fn pulse_envelope(period: usize, frames: usize) -> Vec<f32> {
        (0..frames).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_regular_pulses() {
        // 40 frames/s, spike every 20 frames = 2 beats/s = 120 BPM
        let estimate = estimate_tempo(&pulse_envelope(20, 800), 40.0, &TempoConfig::default());
        assert!((estimate.bpm - 120.0).abs() < 1e-9, "bpm = {}", estimate.bpm);
        assert!(estimate.confidence > 0.0);
    }

    #[test]
    fn test_prior_prefers_nearer_octave() {
        // 90 BPM pulses: the 45 BPM sub-multiple scores equally on
        // autocorrelation but loses on the prior
        let estimate = estimate_tempo(&pulse_envelope(40, 1200), 60.0, &TempoConfig::default());
        assert!((estimate.bpm - 90.0).abs() < 1e-9, "bpm = {}", estimate.bpm);
    }

    #[test]
    fn test_flat_envelope_has_no_tempo() {
        let estimate = estimate_tempo(&vec![0.0; 500], 43.0, &TempoConfig::default());
        assert_eq!(estimate.bpm, 0.0);
        assert_eq!(estimate.confidence, 0.0);
    }

    #[test]
    fn test_too_short_envelope() {
        let estimate = estimate_tempo(&[1.0, 0.0, 1.0], 43.0, &TempoConfig::default());
        assert_eq!(estimate.bpm, 0.0);
    }

    #[test]
    fn test_click_track_at_120_bpm() {
        // 20480 Hz / 512 hop = 40 frames/s, so 0.5 s beats land on whole frames
        let sample_rate = 20480;
        let mut samples = vec![0.0f32; sample_rate as usize * 8];
        for beat in samples.iter_mut().step_by(sample_rate as usize / 2) {
            *beat = 1.0;
        }

        let features = extract_features(&samples, sample_rate, &AnalysisConfig::default());
        assert!((features.tempo - 120.0).abs() < 5.0, "bpm = {}", features.tempo);
    }

    #[test]
    fn test_tempo_prior_peak() {
        let config = TempoConfig::default();
        assert!((tempo_prior(120.0, &config) - 1.0).abs() < 1e-12);
        assert!(tempo_prior(60.0, &config) < tempo_prior(100.0, &config));
        assert!((tempo_prior(60.0, &config) - tempo_prior(240.0, &config)).abs() < 1e-12);
    }
}
