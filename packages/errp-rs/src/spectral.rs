//! Short-time Fourier features of trial volumes.
//!
//! Every (trial, channel) window is split into Hann-windowed frames of
//! `window` samples advancing by `window - overlap`. Frames that would run past
//! the end of the trial are not computed (no padding). Magnitudes are
//! one-sided and divided by the window sum, so a sinusoid centred on a bin
//! reads half its amplitude.

use crate::error::{ErrpError, Result};
use crate::statistics::car_filter;
use crate::volume::TrialVolume;
use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView1, Axis};
use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    static FFT_PLANNER: RefCell<FftPlanner<f64>> = RefCell::new(FftPlanner::new());
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralConfig {
    /// Frame length in samples
    #[serde(default = "default_window")]
    pub window: usize,

    /// Samples shared by consecutive frames
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Seconds between window start and the event, subtracted from frame times
    #[serde(default = "default_pre_trigger_time")]
    pub pre_trigger_time: f64,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Common-average reference the trials before the transform
    #[serde(default = "default_car")]
    pub car_filter: bool,

    /// Trial indices per group; `None` treats all trials as one group
    #[serde(default)]
    pub trigger_groups: Option<Vec<Vec<usize>>>,
}

fn default_window() -> usize {
    512
}
fn default_overlap() -> usize {
    468
}
fn default_pre_trigger_time() -> f64 {
    0.5
}
fn default_sample_rate() -> f64 {
    512.0
}
fn default_car() -> bool {
    true
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            overlap: default_overlap(),
            pre_trigger_time: default_pre_trigger_time(),
            sample_rate: default_sample_rate(),
            car_filter: default_car(),
            trigger_groups: None,
        }
    }
}

impl SpectralConfig {
    /// Frame parameters with rate and pre-trigger time taken from the volume
    pub fn for_volume(volume: &TrialVolume, window: usize, overlap: usize) -> Self {
        Self {
            window,
            overlap,
            pre_trigger_time: volume.pre_samples() as f64 / volume.sample_rate(),
            sample_rate: volume.sample_rate(),
            ..Self::default()
        }
    }

    pub fn hop(&self) -> usize {
        self.window.saturating_sub(self.overlap)
    }

    /// Number of whole frames that fit in `num_samples`
    pub fn num_frames(&self, num_samples: usize) -> usize {
        if self.window == 0 || self.hop() == 0 || num_samples < self.window {
            0
        } else {
            1 + (num_samples - self.window) / self.hop()
        }
    }

    fn validate(&self, num_samples: usize) -> Result<()> {
        if self.window == 0 {
            return Err(ErrpError::InvalidParameter(
                "STFT window must be at least one sample".to_string(),
            ));
        }
        if self.overlap >= self.window {
            return Err(ErrpError::InvalidParameter(format!(
                "Overlap ({}) must be smaller than the window ({})",
                self.overlap, self.window
            )));
        }
        if self.window > num_samples {
            return Err(ErrpError::InvalidParameter(format!(
                "Window ({}) is longer than the trial ({} samples)",
                self.window, num_samples
            )));
        }
        if !(self.sample_rate > 0.0) {
            return Err(ErrpError::InvalidParameter(format!(
                "Sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        Ok(())
    }
}

/// Spectral statistics over one group of trials
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStatistics {
    pub trials: Vec<usize>,
    /// (channel, freq, frame)
    pub grand_mean: Array3<f64>,
    /// (channel, freq, frame), population variance
    pub grand_variance: Array3<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFeatures {
    /// (trial, channel, freq, frame)
    pub spectrogram: Array4<f64>,
    pub frequencies: Array1<f64>,
    /// Frame centres in seconds relative to the event
    pub times: Array1<f64>,
    pub groups: Vec<GroupStatistics>,
}

/// Periodic Hann window
pub fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
        .collect()
}

/// One-sided magnitude frames of a single signal, shaped (freq, frame)
fn stft_magnitude(
    signal: ArrayView1<'_, f64>,
    taper: &[f64],
    hop: usize,
    num_frames: usize,
    fft: &Arc<dyn Fft<f64>>,
) -> Array2<f64> {
    let n = taper.len();
    let num_freqs = n / 2 + 1;
    let norm: f64 = taper.iter().sum();
    let mut out = Array2::zeros((num_freqs, num_frames));
    let mut buffer = vec![Complex::new(0.0, 0.0); n];

    for frame in 0..num_frames {
        let start = frame * hop;
        for (slot, (x, w)) in buffer
            .iter_mut()
            .zip(signal.slice(s![start..start + n]).iter().zip(taper))
        {
            *slot = Complex::new(x * w, 0.0);
        }
        fft.process(&mut buffer);
        for (k, value) in buffer[..num_freqs].iter().enumerate() {
            out[[k, frame]] = value.norm() / norm;
        }
    }
    out
}

pub fn extract_spectral(
    volume: &TrialVolume,
    config: &SpectralConfig,
) -> Result<SpectralFeatures> {
    crate::profile_scope!("extract_spectral");

    let volume = volume.clone().ensure_not_empty()?;
    let num_samples = volume.num_samples();
    config.validate(num_samples)?;

    let volume = if config.car_filter {
        car_filter(&volume)
    } else {
        volume
    };

    let window = config.window;
    let hop = config.hop();
    let num_frames = config.num_frames(num_samples);
    let num_freqs = window / 2 + 1;
    let taper = hann_window(window);

    let per_trial: Vec<Array3<f64>> = (0..volume.num_trials())
        .into_par_iter()
        .map(|t| {
            let fft = FFT_PLANNER.with(|planner| planner.borrow_mut().plan_fft_forward(window));
            let trial = volume.trial(t);
            let mut out = Array3::zeros((volume.num_channels(), num_freqs, num_frames));
            for (c, channel) in trial.axis_iter(Axis(0)).enumerate() {
                out.index_axis_mut(Axis(0), c)
                    .assign(&stft_magnitude(channel, &taper, hop, num_frames, &fft));
            }
            out
        })
        .collect();

    let mut spectrogram = Array4::zeros((
        volume.num_trials(),
        volume.num_channels(),
        num_freqs,
        num_frames,
    ));
    for (mut slot, trial) in spectrogram.axis_iter_mut(Axis(0)).zip(&per_trial) {
        slot.assign(trial);
    }

    let frequencies =
        Array1::from_iter((0..num_freqs).map(|k| k as f64 * config.sample_rate / window as f64));
    let times = Array1::from_iter((0..num_frames).map(|f| {
        (f * hop) as f64 / config.sample_rate + (window as f64 / 2.0) / config.sample_rate
            - config.pre_trigger_time
    }));

    let groups = match &config.trigger_groups {
        Some(groups) => groups.clone(),
        None => vec![(0..volume.num_trials()).collect()],
    };
    let groups = groups
        .into_iter()
        .map(|trials| group_statistics(&spectrogram, trials))
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "STFT: {} trials x {} channels, {} freqs x {} frames, {} groups",
        volume.num_trials(),
        volume.num_channels(),
        num_freqs,
        num_frames,
        groups.len()
    );

    Ok(SpectralFeatures {
        spectrogram,
        frequencies,
        times,
        groups,
    })
}

fn group_statistics(spectrogram: &Array4<f64>, trials: Vec<usize>) -> Result<GroupStatistics> {
    let available = spectrogram.len_of(Axis(0));
    if let Some(bad) = trials.iter().find(|&&t| t >= available) {
        return Err(ErrpError::InvalidParameter(format!(
            "Trigger group references trial {} but only {} trials exist",
            bad, available
        )));
    }

    let selected = spectrogram.select(Axis(0), &trials);
    let grand_mean = selected.mean_axis(Axis(0)).ok_or_else(|| {
        ErrpError::InvalidParameter("Trigger group contains no trials".to_string())
    })?;
    let grand_variance = selected.var_axis(Axis(0), 0.0);

    Ok(GroupStatistics {
        trials,
        grand_mean,
        grand_variance,
    })
}
