//! Digital Filter Implementations
//!
//! IIR Butterworth filters built from second-order sections (biquads), applied
//! forward and backward for zero phase distortion. Used to derive band-limited
//! copies of a recording (theta, alpha, beta).

use crate::error::{ErrpError, Result};
use std::f64::consts::PI;

/// Default Butterworth order for band extraction
pub const DEFAULT_ORDER: usize = 4;

/// Second-order section (biquad) coefficients
/// Transfer function: H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

/// State for a single biquad section (Direct Form II Transposed)
#[derive(Debug, Clone, Default)]
struct BiquadState {
    z1: f64,
    z2: f64,
}

/// Single biquad filter section
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    state: BiquadState,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            state: BiquadState::default(),
        }
    }

    /// Process a single sample using Direct Form II Transposed
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.state.z1;
        self.state.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.state.z2;
        self.state.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }

    pub fn reset(&mut self) {
        self.state = BiquadState::default();
    }
}

/// Cascaded second-order sections filter
#[derive(Debug, Clone)]
pub struct SosFilter {
    sections: Vec<BiquadFilter>,
}

impl SosFilter {
    pub fn new(sections: Vec<BiquadCoeffs>) -> Self {
        Self {
            sections: sections.into_iter().map(BiquadFilter::new).collect(),
        }
    }

    /// Process a single sample through all sections
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let mut output = input;
        for section in &mut self.sections {
            output = section.process(output);
        }
        output
    }

    /// Causal filtering; returns a new array (original unchanged)
    pub fn filter(&mut self, signal: &[f64]) -> Vec<f64> {
        signal.iter().map(|&s| self.process(s)).collect()
    }

    /// Zero-phase filtering: forward pass, then backward pass over the
    /// reversed output. The signal is extended at both ends by odd reflection
    /// to reduce edge transients.
    pub fn filtfilt(&mut self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }
        let pad = (3 * (2 * self.sections.len() + 1)).min(n - 1);

        let mut extended = Vec::with_capacity(n + 2 * pad);
        let first = signal[0];
        let last = signal[n - 1];
        extended.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
        extended.extend_from_slice(signal);
        extended.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));

        self.reset();
        let mut forward = self.filter(&extended);
        forward.reverse();
        self.reset();
        let mut backward = self.filter(&forward);
        backward.reverse();
        self.reset();

        backward[pad..pad + n].to_vec()
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}

/// Butterworth filter designer
pub struct ButterworthFilter;

impl ButterworthFilter {
    pub fn lowpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        SosFilter::new(Self::design_lowpass(wn, order))
    }

    pub fn highpass(cutoff: f64, sample_rate: f64, order: usize) -> SosFilter {
        let wn = Self::prewarp(cutoff, sample_rate);
        SosFilter::new(Self::design_highpass(wn, order))
    }

    /// Bandpass as a highpass/lowpass cascade
    pub fn bandpass(low: f64, high: f64, sample_rate: f64, order: usize) -> SosFilter {
        let mut sections = Self::design_highpass(Self::prewarp(low, sample_rate), order);
        sections.extend(Self::design_lowpass(Self::prewarp(high, sample_rate), order));
        SosFilter::new(sections)
    }

    /// Prewarp frequency for bilinear transform
    fn prewarp(freq: f64, sample_rate: f64) -> f64 {
        (PI * freq / sample_rate).tan()
    }

    /// Damping of the k-th analog pole pair: s^2 + alpha*s + 1
    fn pole_damping(k: usize, order: usize) -> f64 {
        2.0 * (PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64)).sin()
    }

    fn design_lowpass(wn: f64, order: usize) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            if order % 2 == 1 && k == num_sections - 1 {
                // First-order section: H(s) = 1 / (s + 1)
                let k_coeff = wn / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                let alpha = Self::pole_damping(k, order);
                let wn2 = wn * wn;
                let denom = 1.0 + alpha * wn + wn2;

                sections.push(BiquadCoeffs {
                    b0: wn2 / denom,
                    b1: 2.0 * wn2 / denom,
                    b2: wn2 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - alpha * wn + wn2) / denom,
                });
            }
        }

        sections
    }

    fn design_highpass(wn: f64, order: usize) -> Vec<BiquadCoeffs> {
        let num_sections = (order + 1) / 2;
        let mut sections = Vec::with_capacity(num_sections);

        for k in 0..num_sections {
            if order % 2 == 1 && k == num_sections - 1 {
                let k_coeff = 1.0 / (1.0 + wn);
                sections.push(BiquadCoeffs {
                    b0: k_coeff,
                    b1: -k_coeff,
                    b2: 0.0,
                    a1: (wn - 1.0) / (wn + 1.0),
                    a2: 0.0,
                });
            } else {
                let alpha = Self::pole_damping(k, order);
                let wn2 = wn * wn;
                let denom = 1.0 + alpha * wn + wn2;

                sections.push(BiquadCoeffs {
                    b0: 1.0 / denom,
                    b1: -2.0 / denom,
                    b2: 1.0 / denom,
                    a1: 2.0 * (wn2 - 1.0) / denom,
                    a2: (1.0 - alpha * wn + wn2) / denom,
                });
            }
        }

        sections
    }
}

/// Build a zero-phase-ready filter from optional cutoffs, mirroring
/// `filter(l_freq, h_freq)`: both set is a bandpass, only `low` a highpass,
/// only `high` a lowpass.
pub fn design_filter(
    low: Option<f64>,
    high: Option<f64>,
    sample_rate: f64,
    order: usize,
) -> Result<SosFilter> {
    let nyquist = sample_rate / 2.0;
    let check = |name: &str, freq: f64| -> Result<()> {
        if freq <= 0.0 || freq >= nyquist {
            return Err(ErrpError::InvalidParameter(format!(
                "{} cutoff ({} Hz) must be within (0, {}) Hz",
                name, freq, nyquist
            )));
        }
        Ok(())
    };

    match (low, high) {
        (Some(low), Some(high)) => {
            check("Low", low)?;
            check("High", high)?;
            if low >= high {
                return Err(ErrpError::InvalidParameter(
                    "Low cutoff must be less than high cutoff".to_string(),
                ));
            }
            Ok(ButterworthFilter::bandpass(low, high, sample_rate, order))
        }
        (Some(low), None) => {
            check("Low", low)?;
            Ok(ButterworthFilter::highpass(low, sample_rate, order))
        }
        (None, Some(high)) => {
            check("High", high)?;
            Ok(ButterworthFilter::lowpass(high, sample_rate, order))
        }
        (None, None) => Err(ErrpError::InvalidParameter(
            "At least one cutoff frequency is required".to_string(),
        )),
    }
}
