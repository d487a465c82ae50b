use crate::error::{ErrpError, Result};
use crate::types::ErrorLabel;
use ndarray::{Array1, Array3, ArrayView2, Axis};

/// Stack of equally sized trial windows, indexed (trial, channel, sample).
///
/// Sample `pre_samples` of every window is the event onset.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialVolume {
    data: Array3<f64>,
    channel_names: Vec<String>,
    sample_rate: f64,
    pre_samples: usize,
    onsets: Vec<f64>,
    label: ErrorLabel,
}

impl TrialVolume {
    pub fn new(
        data: Array3<f64>,
        channel_names: Vec<String>,
        sample_rate: f64,
        pre_samples: usize,
        onsets: Vec<f64>,
        label: ErrorLabel,
    ) -> Result<Self> {
        let (trials, channels, _) = data.dim();
        if channels != channel_names.len() {
            return Err(ErrpError::InvalidParameter(format!(
                "Volume has {} channels but {} names",
                channels,
                channel_names.len()
            )));
        }
        if trials != onsets.len() {
            return Err(ErrpError::InvalidParameter(format!(
                "Volume has {} trials but {} onsets",
                trials,
                onsets.len()
            )));
        }
        Ok(Self {
            data,
            channel_names,
            sample_rate,
            pre_samples,
            onsets,
            label,
        })
    }

    /// Same metadata, new samples of identical shape
    pub fn with_data(&self, data: Array3<f64>) -> Result<Self> {
        if data.dim() != self.data.dim() {
            return Err(ErrpError::InvalidParameter(format!(
                "Shape {:?} does not match volume shape {:?}",
                data.dim(),
                self.data.dim()
            )));
        }
        Ok(self.replace_data(data))
    }

    /// Shape-preserving transforms inside the crate
    pub(crate) fn replace_data(&self, data: Array3<f64>) -> Self {
        debug_assert_eq!(data.dim(), self.data.dim());
        Self {
            data,
            channel_names: self.channel_names.clone(),
            sample_rate: self.sample_rate,
            pre_samples: self.pre_samples,
            onsets: self.onsets.clone(),
            label: self.label,
        }
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array3<f64> {
        self.data
    }

    pub fn trial(&self, index: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn pre_samples(&self) -> usize {
        self.pre_samples
    }

    /// Event onset (seconds in the source recording) of every trial
    pub fn onsets(&self) -> &[f64] {
        &self.onsets
    }

    pub fn label(&self) -> ErrorLabel {
        self.label
    }

    pub fn num_trials(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn num_channels(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Window length in samples
    pub fn num_samples(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn is_empty(&self) -> bool {
        self.num_trials() == 0
    }

    pub fn ensure_not_empty(self) -> Result<Self> {
        if self.is_empty() {
            Err(ErrpError::EmptyVolume)
        } else {
            Ok(self)
        }
    }

    /// Window time axis in seconds relative to the event onset
    pub fn times(&self) -> Array1<f64> {
        let pre = self.pre_samples as f64;
        Array1::from_iter((0..self.num_samples()).map(|i| (i as f64 - pre) / self.sample_rate))
    }
}
