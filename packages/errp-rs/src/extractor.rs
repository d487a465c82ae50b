//! Cuts fixed windows around labeled events into a [`TrialVolume`].

use crate::aligner::TrialAlignment;
use crate::error::{ErrpError, Result};
use crate::recording::Recording;
use crate::types::{seconds_to_samples, ErrorLabel};
use crate::volume::TrialVolume;
use ndarray::{s, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Which trials to extract and how wide the window is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialQuery {
    /// `true` selects error trials, `false` correct trials
    pub error: bool,
    /// Seconds before the event
    pub pre: f64,
    /// Seconds after the event
    pub post: f64,
    /// Adds `offset * channel_index` to every channel so stacked traces separate
    #[serde(default)]
    pub visual_offset: Option<f64>,
}

impl TrialQuery {
    pub fn errors(pre: f64, post: f64) -> Self {
        Self {
            error: true,
            pre,
            post,
            visual_offset: None,
        }
    }

    pub fn correct(pre: f64, post: f64) -> Self {
        Self {
            error: false,
            ..Self::errors(pre, post)
        }
    }

    pub fn with_visual_offset(mut self, offset: f64) -> Self {
        self.visual_offset = Some(offset);
        self
    }

    pub fn label(&self) -> ErrorLabel {
        if self.error {
            ErrorLabel::Error
        } else {
            ErrorLabel::NoError
        }
    }

    /// `(pre, post)` in samples at the given rate
    pub fn window_samples(&self, sample_rate: f64) -> Result<(usize, usize)> {
        if !(self.pre >= 0.0 && self.post >= 0.0) {
            return Err(ErrpError::InvalidParameter(format!(
                "Window bounds must be non-negative (pre={}, post={})",
                self.pre, self.post
            )));
        }
        let pre = seconds_to_samples(self.pre, sample_rate) as usize;
        let post = seconds_to_samples(self.post, sample_rate) as usize;
        if pre + post == 0 {
            return Err(ErrpError::InvalidParameter(
                "Trial window is empty".to_string(),
            ));
        }
        Ok((pre, post))
    }
}

pub fn extract_trials(
    recording: &Recording,
    alignment: &TrialAlignment,
    query: &TrialQuery,
) -> Result<TrialVolume> {
    crate::profile_scope!("extract_trials");

    let fs = recording.sample_rate();
    let (pre, post) = query.window_samples(fs)?;
    let window = pre + post;
    let total = recording.num_samples() as i64;
    let data = recording.data();
    let wanted = query.label();

    let mut windows: Vec<ArrayView2<'_, f64>> = Vec::new();
    let mut onsets = Vec::new();

    for (index, (label, onset)) in alignment.trials().enumerate() {
        if !label.matches(query.error) {
            continue;
        }
        if !onset.is_finite() {
            return Err(ErrpError::InvalidFormat(format!(
                "Trial {} has a non-finite onset ({})",
                index, onset
            )));
        }
        let center = seconds_to_samples(onset, fs);
        let bounds = center
            .checked_sub(pre as i64)
            .zip(center.checked_add(post as i64));
        let (start, stop) = match bounds {
            Some((start, stop)) if start >= 0 && stop <= total => (start, stop),
            _ => {
                log::debug!(
                    "Dropping trial {} at {:.3}s: window of {} samples around sample {} outside 0..{}",
                    index,
                    onset,
                    window,
                    center,
                    total
                );
                continue;
            }
        };
        windows.push(data.slice(s![.., start as usize..stop as usize]));
        onsets.push(onset);
    }

    let channels = recording.num_channels();
    let mut volume = Array3::<f64>::zeros((windows.len(), channels, window));
    for (mut slot, trial) in volume.axis_iter_mut(Axis(0)).zip(&windows) {
        slot.assign(trial);
    }

    if let Some(offset) = query.visual_offset {
        for (c, mut channel) in volume.axis_iter_mut(Axis(1)).enumerate() {
            channel += offset * c as f64;
        }
    }

    log::debug!(
        "Extracted {} {:?} trials ({} samples per window)",
        windows.len(),
        wanted,
        window
    );

    TrialVolume::new(
        volume,
        recording.channel_names().to_vec(),
        fs,
        pre,
        onsets,
        wanted,
    )
}
