//! Pairs behavioral trials with recording annotations and labels each trial.
//!
//! Pairing is positional: after trimming, annotation *i* belongs to behavior
//! trial *i*. The recording usually carries one extra marker at each end
//! (session start and stop) and the behavior log one leading calibration
//! column, which the defaults remove.

use crate::behavior::BehaviorRecord;
use crate::error::{ErrpError, Result};
use crate::types::{Annotation, ErrorLabel};
use serde::{Deserialize, Serialize};

/// What to do when annotation and trial counts differ after trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Log a warning and pair up to the shorter sequence
    #[default]
    Warn,
    /// Return `AlignmentMismatch`
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Annotations dropped from the start of the recording
    #[serde(default = "default_trim")]
    pub trim_leading: usize,

    /// Annotations dropped from the end of the recording
    #[serde(default = "default_trim")]
    pub trim_trailing: usize,

    /// Leading state columns that are not trials
    #[serde(default = "default_trim")]
    pub skip_state_columns: usize,

    #[serde(default)]
    pub mismatch: MismatchPolicy,

    /// Only annotations with one of these descriptions count as trial events
    #[serde(default)]
    pub event_codes: Option<Vec<String>>,
}

fn default_trim() -> usize {
    1
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            trim_leading: default_trim(),
            trim_trailing: default_trim(),
            skip_state_columns: default_trim(),
            mismatch: MismatchPolicy::default(),
            event_codes: None,
        }
    }
}

impl AlignmentConfig {
    pub fn strict(mut self) -> Self {
        self.mismatch = MismatchPolicy::Fail;
        self
    }

    pub fn with_event_codes(mut self, codes: Vec<String>) -> Self {
        self.event_codes = Some(codes);
        self
    }
}

/// Per-trial labels and the trimmed annotation sequence they pair with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialAlignment {
    pub labels: Vec<ErrorLabel>,
    /// Onsets in seconds, parallel to `descriptions`
    pub onsets: Vec<f64>,
    pub descriptions: Vec<String>,
}

impl TrialAlignment {
    /// `(label, onset)` pairs, stopping at the shorter of the two sequences
    pub fn trials(&self) -> impl Iterator<Item = (ErrorLabel, f64)> + '_ {
        self.labels.iter().copied().zip(self.onsets.iter().copied())
    }

    pub fn num_paired(&self) -> usize {
        self.labels.len().min(self.onsets.len())
    }

    pub fn error_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|label| **label == ErrorLabel::Error)
            .count()
    }

    pub fn count(&self, label: ErrorLabel) -> usize {
        self.labels.iter().filter(|l| **l == label).count()
    }

    pub fn is_consistent(&self) -> bool {
        self.labels.len() == self.onsets.len()
    }
}

/// Label every behavior trial; see [`ErrorLabel::classify`]
pub fn label_trials(behavior: &BehaviorRecord, skip_state_columns: usize) -> Vec<ErrorLabel> {
    let intended = behavior.intended();
    let actual = behavior.actual();
    let end = (skip_state_columns + behavior.actions().len()).min(behavior.num_state_columns());

    (skip_state_columns.min(end)..end)
        .map(|col| ErrorLabel::classify(intended[col], actual[col]))
        .collect()
}

pub fn align(
    annotations: &[Annotation],
    behavior: &BehaviorRecord,
    config: &AlignmentConfig,
) -> Result<TrialAlignment> {
    let end = annotations.len().saturating_sub(config.trim_trailing);
    let start = config.trim_leading.min(end);

    let events: Vec<&Annotation> = annotations[start..end]
        .iter()
        .filter(|annotation| match &config.event_codes {
            Some(codes) => codes.iter().any(|code| code == &annotation.description),
            None => true,
        })
        .collect();

    let labels = label_trials(behavior, config.skip_state_columns);

    log::debug!(
        "Aligned {} behavior trials ({} errors) against {} annotations",
        labels.len(),
        labels.iter().filter(|l| **l == ErrorLabel::Error).count(),
        events.len()
    );

    if events.len() != labels.len() {
        match config.mismatch {
            MismatchPolicy::Fail => {
                return Err(ErrpError::AlignmentMismatch {
                    annotations: events.len(),
                    trials: labels.len(),
                })
            }
            MismatchPolicy::Warn => log::warn!(
                "Annotation count ({}) does not match behavior trial count ({}); pairing the first {}",
                events.len(),
                labels.len(),
                events.len().min(labels.len())
            ),
        }
    }

    Ok(TrialAlignment {
        labels,
        onsets: events.iter().map(|a| a.onset).collect(),
        descriptions: events.iter().map(|a| a.description.clone()).collect(),
    })
}
