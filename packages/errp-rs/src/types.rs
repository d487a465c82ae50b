use crate::error::ErrpError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Discrete event recorded alongside the continuous signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Onset in seconds from the start of the recording
    pub onset: f64,
    /// Duration in seconds (0 for instantaneous events)
    pub duration: f64,
    pub description: String,
}

impl Annotation {
    pub fn new(onset: f64, description: impl Into<String>) -> Self {
        Self {
            onset,
            duration: 0.0,
            description: description.into(),
        }
    }
}

/// Outcome of comparing intended and actual state codes for one trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorLabel {
    Error,
    NoError,
    /// Intended code was negative: the trial cannot be evaluated
    Undefined,
}

impl ErrorLabel {
    /// Label a trial from its intended and actual outcome codes
    pub fn classify(intended: i64, actual: i64) -> Self {
        if intended < 0 {
            Self::Undefined
        } else if intended != actual {
            Self::Error
        } else {
            Self::NoError
        }
    }

    /// `Some(true)` for errors, `Some(false)` for correct trials, `None` when undefined
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Error => Some(true),
            Self::NoError => Some(false),
            Self::Undefined => None,
        }
    }

    /// Whether this label selects trials of the requested kind
    pub fn matches(self, error: bool) -> bool {
        self.as_bool() == Some(error)
    }
}

/// Named EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Theta,
    Alpha,
    Beta,
}

impl Band {
    /// Low and high cutoff in Hz
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::Theta => (1.0, 8.0),
            Self::Alpha => (8.0, 12.0),
            Self::Beta => (12.0, 30.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Theta => "theta",
            Self::Alpha => "alpha",
            Self::Beta => "beta",
        }
    }
}

impl FromStr for Band {
    type Err = ErrpError;

    /// Case-insensitive band name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "theta" => Ok(Self::Theta),
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            _ => Err(ErrpError::InvalidParameter(format!("Unknown band '{}'", s))),
        }
    }
}

/// Convert a duration or time point in seconds to a sample count.
///
/// Every window computation goes through this function so that pre/post
/// lengths and onsets share one rounding rule.
pub fn seconds_to_samples(seconds: f64, sample_rate: f64) -> i64 {
    (seconds * sample_rate).round() as i64
}
