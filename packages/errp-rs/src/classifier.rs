//! Boundary between extracted trials and a two-class error detector.

use crate::error::{ErrpError, Result};
use crate::types::ErrorLabel;
use crate::volume::TrialVolume;
use ndarray::{concatenate, Array2, Array3, ArrayView2, ArrayView3, Axis};

/// Class column order of probability and target matrices
pub const CLASS_NO_ERROR: usize = 0;
pub const CLASS_ERROR: usize = 1;

pub trait TrialClassifier {
    /// Class probabilities per trial, shaped (trial, 2) as `[no-error, error]`.
    /// `features` is indexed (trial, channel, sample).
    fn predict_proba(&self, features: ArrayView3<'_, f64>) -> Result<Array2<f64>>;

    fn predict(&self, features: ArrayView3<'_, f64>) -> Result<Vec<ErrorLabel>> {
        let proba = self.predict_proba(features)?;
        Ok(proba
            .outer_iter()
            .map(|p| {
                if p[CLASS_ERROR] > p[CLASS_NO_ERROR] {
                    ErrorLabel::Error
                } else {
                    ErrorLabel::NoError
                }
            })
            .collect())
    }
}

/// Stacked trials with one-hot targets
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    /// (trial, channel, sample): error trials first, then correct trials
    pub features: Array3<f64>,
    /// (trial, 2) one-hot `[no-error, error]`
    pub targets: Array2<f64>,
}

impl TrainingSet {
    pub fn from_volumes(error: &TrialVolume, no_error: &TrialVolume) -> Result<Self> {
        if error.is_empty() && no_error.is_empty() {
            return Err(ErrpError::EmptyVolume);
        }
        let (_, ec, es) = error.data().dim();
        let (_, nc, ns) = no_error.data().dim();
        if (ec, es) != (nc, ns) {
            return Err(ErrpError::InvalidParameter(format!(
                "Trial shapes differ: error ({} channels, {} samples) vs no-error ({} channels, {} samples)",
                ec, es, nc, ns
            )));
        }

        let features = concatenate(Axis(0), &[error.data().view(), no_error.data().view()])
            .map_err(|e| ErrpError::InvalidParameter(format!("Cannot stack volumes: {}", e)))?;

        let num_error = error.num_trials();
        let targets = Array2::from_shape_fn((features.len_of(Axis(0)), 2), |(t, class)| {
            let is_error = t < num_error;
            match (class, is_error) {
                (CLASS_ERROR, true) | (CLASS_NO_ERROR, false) => 1.0,
                _ => 0.0,
            }
        });

        Ok(Self { features, targets })
    }

    pub fn num_trials(&self) -> usize {
        self.features.len_of(Axis(0))
    }

    pub fn labels(&self) -> Vec<ErrorLabel> {
        self.targets
            .outer_iter()
            .map(|row| {
                if row[CLASS_ERROR] > 0.5 {
                    ErrorLabel::Error
                } else {
                    ErrorLabel::NoError
                }
            })
            .collect()
    }

    fn class_features(&self, class: usize) -> Array3<f64> {
        let indices: Vec<usize> = self
            .targets
            .outer_iter()
            .enumerate()
            .filter(|(_, row)| row[class] > 0.5)
            .map(|(i, _)| i)
            .collect();
        self.features.select(Axis(0), &indices)
    }
}

/// Scores trials by their distance to each class's grand average.
///
/// Logits are the negative mean squared distance to each template divided by
/// the within-class spread of the training data.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateClassifier {
    no_error_template: Array2<f64>,
    error_template: Array2<f64>,
    temperature: f64,
}

fn mean_squared_distance(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> f64 {
    let n = a.len().max(1) as f64;
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>() / n
}

impl TemplateClassifier {
    pub fn fit(training: &TrainingSet) -> Result<Self> {
        let error = training.class_features(CLASS_ERROR);
        let no_error = training.class_features(CLASS_NO_ERROR);
        let error_template = error.mean_axis(Axis(0)).ok_or(ErrpError::EmptyVolume)?;
        let no_error_template = no_error.mean_axis(Axis(0)).ok_or(ErrpError::EmptyVolume)?;

        let spread: f64 = error
            .outer_iter()
            .map(|trial| mean_squared_distance(trial, error_template.view()))
            .chain(
                no_error
                    .outer_iter()
                    .map(|trial| mean_squared_distance(trial, no_error_template.view())),
            )
            .sum::<f64>()
            / training.num_trials() as f64;

        let separation = mean_squared_distance(error_template.view(), no_error_template.view());
        let temperature = if spread > 0.0 {
            spread
        } else if separation > 0.0 {
            separation
        } else {
            1.0
        };

        log::debug!(
            "Template classifier: {} error / {} no-error trials, temperature {:.3e}",
            error.len_of(Axis(0)),
            no_error.len_of(Axis(0)),
            temperature
        );

        Ok(Self {
            no_error_template,
            error_template,
            temperature,
        })
    }

    pub fn from_volumes(error: &TrialVolume, no_error: &TrialVolume) -> Result<Self> {
        Self::fit(&TrainingSet::from_volumes(error, no_error)?)
    }
}

impl TrialClassifier for TemplateClassifier {
    fn predict_proba(&self, features: ArrayView3<'_, f64>) -> Result<Array2<f64>> {
        let (_, channels, samples) = features.dim();
        if (channels, samples) != self.error_template.dim() {
            return Err(ErrpError::InvalidParameter(format!(
                "Expected trials of {:?}, got ({}, {})",
                self.error_template.dim(),
                channels,
                samples
            )));
        }

        let mut proba = Array2::zeros((features.len_of(Axis(0)), 2));
        for (trial, mut out) in features.outer_iter().zip(proba.outer_iter_mut()) {
            let l0 = -mean_squared_distance(trial, self.no_error_template.view()) / self.temperature;
            let l1 = -mean_squared_distance(trial, self.error_template.view()) / self.temperature;
            let max = l0.max(l1);
            let (e0, e1) = ((l0 - max).exp(), (l1 - max).exp());
            out[CLASS_NO_ERROR] = e0 / (e0 + e1);
            out[CLASS_ERROR] = e1 / (e0 + e1);
        }
        Ok(proba)
    }
}
