//! Continuous multi-channel recording with annotations.

use crate::error::{ErrpError, Result};
use crate::filters::{design_filter, DEFAULT_ORDER};
use crate::types::{Annotation, Band};
use chrono::{DateTime, Utc};
use ndarray::{s, Array1, Array2, Axis};
use rayon::prelude::*;
use std::collections::HashMap;

/// Continuous signal matrix (channels × samples) plus channel metadata and
/// annotation events. Every transformation returns a new recording.
#[derive(Debug, Clone)]
pub struct Recording {
    data: Array2<f64>,
    channel_names: Vec<String>,
    sample_rate: f64,
    annotations: Vec<Annotation>,
    start_time: Option<DateTime<Utc>>,
}

impl Recording {
    pub fn new(data: Array2<f64>, channel_names: Vec<String>, sample_rate: f64) -> Result<Self> {
        if data.nrows() != channel_names.len() {
            return Err(ErrpError::InvalidParameter(format!(
                "Data has {} channels but {} channel names were given",
                data.nrows(),
                channel_names.len()
            )));
        }
        if !(sample_rate > 0.0) {
            return Err(ErrpError::InvalidParameter(format!(
                "Sampling rate must be positive, got {}",
                sample_rate
            )));
        }

        Ok(Self {
            data,
            channel_names,
            sample_rate,
            annotations: Vec::new(),
            start_time: None,
        })
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_start_time(mut self, start_time: Option<DateTime<Utc>>) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn num_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.num_samples() as f64 / self.sample_rate
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channel_names.iter().position(|c| c == name)
    }

    fn resolve_picks(&self, picks: &[String]) -> Result<Vec<usize>> {
        picks
            .iter()
            .map(|name| {
                self.channel_index(name)
                    .ok_or_else(|| ErrpError::ChannelNotFound(name.clone()))
            })
            .collect()
    }

    /// Time of every sample in seconds
    pub fn times(&self) -> Array1<f64> {
        Array1::from_iter((0..self.num_samples()).map(|i| i as f64 / self.sample_rate))
    }

    /// Samples `[start, stop)` for the picked channels (all when `None`).
    ///
    /// The range is clamped to the recording, so a window that runs off
    /// either end comes back shorter than requested.
    pub fn get_data(
        &self,
        start: usize,
        stop: usize,
        picks: Option<&[String]>,
    ) -> Result<Array2<f64>> {
        let stop = stop.min(self.num_samples());
        let start = start.min(stop);

        match picks {
            None => Ok(self.data.slice(s![.., start..stop]).to_owned()),
            Some(picks) => {
                let indices = self.resolve_picks(picks)?;
                let selected = self.data.select(Axis(0), &indices);
                Ok(selected.slice(s![.., start..stop]).to_owned())
            }
        }
    }

    /// Keep only the named channels, in the given order
    pub fn pick_channels(&self, picks: &[String]) -> Result<Recording> {
        let indices = self.resolve_picks(picks)?;
        Ok(Self {
            data: self.data.select(Axis(0), &indices),
            channel_names: picks.to_vec(),
            ..self.clone()
        })
    }

    pub fn drop_channels(&self, names: &[String]) -> Result<Recording> {
        self.resolve_picks(names)?;
        let keep: Vec<String> = self
            .channel_names
            .iter()
            .filter(|c| !names.contains(c))
            .cloned()
            .collect();
        self.pick_channels(&keep)
    }

    /// Apply a raw-name to label mapping. Every key must name an existing channel.
    pub fn rename_channels(&self, mapping: &HashMap<String, String>) -> Result<Recording> {
        for raw in mapping.keys() {
            if self.channel_index(raw).is_none() {
                return Err(ErrpError::ChannelNotFound(raw.clone()));
            }
        }

        let channel_names = self
            .channel_names
            .iter()
            .map(|c| mapping.get(c).cloned().unwrap_or_else(|| c.clone()))
            .collect();

        Ok(Self {
            channel_names,
            ..self.clone()
        })
    }

    /// Separate the trigger channel (the single channel whose name contains
    /// `pattern`) from the EEG channels.
    pub fn split_trigger(&self, pattern: &str) -> Result<(Recording, Array1<f64>)> {
        let matches: Vec<&String> = self
            .channel_names
            .iter()
            .filter(|c| c.contains(pattern))
            .collect();

        let trigger_name = match matches.as_slice() {
            [single] => (*single).clone(),
            [] => {
                return Err(ErrpError::TriggerChannel(format!(
                    "No channel name contains '{}'",
                    pattern
                )))
            }
            many => {
                return Err(ErrpError::TriggerChannel(format!(
                    "{} channels match '{}': {:?}",
                    many.len(),
                    pattern,
                    many
                )))
            }
        };

        let index = self
            .channel_index(&trigger_name)
            .ok_or_else(|| ErrpError::ChannelNotFound(trigger_name.clone()))?;
        let trigger = self.data.row(index).to_owned();
        let eeg = self.drop_channels(&[trigger_name])?;

        log::debug!(
            "Split trigger channel {} from {} EEG channels",
            index,
            eeg.num_channels()
        );

        Ok((eeg, trigger))
    }

    /// Apply `f` to every sample
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Recording {
        Self {
            data: self.data.mapv(f),
            ..self.clone()
        }
    }

    pub fn scale(&self, factor: f64) -> Recording {
        self.map(|x| x * factor)
    }

    /// Zero-phase Butterworth filtering of every channel. `low` alone is a
    /// highpass, `high` alone a lowpass, both a bandpass.
    pub fn filter(&self, low: Option<f64>, high: Option<f64>) -> Result<Recording> {
        let filter = design_filter(low, high, self.sample_rate, DEFAULT_ORDER)?;
        crate::profile_scope!(format!("filter {:?}-{:?} Hz", low, high));

        let rows: Vec<Vec<f64>> = (0..self.num_channels())
            .into_par_iter()
            .map(|ch| {
                let mut channel_filter = filter.clone();
                channel_filter.filtfilt(&self.data.row(ch).to_vec())
            })
            .collect();

        let data = Array2::from_shape_vec(
            (self.num_channels(), self.num_samples()),
            rows.concat(),
        )
        .map_err(|e| ErrpError::InvalidParameter(format!("Filtered shape mismatch: {}", e)))?;

        Ok(Self {
            data,
            ..self.clone()
        })
    }

    pub fn band(&self, band: Band) -> Result<Recording> {
        let (low, high) = band.range();
        log::info!("Filtering {} band ({}-{} Hz)", band.name(), low, high);
        self.filter(Some(low), Some(high))
    }

    pub fn theta(&self) -> Result<Recording> {
        self.band(Band::Theta)
    }

    pub fn alpha(&self) -> Result<Recording> {
        self.band(Band::Alpha)
    }

    pub fn beta(&self) -> Result<Recording> {
        self.band(Band::Beta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("eeg:{}", i)).collect()
    }

    fn ramp_recording() -> Recording {
        let mut channel_names = names(3);
        channel_names.push("trigger:1".to_string());
        let data = Array2::from_shape_fn((4, 100), |(c, t)| (c * 1000 + t) as f64);
        Recording::new(data, channel_names, 100.0).unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_names() {
        let data = Array2::zeros((2, 10));
        assert!(Recording::new(data.clone(), names(3), 100.0).is_err());
        assert!(Recording::new(data, names(2), 0.0).is_err());
    }

    #[test]
    fn test_get_data_clamps_range() {
        let rec = ramp_recording();
        let full = rec.get_data(10, 20, None).unwrap();
        assert_eq!(full.dim(), (4, 10));
        assert_eq!(full[[1, 0]], 1010.0);

        let tail = rec.get_data(95, 110, None).unwrap();
        assert_eq!(tail.ncols(), 5);

        let picked = rec
            .get_data(0, 5, Some(&["eeg:3".to_string()]))
            .unwrap();
        assert_eq!(picked.dim(), (1, 5));
        assert_eq!(picked[[0, 4]], 2004.0);
    }

    #[test]
    fn test_split_trigger() {
        let rec = ramp_recording();
        let (eeg, trigger) = rec.split_trigger("trigger").unwrap();
        assert_eq!(eeg.num_channels(), 3);
        assert!(eeg.channel_index("trigger:1").is_none());
        assert_eq!(trigger.len(), 100);
        assert_eq!(trigger[0], 3000.0);
    }

    #[test]
    fn test_split_trigger_requires_exactly_one() {
        let rec = ramp_recording();
        assert!(matches!(
            rec.split_trigger("status"),
            Err(ErrpError::TriggerChannel(_))
        ));
        assert!(matches!(
            rec.split_trigger("eeg"),
            Err(ErrpError::TriggerChannel(_))
        ));
    }

    #[test]
    fn test_rename_channels() {
        let rec = ramp_recording();
        let mut mapping = HashMap::new();
        mapping.insert("eeg:1".to_string(), "Fz".to_string());
        let renamed = rec.rename_channels(&mapping).unwrap();
        assert_eq!(renamed.channel_names()[0], "Fz");
        assert_eq!(rec.channel_names()[0], "eeg:1");

        mapping.insert("eeg:42".to_string(), "Oz".to_string());
        assert!(matches!(
            rec.rename_channels(&mapping),
            Err(ErrpError::ChannelNotFound(_))
        ));
    }

    #[test]
    fn test_scale_returns_copy() {
        let rec = ramp_recording();
        let scaled = rec.scale(1e-6);
        assert_eq!(rec.data()[[0, 1]], 1.0);
        assert!((scaled.data()[[0, 1]] - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn test_band_filter_keeps_shape_and_annotations() {
        let rec = ramp_recording().with_annotations(vec![Annotation::new(0.5, "1")]);
        let (eeg, _) = rec.split_trigger("trigger").unwrap();
        let theta = eeg.theta().unwrap();
        assert_eq!(theta.data().dim(), eeg.data().dim());
        assert_eq!(theta.annotations().len(), 1);
        assert_eq!(theta.channel_names(), eeg.channel_names());
    }
}
