//! One recording run: EEG, trigger channel and behavior log loaded together.

use crate::aligner::{align, AlignmentConfig, TrialAlignment};
use crate::behavior::BehaviorRecord;
use crate::channels::speller_channel_map;
use crate::error::Result;
use crate::extractor::{extract_trials, TrialQuery};
use crate::reader::{MatVariables, ReaderFactory, SessionPaths};
use crate::recording::Recording;
use crate::types::Band;
use crate::volume::TrialVolume;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Raw channel name to label, applied before the trigger split
    #[serde(default)]
    pub rename: Option<HashMap<String, String>>,

    /// Use the 16-channel speller montage when `rename` is not given
    #[serde(default)]
    pub speller_channels: bool,

    /// Substring identifying the trigger channel
    #[serde(default = "default_trigger_pattern")]
    pub trigger_pattern: String,

    /// Extra factor applied to the EEG after loading (samples are already in volts)
    #[serde(default)]
    pub scale: Option<f64>,

    #[serde(default)]
    pub variables: MatVariables,
}

fn default_trigger_pattern() -> String {
    "trigger".to_string()
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            rename: None,
            speller_channels: false,
            trigger_pattern: default_trigger_pattern(),
            scale: None,
            variables: MatVariables::default(),
        }
    }
}

impl SessionOptions {
    fn channel_map(&self) -> Option<HashMap<String, String>> {
        match (&self.rename, self.speller_channels) {
            (Some(map), _) => Some(map.clone()),
            (None, true) => Some(speller_channel_map()),
            (None, false) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    paths: Option<SessionPaths>,
    eeg: Recording,
    trigger: Array1<f64>,
    behavior: BehaviorRecord,
    alignment: AlignmentConfig,
}

impl Session {
    /// Open a `.gdf`/`.mat` pair from either file
    pub fn open<P: AsRef<Path>>(path: P, options: &SessionOptions) -> Result<Self> {
        crate::profile_scope!("Session::open");

        let paths = SessionPaths::resolve(path.as_ref())?;
        log::info!(
            "Opening session {} (behavior: {})",
            paths.recording.display(),
            paths.behavior.display()
        );

        let mut raw = ReaderFactory::create_signal_reader(&paths.recording)?.load()?;
        if let Some(map) = options.channel_map() {
            raw = raw.rename_channels(&map)?;
        }

        let (mut eeg, trigger) = raw.split_trigger(&options.trigger_pattern)?;
        if let Some(factor) = options.scale {
            eeg = eeg.scale(factor);
        }

        let behavior =
            ReaderFactory::create_behavior_reader(&paths.behavior, &options.variables)?
                .read_behavior()?;

        log::info!(
            "Loaded {} EEG channels at {} Hz ({:.1}s, {} annotations), {} behavior trials",
            eeg.num_channels(),
            eeg.sample_rate(),
            eeg.duration(),
            eeg.annotations().len(),
            behavior.num_trials()
        );

        Ok(Self {
            paths: Some(paths),
            eeg,
            trigger,
            behavior,
            alignment: AlignmentConfig::default(),
        })
    }

    pub fn from_parts(eeg: Recording, trigger: Array1<f64>, behavior: BehaviorRecord) -> Self {
        Self {
            paths: None,
            eeg,
            trigger,
            behavior,
            alignment: AlignmentConfig::default(),
        }
    }

    /// Alignment settings used by [`Session::trials`]
    pub fn with_alignment(mut self, alignment: AlignmentConfig) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn paths(&self) -> Option<&SessionPaths> {
        self.paths.as_ref()
    }

    pub fn channel_names(&self) -> &[String] {
        self.eeg.channel_names()
    }

    pub fn eeg(&self) -> &Recording {
        &self.eeg
    }

    pub fn trigger(&self) -> &Array1<f64> {
        &self.trigger
    }

    pub fn behavior(&self) -> &BehaviorRecord {
        &self.behavior
    }

    pub fn sample_rate(&self) -> f64 {
        self.eeg.sample_rate()
    }

    /// Full EEG for the picked channels plus its time axis in seconds
    pub fn raw_eeg(&self, picks: Option<&[String]>) -> Result<(Array2<f64>, Array1<f64>)> {
        let data = self.eeg.get_data(0, self.eeg.num_samples(), picks)?;
        Ok((data, self.eeg.times()))
    }

    pub fn band(&self, band: Band) -> Result<Recording> {
        self.eeg.band(band)
    }

    pub fn theta(&self) -> Result<Recording> {
        self.eeg.theta()
    }

    pub fn alpha(&self) -> Result<Recording> {
        self.eeg.alpha()
    }

    pub fn beta(&self) -> Result<Recording> {
        self.eeg.beta()
    }

    pub fn filter(&self, low: Option<f64>, high: Option<f64>) -> Result<Recording> {
        self.eeg.filter(low, high)
    }

    /// Label every behavior trial and pair it with the recording's annotations
    pub fn identify_errors(&self, config: &AlignmentConfig) -> Result<TrialAlignment> {
        align(self.eeg.annotations(), &self.behavior, config)
    }

    /// Trials matching `query`, cut from `source` (the session's own EEG when
    /// `None`). Alignment is recomputed from the session's annotations.
    pub fn trials(&self, query: &TrialQuery, source: Option<&Recording>) -> Result<TrialVolume> {
        let alignment = self.identify_errors(&self.alignment)?;
        extract_trials(source.unwrap_or(&self.eeg), &alignment, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, ErrorLabel};

    fn session() -> Session {
        let fs = 100.0;
        let data =
            Array2::from_shape_fn((3, 1000), |(c, t)| (c + 1) as f64 * (t as f64 * 0.05).sin());
        let names = vec!["Fz".to_string(), "Cz".to_string(), "Pz".to_string()];
        let annotations = [1.0, 2.0, 4.0, 6.0, 9.0]
            .iter()
            .map(|&t| Annotation::new(t, "1"))
            .collect();
        let eeg = Recording::new(data, names, fs).unwrap().with_annotations(annotations);
        let behavior =
            BehaviorRecord::from_rows(&[0, 1, 2, 1], &[0, 1, 1, 1], vec![5, 5, 5]).unwrap();
        Session::from_parts(eeg, Array1::zeros(1000), behavior)
    }

    #[test]
    fn test_identify_errors() {
        let alignment = session().identify_errors(&AlignmentConfig::default()).unwrap();
        assert_eq!(
            alignment.labels,
            vec![ErrorLabel::NoError, ErrorLabel::Error, ErrorLabel::NoError]
        );
        assert_eq!(alignment.onsets, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_trials_default_source() {
        let s = session();
        let errors = s.trials(&TrialQuery::errors(0.5, 1.0), None).unwrap();
        assert_eq!(errors.num_trials(), 1);
        assert_eq!(errors.onsets(), &[4.0]);
        assert_eq!(errors.num_samples(), 150);

        let correct = s.trials(&TrialQuery::correct(0.5, 1.0), None).unwrap();
        assert_eq!(correct.onsets(), &[2.0, 6.0]);
    }

    #[test]
    fn test_trials_from_filtered_source() {
        let s = session();
        let scaled = s.eeg().scale(2.0);
        let plain = s.trials(&TrialQuery::errors(0.5, 1.0), None).unwrap();
        let doubled = s.trials(&TrialQuery::errors(0.5, 1.0), Some(&scaled)).unwrap();
        assert_eq!(doubled.data(), &(plain.data() * 2.0));
    }

    #[test]
    fn test_raw_eeg_picks() {
        let s = session();
        let (data, times) = s.raw_eeg(Some(&["Cz".to_string()])).unwrap();
        assert_eq!(data.dim(), (1, 1000));
        assert_eq!(times.len(), 1000);
        assert_eq!(times[100], 1.0);
        assert!(s.raw_eeg(Some(&["O1".to_string()])).is_err());
    }

    #[test]
    fn test_options_channel_map() {
        let options = SessionOptions {
            speller_channels: true,
            ..SessionOptions::default()
        };
        let map = options.channel_map().unwrap();
        assert_eq!(map.get("eeg:1").map(String::as_str), Some("Fz"));
        assert!(SessionOptions::default().channel_map().is_none());
    }

    #[test]
    fn test_open_missing_companion() {
        let dir = tempfile::tempdir().unwrap();
        let gdf = dir.path().join("run.gdf");
        std::fs::write(&gdf, b"GDF").unwrap();
        assert!(Session::open(&gdf, &SessionOptions::default()).is_err());
    }
}
