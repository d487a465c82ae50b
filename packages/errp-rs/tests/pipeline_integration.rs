//! End-to-end runs over GDF/MAT session pairs written to a temp directory.

use errp_rs::reader::{GdfWriter, MatBehaviorWriter, MatVariables};
use errp_rs::{
    add_offset, car_filter, extract_spectral, grand_average, grand_variance, magnitude,
    AlignmentConfig, Annotation, BehaviorRecord, ErrorLabel, ErrpError, Recording, Session,
    SessionOptions, SpectralConfig, TemplateClassifier, TrainingSet, TrialClassifier, TrialQuery,
};
use ndarray::{Array2, Axis};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FS: f64 = 512.0;

/// `eeg_channels` sine channels plus one trigger channel, `seconds` long
fn recording(eeg_channels: usize, seconds: f64, onsets: &[f64]) -> Recording {
    let samples = (seconds * FS) as usize;
    let data = Array2::from_shape_fn((eeg_channels + 1, samples), |(c, t)| {
        if c == eeg_channels {
            0.0
        } else {
            let time = t as f64 / FS;
            1e-5 * (c as f64 + 1.0) * (2.0 * std::f64::consts::PI * 6.0 * time).sin()
        }
    });
    let mut names: Vec<String> = (1..=eeg_channels).map(|i| format!("eeg:{}", i)).collect();
    names.push("trigger:1".to_string());

    let annotations = onsets.iter().map(|&t| Annotation::new(t, "1")).collect();
    Recording::new(data, names, FS)
        .unwrap()
        .with_annotations(annotations)
}

fn write_session(
    dir: &Path,
    stem: &str,
    recording: &Recording,
    behavior: &BehaviorRecord,
) -> (PathBuf, PathBuf) {
    let gdf = dir.join(format!("{}.gdf", stem));
    let mat = dir.join(format!("{}.mat", stem));
    GdfWriter::new().write(&gdf, recording).unwrap();
    MatBehaviorWriter::new(MatVariables::default())
        .write(&mat, behavior)
        .unwrap();
    (gdf, mat)
}

/// 10 EEG channels at 512 Hz, annotations at 10/20/30 s, a calibration
/// column followed by states [[1,2,1],[1,1,2]] and 5 recorded actions
fn scenario_session(dir: &TempDir) -> (PathBuf, PathBuf) {
    let rec = recording(10, 40.0, &[10.0, 20.0, 30.0]);
    let behavior =
        BehaviorRecord::from_rows(&[0, 1, 2, 1], &[0, 1, 1, 2], vec![1, 2, 3, 4, 5]).unwrap();
    write_session(dir.path(), "subject1_offline", &rec, &behavior)
}

#[test]
fn test_scenario_labels_and_trimmed_onsets() {
    let dir = TempDir::new().unwrap();
    let (gdf, _) = scenario_session(&dir);

    let session = Session::open(&gdf, &SessionOptions::default()).unwrap();
    assert_eq!(session.channel_names().len(), 10);
    assert_eq!(session.sample_rate(), FS);
    assert_eq!(session.trigger().len(), 40 * 512);

    let alignment = session
        .identify_errors(&AlignmentConfig::default())
        .unwrap();
    assert_eq!(
        alignment.labels,
        vec![ErrorLabel::NoError, ErrorLabel::Error, ErrorLabel::Error]
    );
    assert_eq!(alignment.onsets, vec![20.0]);
    assert_eq!(alignment.error_count(), 2);

    // Only the first label has an onset to pair with
    let pairs: Vec<_> = alignment.trials().collect();
    assert_eq!(pairs, vec![(ErrorLabel::NoError, 20.0)]);

    let correct = session.trials(&TrialQuery::correct(0.5, 1.0), None).unwrap();
    assert_eq!(correct.num_trials(), 1);
    assert_eq!(correct.num_samples(), 768);

    let errors = session.trials(&TrialQuery::errors(0.5, 1.0), None).unwrap();
    assert!(errors.is_empty());
    assert!(matches!(grand_average(&errors), Err(ErrpError::EmptyVolume)));
}

#[test]
fn test_scenario_strict_alignment_fails() {
    let dir = TempDir::new().unwrap();
    let (_, mat) = scenario_session(&dir);

    // Opening from the behavior file finds the recording next to it
    let session = Session::open(&mat, &SessionOptions::default())
        .unwrap()
        .with_alignment(AlignmentConfig::default().strict());
    assert!(session.paths().is_some());

    let result = session.trials(&TrialQuery::correct(0.5, 1.0), None);
    assert!(matches!(
        result,
        Err(ErrpError::AlignmentMismatch {
            annotations: 1,
            trials: 3
        })
    ));
}

#[test]
fn test_window_past_end_is_dropped() {
    let dir = TempDir::new().unwrap();
    let rec = recording(4, 40.0, &[1.0, 10.0, 20.0, 39.5, 39.9]);
    let behavior = BehaviorRecord::from_rows(&[0, 1, 1, 1], &[0, 2, 2, 2], vec![1, 1, 1]).unwrap();
    let (gdf, _) = write_session(dir.path(), "run", &rec, &behavior);

    let session = Session::open(&gdf, &SessionOptions::default()).unwrap();
    let alignment = session
        .identify_errors(&AlignmentConfig::default().strict())
        .unwrap();
    assert_eq!(alignment.error_count(), 3);

    let short = session.trials(&TrialQuery::errors(0.5, 0.4), None).unwrap();
    assert_eq!(short.num_trials(), 3);

    let long = session.trials(&TrialQuery::errors(0.5, 1.0), None).unwrap();
    assert_eq!(long.num_trials(), 2);
    assert_eq!(long.onsets(), &[10.0, 20.0]);
    assert!(long.data().iter().all(|v| v.is_finite()));
}

#[test]
fn test_band_statistics_and_spectral_chain() {
    let dir = TempDir::new().unwrap();
    let onsets: Vec<f64> = (0..12).map(|i| 2.0 + 3.0 * i as f64).collect();
    let rec = recording(16, 40.0, &onsets);
    // 10 trials after trimming: every third one is an error
    let intended: Vec<i64> = std::iter::once(0).chain((0..10).map(|_| 1)).collect();
    let actual: Vec<i64> = std::iter::once(0)
        .chain((0..10).map(|i| if i % 3 == 0 { 2 } else { 1 }))
        .collect();
    let behavior = BehaviorRecord::from_rows(&intended, &actual, vec![1; 10]).unwrap();
    let (gdf, _) = write_session(dir.path(), "speller", &rec, &behavior);

    let options = SessionOptions {
        speller_channels: true,
        ..SessionOptions::default()
    };
    let session = Session::open(&gdf, &options).unwrap();
    assert_eq!(session.channel_names()[0], "Fz");
    assert_eq!(session.channel_names()[8], "Cz");

    let theta = session.theta().unwrap();
    let query = TrialQuery::errors(0.5, 1.0);
    let errors = car_filter(&session.trials(&query, Some(&theta)).unwrap());
    let correct = car_filter(
        &session
            .trials(&TrialQuery::correct(0.5, 1.0), Some(&theta))
            .unwrap(),
    );
    assert_eq!(errors.num_trials(), 4);
    assert_eq!(correct.num_trials(), 6);

    let average = grand_average(&errors).unwrap();
    let variance = grand_variance(&errors).unwrap();
    assert_eq!(average.dim(), (16, 768));
    assert!(variance.iter().all(|v| *v >= 0.0));
    // CAR leaves a zero mean across channels
    let across = average.mean_axis(Axis(0)).unwrap();
    assert!(across.iter().all(|m| m.abs() < 1e-15));

    let rectified = magnitude(&average);
    assert!(rectified.iter().all(|v| *v >= 0.0));
    let stacked = add_offset(&average, 1e-6);
    assert!((stacked[[15, 0]] - average[[15, 0]] - 15e-6).abs() < 1e-18);

    let spectral_config = SpectralConfig {
        trigger_groups: Some(vec![vec![0, 1], vec![2, 3]]),
        ..SpectralConfig::for_volume(&errors, 512, 468)
    };
    let features = extract_spectral(&errors, &spectral_config).unwrap();
    assert_eq!(features.spectrogram.dim(), (4, 16, 257, 6));
    assert_eq!(features.groups.len(), 2);
    assert_eq!(features.groups[0].grand_mean.dim(), (16, 257, 6));
    assert_eq!(features.frequencies[1], 1.0);

    let training = TrainingSet::from_volumes(&errors, &correct).unwrap();
    assert_eq!(training.num_trials(), 10);
    assert_eq!(training.labels()[0], ErrorLabel::Error);
    assert_eq!(training.labels()[9], ErrorLabel::NoError);
    let classifier = TemplateClassifier::fit(&training).unwrap();
    let proba = classifier.predict_proba(training.features.view()).unwrap();
    assert_eq!(proba.dim(), (10, 2));
    assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn test_missing_companion_and_bad_extension() {
    let dir = TempDir::new().unwrap();
    let rec = recording(2, 5.0, &[1.0]);
    let gdf = dir.path().join("lonely.gdf");
    GdfWriter::new().write(&gdf, &rec).unwrap();

    assert!(matches!(
        Session::open(&gdf, &SessionOptions::default()),
        Err(ErrpError::FileNotFound(_))
    ));
    assert!(matches!(
        Session::open(dir.path().join("notes.txt"), &SessionOptions::default()),
        Err(ErrpError::InvalidFormat(_))
    ));
}

#[test]
fn test_missing_trigger_channel() {
    let dir = TempDir::new().unwrap();
    let rec = recording(3, 5.0, &[1.0, 2.0]);
    let behavior = BehaviorRecord::from_rows(&[0], &[0], vec![]).unwrap();
    write_session(dir.path(), "run", &rec, &behavior);

    let options = SessionOptions {
        trigger_pattern: "stim".to_string(),
        ..SessionOptions::default()
    };
    assert!(matches!(
        Session::open(dir.path().join("run.gdf"), &options),
        Err(ErrpError::TriggerChannel(_))
    ));
}
