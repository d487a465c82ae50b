use crate::cli::ExtractArgs;
use crate::exit_codes;
use crate::output;
use errp_rs::{
    car_filter, extract_spectral, grand_average, grand_variance, ErrorLabel, MismatchPolicy,
    PipelineConfig, Result, Session, SpectralConfig, TrialAlignment, TrialVolume,
};
use ndarray::{Array2, Axis};
use serde::Serialize;

#[derive(Serialize)]
struct AlignmentSummary {
    labels: Vec<ErrorLabel>,
    errors: usize,
    no_errors: usize,
    undefined: usize,
    annotations: usize,
    paired: usize,
    consistent: bool,
}

#[derive(Serialize)]
struct SpectralSummary {
    frequencies: Vec<f64>,
    times: Vec<f64>,
    /// (channel, frequency), averaged over trials and frames
    mean_magnitude: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct ClassSummary {
    label: ErrorLabel,
    trials: usize,
    onsets: Vec<f64>,
    empty: bool,
    grand_average: Option<Vec<Vec<f64>>>,
    grand_variance: Option<Vec<Vec<f64>>>,
    spectral: Option<SpectralSummary>,
}

#[derive(Serialize)]
struct ExtractOutput {
    file: String,
    sample_rate: f64,
    channels: Vec<String>,
    window_samples: usize,
    pre_samples: usize,
    band: Option<String>,
    car: bool,
    alignment: AlignmentSummary,
    classes: Vec<ClassSummary>,
}

/// Config file (or defaults) with command-line overrides applied
pub(crate) fn build_config(args: &ExtractArgs) -> Result<PipelineConfig> {
    let mut config = match args.config {
        Some(ref path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(pre) = args.pre {
        config.pre = pre;
    }
    if let Some(post) = args.post {
        config.post = post;
    }
    if let Some(choice) = args.band {
        config.band = choice.band();
    }
    if args.car {
        config.car = true;
    }
    if args.no_car {
        config.car = false;
    }
    if args.strict {
        config.alignment.mismatch = MismatchPolicy::Fail;
    }
    if args.speller_channels {
        config.session.speller_channels = true;
    }
    if let Some(ref trigger) = args.trigger {
        config.session.trigger_pattern = trigger.clone();
    }
    if args.spectral || args.window.is_some() || args.overlap.is_some() {
        let mut spectral = config.spectral.take().unwrap_or_default();
        if let Some(window) = args.window {
            spectral.window = window;
        }
        if let Some(overlap) = args.overlap {
            spectral.overlap = overlap;
        }
        config.spectral = Some(spectral);
    }

    config.validate()?;
    Ok(config)
}

fn rows(array: &Array2<f64>) -> Vec<Vec<f64>> {
    array.outer_iter().map(|row| row.to_vec()).collect()
}

fn summarize_alignment(alignment: &TrialAlignment) -> AlignmentSummary {
    AlignmentSummary {
        labels: alignment.labels.clone(),
        errors: alignment.count(ErrorLabel::Error),
        no_errors: alignment.count(ErrorLabel::NoError),
        undefined: alignment.count(ErrorLabel::Undefined),
        annotations: alignment.onsets.len(),
        paired: alignment.num_paired(),
        consistent: alignment.is_consistent(),
    }
}

fn summarize_spectral(volume: &TrialVolume, template: &SpectralConfig) -> Result<SpectralSummary> {
    let config = SpectralConfig {
        car_filter: template.car_filter,
        trigger_groups: None,
        ..SpectralConfig::for_volume(volume, template.window, template.overlap)
    };
    let features = extract_spectral(volume, &config)?;

    let mean_magnitude = match features.groups.first() {
        Some(group) => group
            .grand_mean
            .mean_axis(Axis(2))
            .map(|m| rows(&m))
            .unwrap_or_default(),
        None => Vec::new(),
    };

    Ok(SpectralSummary {
        frequencies: features.frequencies.to_vec(),
        times: features.times.to_vec(),
        mean_magnitude,
    })
}

fn summarize_class(volume: &TrialVolume, spectral: Option<&SpectralConfig>) -> Result<ClassSummary> {
    if volume.is_empty() {
        return Ok(ClassSummary {
            label: volume.label(),
            trials: 0,
            onsets: Vec::new(),
            empty: true,
            grand_average: None,
            grand_variance: None,
            spectral: None,
        });
    }

    let spectral = match spectral {
        Some(template) => Some(summarize_spectral(volume, template)?),
        None => None,
    };

    Ok(ClassSummary {
        label: volume.label(),
        trials: volume.num_trials(),
        onsets: volume.onsets().to_vec(),
        empty: false,
        grand_average: Some(rows(&grand_average(volume)?)),
        grand_variance: Some(rows(&grand_variance(volume)?)),
        spectral,
    })
}

fn run(args: &ExtractArgs, config: &PipelineConfig) -> Result<ExtractOutput> {
    let session = Session::open(&args.file, &config.session)?
        .with_alignment(config.alignment.clone());

    let filtered = match config.band {
        Some(band) => {
            if !args.quiet {
                let (low, high) = band.range();
                eprintln!("  Band: {} ({}-{} Hz)", band.name(), low, high);
            }
            Some(session.band(band)?)
        }
        None => None,
    };

    let alignment = session.identify_errors(&config.alignment)?;
    if !args.quiet {
        eprintln!(
            "  Trials: {} labeled ({} errors), {} annotations",
            alignment.labels.len(),
            alignment.error_count(),
            alignment.onsets.len()
        );
    }

    let mut classes = Vec::with_capacity(2);
    let mut window = (0, 0);
    for error in [true, false] {
        let query = config.query(error);
        window = query.window_samples(session.sample_rate())?;

        let volume = session.trials(&query, filtered.as_ref())?;
        let volume = if config.car {
            car_filter(&volume)
        } else {
            volume
        };
        if !args.quiet && volume.is_empty() {
            eprintln!("  No {:?} trials survived extraction", volume.label());
        }
        classes.push(summarize_class(&volume, config.spectral.as_ref())?);
    }

    Ok(ExtractOutput {
        file: args.file.clone(),
        sample_rate: session.sample_rate(),
        channels: session.channel_names().to_vec(),
        window_samples: window.0 + window.1,
        pre_samples: window.0,
        band: config.band.map(|b| b.name().to_string()),
        car: config.car,
        alignment: summarize_alignment(&alignment),
        classes,
    })
}

pub fn execute(args: ExtractArgs) -> i32 {
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => return exit_codes::report(&e),
    };

    if !args.quiet {
        eprintln!("Extracting ErrP trials from {}...", args.file);
        eprintln!(
            "  Window: pre={}s, post={}s, CAR {}",
            config.pre,
            config.post,
            if config.car { "on" } else { "off" }
        );
    }

    let result = match run(&args, &config) {
        Ok(result) => result,
        Err(e) => return exit_codes::report(&e),
    };

    let code = output::emit(&result, args.compact, args.output.as_deref());
    if code == exit_codes::SUCCESS && !args.quiet {
        if let Some(ref path) = args.output {
            eprintln!("Summary written to {}", path);
        }
    }
    code
}
