use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;
use errp_rs::reader::{MatVariables, ReaderFactory, SessionPaths};
use errp_rs::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct RecordingInfo {
    file: String,
    format: String,
    channels: Vec<String>,
    units: Vec<String>,
    sample_rate: f64,
    num_samples: usize,
    duration_seconds: f64,
    start_time: Option<String>,
    annotations: usize,
}

#[derive(Serialize)]
struct BehaviorInfo {
    file: String,
    state_columns: usize,
    actions: usize,
}

#[derive(Serialize)]
struct InfoOutput {
    cli_version: String,
    recording: Option<RecordingInfo>,
    behavior: Option<BehaviorInfo>,
}

fn recording_info(path: &Path) -> Result<RecordingInfo> {
    let reader = ReaderFactory::create_signal_reader(path)?;
    let metadata = reader.metadata()?;
    Ok(RecordingInfo {
        file: metadata.file_path,
        format: reader.format_name().to_string(),
        channels: metadata.channels,
        units: metadata.units,
        sample_rate: metadata.sample_rate,
        num_samples: metadata.num_samples,
        duration_seconds: metadata.duration,
        start_time: metadata.start_time.map(|t| t.to_rfc3339()),
        annotations: reader.annotations()?.len(),
    })
}

fn behavior_info(path: &Path) -> Result<BehaviorInfo> {
    let behavior =
        ReaderFactory::create_behavior_reader(path, &MatVariables::default())?.read_behavior()?;
    Ok(BehaviorInfo {
        file: path.display().to_string(),
        state_columns: behavior.num_state_columns(),
        actions: behavior.actions().len(),
    })
}

pub fn execute(args: InfoArgs) -> i32 {
    let paths = match SessionPaths::derive(Path::new(&args.file)) {
        Ok(paths) => paths,
        Err(e) => return exit_codes::report(&e),
    };
    if !Path::new(&args.file).is_file() {
        eprintln!("Error: File not found: {}", args.file);
        return exit_codes::INPUT_ERROR;
    }

    // Missing files are listed as absent; unreadable ones abort
    let recording = if paths.recording.is_file() {
        match recording_info(&paths.recording) {
            Ok(info) => Some(info),
            Err(e) => return exit_codes::report(&e),
        }
    } else {
        None
    };
    let behavior = if paths.behavior.is_file() {
        match behavior_info(&paths.behavior) {
            Ok(info) => Some(info),
            Err(e) => return exit_codes::report(&e),
        }
    } else {
        None
    };

    let info = InfoOutput {
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
        recording,
        behavior,
    };

    if args.json {
        return output::emit(&info, false, None);
    }

    println!("errp CLI v{}", info.cli_version);
    println!();
    match &info.recording {
        Some(rec) => {
            println!("Recording: {} ({})", rec.file, rec.format);
            println!(
                "  {} channels at {} Hz, {} samples ({:.2} s)",
                rec.channels.len(),
                rec.sample_rate,
                rec.num_samples,
                rec.duration_seconds
            );
            println!("  Channels: {}", rec.channels.join(", "));
            if let Some(ref start) = rec.start_time {
                println!("  Start: {}", start);
            }
            println!("  Annotations: {}", rec.annotations);
        }
        None => println!("Recording: not found ({})", paths.recording.display()),
    }
    match &info.behavior {
        Some(beh) => {
            println!("Behavior log: {}", beh.file);
            println!(
                "  State columns: {}, actions: {}",
                beh.state_columns, beh.actions
            );
        }
        None => println!("Behavior log: not found ({})", paths.behavior.display()),
    }

    exit_codes::SUCCESS
}
