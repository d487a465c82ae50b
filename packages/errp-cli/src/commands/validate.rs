use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use errp_rs::reader::{FileKind, ReaderFactory, SessionPaths};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    exists: bool,
    supported: bool,
    file_type: Option<String>,
    companion: Option<String>,
    companion_exists: bool,
    size_bytes: Option<u64>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let path = Path::new(&args.file);

    let exists = path.is_file();
    let kind = FileKind::from_path(path);
    let companion = SessionPaths::derive(path).ok().map(|paths| match kind {
        Some(FileKind::Mat) => paths.recording,
        _ => paths.behavior,
    });
    let companion_exists = companion.as_ref().is_some_and(|c| c.is_file());

    let size_bytes = if exists {
        std::fs::metadata(path).ok().map(|m| m.len())
    } else {
        None
    };

    let error = if kind.is_none() {
        Some(format!(
            "Unsupported file '{}'. Supported extensions: {}",
            args.file,
            ReaderFactory::supported_extensions().join(", ")
        ))
    } else if !exists {
        Some(format!("File not found: {}", args.file))
    } else if !companion_exists {
        Some(format!(
            "Companion file not found: {}",
            companion
                .as_ref()
                .map(|c| c.display().to_string())
                .unwrap_or_default()
        ))
    } else {
        None
    };

    let result = ValidateOutput {
        file: args.file.clone(),
        exists,
        supported: kind.is_some(),
        file_type: kind.map(|k| k.extension().to_uppercase()),
        companion: companion.as_ref().map(|c| c.display().to_string()),
        companion_exists,
        size_bytes,
        error: error.clone(),
    };

    if args.json {
        let code = output::emit(&result, false, None);
        if code != exit_codes::SUCCESS {
            return code;
        }
    } else if let Some(ref err) = error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "Session '{}' is valid ({}, {} bytes, companion {})",
            args.file,
            result.file_type.as_deref().unwrap_or_default(),
            size_bytes.unwrap_or(0),
            result.companion.as_deref().unwrap_or_default()
        );
    }

    if error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
