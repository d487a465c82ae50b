use clap::{Args, Parser, Subcommand};
use errp_rs::Band;

#[derive(Parser)]
#[command(
    name = "errp",
    version,
    about = "Error-related potential (ErrP) trial extraction for EEG sessions",
    long_about = "Align EEG recordings (GDF) with behavior logs (MAT), label error trials\n\
                  and summarize the extracted windows. A session is a .gdf/.mat pair\n\
                  sharing one file stem; either file may be given."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show recording and behavior log details of a session
    Info(InfoArgs),
    /// Check that a session file and its companion exist
    Validate(ValidateArgs),
    /// Label trials, extract windows and write a JSON summary
    Extract(ExtractArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    /// Session file (.gdf or .mat)
    #[arg(long)]
    pub file: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Session file (.gdf or .mat)
    #[arg(long)]
    pub file: String,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Session file (.gdf or .mat)
    #[arg(long)]
    pub file: String,

    /// Pipeline config (JSON); flags below override it
    #[arg(long, env = "ERRP_CONFIG")]
    pub config: Option<String>,

    /// Seconds before each event
    #[arg(long)]
    pub pre: Option<f64>,

    /// Seconds after each event
    #[arg(long)]
    pub post: Option<f64>,

    /// Band filter applied before extraction: theta, alpha, beta or none
    #[arg(long, value_parser = parse_band)]
    pub band: Option<BandChoice>,

    /// Common-average reference the trials
    #[arg(long, default_value_t = false, conflicts_with = "no_car")]
    pub car: bool,

    /// Skip common-average referencing
    #[arg(long, default_value_t = false)]
    pub no_car: bool,

    /// Fail when annotation and behavior trial counts differ
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Rename eeg:1..eeg:16 to the speller montage labels
    #[arg(long, default_value_t = false)]
    pub speller_channels: bool,

    /// Substring identifying the trigger channel
    #[arg(long)]
    pub trigger: Option<String>,

    /// Add per-channel STFT grand means to the summary
    #[arg(long, default_value_t = false)]
    pub spectral: bool,

    /// STFT window in samples
    #[arg(long)]
    pub window: Option<usize>,

    /// STFT overlap in samples
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Compact JSON output (no indentation)
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    /// Suppress progress messages on stderr
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

/// `--band` value: a named band or broadband
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandChoice {
    Band(Band),
    None,
}

impl BandChoice {
    pub fn band(self) -> Option<Band> {
        match self {
            Self::Band(band) => Some(band),
            Self::None => None,
        }
    }
}

/// Parse a band name ("theta", "alpha", "beta", "none").
pub fn parse_band(s: &str) -> Result<BandChoice, String> {
    let name = s.trim();
    if name.eq_ignore_ascii_case("none") {
        return Ok(BandChoice::None);
    }
    name.parse::<Band>()
        .map(BandChoice::Band)
        .map_err(|_| format!("Invalid band '{}': expected theta, alpha, beta or none", s))
}
