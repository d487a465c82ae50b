/// File Readers Module
///
/// A recording session is a pair of sibling files sharing one stem: the
/// signal recording (`.gdf`) and the behavior log (`.mat`). Either file may be
/// given; the other is derived from it. Readers for both kinds sit behind
/// traits so callers can plug in other sources.
use crate::behavior::BehaviorRecord;
use crate::error::{ErrpError, Result};
use crate::recording::Recording;
use crate::types::Annotation;
use ndarray::Array2;
use std::path::{Path, PathBuf};

pub mod gdf;
pub mod mat;

pub use gdf::{GdfReader, GdfWriter};
pub use mat::{MatBehaviorReader, MatBehaviorWriter, MatVariables};

/// The two recognized session file kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// General Data Format signal recording
    Gdf,
    /// MATLAB behavior log
    Mat,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "gdf" => Some(Self::Gdf),
            "mat" => Some(Self::Mat),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Gdf => "gdf",
            Self::Mat => "mat",
        }
    }

    pub fn companion(self) -> Self {
        match self {
            Self::Gdf => Self::Mat,
            Self::Mat => Self::Gdf,
        }
    }
}

/// Recording and behavior-log paths of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    pub recording: PathBuf,
    pub behavior: PathBuf,
}

impl SessionPaths {
    /// Derive both paths from either member of the pair, without touching the
    /// filesystem.
    pub fn derive(path: &Path) -> Result<Self> {
        let kind = FileKind::from_path(path).ok_or_else(|| {
            ErrpError::InvalidFormat(format!(
                "'{}' must be a .gdf recording or a .mat behavior log",
                path.display()
            ))
        })?;
        let companion = path.with_extension(kind.companion().extension());

        Ok(match kind {
            FileKind::Gdf => Self {
                recording: path.to_path_buf(),
                behavior: companion,
            },
            FileKind::Mat => Self {
                recording: companion,
                behavior: path.to_path_buf(),
            },
        })
    }

    /// Derive both paths and check that both files exist
    pub fn resolve(path: &Path) -> Result<Self> {
        let paths = Self::derive(path)?;
        for file in [&paths.recording, &paths.behavior] {
            if !file.is_file() {
                return Err(ErrpError::FileNotFound(file.display().to_string()));
            }
        }
        Ok(paths)
    }
}

/// Metadata common to signal sources
#[derive(Debug, Clone)]
pub struct SignalMetadata {
    pub file_path: String,
    pub sample_rate: f64,
    pub num_channels: usize,
    pub num_samples: usize,
    pub duration: f64,
    pub channels: Vec<String>,
    /// Physical unit per channel, as stored in the file
    pub units: Vec<String>,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub file_type: String,
}

/// Trait that signal readers implement
pub trait SignalReader: Send + Sync {
    fn metadata(&self) -> Result<SignalMetadata>;

    /// Read `num_samples` samples starting at `start_sample`, one vector per
    /// selected channel (all channels when `channels` is `None`). Values are in
    /// volts.
    fn read_chunk(
        &self,
        start_sample: usize,
        num_samples: usize,
        channels: Option<&[String]>,
    ) -> Result<Vec<Vec<f64>>>;

    /// Discrete events stored with the signal
    fn annotations(&self) -> Result<Vec<Annotation>>;

    fn format_name(&self) -> &str;

    /// Load the complete recording into memory
    fn load(&self) -> Result<Recording> {
        let metadata = self.metadata()?;
        let channels = self.read_chunk(0, metadata.num_samples, None)?;

        let num_samples = channels.first().map(|c| c.len()).unwrap_or(0);
        let data = Array2::from_shape_vec((channels.len(), num_samples), channels.concat())
            .map_err(|e| ErrpError::InvalidFormat(format!("Ragged channel data: {}", e)))?;

        Ok(Recording::new(data, metadata.channels, metadata.sample_rate)?
            .with_annotations(self.annotations()?)
            .with_start_time(metadata.start_time))
    }
}

/// Trait that behavior-log readers implement
pub trait BehaviorReader: Send + Sync {
    fn read_behavior(&self) -> Result<BehaviorRecord>;

    fn format_name(&self) -> &str;
}

/// Factory for creating readers based on file extension
pub struct ReaderFactory;

impl ReaderFactory {
    pub fn create_signal_reader(path: &Path) -> Result<Box<dyn SignalReader>> {
        match FileKind::from_path(path) {
            Some(FileKind::Gdf) => Ok(Box::new(GdfReader::open(path)?)),
            _ => Err(ErrpError::InvalidFormat(format!(
                "No signal reader for '{}'",
                path.display()
            ))),
        }
    }

    pub fn create_behavior_reader(
        path: &Path,
        variables: &MatVariables,
    ) -> Result<Box<dyn BehaviorReader>> {
        match FileKind::from_path(path) {
            Some(FileKind::Mat) => Ok(Box::new(MatBehaviorReader::new(path, variables.clone()))),
            _ => Err(ErrpError::InvalidFormat(format!(
                "No behavior reader for '{}'",
                path.display()
            ))),
        }
    }

    pub fn supported_extensions() -> Vec<&'static str> {
        vec!["gdf", "mat"]
    }

    pub fn is_supported(path: &Path) -> bool {
        FileKind::from_path(path).is_some()
    }
}
