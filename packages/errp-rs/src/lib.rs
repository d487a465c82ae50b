pub mod aligner;
pub mod behavior;
pub mod channels;
pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod filters;
pub mod mmap_utils;
pub mod profiling;
pub mod reader;
pub mod recording;
pub mod session;
pub mod spectral;
pub mod statistics;
pub mod types;
pub mod volume;

pub use aligner::{align, AlignmentConfig, MismatchPolicy, TrialAlignment};
pub use behavior::BehaviorRecord;
pub use classifier::{TemplateClassifier, TrainingSet, TrialClassifier};
pub use config::PipelineConfig;
pub use error::{ErrpError, Result};
pub use extractor::{extract_trials, TrialQuery};
pub use recording::Recording;
pub use session::{Session, SessionOptions};
pub use spectral::{extract_spectral, GroupStatistics, SpectralConfig, SpectralFeatures};
pub use statistics::{add_offset, car_filter, grand_average, grand_variance, magnitude};
pub use types::*;
pub use volume::TrialVolume;
