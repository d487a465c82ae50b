use crate::aligner::AlignmentConfig;
use crate::error::{ErrpError, Result};
use crate::extractor::TrialQuery;
use crate::session::SessionOptions;
use crate::spectral::SpectralConfig;
use crate::types::Band;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to go from a session file to trial volumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seconds kept before each event
    #[serde(default = "default_pre")]
    pub pre: f64,

    /// Seconds kept after each event
    #[serde(default = "default_post")]
    pub post: f64,

    /// Band-pass applied before extraction (`null` for broadband)
    #[serde(default = "default_band")]
    pub band: Option<Band>,

    /// Common-average reference the extracted trials
    #[serde(default = "default_car")]
    pub car: bool,

    #[serde(default)]
    pub visual_offset: Option<f64>,

    #[serde(default)]
    pub session: SessionOptions,

    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// STFT settings; spectral features are skipped when absent
    #[serde(default)]
    pub spectral: Option<SpectralConfig>,
}

fn default_pre() -> f64 {
    0.5
}
fn default_post() -> f64 {
    1.0
}
fn default_band() -> Option<Band> {
    Some(Band::Theta)
}
fn default_car() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pre: default_pre(),
            post: default_post(),
            band: default_band(),
            car: default_car(),
            visual_offset: None,
            session: SessionOptions::default(),
            alignment: AlignmentConfig::default(),
            spectral: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ErrpError::InvalidFormat(format!("Invalid pipeline config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ErrpError::FileNotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)?;
        log::debug!("Loading pipeline config from {}", path.display());
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.pre >= 0.0 && self.post >= 0.0) || self.pre + self.post == 0.0 {
            return Err(ErrpError::InvalidParameter(format!(
                "pre/post must be non-negative and not both zero (pre={}, post={})",
                self.pre, self.post
            )));
        }
        if let Some(spectral) = &self.spectral {
            if spectral.overlap >= spectral.window {
                return Err(ErrpError::InvalidParameter(format!(
                    "Spectral overlap ({}) must be smaller than the window ({})",
                    spectral.overlap, spectral.window
                )));
            }
        }
        Ok(())
    }

    pub fn query(&self, error: bool) -> TrialQuery {
        TrialQuery {
            error,
            pre: self.pre,
            post: self.post,
            visual_offset: self.visual_offset,
        }
    }
}
