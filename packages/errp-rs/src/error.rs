use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErrpError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Annotation count ({annotations}) does not match behavior trial count ({trials})")]
    AlignmentMismatch { annotations: usize, trials: usize },

    #[error("No trials survived extraction")]
    EmptyVolume,

    #[error("Trigger channel error: {0}")]
    TriggerChannel(String),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Failed to read MAT file: {0}")]
    Mat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ErrpError>;
