use errp_rs::ErrpError;

pub const SUCCESS: i32 = 0;
/// Processing failed after the inputs were accepted
pub const EXECUTION_ERROR: i32 = 1;
/// Bad arguments, missing files or malformed session data
pub const INPUT_ERROR: i32 = 2;

/// Exit code for a library error
pub fn for_error(err: &ErrpError) -> i32 {
    match err {
        ErrpError::InvalidFormat(_)
        | ErrpError::FileNotFound(_)
        | ErrpError::AlignmentMismatch { .. }
        | ErrpError::TriggerChannel(_)
        | ErrpError::ChannelNotFound(_)
        | ErrpError::Mat(_)
        | ErrpError::InvalidParameter(_) => INPUT_ERROR,
        ErrpError::EmptyVolume | ErrpError::Io(_) => EXECUTION_ERROR,
    }
}

/// Print `err` on stderr and return its exit code
pub fn report(err: &ErrpError) -> i32 {
    eprintln!("Error: {}", err);
    for_error(err)
}
