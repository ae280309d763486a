use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlvError {
    /// The file does not start with a valid FLV header
    #[error("Not a valid FLV container: {reason}")]
    ContainerInvalid { reason: String },

    #[error("{0}")]
    Io(#[from] io::Error),
}
