use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type used by the codec and the sinks.
pub type SinkResult<T> = Result<T, SinkError>;

/* ----- enum SinkError ----- */

/// Errors that can occur while encoding records or driving a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The capture file could not be created with its global header.
    #[error("I/O error while creating the capture file")]
    CreateFailed(#[source] std::io::Error),
    /// A record could not be appended to the capture file.
    #[error("I/O error while writing the capture file")]
    WriteFailed(#[source] std::io::Error),
    /// The capture file could not be read back.
    #[error("I/O error while reading the capture file")]
    ReadFailed(#[source] std::io::Error),
    /// The FIFO path is already taken, most likely by a pipe left over from an unclean shutdown.
    ///
    /// This is a setup error: the path must be removed before a new pipe can be created.
    #[error("The pipe {0:?} already exists")]
    PipeAlreadyExists(PathBuf),
    /// The FIFO could not be created for another reason.
    /// # Fields
    /// - 0: path of the pipe
    /// - 1: underlying I/O error
    #[error("Failed to create the pipe {0:?}")]
    PipeCreateFailed(PathBuf, #[source] std::io::Error),
    /// The FIFO exists but could not be opened for writing.
    #[error("I/O error while opening the pipe")]
    PipeOpenFailed(#[source] std::io::Error),
    /// The global header could not be written at the start of a pipe lifetime.
    #[error("I/O error while writing the pipe header")]
    PipeWriteFailed(#[source] std::io::Error),
    /// A field of a header is invalid.
    #[error(transparent)]
    InvalidField(PcapValidationError),
}

impl From<PcapValidationError> for SinkError {
    fn from(err: PcapValidationError) -> Self {
        SinkError::InvalidField(err)
    }
}


/* ----- enum PcapValidationError ----- */

/// Errors that can occur while building a record header.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PcapValidationError {
    /// The timestamp is too big to be represented in a u32 seconds field
    #[error("Timestamp too big: {0:?} > 2^32 seconds")]
    TimestampTooBig(Duration),
    /// The data length is bigger than u32::MAX
    #[error("data length too big: {0} > u32::MAX")]
    DataTooBig(usize),
}
