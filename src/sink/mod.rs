//! Contains the capture sinks: the rolling capture file and the live pipe

mod file;
mod pipe;

pub use file::*;
pub use pipe::*;
