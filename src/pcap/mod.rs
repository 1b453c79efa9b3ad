//! Contains the pcap encoders: the global header, the record header and the capture record

mod header;
mod record;

pub use header::*;
pub use record::*;
