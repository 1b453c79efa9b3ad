//! Writes a stream of captured packets as classic pcap to two kinds of sinks:
//! a size-bounded capture file rolled over to a single backup, and a named pipe feeding a live
//! packet analyzer.
//!
//! Every record is made of a 16B record header, the identifier of the board which captured the
//! packet and the raw packet bytes. Every stream starts with the same 24B global header
//! using the Nordic BLE link type.
//!
//! # Examples
//!
//! ```no_run
//! use pcap_sink::{CaptureEmitter, PipeSink, RollingFileSink, SinkError};
//!
//! let file = RollingFileSink::open("capture.pcap", false).expect("Error opening capture file");
//!
//! // Blocks until a reader, e.g. `wireshark -k -i /tmp/ble-sniffer`, attaches
//! let pipe = match PipeSink::open_and_init("/tmp/ble-sniffer") {
//!     Ok(pipe) => pipe,
//!     Err(SinkError::PipeAlreadyExists(path)) => {
//!         eprintln!("Remove the stale pipe {path:?} first");
//!         std::process::exit(1);
//!     },
//!     Err(e) => panic!("{e}"),
//! };
//!
//! let mut emitter = CaptureEmitter::new(Some(file), pipe);
//!
//! // For each packet yielded by the sniffer
//! emitter.new_packet(1, &[0xAA, 0xBB]).unwrap();
//! ```

pub mod errors;
pub mod pcap;
pub mod sink;
mod common;
mod emitter;

pub use common::*;
pub use emitter::CaptureEmitter;
pub use errors::{PcapValidationError, SinkError, SinkResult};
pub use pcap::{CaptureRecord, GlobalHeader, RecordHeader};
pub use sink::{PipeSink, PipeState, RollingFileSink};
