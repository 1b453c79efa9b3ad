use std::fs::File;

use crate::errors::*;
use crate::pcap::CaptureRecord;
use crate::sink::{PipeSink, RollingFileSink};


/// Delivers every packet to the capture file and to the live pipe.
///
/// The file is the durable copy: a failed append is returned to the caller.
/// The pipe is best effort: when its reader goes away the emitter keeps capturing to the file
/// until a new pipe is attached.
///
/// # Examples
///
/// ```rust,no_run
/// use pcap_sink::{CaptureEmitter, PipeSink, RollingFileSink};
///
/// let file = RollingFileSink::open("capture.pcap", false).unwrap();
/// let mut emitter = CaptureEmitter::new(Some(file), PipeSink::new());
///
/// emitter.new_packet(1, &[0xAA, 0xBB]).unwrap();
/// ```
#[derive(Debug)]
pub struct CaptureEmitter<W: std::io::Write = File> {
    file: Option<RollingFileSink>,
    pipe: PipeSink<W>,
    packets: u64,
}

impl<W: std::io::Write> CaptureEmitter<W> {
    /// Creates an emitter over an optional capture file and a pipe sink, which may be unopened.
    pub fn new(file: Option<RollingFileSink>, pipe: PipeSink<W>) -> CaptureEmitter<W> {
        CaptureEmitter { file, pipe, packets: 0 }
    }

    /// Replaces the pipe sink, returning the previous one.
    pub fn attach_pipe(&mut self, pipe: PipeSink<W>) -> PipeSink<W> {
        std::mem::replace(&mut self.pipe, pipe)
    }

    /// Builds one record for the packet and writes it to every sink.
    ///
    /// Both sinks receive the same timestamp.
    ///
    /// # Errors
    ///
    /// Return an error if the record can't be built or can't be appended to the capture file.
    pub fn new_packet(&mut self, board_id: u8, payload: &[u8]) -> SinkResult<()> {
        let record = CaptureRecord::new(board_id, payload)?;

        if let Some(file) = &self.file {
            file.write_record(&record)?;
        }
        self.pipe.write_record(&record);
        self.packets += 1;

        Ok(())
    }

    /// The capture file sink, if any.
    pub fn file(&self) -> Option<&RollingFileSink> {
        self.file.as_ref()
    }

    /// The pipe sink.
    pub fn pipe(&self) -> &PipeSink<W> {
        &self.pipe
    }

    pub fn pipe_mut(&mut self) -> &mut PipeSink<W> {
        &mut self.pipe
    }

    /// Number of packets emitted so far.
    pub fn packets(&self) -> u64 {
        self.packets
    }
}
