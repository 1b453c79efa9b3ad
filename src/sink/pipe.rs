use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::errors::*;
use crate::pcap::{global_header, CaptureRecord};


/// Lifecycle of a [`PipeSink`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PipeState {
    /// No pipe was ever opened, writes are dropped.
    Unopened,
    /// The global header was written, records are streamed.
    Open,
    /// The pipe was closed explicitly or its reader went away, writes are dropped.
    Closed,
}

/// Outcome of [`create_fifo`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FifoCreation {
    /// A new FIFO was created at the path.
    Created,
    /// Something already exists at the path.
    AlreadyExists,
}

/// Creates a FIFO at `path`, readable and writable by the owner only.
///
/// # Errors
///
/// Return an error if the FIFO can't be created, except when the path is taken which is
/// reported as [`FifoCreation::AlreadyExists`].
#[cfg(unix)]
pub fn create_fifo<P: AsRef<Path>>(path: P) -> SinkResult<FifoCreation> {
    use nix::errno::Errno;
    use nix::sys::stat::Mode;

    let path = path.as_ref();
    match nix::unistd::mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR) {
        Ok(()) => Ok(FifoCreation::Created),
        Err(Errno::EEXIST) => Ok(FifoCreation::AlreadyExists),
        Err(errno) => Err(SinkError::PipeCreateFailed(path.to_path_buf(), errno.into())),
    }
}


/// Streams pcap records to a live consumer, typically a packet analyzer reading a named pipe.
///
/// The global header is written once when a lifetime starts. When a write fails, most likely
/// because the reader detached, the sink closes itself and every further write is dropped.
/// Starting a new lifetime means opening a new sink.
///
/// # Examples
///
/// ```rust,no_run
/// use pcap_sink::PipeSink;
///
/// // Blocks until a reader opens the pipe
/// let mut pipe = PipeSink::open_and_init("/tmp/ble-sniffer").unwrap();
/// pipe.new_packet(1, &[0xAA, 0xBB]);
///
/// if !pipe.is_open() {
///     // The reader went away
/// }
/// ```
#[derive(Debug)]
pub struct PipeSink<W: Write = File> {
    writer: Option<W>,
    state: PipeState,
    path: Option<PathBuf>,
}

#[cfg(unix)]
impl PipeSink<File> {
    /// Creates a FIFO at `pipe_path`, waits for a reader and writes the global header.
    ///
    /// # Errors
    ///
    /// Return [`SinkError::PipeAlreadyExists`] if the path is already taken: a stale pipe must be
    /// removed by the caller before retrying.
    /// Return an error if the pipe can't be created, opened or written to.
    pub fn open_and_init<P: AsRef<Path>>(pipe_path: P) -> SinkResult<PipeSink<File>> {
        let path = pipe_path.as_ref();

        if create_fifo(path)? == FifoCreation::AlreadyExists {
            error!("Pipe {} already exists", path.display());
            return Err(SinkError::PipeAlreadyExists(path.to_path_buf()));
        }

        debug!("Waiting for a reader on {}", path.display());
        let file = File::options()
            .write(true)
            .open(path)
            .map_err(SinkError::PipeOpenFailed)?;

        let mut sink = PipeSink::with_writer(file)?;
        sink.path = Some(path.to_path_buf());
        info!("Pipe {} attached", path.display());

        Ok(sink)
    }
}

impl PipeSink<File> {
    /// Creates a sink with no pipe, every write is dropped.
    ///
    /// Use [`Default`] for a sink over another writer type.
    pub fn new() -> PipeSink<File> {
        PipeSink::default()
    }
}

impl<W: Write> PipeSink<W> {
    /// Starts a lifetime on an already opened writer by writing the global header.
    ///
    /// # Errors
    ///
    /// Return an error if the global header can't be written.
    pub fn with_writer(mut writer: W) -> SinkResult<PipeSink<W>> {
        writer.write_all(global_header()).map_err(SinkError::PipeWriteFailed)?;
        writer.flush().map_err(SinkError::PipeWriteFailed)?;

        Ok(PipeSink { writer: Some(writer), state: PipeState::Open, path: None })
    }

    /// Returns true iff the pipe is open and its reader has not gone away.
    pub fn is_open(&self) -> bool {
        self.state == PipeState::Open && self.writer.is_some()
    }

    /// Current state of the sink.
    pub fn state(&self) -> PipeState {
        self.state
    }

    /// Path of the FIFO, if the sink was opened on one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes raw bytes to the pipe.
    ///
    /// Nothing is written if the pipe is not open.
    /// A failed write is logged and closes the sink.
    pub fn write(&mut self, data: &[u8]) {
        if !self.is_open() {
            return;
        }

        let result = match self.writer.as_mut() {
            Some(writer) => writer.write_all(data).and_then(|_| writer.flush()),
            None => return,
        };

        if let Err(e) = result {
            error!("Got error trying to write to pipe: {}", e);
            self.close();
        }
    }

    /// Writes an already built record.
    pub fn write_record(&mut self, record: &CaptureRecord) {
        if self.is_open() {
            self.write(&record.to_bytes());
        }
    }

    /// Builds a record made of `board_id` followed by `payload`, stamped with the current time, and writes it.
    pub fn new_packet(&mut self, board_id: u8, payload: &[u8]) {
        if !self.is_open() {
            return;
        }

        match CaptureRecord::new(board_id, payload) {
            Ok(record) => self.write_record(&record),
            Err(e) => error!("Dropping packet for pipe: {}", e),
        }
    }

    /// Closes the pipe, does nothing if it is already closed.
    pub fn close(&mut self) {
        if self.state == PipeState::Closed {
            return;
        }

        debug!("Closing pipe");
        self.writer = None;
        self.state = PipeState::Closed;
    }

    /// Consumes the `PipeSink`, returning the wrapped writer if it is still open.
    pub fn into_writer(self) -> Option<W> {
        self.writer
    }
}

impl<W: Write> Default for PipeSink<W> {
    fn default() -> Self {
        PipeSink { writer: None, state: PipeState::Unopened, path: None }
    }
}
