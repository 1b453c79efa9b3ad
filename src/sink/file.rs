use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::errors::*;
use crate::pcap::{global_header, CaptureRecord};
use crate::{BACKUP_SUFFIX, ROTATE_THRESHOLD};


/// Appends records to a pcap capture file, keeping one backup generation of it.
///
/// No file handle is held between calls: every append opens the file, writes the whole record,
/// flushes and closes it.
///
/// The size of the file is only checked when the sink is opened, so the file can grow past the
/// threshold during a session.
///
/// # Examples
///
/// ```rust,no_run
/// use pcap_sink::RollingFileSink;
///
/// let sink = RollingFileSink::open("capture.pcap", false).unwrap();
/// sink.append_record(1, &[0xAA, 0xBB]).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RollingFileSink {
    path: PathBuf,
    backup_path: PathBuf,
    threshold: u64,
}

impl RollingFileSink {
    /// Opens the capture file at `path`, rolling it over if it is bigger than [`ROTATE_THRESHOLD`].
    ///
    /// A missing file is created with the global header. When `truncate` is set the file is
    /// recreated with only the global header, whatever its previous content.
    ///
    /// # Errors
    ///
    /// Return an error if the file has to be created and can't be.
    /// A failed rollover is logged and the previous file is kept.
    pub fn open<P: AsRef<Path>>(path: P, truncate: bool) -> SinkResult<RollingFileSink> {
        RollingFileSink::open_with_threshold(path, ROTATE_THRESHOLD, truncate)
    }

    /// Same as [`RollingFileSink::open`] with a custom rollover threshold in bytes.
    pub fn open_with_threshold<P: AsRef<Path>>(path: P, threshold: u64, truncate: bool) -> SinkResult<RollingFileSink> {
        let path = path.as_ref().to_path_buf();
        let sink = RollingFileSink { backup_path: backup_path_for(&path), path, threshold };

        match fs::metadata(&sink.path) {
            Ok(meta) if meta.len() > sink.threshold => sink.roll_over(),
            Ok(_) => {},
            Err(_) => sink.start_new_file()?,
        }

        if truncate {
            sink.start_new_file()?;
        }

        Ok(sink)
    }

    /// Path of the capture file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the backup generation of the capture file.
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Size in bytes above which the file is rolled over at open time.
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Current size of the capture file.
    pub fn size(&self) -> SinkResult<u64> {
        fs::metadata(&self.path)
            .map(|meta| meta.len())
            .map_err(SinkError::ReadFailed)
    }

    /// Appends a record made of `board_id` followed by `payload`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Return an error if the record was not durably written.
    pub fn append_record(&self, board_id: u8, payload: &[u8]) -> SinkResult<()> {
        let record = CaptureRecord::new(board_id, payload)?;
        self.write_record(&record)
    }

    /// Appends an already built record.
    pub fn write_record(&self, record: &CaptureRecord) -> SinkResult<()> {
        self.append(&record.to_bytes())
    }

    /// Returns the whole content of the capture file, global header included.
    pub fn read_all(&self) -> SinkResult<Vec<u8>> {
        fs::read(&self.path).map_err(SinkError::ReadFailed)
    }

    /// Returns the content of the capture file from `offset` to its end.
    ///
    /// An offset past the end of the file returns an empty buffer.
    pub fn read_from(&self, offset: u64) -> SinkResult<Vec<u8>> {
        let mut file = File::open(&self.path).map_err(SinkError::ReadFailed)?;
        file.seek(SeekFrom::Start(offset)).map_err(SinkError::ReadFailed)?;

        let mut out = Vec::new();
        file.read_to_end(&mut out).map_err(SinkError::ReadFailed)?;

        Ok(out)
    }

    fn append(&self, data: &[u8]) -> SinkResult<()> {
        // The file must already exist with its global header
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(SinkError::WriteFailed)?;

        file.write_all(data).map_err(SinkError::WriteFailed)?;
        file.flush().map_err(SinkError::WriteFailed)?;

        Ok(())
    }

    fn start_new_file(&self) -> SinkResult<()> {
        let mut file = File::create(&self.path).map_err(SinkError::CreateFailed)?;
        file.write_all(global_header()).map_err(SinkError::CreateFailed)?;
        file.flush().map_err(SinkError::CreateFailed)?;

        debug!("Created capture file {}", self.path.display());
        Ok(())
    }

    fn roll_over(&self) {
        match fs::remove_file(&self.backup_path) {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::NotFound => debug!("No capture backup to remove at {}", self.backup_path.display()),
            Err(e) => warn!("Failed to remove capture backup {}: {}", self.backup_path.display(), e),
        }

        if let Err(e) = fs::rename(&self.path, &self.backup_path) {
            error!("Capture file rollover of {} failed: {}", self.path.display(), e);
            return;
        }

        match self.start_new_file() {
            Ok(()) => info!("Rolled capture file {} over to {}", self.path.display(), self.backup_path.display()),
            Err(e) => error!("Capture file rollover of {} failed: {}", self.path.display(), e),
        }
    }
}

/// Returns the backup path of a capture file: its path with [`BACKUP_SUFFIX`] appended.
pub fn backup_path_for<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(BACKUP_SUFFIX);

    PathBuf::from(name)
}
