use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;

use pcap_sink::pcap::global_header;
use pcap_sink::{CaptureRecord, PipeSink, PipeState, SinkError};

use crate::slice_records;

/// In-memory pipe whose reader can be detached.
#[derive(Debug, Clone, Default)]
struct FakePipe {
    data: Rc<RefCell<Vec<u8>>>,
    detached: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl Write for FakePipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.set(self.writes.get() + 1);
        if self.detached.get() {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }

        self.data.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn unopened_pipe_drops_writes() {
    let mut pipe = PipeSink::new();

    assert!(!pipe.is_open());
    assert_eq!(pipe.state(), PipeState::Unopened);

    pipe.write(&[1, 2, 3]);
    pipe.new_packet(1, &[0xAA]);
    pipe.write_record(&CaptureRecord::new(1, &[0xAA]).unwrap());

    assert_eq!(pipe.state(), PipeState::Unopened);
    assert!(pipe.into_writer().is_none());
}

#[test]
fn header_written_once_on_open() {
    let fake = FakePipe::default();
    let mut pipe = PipeSink::with_writer(fake.clone()).unwrap();

    assert!(pipe.is_open());
    assert_eq!(pipe.state(), PipeState::Open);
    assert_eq!(&fake.data.borrow()[..], &global_header()[..]);

    pipe.new_packet(1, &[0xAA, 0xBB]);
    pipe.new_packet(2, &[0xCC]);

    let data = fake.data.borrow();
    assert_eq!(&data[..24], &global_header()[..]);
    assert_eq!(data.len(), 24 + 19 + 18);

    let records = slice_records(&data);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].data, &[1, 0xAA, 0xBB]);
    assert_eq!(records[1].data, &[2, 0xCC]);
}

#[test]
fn broken_pipe_closes_sink() {
    let fake = FakePipe::default();
    let mut pipe = PipeSink::with_writer(fake.clone()).unwrap();
    pipe.new_packet(1, &[0xAA, 0xBB]);

    fake.detached.set(true);
    pipe.new_packet(1, &[0xCC]);

    assert!(!pipe.is_open());
    assert_eq!(pipe.state(), PipeState::Closed);

    // Nothing reaches the writer anymore
    let writes = fake.writes.get();
    fake.detached.set(false);
    pipe.new_packet(1, &[0xDD]);
    pipe.write(&[0xEE]);

    assert_eq!(fake.writes.get(), writes);
    assert_eq!(fake.data.borrow().len(), 24 + 19);
    assert!(pipe.into_writer().is_none());
}

#[test]
fn close_is_idempotent() {
    let fake = FakePipe::default();
    let mut pipe = PipeSink::with_writer(fake.clone()).unwrap();

    pipe.close();
    assert!(!pipe.is_open());
    pipe.close();
    assert_eq!(pipe.state(), PipeState::Closed);

    pipe.write(&[1]);
    assert_eq!(fake.data.borrow().len(), 24);

    let mut unopened = PipeSink::new();
    unopened.close();
    assert_eq!(unopened.state(), PipeState::Closed);
}

#[test]
fn header_failure_is_reported() {
    let fake = FakePipe::default();
    fake.detached.set(true);

    let err = PipeSink::with_writer(fake).unwrap_err();
    assert!(matches!(err, SinkError::PipeWriteFailed(_)));
}

#[cfg(unix)]
mod fifo {
    use std::fs::{self, File};
    use std::io::Read;
    use std::path::PathBuf;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    use pcap_sink::pcap::global_header;
    use pcap_sink::sink::{create_fifo, FifoCreation};
    use pcap_sink::{PipeSink, PipeState, SinkError};
    use tempfile::tempdir;

    use crate::slice_records;

    /// Waits for the FIFO to appear, then reads `len` bytes from it and detaches.
    fn spawn_reader(path: PathBuf, len: usize) -> JoinHandle<Vec<u8>> {
        thread::spawn(move || {
            while !path.exists() {
                thread::sleep(Duration::from_millis(1));
            }

            let mut file = File::open(&path).unwrap();
            let mut buf = vec![0; len];
            file.read_exact(&mut buf).unwrap();
            buf
        })
    }

    #[test]
    fn stream_to_fifo_until_reader_detaches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sniffer");

        let reader = spawn_reader(path.clone(), 24 + 19);
        let mut pipe = PipeSink::open_and_init(&path).unwrap();
        assert!(pipe.is_open());
        assert_eq!(pipe.path(), Some(path.as_path()));

        pipe.new_packet(1, &[0xAA, 0xBB]);
        let data = reader.join().unwrap();

        assert_eq!(&data[..24], &global_header()[..]);
        let records = slice_records(&data);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].incl_len, 3);
        assert_eq!(records[0].data, &[1, 0xAA, 0xBB]);

        // The reader is gone
        pipe.new_packet(1, &[0xCC]);
        assert!(!pipe.is_open());
        assert_eq!(pipe.state(), PipeState::Closed);
        pipe.new_packet(1, &[0xDD]);
    }

    #[test]
    fn stale_fifo_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sniffer");

        assert_eq!(create_fifo(&path).unwrap(), FifoCreation::Created);
        assert_eq!(create_fifo(&path).unwrap(), FifoCreation::AlreadyExists);

        match PipeSink::open_and_init(&path) {
            Err(SinkError::PipeAlreadyExists(p)) => assert_eq!(p, path),
            other => panic!("Expected PipeAlreadyExists, got {other:?}"),
        }

        // Once the stale pipe is removed a new lifetime can start
        fs::remove_file(&path).unwrap();
        let reader = spawn_reader(path.clone(), 24);
        let pipe = PipeSink::open_and_init(&path).unwrap();
        assert_eq!(&reader.join().unwrap()[..], &global_header()[..]);
        assert!(pipe.is_open());
    }

    #[test]
    fn existing_file_is_already_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sniffer");
        fs::write(&path, b"").unwrap();

        assert_eq!(create_fifo(&path).unwrap(), FifoCreation::AlreadyExists);
    }

    #[test]
    fn fifo_in_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("sniffer");

        assert!(matches!(create_fifo(&path), Err(SinkError::PipeCreateFailed(p, _)) if p == path));
    }
}
