use std::borrow::Cow;
use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use byteorder_slice::byteorder::{LittleEndian, WriteBytesExt};
use derive_into_owned::IntoOwned;

use crate::errors::*;
use crate::RECORD_HEADER_LEN;


/// Pcap record header, precedes the bytes of every record.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RecordHeader {
    /// Timestamp in seconds
    pub ts_sec: u32,
    /// Microsecond part of the timestamp
    pub ts_usec: u32,
    /// Number of octets of the record saved in the stream
    pub incl_len: u32,
    /// Original length of the record, always equal to `incl_len`
    pub orig_len: u32,
}

impl RecordHeader {
    /// Creates a `RecordHeader` for a payload of `len` bytes captured at `timestamp` (EPOCH based).
    ///
    /// Returns an error if `len` or the seconds of `timestamp` don't fit in a u32.
    pub fn new(timestamp: Duration, len: usize) -> Result<RecordHeader, PcapValidationError> {
        let ts_sec = timestamp.as_secs();
        if ts_sec > u32::MAX as u64 {
            return Err(PcapValidationError::TimestampTooBig(timestamp));
        }

        let len = u32::try_from(len).map_err(|_| PcapValidationError::DataTooBig(len))?;

        Ok(RecordHeader {
            ts_sec: ts_sec as u32,
            ts_usec: timestamp.subsec_micros(),
            incl_len: len,
            orig_len: len,
        })
    }

    /// Creates a `RecordHeader` for a payload of `len` bytes stamped with the current wall-clock time.
    pub fn now(len: usize) -> Result<RecordHeader, PcapValidationError> {
        RecordHeader::new(wall_clock(), len)
    }

    /// Writes the `RecordHeader` to a writer, least significant byte first.
    ///
    /// Writes 16B in the writer on success.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<LittleEndian>(self.ts_sec)?;
        writer.write_u32::<LittleEndian>(self.ts_usec)?;
        writer.write_u32::<LittleEndian>(self.incl_len)?;
        writer.write_u32::<LittleEndian>(self.orig_len)?;

        Ok(())
    }

    /// Encodes the `RecordHeader` into its 16B representation.
    pub fn to_bytes(&self) -> [u8; RECORD_HEADER_LEN] {
        let mut out = [0_u8; RECORD_HEADER_LEN];
        let mut dst = &mut out[..];

        // A 16B slice always has room for the 16B header
        let _ = self.write_to(&mut dst);

        out
    }
}

/// Encodes a record header for a payload of `len` bytes, stamped now.
pub fn encode_record_header(len: usize) -> Result<[u8; RECORD_HEADER_LEN], PcapValidationError> {
    RecordHeader::now(len).map(|header| header.to_bytes())
}

/// Current time since EPOCH, a clock set before EPOCH yields zero.
fn wall_clock() -> Duration {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default()
}


/// A record as it is written on a sink: header, board identifier and raw packet bytes.
///
/// The packet bytes can be owned or borrowed.
#[derive(Clone, Debug, IntoOwned, Eq, PartialEq)]
pub struct CaptureRecord<'a> {
    /// Header of the record, its lengths account for the board identifier
    pub header: RecordHeader,
    /// Identifier of the board which captured the packet
    pub board_id: u8,
    /// Raw packet bytes, owned or borrowed
    pub payload: Cow<'a, [u8]>,
}

impl<'a> CaptureRecord<'a> {
    /// Creates a new borrowed `CaptureRecord` stamped with the current wall-clock time.
    pub fn new(board_id: u8, payload: &'a [u8]) -> Result<CaptureRecord<'a>, PcapValidationError> {
        CaptureRecord::with_timestamp(wall_clock(), board_id, payload)
    }

    /// Creates a new borrowed `CaptureRecord` with the given timestamp.
    pub fn with_timestamp(timestamp: Duration, board_id: u8, payload: &'a [u8]) -> Result<CaptureRecord<'a>, PcapValidationError> {
        let header = RecordHeader::new(timestamp, record_len(payload.len())?)?;

        Ok(CaptureRecord { header, board_id, payload: Cow::Borrowed(payload) })
    }

    /// Creates a new owned `CaptureRecord` stamped with the current wall-clock time.
    pub fn new_owned(board_id: u8, payload: Vec<u8>) -> Result<CaptureRecord<'static>, PcapValidationError> {
        let header = RecordHeader::now(record_len(payload.len())?)?;

        Ok(CaptureRecord { header, board_id, payload: Cow::Owned(payload) })
    }

    /// Number of bytes taken by the record on a sink, header included.
    pub fn len(&self) -> usize {
        RECORD_HEADER_LEN + self.header.incl_len as usize
    }

    /// Always false, a record holds at least its header and board identifier.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Writes the `CaptureRecord` to a writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.header.write_to(writer)?;
        writer.write_u8(self.board_id)?;
        writer.write_all(&self.payload)?;

        Ok(())
    }

    /// Encodes the `CaptureRecord` into a contiguous buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.push(self.board_id);
        out.extend_from_slice(&self.payload);

        out
    }
}

// The board identifier byte is part of the record
fn record_len(payload_len: usize) -> Result<usize, PcapValidationError> {
    payload_len.checked_add(1).ok_or(PcapValidationError::DataTooBig(payload_len))
}
