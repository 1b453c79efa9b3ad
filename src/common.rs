//! Link types and constants shared by the codec and the sinks.

/// Size, in bytes, above which a capture file is rolled over when a sink is opened.
pub const ROTATE_THRESHOLD: u64 = 20_000_000;

/// Suffix appended to the capture file name to get its single backup generation.
pub const BACKUP_SUFFIX: &str = ".1";

/// Conventional name of the capture file.
pub const DEFAULT_CAPTURE_FILE: &str = "capture.pcap";

/// Snapshot length written in every global header, records are never truncated.
pub const SNAPLEN: u32 = 0xFFFF;

/// Size of the encoded global header.
pub const GLOBAL_HEADER_LEN: usize = 24;

/// Size of an encoded record header.
pub const RECORD_HEADER_LEN: usize = 16;


/// Link-layer type written in the `network` field of the global header.
///
/// See [tcpdump link types](https://www.tcpdump.org/linktypes.html).
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DataLink {
    /// Nordic BLE sniffer framing: a board identifier byte followed by the sniffer packet.
    NORDIC_BLE,
    /// Bluetooth Low Energy link layer, without the sniffer framing.
    BLUETOOTH_LE_LL,
    Unknown(u32)
}

impl From<u32> for DataLink {
    fn from(n: u32) -> DataLink {
        match n {
            157 => DataLink::NORDIC_BLE,
            251 => DataLink::BLUETOOTH_LE_LL,
            _ => DataLink::Unknown(n)
        }
    }
}

impl From<DataLink> for u32 {
    fn from(link: DataLink) -> u32 {
        match link {
            DataLink::NORDIC_BLE => 157,
            DataLink::BLUETOOTH_LE_LL => 251,
            DataLink::Unknown(n) => n
        }
    }
}
