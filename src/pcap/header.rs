use std::io::Write;

use byteorder_slice::byteorder::{LittleEndian, WriteBytesExt};
use once_cell::sync::Lazy;

use crate::{DataLink, GLOBAL_HEADER_LEN, SNAPLEN};


static GLOBAL_HEADER: Lazy<[u8; GLOBAL_HEADER_LEN]> = Lazy::new(|| GlobalHeader::default().to_bytes());

/// Pcap global header, written once at the start of every output stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GlobalHeader {
    /// Magic number, written little endian
    pub magic_number: u32,

    /// Major version number
    pub version_major: u16,

    /// Minor version number
    pub version_minor: u16,

    /// GMT to local timezone correction, always 0
    pub thiszone: i32,

    /// Timestamp accuracy, always 0
    pub sigfigs: u32,

    /// Max length of a captured record
    pub snaplen: u32,

    /// DataLink type of the records
    pub network: DataLink,
}

impl GlobalHeader {
    /// Writes the `GlobalHeader` to a writer, least significant byte first.
    ///
    /// Writes 24B in the writer on success.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u32::<LittleEndian>(self.magic_number)?;
        writer.write_u16::<LittleEndian>(self.version_major)?;
        writer.write_u16::<LittleEndian>(self.version_minor)?;
        writer.write_i32::<LittleEndian>(self.thiszone)?;
        writer.write_u32::<LittleEndian>(self.sigfigs)?;
        writer.write_u32::<LittleEndian>(self.snaplen)?;
        writer.write_u32::<LittleEndian>(self.network.into())?;

        Ok(())
    }

    /// Encodes the `GlobalHeader` into its 24B representation.
    pub fn to_bytes(&self) -> [u8; GLOBAL_HEADER_LEN] {
        let mut out = [0_u8; GLOBAL_HEADER_LEN];
        let mut dst = &mut out[..];

        // A 24B slice always has room for the 24B header
        let _ = self.write_to(&mut dst);

        out
    }
}

/// Creates the `GlobalHeader` used by every stream:
///
/// ```rust,ignore
/// GlobalHeader {
///     magic_number: 0xa1b2c3d4,
///     version_major: 2,
///     version_minor: 4,
///     thiszone: 0,
///     sigfigs: 0,
///     snaplen: 0xFFFF,
///     network: DataLink::NORDIC_BLE,
/// };
/// ```
impl Default for GlobalHeader {
    fn default() -> Self {
        GlobalHeader {
            magic_number: 0xa1b2c3d4,
            version_major: 2,
            version_minor: 4,
            thiszone: 0,
            sigfigs: 0,
            snaplen: SNAPLEN,
            network: DataLink::NORDIC_BLE,
        }
    }
}

/// Returns the encoded default [`GlobalHeader`], identical on every call.
pub fn global_header() -> &'static [u8; GLOBAL_HEADER_LEN] {
    &GLOBAL_HEADER
}

/// Returns a copy of the encoded default [`GlobalHeader`].
pub fn encode_global_header() -> [u8; GLOBAL_HEADER_LEN] {
    *global_header()
}
