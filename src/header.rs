//! The fixed 16-byte record at the start of every Yaz0 stream.

use std::io::Write;
use byteorder::{ByteOrder, WriteBytesExt, BE};
use fehler::throws;

use crate::reader::{ByteReader, Endianness};

/// The four magic bytes at the start of every Yaz0 stream.
pub const MAGIC: [u8; 4] = *b"Yaz0";
/// Size of the header. All offsets in the body are relative to its end.
pub const HEADER_SIZE: usize = 16;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Header {
    pub magic: [u8; 4],
    /// Exact length of the decompressed payload.
    pub uncompressed_size: u32,
    /// Alignment hint for whoever consumes the decompressed data (0 = none).
    /// The codec itself never looks at it.
    pub data_alignment: u32,
    /// Written as zero, ignored on read.
    pub reserved: [u8; 4],
}

impl Header {
    pub fn new(uncompressed_size: u32, data_alignment: u32) -> Self {
        Header { magic: MAGIC, uncompressed_size, data_alignment, reserved: [0; 4] }
    }

    /// Reads a header at the reader's cursor.
    ///
    /// Returns `None` if there aren't enough bytes or the magic is wrong. The declared size
    /// is not checked against anything.
    pub fn read(reader: &mut ByteReader<'_>) -> Option<Self> {
        let magic = reader.read::<[u8; 4]>().ok()?;
        if magic != MAGIC {
            return None;
        }
        Some(Header {
            magic,
            uncompressed_size: reader.read::<u32>().ok()?,
            data_alignment: reader.read::<u32>().ok()?,
            reserved: reader.read::<[u8; 4]>().ok()?,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..4].copy_from_slice(&MAGIC);
        BE::write_u32(&mut buf[4..8], self.uncompressed_size);
        BE::write_u32(&mut buf[8..12], self.data_alignment);
        buf
    }

    #[throws(std::io::Error)]
    pub fn write<W: Write>(&self, mut writer: W) {
        writer.write_all(&MAGIC)?;
        writer.write_u32::<BE>(self.uncompressed_size)?;
        writer.write_u32::<BE>(self.data_alignment)?;
        writer.write_all(&[0; 4])?;
    }
}

/// Parses the header at the start of `data`, if there is a valid one.
pub fn parse_header(data: &[u8]) -> Option<Header> {
    Header::read(&mut ByteReader::new(data, Endianness::Big))
}
