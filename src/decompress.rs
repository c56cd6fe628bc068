//! Yaz0 decompression.
//!
//! The body is a sequence of groups: a flag byte followed by up to eight chunks. A set bit
//! (most significant first) means the chunk is a single literal byte, a clear bit means it is a
//! back-reference into what has been decompressed so far:
//!
//! ```text
//! 0xNDDD        copy N + 2 bytes from DDD + 1 bytes back   (N != 0)
//! 0x0DDD LL     copy LL + 0x12 bytes from DDD + 1 bytes back
//! ```
//!
//! Decoding stops as soon as the output has the size declared in the header, so the last group
//! may be short and anything after the final chunk is never looked at.

use fehler::{throw, throws};
use thiserror::Error;
use tracing::{debug, trace};

use crate::compress::{CHUNKS_PER_GROUP, LONG_MATCH};
use crate::header::{Header, HEADER_SIZE};
use crate::reader::{self, ByteReader, Endianness};

#[derive(Error, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Error {
    #[error("input does not start with a Yaz0 header")]
    InvalidHeader,
    /// Expected more bytes, but found none.
    /// Either your input was truncated or you're trying to decompress garbage.
    #[error("the compressed stream ended early")]
    Truncated(#[from] reader::Error),
    /// A back-reference points before the start of the output or runs past its end.
    #[error("copy of {length} bytes from {distance} bytes back at output offset {position} is out of bounds")]
    CorruptCopy { position: usize, distance: usize, length: usize },
    #[error("destination is {actual} bytes but the header says {expected}")]
    DestinationSize { expected: usize, actual: usize },
}

/// Where we are in the group structure.
#[derive(Clone, Copy, Debug)]
enum GroupState {
    AwaitingGroupHeader,
    /// `flags` is shifted so the next chunk's bit is the most significant one.
    InGroup { flags: u8, remaining: usize },
}

impl GroupState {
    fn next(flags: u8, remaining: usize) -> Self {
        match remaining - 1 {
            0 => GroupState::AwaitingGroupHeader,
            remaining => GroupState::InGroup { flags: flags << 1, remaining },
        }
    }
}

/// Splits a match code into `(distance, length)`.
fn decode_pair(pair: u16, extra: impl FnOnce() -> Result<u8, reader::Error>) -> Result<(usize, usize), reader::Error> {
    let distance = (pair & 0x0FFF) as usize + 1;
    let length = match pair >> 12 {
        0 => extra()? as usize + LONG_MATCH,
        n => n as usize + 2,
    };
    Ok((distance, length))
}

#[throws]
fn header_for(input: &[u8]) -> Header {
    crate::header::parse_header(input).ok_or(Error::InvalidHeader)?
}

fn body_reader(input: &[u8]) -> ByteReader<'_> {
    let mut reader = ByteReader::new(input, Endianness::Big);
    reader.seek(HEADER_SIZE);
    reader
}

#[throws]
fn replay(reader: &mut ByteReader, output: &mut [u8]) {
    let mut state = GroupState::AwaitingGroupHeader;
    let mut cursor = 0;
    while cursor < output.len() {
        let (flags, remaining) = match state {
            GroupState::AwaitingGroupHeader => (reader.read::<u8>()?, CHUNKS_PER_GROUP),
            GroupState::InGroup { flags, remaining } => (flags, remaining),
        };

        if flags & 0x80 != 0 {
            output[cursor] = reader.read::<u8>()?;
            cursor += 1;
        } else {
            let pair = reader.read::<u16>()?;
            let (distance, length) = decode_pair(pair, || reader.read::<u8>())?;

            let source = match cursor.checked_sub(distance) {
                Some(source) if length <= output.len() - cursor => source,
                _ => {
                    trace!(cursor, distance, length, "rejecting out of bounds copy");
                    throw!(Error::CorruptCopy { position: cursor, distance, length });
                }
            };
            // byte by byte: the source may overlap what we are writing
            for i in 0..length {
                output[cursor + i] = output[source + i];
            }
            cursor += length;
        }

        state = GroupState::next(flags, remaining);
    }
}

/// Decompresses into `output`, which must be exactly as large as the header says.
#[throws]
pub fn decompress_into(input: &[u8], output: &mut [u8]) {
    let header = header_for(input)?;
    let expected = header.uncompressed_size as usize;
    if output.len() != expected {
        throw!(Error::DestinationSize { expected, actual: output.len() });
    }

    debug!(compressed = input.len(), uncompressed = expected, "decompressing Yaz0 stream");
    let mut reader = body_reader(input);
    replay(&mut reader, output)?;
    debug!(consumed = reader.tell(), "finished Yaz0 stream");
}

/// Decompresses all of `input`, checking every read and every copy.
#[throws]
pub fn decompress(input: &[u8]) -> Vec<u8> {
    let header = header_for(input)?;
    let mut output = vec![0u8; header.uncompressed_size as usize];

    debug!(compressed = input.len(), uncompressed = output.len(), "decompressing Yaz0 stream");
    let mut reader = body_reader(input);
    replay(&mut reader, &mut output)?;
    debug!(consumed = reader.tell(), "finished Yaz0 stream");
    output
}

fn replay_trusted(reader: &mut ByteReader, output: &mut [u8]) {
    let mut state = GroupState::AwaitingGroupHeader;
    let mut cursor = 0;
    while cursor < output.len() {
        let (flags, remaining) = match state {
            GroupState::AwaitingGroupHeader => (reader.read_unchecked::<u8>(), CHUNKS_PER_GROUP),
            GroupState::InGroup { flags, remaining } => (flags, remaining),
        };

        if flags & 0x80 != 0 {
            output[cursor] = reader.read_unchecked::<u8>();
            cursor += 1;
        } else {
            let pair = reader.read_unchecked::<u16>();
            let distance = (pair & 0x0FFF) as usize + 1;
            let length = match pair >> 12 {
                0 => reader.read_unchecked::<u8>() as usize + LONG_MATCH,
                n => n as usize + 2,
            };
            let source = cursor - distance;
            for i in 0..length {
                output[cursor + i] = output[source + i];
            }
            cursor += length;
        }

        state = GroupState::next(flags, remaining);
    }
}

/// Decompresses data that is already known to be a well-formed Yaz0 stream.
///
/// Skips the truncation and copy bounds checks of [`decompress_into`]. Malformed input
/// makes this panic (or produce garbage), so never feed it anything untrusted.
/// The header still has to be valid and match `output`.
#[throws]
pub fn decompress_unsafe_into(input: &[u8], output: &mut [u8]) {
    let header = header_for(input)?;
    let expected = header.uncompressed_size as usize;
    if output.len() != expected {
        throw!(Error::DestinationSize { expected, actual: output.len() });
    }
    replay_trusted(&mut body_reader(input), output);
}

/// Trusted-input counterpart of [`decompress`]; see [`decompress_unsafe_into`].
#[throws]
pub fn decompress_unsafe(input: &[u8]) -> Vec<u8> {
    let header = header_for(input)?;
    let mut output = vec![0u8; header.uncompressed_size as usize];
    replay_trusted(&mut body_reader(input), &mut output);
    output
}

#[cfg(test)]
mod test {
    use super::*;

    fn stream(size: u32, body: &[u8]) -> Vec<u8> {
        let mut data = Header::new(size, 0).to_bytes().to_vec();
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn header_only() {
        assert_eq!(decompress(&stream(0, &[])).unwrap(), b"");
        // nothing past the header is even looked at
        assert_eq!(decompress(&stream(0, &[0x00, 0xFF, 0xFF])).unwrap(), b"");
        assert_eq!(decompress_unsafe(&stream(0, &[])).unwrap(), b"");
    }

    #[test]
    fn all_literal() {
        let data = stream(8, b"\xFF12345678");
        assert_eq!(decompress(&data).unwrap(), b"12345678");
        assert_eq!(decompress_unsafe(&data).unwrap(), b"12345678");
    }

    #[test]
    fn second_group() {
        assert_eq!(decompress(&stream(10, b"\xFF12345678\xC09!")).unwrap(), b"123456789!");
    }

    #[test]
    fn aaaaaaaaaaa_lots_of_aaaaaaaaa() {
        assert_eq!(decompress(&stream(6, &[0x80, b'a', 0x30, 0x00])).unwrap(), b"aaaaaa");
    }

    #[test]
    fn repeating_pattern() {
        assert_eq!(
            decompress(&stream(14, &[0xB0, b'a', 0x30, 0x00, b'b', b'c', 0x40, 0x01])).unwrap(),
            b"aaaaaabcbcbcbc"
        );
    }

    #[test]
    fn long_copy() {
        let data = stream(1 + 0x12 + 0xFF, &[0x80, b'z', 0x00, 0x00, 0xFF]);
        assert_eq!(decompress(&data).unwrap(), vec![b'z'; 1 + 0x12 + 0xFF]);
        assert_eq!(decompress_unsafe(&data).unwrap(), vec![b'z'; 1 + 0x12 + 0xFF]);
    }

    #[test]
    fn bad_header() {
        assert_eq!(decompress(b"Yaz0"), Err(Error::InvalidHeader));
        assert_eq!(decompress(b"Yaz1\0\0\0\x01\0\0\0\0\0\0\0\0\xFFa"), Err(Error::InvalidHeader));
        assert_eq!(decompress_unsafe(b""), Err(Error::InvalidHeader));
    }

    #[test]
    fn truncated() {
        // missing literal
        assert!(matches!(decompress(&stream(3, b"\xFFab")), Err(Error::Truncated(_))));
        // missing flag byte
        assert!(matches!(decompress(&stream(1, b"")), Err(Error::Truncated(_))));
        // half a match code
        assert!(matches!(decompress(&stream(4, &[0x80, b'a', 0x10])), Err(Error::Truncated(_))));
        // missing length byte
        assert!(matches!(decompress(&stream(40, &[0x80, b'a', 0x00, 0x00])), Err(Error::Truncated(_))));
    }

    #[test]
    fn offset_oob() {
        // reaches before the start
        assert_eq!(
            decompress(&stream(3, &[0x00, 0x10, 0x00])),
            Err(Error::CorruptCopy { position: 0, distance: 1, length: 3 })
        );
        assert_eq!(
            decompress(&stream(6, &[0x80, b'a', 0x30, 0x01])),
            Err(Error::CorruptCopy { position: 1, distance: 2, length: 5 })
        );
        // runs past the end
        assert_eq!(
            decompress(&stream(3, &[0x80, b'a', 0x10, 0x00])),
            Err(Error::CorruptCopy { position: 1, distance: 1, length: 3 })
        );
    }

    #[test]
    fn destination_size() {
        let data = stream(4, b"\xF0abcd");
        let mut exact = [0u8; 4];
        decompress_into(&data, &mut exact).unwrap();
        assert_eq!(&exact, b"abcd");

        let mut small = [0u8; 3];
        assert_eq!(decompress_into(&data, &mut small), Err(Error::DestinationSize { expected: 4, actual: 3 }));
        let mut large = [0u8; 5];
        assert_eq!(decompress_unsafe_into(&data, &mut large), Err(Error::DestinationSize { expected: 4, actual: 5 }));
    }

    #[test]
    fn all_entry_points_agree() {
        let data = stream(14, &[0xB0, b'a', 0x30, 0x00, b'b', b'c', 0x40, 0x01]);
        let mut into = [0u8; 14];
        decompress_into(&data, &mut into).unwrap();
        let mut unsafe_into = [0u8; 14];
        decompress_unsafe_into(&data, &mut unsafe_into).unwrap();

        assert_eq!(decompress(&data).unwrap(), &into[..]);
        assert_eq!(decompress_unsafe(&data).unwrap(), &unsafe_into[..]);
        assert_eq!(into, unsafe_into);
    }

    #[test]
    #[should_panic]
    fn unsafe_path_panics_on_garbage() {
        let _ = decompress_unsafe(&stream(3, &[0x00, 0x10, 0x00]));
    }
}
