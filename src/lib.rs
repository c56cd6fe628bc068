//! Pure Rust implementation of Yaz0, the LZ77 flavour Nintendo uses for game assets.
//!
//! A Yaz0 stream is a 16-byte [`Header`] followed by groups of one flag byte and up to eight
//! chunks, each chunk being a literal byte or a back-reference of up to 273 bytes into the last
//! 4KiB of output.
//!
//! ```
//! let compressed = syaz0::CompressionSettings::default()
//!     .data_alignment(0x80)
//!     .compress(b"hello hello hello");
//!
//! let header = syaz0::parse_header(&compressed).unwrap();
//! assert_eq!(header.uncompressed_size, 17);
//! assert_eq!(header.data_alignment, 0x80);
//! assert_eq!(syaz0::decompress(&compressed).unwrap(), b"hello hello hello");
//! ```
#![forbid(unsafe_code)]

pub mod compress;
pub mod decompress;
pub mod finder;
pub mod header;
pub mod reader;

use std::io::{Error as IoError, ErrorKind};

pub use compress::{compress, compress_with, CompressionSettings};
pub use decompress::{decompress, decompress_into, decompress_unsafe, decompress_unsafe_into};
pub use finder::{HashChainTable, Match, MatchFinder, WindowScan};
pub use header::{parse_header, Header, HEADER_SIZE, MAGIC};

impl From<decompress::Error> for IoError {
    fn from(e: decompress::Error) -> IoError {
        IoError::new(ErrorKind::InvalidData, e)
    }
}
