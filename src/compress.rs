//! The compression algorithm.
//!
//! Greedy LZ77: at every position we take the longest match the [`MatchFinder`] can come up
//! with, or a literal if it is shorter than three bytes. Chunks are grouped by eight behind a
//! flag byte whose bits (most significant first) mark the literals.

use std::cmp;
use std::convert::TryFrom;
use std::io::Write;
use byteorder::{ByteOrder, BE};
use fehler::throws;
use tracing::debug;

use crate::finder::{HashChainTable, Match, MatchFinder, BUCKET_CAPACITY, MAX_MATCH_LENGTH, MIN_MATCH_LENGTH, WINDOW_SIZE};
use crate::header::{Header, HEADER_SIZE};

pub(crate) const CHUNKS_PER_GROUP: usize = 8;
/// Matches at least this long need the three byte code.
pub(crate) const LONG_MATCH: usize = 0x12;

/// Candidates compared per lookup, indexed by compression level.
const SEARCH_DEPTH: [usize; 10] = [1, 2, 4, 8, 16, 32, 64, BUCKET_CAPACITY, BUCKET_CAPACITY, BUCKET_CAPACITY];

pub const DEFAULT_LEVEL: u32 = 7;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CompressionSettings {
    data_alignment: u32,
    level: u32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            data_alignment: 0,
            level: DEFAULT_LEVEL,
        }
    }
}

impl CompressionSettings {
    /// Stored in the header for whoever loads the data. Has no effect on the encoding.
    pub fn data_alignment(&mut self, v: u32) -> &mut Self {
        self.data_alignment = v;
        self
    }

    /// How hard to look for matches. Levels above 9 behave like 9.
    ///
    /// From level 7 on, every candidate in the window is considered.
    pub fn level(&mut self, v: u32) -> &mut Self {
        self.level = v;
        self
    }

    fn search_depth(&self) -> usize {
        SEARCH_DEPTH[cmp::min(self.level as usize, SEARCH_DEPTH.len() - 1)]
    }

    pub fn compress(&self, input: &[u8]) -> Vec<u8> {
        let mut table = HashChainTable::with_search_depth(self.search_depth());
        compress_with(input, self.data_alignment, &mut table)
    }

    #[throws(std::io::Error)]
    pub fn compress_to<W: Write>(&self, input: &[u8], mut writer: W) {
        writer.write_all(&self.compress(input))?;
    }
}

/// Compresses `input` with no alignment hint at the default level.
pub fn compress(input: &[u8]) -> Vec<u8> {
    CompressionSettings::default().compress(input)
}

/// Appends the code for `found` and returns how many input bytes it covers.
fn write_match(found: Match, cursor: usize, output: &mut Vec<u8>) -> usize {
    let distance = cursor - found.offset - 1;
    debug_assert!(distance < WINDOW_SIZE);

    let code_start = output.len();
    if found.length < LONG_MATCH {
        output.resize(code_start + 2, 0);
        let pair = ((found.length - 2) << 12) | distance;
        BE::write_u16(&mut output[code_start..], pair as u16);
        found.length
    } else {
        // a zero length nibble tells the decoder an extra length byte follows
        let length = cmp::min(MAX_MATCH_LENGTH, found.length);
        output.resize(code_start + 3, 0);
        BE::write_u16(&mut output[code_start..], distance as u16);
        output[code_start + 2] = (length - LONG_MATCH) as u8;
        length
    }
}

/// Compresses `input` using the given match finder, which should be fresh.
pub fn compress_with<F: MatchFinder>(input: &[u8], data_alignment: u32, finder: &mut F) -> Vec<u8> {
    let uncompressed_size = u32::try_from(input.len()).expect("Yaz0 cannot describe inputs of 4GiB or more");

    let mut output = Vec::with_capacity(HEADER_SIZE + input.len() + input.len() / CHUNKS_PER_GROUP + 1);
    output.extend_from_slice(&Header::new(uncompressed_size, data_alignment).to_bytes());

    let mut cursor = 0;
    while cursor < input.len() {
        // patched once we know which chunks are literals
        let flag_position = output.len();
        output.push(0);
        let mut flags = 0u8;

        for chunk in 0..CHUNKS_PER_GROUP {
            if cursor >= input.len() {
                break;
            }

            let found = finder.find(input, cursor);
            let processed = if found.length < MIN_MATCH_LENGTH {
                flags |= 0x80 >> chunk;
                output.push(input[cursor]);
                1
            } else {
                write_match(found, cursor, &mut output)
            };

            finder.advance(input, cursor, processed);
            cursor += processed;
        }

        output[flag_position] = flags;
    }

    debug!(input = input.len(), output = output.len(), data_alignment, "compressed Yaz0 stream");
    output
}
