//! Finding back-references inside the sliding window.
//!
//! The real encoder uses [`HashChainTable`]: every position in the window is filed under the
//! three bytes starting there, so a lookup only ever compares against positions that share at
//! least a three byte prefix with the cursor. [`WindowScan`] is the obvious quadratic search and
//! exists mostly to check the table against.

use std::cmp;
use std::collections::{HashMap, VecDeque};
use std::mem;
use byteorder::{ByteOrder, BE};

/// How far back a match may start.
pub const WINDOW_SIZE: usize = 0x1000;
/// The longest match the three byte code can express.
pub const MAX_MATCH_LENGTH: usize = 0xFF + 0x12;
/// Anything shorter is cheaper as literals.
pub const MIN_MATCH_LENGTH: usize = 3;
/// Positions kept per hash bucket. Older ones are dropped.
pub const BUCKET_CAPACITY: usize = 128;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Match {
    /// Where in the input the earlier occurrence starts.
    pub offset: usize,
    /// Zero if nothing was found.
    pub length: usize,
}

pub trait MatchFinder {
    /// Looks for the longest earlier occurrence of the bytes at `cursor`.
    fn find(&self, input: &[u8], cursor: usize) -> Match;

    /// Tells the finder that `input[cursor..cursor + processed]` has just been encoded.
    fn advance(&mut self, input: &[u8], cursor: usize, processed: usize);
}

fn window_begin(cursor: usize) -> usize {
    cursor.saturating_sub(WINDOW_SIZE)
}

/// The three bytes at `position` as a 24-bit key, if there are three bytes left.
fn key_at(input: &[u8], position: usize) -> Option<u32> {
    input.get(position..position + 3).map(BE::read_u24)
}

/// How many bytes `input[cursor..]` shares with `input[candidate..]`, capped at `limit`.
fn match_length(input: &[u8], candidate: usize, cursor: usize) -> usize {
    let limit = cmp::min(MAX_MATCH_LENGTH, input.len() - cursor);
    count_matching_bytes(&input[cursor..][..limit], &input[candidate..])
}

fn count_matching_bytes(a: &[u8], b: &[u8]) -> usize {
    const REGSIZE: usize = mem::size_of::<usize>();
    fn read_usize(b: &[u8]) -> usize {
        let mut buf = [0u8; REGSIZE];
        buf.copy_from_slice(&b[..REGSIZE]);
        usize::from_le_bytes(buf)
    }

    let mut matching_bytes = 0;
    // a full register at a time, the first differing bit tells us where the mismatch is
    for (a, b) in a.chunks_exact(REGSIZE).zip(b.chunks_exact(REGSIZE)) {
        let xor = read_usize(a) ^ read_usize(b);
        if xor != 0 {
            return matching_bytes + (xor.trailing_zeros() / 8) as usize;
        }
        matching_bytes += REGSIZE;
    }

    let trailing_matches = a.iter().zip(b).skip(matching_bytes).take_while(|&(a, b)| a == b).count();
    matching_bytes + trailing_matches
}

/// Hash-chained match finder.
///
/// Maps each 24-bit key to the positions starting with it, most recent first. Only positions
/// the encoder has already passed are ever in here, and none of them are more than
/// [`WINDOW_SIZE`] bytes behind the cursor.
#[derive(Clone, Debug)]
pub struct HashChainTable {
    buckets: HashMap<u32, VecDeque<usize>>,
    search_depth: usize,
}

impl Default for HashChainTable {
    fn default() -> Self {
        HashChainTable::with_search_depth(BUCKET_CAPACITY)
    }
}

impl HashChainTable {
    /// A table that compares against at most `search_depth` candidates per lookup.
    ///
    /// This trades ratio for speed only; the output is valid Yaz0 either way.
    pub fn with_search_depth(search_depth: usize) -> Self {
        HashChainTable {
            buckets: HashMap::new(),
            search_depth: cmp::max(1, search_depth),
        }
    }

    pub fn search_depth(&self) -> usize {
        self.search_depth
    }

    /// Positions currently filed under `key`, most recent first.
    pub fn bucket(&self, key: u32) -> impl Iterator<Item = usize> + '_ {
        self.buckets.get(&key).into_iter().flatten().copied()
    }
}

impl MatchFinder for HashChainTable {
    fn find(&self, input: &[u8], cursor: usize) -> Match {
        let mut best = Match::default();
        let candidates = match key_at(input, cursor).and_then(|key| self.buckets.get(&key)) {
            Some(bucket) => bucket,
            None => return best,
        };

        for &candidate in candidates.iter().take(self.search_depth) {
            let length = match_length(input, candidate, cursor);
            // strictly greater: on a tie the nearer candidate (seen first) wins
            if length > best.length {
                best = Match { offset: candidate, length };
                if length == MAX_MATCH_LENGTH {
                    break;
                }
            }
        }
        best
    }

    fn advance(&mut self, input: &[u8], cursor: usize, processed: usize) {
        let old_begin = window_begin(cursor);
        let new_begin = window_begin(cursor + processed);

        // whatever slides out of the window sits at the back of its bucket
        for leaving in old_begin..new_begin {
            let key = match key_at(input, leaving) {
                Some(key) => key,
                None => break,
            };
            let now_empty = match self.buckets.get_mut(&key) {
                Some(bucket) => {
                    while bucket.back().map_or(false, |&p| p < new_begin) {
                        bucket.pop_back();
                    }
                    bucket.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.buckets.remove(&key);
            }
        }

        for position in cursor..cursor + processed {
            let key = match key_at(input, position) {
                Some(key) => key,
                None => break,
            };
            let bucket = self.buckets.entry(key).or_insert_with(VecDeque::new);
            if bucket.len() >= BUCKET_CAPACITY {
                bucket.pop_back();
            }
            bucket.push_front(position);
        }
    }
}

/// Brute-force search over the whole window.
///
/// Finds the same matches as [`HashChainTable`] as long as no bucket of the table overflows,
/// at a quadratic cost.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowScan;

impl MatchFinder for WindowScan {
    fn find(&self, input: &[u8], cursor: usize) -> Match {
        let mut best = Match::default();
        if input.len() - cursor < MIN_MATCH_LENGTH {
            return best;
        }

        let first = input[cursor];
        for candidate in window_begin(cursor)..cursor {
            if input[candidate] != first {
                continue;
            }
            let length = match_length(input, candidate, cursor);
            // later candidates are nearer, so they win ties
            if length >= best.length {
                best = Match { offset: candidate, length };
            }
        }
        best
    }

    fn advance(&mut self, _input: &[u8], _cursor: usize, _processed: usize) {}
}
