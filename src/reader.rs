//! A bounds-checked cursor over a byte slice that normalizes endianness.
//!
//! Values are always assembled from a byte-wise copy, so unaligned or
//! oddly-typed reads are never a problem.

use byteorder::{ByteOrder, NativeEndian, BE, LE};
use cfg_if::cfg_if;
use fehler::{throw, throws};
use thiserror::Error;

#[derive(Error, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Error {
    /// The read would have run past the end of the buffer.
    #[error("wanted {wanted} bytes at offset {offset} but only {available} are left")]
    InsufficientData { offset: usize, wanted: usize, available: usize },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Endianness {
    Big,
    Little,
}

cfg_if! {
    if #[cfg(target_endian = "big")] {
        const HOST: Endianness = Endianness::Big;
    } else {
        const HOST: Endianness = Endianness::Little;
    }
}

impl Endianness {
    /// The byte order of the machine we are running on.
    pub const fn host() -> Self { HOST }
}

/// Plain values that can be pulled out of a byte buffer.
///
/// Arithmetic types are decoded in host storage order and byte-swapped by the reader
/// when the declared endianness is not the host's. Byte arrays are never swapped.
pub trait Primitive: Sized + Copy {
    const SIZE: usize;

    /// `bytes` is exactly `SIZE` long.
    fn from_native_bytes(bytes: &[u8]) -> Self;
    fn swap_bytes(self) -> Self;
}

impl Primitive for u8 {
    const SIZE: usize = 1;
    fn from_native_bytes(bytes: &[u8]) -> Self { bytes[0] }
    fn swap_bytes(self) -> Self { self }
}

impl Primitive for i8 {
    const SIZE: usize = 1;
    fn from_native_bytes(bytes: &[u8]) -> Self { bytes[0] as i8 }
    fn swap_bytes(self) -> Self { self }
}

macro_rules! impl_primitive {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();
                fn from_native_bytes(bytes: &[u8]) -> Self { NativeEndian::$read(bytes) }
                fn swap_bytes(self) -> Self { <$ty>::swap_bytes(self) }
            }
        )*
    };
}

impl_primitive! {
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
}

impl Primitive for f32 {
    const SIZE: usize = 4;
    fn from_native_bytes(bytes: &[u8]) -> Self { NativeEndian::read_f32(bytes) }
    fn swap_bytes(self) -> Self { f32::from_bits(self.to_bits().swap_bytes()) }
}

impl Primitive for f64 {
    const SIZE: usize = 8;
    fn from_native_bytes(bytes: &[u8]) -> Self { NativeEndian::read_f64(bytes) }
    fn swap_bytes(self) -> Self { f64::from_bits(self.to_bits().swap_bytes()) }
}

impl<const N: usize> Primitive for [u8; N] {
    const SIZE: usize = N;
    fn from_native_bytes(bytes: &[u8]) -> Self {
        let mut buf = [0u8; N];
        buf.copy_from_slice(bytes);
        buf
    }
    fn swap_bytes(self) -> Self { self }
}

#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
    endianness: Endianness,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        ByteReader { data, offset: 0, endianness }
    }

    pub fn data(&self) -> &'a [u8] { self.data }
    pub fn endianness(&self) -> Endianness { self.endianness }
    pub fn tell(&self) -> usize { self.offset }

    /// Moves the cursor. Going past the end is fine, only reads will fail.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    #[throws(Error)]
    fn check(&self, wanted: usize) {
        let available = self.remaining();
        if wanted > available {
            throw!(Error::InsufficientData { offset: self.offset, wanted, available });
        }
    }

    fn normalize<T: Primitive>(&self, value: T) -> T {
        if self.endianness == Endianness::host() {
            value
        } else {
            value.swap_bytes()
        }
    }

    #[throws(Error)]
    pub fn read<T: Primitive>(&mut self) -> T {
        self.check(T::SIZE)?;
        self.read_unchecked()
    }

    /// Like [`read`](Self::read), minus the length check.
    ///
    /// The caller promises there is enough data left. If there isn't, this panics.
    pub fn read_unchecked<T: Primitive>(&mut self) -> T {
        let value = T::from_native_bytes(&self.data[self.offset..][..T::SIZE]);
        self.offset += T::SIZE;
        self.normalize(value)
    }

    #[throws(Error)]
    pub fn read_u24(&mut self) -> u32 {
        self.check(3)?;
        self.read_u24_unchecked()
    }

    pub fn read_u24_unchecked(&mut self) -> u32 {
        let bytes = &self.data[self.offset..][..3];
        self.offset += 3;
        match self.endianness {
            Endianness::Big => BE::read_u24(bytes),
            Endianness::Little => LE::read_u24(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &[u8] = &[0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];

    #[test]
    fn big_endian_integers() {
        let mut reader = ByteReader::new(DATA, Endianness::Big);
        assert_eq!(reader.read::<u16>().unwrap(), 0x1234);
        assert_eq!(reader.read::<u8>().unwrap(), 0x56);
        assert_eq!(reader.read::<u8>().unwrap(), 0x78);
        assert_eq!(reader.read::<u32>().unwrap(), 0x9ABC_DEF0);
        assert_eq!(reader.tell(), 8);
    }

    #[test]
    fn little_endian_integers() {
        let mut reader = ByteReader::new(DATA, Endianness::Little);
        assert_eq!(reader.read::<u32>().unwrap(), 0x7856_3412);
        assert_eq!(reader.read::<i32>().unwrap(), 0xF0DE_BC9Au32 as i32);
    }

    #[test]
    fn u64_and_floats() {
        let mut reader = ByteReader::new(DATA, Endianness::Big);
        assert_eq!(reader.read::<u64>().unwrap(), 0x1234_5678_9ABC_DEF0);

        let one = 1.0f32.to_bits().to_be_bytes();
        let mut reader = ByteReader::new(&one, Endianness::Big);
        assert_eq!(reader.read::<f32>().unwrap(), 1.0);
    }

    #[test]
    fn u24() {
        let mut reader = ByteReader::new(DATA, Endianness::Big);
        assert_eq!(reader.read_u24().unwrap(), 0x12_3456);
        let mut reader = ByteReader::new(DATA, Endianness::Little);
        assert_eq!(reader.read_u24().unwrap(), 0x56_3412);
        assert_eq!(reader.tell(), 3);
    }

    #[test]
    fn arrays_are_not_swapped() {
        let mut reader = ByteReader::new(DATA, Endianness::Little);
        assert_eq!(reader.read::<[u8; 3]>().unwrap(), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn reading_past_the_end_fails() {
        let mut reader = ByteReader::new(DATA, Endianness::Big);
        reader.seek(6);
        assert_eq!(
            reader.read::<u32>(),
            Err(Error::InsufficientData { offset: 6, wanted: 4, available: 2 })
        );
        // a failed read leaves the cursor alone
        assert_eq!(reader.tell(), 6);
        assert_eq!(reader.read::<u16>().unwrap(), 0xDEF0);
        assert!(reader.read::<u8>().is_err());
        assert!(reader.read_u24().is_err());
    }

    #[test]
    fn seeking_past_the_end_is_allowed() {
        let mut reader = ByteReader::new(DATA, Endianness::Big);
        reader.seek(100);
        assert_eq!(reader.tell(), 100);
        assert_eq!(reader.remaining(), 0);
        assert!(reader.read::<u8>().is_err());
    }

    #[test]
    fn unchecked_reads_agree() {
        let mut checked = ByteReader::new(DATA, Endianness::Big);
        let mut unchecked = ByteReader::new(DATA, Endianness::Big);
        assert_eq!(checked.read::<u16>().unwrap(), unchecked.read_unchecked::<u16>());
        assert_eq!(checked.read_u24().unwrap(), unchecked.read_u24_unchecked());
    }

    #[test]
    #[should_panic]
    fn unchecked_read_past_the_end_panics() {
        let mut reader = ByteReader::new(&DATA[..1], Endianness::Big);
        reader.read_unchecked::<u16>();
    }
}
