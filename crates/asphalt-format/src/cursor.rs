use std::fmt::Write as _;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::FormatError;
use crate::layout::FromRecord;

/// Typed reader over an immutable byte slice.
///
/// Every read advances the position by the width it consumed and clamps at the
/// end of input. Reads that run past the end are lenient: integers come back
/// with the missing high-order bytes zeroed, strings and arrays come back
/// short. Use [`ByteCursor::require`] where truncation must be an error.
#[derive(Clone, Copy, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the cursor, clamped into `[0, len]`.
    #[inline]
    pub fn set_pos(&mut self, pos: usize) -> &mut Self {
        self.pos = pos.min(self.data.len());
        self
    }

    #[inline]
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.data.len());
    }

    #[inline]
    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fails with `OutOfRangeRead` unless `n` more bytes are available.
    pub fn require(&self, n: usize) -> Result<(), FormatError> {
        if n > self.remaining() {
            return Err(FormatError::OutOfRangeRead {
                offset: self.pos,
                wanted: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn peek_bytes(&self, n: usize) -> &'a [u8] {
        let end = self.pos.saturating_add(n).min(self.data.len());
        &self.data[self.pos..end]
    }

    #[inline]
    pub fn read_bytes(&mut self, n: usize) -> &'a [u8] {
        let bytes = self.peek_bytes(n);
        self.skip(n);
        bytes
    }

    /// Splits off the next `n` bytes as an independent cursor and advances past them.
    pub fn take(&mut self, n: usize) -> ByteCursor<'a> {
        ByteCursor::new(self.read_bytes(n))
    }

    // Available bytes land in the low-order end; missing ones stay zero.
    #[inline]
    fn read_le<const N: usize>(&mut self) -> [u8; N] {
        let bytes = self.read_bytes(N);
        let mut buf = [0u8; N];
        buf[..bytes.len()].copy_from_slice(bytes);
        buf
    }

    #[inline]
    fn read_be<const N: usize>(&mut self) -> [u8; N] {
        let bytes = self.read_bytes(N);
        let mut buf = [0u8; N];
        buf[N - bytes.len()..].copy_from_slice(bytes);
        buf
    }

    #[inline]
    pub fn read_u8(&mut self) -> u8 {
        self.read_le::<1>()[0]
    }

    #[inline]
    pub fn read_u16_le(&mut self) -> u16 {
        LittleEndian::read_u16(&self.read_le::<2>())
    }

    #[inline]
    pub fn read_u32_le(&mut self) -> u32 {
        LittleEndian::read_u32(&self.read_le::<4>())
    }

    #[inline]
    pub fn read_u16_be(&mut self) -> u16 {
        BigEndian::read_u16(&self.read_be::<2>())
    }

    #[inline]
    pub fn read_u32_be(&mut self) -> u32 {
        BigEndian::read_u32(&self.read_be::<4>())
    }

    /// Reads `n` bytes as a string, one char per byte (Latin-1).
    pub fn read_string(&mut self, n: usize) -> String {
        self.read_bytes(n).iter().map(|&b| char::from(b)).collect()
    }

    /// Reads `byte_len` bytes as an owned byte array.
    pub fn read_u8_array(&mut self, byte_len: usize) -> Vec<u8> {
        self.read_bytes(byte_len).to_vec()
    }

    /// Reads `byte_len` bytes as `byte_len / 2` little-endian words.
    pub fn read_u16_array_le(&mut self, byte_len: usize) -> Vec<u16> {
        let bytes = self.read_bytes(byte_len);
        let mut out = vec![0u16; bytes.len() / 2];
        LittleEndian::read_u16_into(&bytes[..out.len() * 2], &mut out);
        out
    }

    pub fn read_u16_array_be(&mut self, byte_len: usize) -> Vec<u16> {
        let bytes = self.read_bytes(byte_len);
        let mut out = vec![0u16; bytes.len() / 2];
        BigEndian::read_u16_into(&bytes[..out.len() * 2], &mut out);
        out
    }

    /// Reads `byte_len` bytes as `byte_len / 4` little-endian double words.
    pub fn read_u32_array_le(&mut self, byte_len: usize) -> Vec<u32> {
        let bytes = self.read_bytes(byte_len);
        let mut out = vec![0u32; bytes.len() / 4];
        LittleEndian::read_u32_into(&bytes[..out.len() * 4], &mut out);
        out
    }

    pub fn read_u32_array_be(&mut self, byte_len: usize) -> Vec<u32> {
        let bytes = self.read_bytes(byte_len);
        let mut out = vec![0u32; bytes.len() / 4];
        BigEndian::read_u32_into(&bytes[..out.len() * 4], &mut out);
        out
    }

    /// Reads one structure through its static field layout.
    pub fn read_struct<T: FromRecord>(&mut self) -> T {
        let record = T::LAYOUT.read(self);
        T::from_record(&record)
    }

    /// Reads up to `count` structures, stopping at end of input. A trailing
    /// partial structure is read with its missing fields zeroed.
    pub fn read_structs<T: FromRecord>(&mut self, count: usize) -> Vec<T> {
        // Never trust a count from the file for the allocation size.
        let fit = self.remaining().div_ceil(T::LAYOUT.size().max(1));
        let mut out = Vec::with_capacity(count.min(fit));
        while out.len() < count && !self.eof() {
            out.push(self.read_struct::<T>());
        }
        out
    }

    /// Debug rendering of the cursor with the next `n` bytes in hex.
    pub fn inspect(&self, n: usize) -> String {
        let mut s = format!(
            "[ByteCursor pos={} length={} next=",
            self.pos,
            self.data.len()
        );
        for (i, b) in self.peek_bytes(n).iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            let _ = write!(s, "{:02x}", b);
        }
        s.push(']');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_little_and_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u8(), 0x01);
        assert_eq!(c.read_u16_le(), 0x0302);
        assert_eq!(c.read_u16_be(), 0x0405);
        assert_eq!(c.read_u32_le(), 0x0908_0706);
        assert!(c.eof());
    }

    #[test]
    fn truncated_integers_zero_high_bytes() {
        let data = [0xAA, 0xBB];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u32_le(), 0x0000_BBAA);
        assert!(c.eof());
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u32_be(), 0x0000_AABB);
        assert_eq!(c.read_u8(), 0);
        assert_eq!(c.pos(), 2);
    }

    #[test]
    fn set_pos_and_skip_clamp() {
        let data = [0u8; 4];
        let mut c = ByteCursor::new(&data);
        c.set_pos(100);
        assert_eq!(c.pos(), 4);
        c.set_pos(1).skip(usize::MAX);
        assert_eq!(c.pos(), 4);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn arrays_are_sized_in_bytes() {
        let data = [1, 0, 2, 0, 3, 0, 0, 0, 9];
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u16_array_le(5), vec![1, 2]);
        assert_eq!(c.pos(), 5);
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_u32_array_le(8), vec![0x0002_0001, 0x0000_0003]);
        assert_eq!(c.read_u32_array_le(8), Vec::<u32>::new());
        assert!(c.eof());
    }

    #[test]
    fn strings_and_require() {
        let data = *b"GBMPxy";
        let mut c = ByteCursor::new(&data);
        assert_eq!(c.read_string(4), "GBMP");
        assert!(c.require(2).is_ok());
        assert_eq!(
            c.require(3),
            Err(FormatError::OutOfRangeRead {
                offset: 4,
                wanted: 3,
                available: 2
            })
        );
        assert_eq!(c.read_string(10), "xy");
    }

    #[test]
    fn take_splits_an_independent_cursor() {
        let data = [1, 2, 3, 4, 5];
        let mut c = ByteCursor::new(&data);
        c.skip(1);
        let mut sub = c.take(3);
        assert_eq!(c.pos(), 4);
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.read_u8(), 2);
        assert_eq!(sub.read_u16_le(), 0x0403);
        assert!(sub.eof());
    }

    #[derive(Debug, PartialEq)]
    struct Pair(u16, u8);

    impl FromRecord for Pair {
        const LAYOUT: crate::StructLayout = crate::StructLayout::new(&[
            crate::Field::new("a", crate::FieldKind::U16Le),
            crate::Field::new("b", crate::FieldKind::U8),
        ]);

        fn from_record(r: &crate::Record) -> Self {
            Pair(r.int("a") as u16, r.int("b") as u8)
        }
    }

    #[test]
    fn read_structs_stops_at_end() {
        let data = [1, 0, 2, 3, 0, 4, 5];
        let mut c = ByteCursor::new(&data);
        let v: Vec<Pair> = c.read_structs(usize::MAX);
        assert_eq!(v, vec![Pair(1, 2), Pair(3, 4), Pair(5, 0)]);
        assert!(c.eof());
    }

    #[test]
    fn inspect_shows_next_bytes() {
        let data = [0xde, 0xad, 0xbe, 0xef];
        let mut c = ByteCursor::new(&data);
        c.skip(1);
        assert_eq!(c.inspect(2), "[ByteCursor pos=1 length=4 next=ad be]");
    }
}
