use std::mem;

use allocative::{Allocative, Key, Visitor};
use bitvec::prelude::*;

type Words = BitVec<u64, Lsb0>;

/// Per-row presence flags for a column: a set bit means the row holds a value,
/// a cleared bit means the row is null.
///
/// Bits are packed into `u64` words, `ceil(len / 64)` of them. Padding bits past
/// `len` in the last word are never read through [`Bitmap::get`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bitmap {
    bits: Words,
}

impl Bitmap {
    /// Creates a bitmap of `len` rows, all present (`valid == true`) or all null.
    ///
    /// When all rows are present, only the low `len % 64` bits of the final word are set.
    pub fn new(len: usize, valid: bool) -> Self {
        let mut words = vec![if valid { u64::MAX } else { 0 }; len.div_ceil(64)];
        let remainder = len % 64;
        if valid && remainder != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1_u64 << remainder) - 1;
            }
        }
        let mut bits = Words::from_vec(words);
        bits.truncate(len);
        Self { bits }
    }

    /// Builds a bitmap with exactly the bits of the `true` entries set.
    pub fn from_bools(flags: &[bool]) -> Self {
        let mut bitmap = Self::new(flags.len(), false);
        for (i, _) in flags.iter().enumerate().filter(|(_, valid)| **valid) {
            bitmap.set(i);
        }
        bitmap
    }

    /// Returns whether row `i` is present.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> bool {
        self.bits[i]
    }

    /// Marks row `i` as present. Setting an already present row is a no-op.
    pub fn set(&mut self, i: usize) {
        self.bits.set(i, true);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of present rows.
    pub fn count_valid(&self) -> usize {
        self.bits.count_ones()
    }

    /// The packed backing words, including the padding bits of the last word.
    pub fn as_words(&self) -> &[u64] {
        self.bits.as_raw_slice()
    }
}

impl Allocative for Bitmap {
    fn visit<'a, 'b: 'a>(&self, visitor: &'a mut Visitor<'b>) {
        let mut visitor = visitor.enter_self_sized::<Self>();
        let words = self.as_words();
        if !words.is_empty() {
            let mut heap = visitor.enter_unique(Key::new("words"), mem::size_of::<*const u64>());
            heap.visit_simple(Key::new("data"), mem::size_of_val(words));
            heap.exit();
        }
        visitor.exit();
    }
}

/// Grows a [`Bitmap`] one row at a time during ingestion and column transforms.
#[derive(Debug, Default)]
pub struct BitmapBuilder {
    bits: Words,
}

impl BitmapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(rows: usize) -> Self {
        Self {
            bits: Words::with_capacity(rows),
        }
    }

    /// Appends one row's presence flag.
    pub fn append(&mut self, valid: bool) {
        self.bits.push(valid);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn finish(self) -> Bitmap {
        Bitmap { bits: self.bits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────
    // Test 1 : all valid, partial last word
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_all_valid_masks_last_word() {
        let bitmap = Bitmap::new(70, true);

        assert_eq!(bitmap.len(), 70);
        assert_eq!(bitmap.as_words().len(), 2);
        assert_eq!(bitmap.as_words()[0], u64::MAX);
        // only the 6 rows living in the second word are set
        assert_eq!(bitmap.as_words()[1], 0b11_1111);
        assert_eq!(bitmap.count_valid(), 70);
        assert!((0..70).all(|i| bitmap.get(i)));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : exact word multiple and empty
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_word_boundaries() {
        let full = Bitmap::new(128, true);
        assert_eq!(full.as_words(), &[u64::MAX, u64::MAX]);

        let empty = Bitmap::new(0, true);
        assert!(empty.is_empty());
        assert!(empty.as_words().is_empty());

        let nulls = Bitmap::new(10, false);
        assert_eq!(nulls.count_valid(), 0);
        assert!(!nulls.get(9));
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : from bools
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_from_bools() {
        let flags = [true, false, true, true, false];
        let bitmap = Bitmap::from_bools(&flags);

        assert_eq!(bitmap.len(), 5);
        for (i, flag) in flags.iter().enumerate() {
            assert_eq!(bitmap.get(i), *flag);
        }
        assert_eq!(bitmap.as_words()[0], 0b01101);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : set is idempotent
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_set_idempotent() {
        let mut bitmap = Bitmap::new(3, false);
        bitmap.set(1);
        bitmap.set(1);

        assert!(!bitmap.get(0));
        assert!(bitmap.get(1));
        assert_eq!(bitmap.count_valid(), 1);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 5 : builder across several words
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_builder_append() {
        let mut builder = BitmapBuilder::new();
        for i in 0..200 {
            builder.append(i % 3 != 0);
        }
        assert_eq!(builder.len(), 200);

        let bitmap = builder.finish();
        assert_eq!(bitmap.len(), 200);
        assert_eq!(bitmap.as_words().len(), 4);
        for i in 0..200 {
            assert_eq!(bitmap.get(i), i % 3 != 0);
        }
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        let bitmap = Bitmap::new(4, true);
        bitmap.get(4);
    }
}
