pub mod bitpacked;
pub mod hybrid_rle;
pub mod uleb128;

/// Number of bytes needed to hold `value` bits.
#[inline]
pub fn ceil8(value: usize) -> usize {
    (value + 7) / 8
}

/// Reads the little-endian u32 length prefix used by v1 level streams.
#[inline]
pub fn get_length(values: &[u8]) -> Option<usize> {
    values
        .get(..4)
        .map(|x| u32::from_le_bytes(x.try_into().unwrap()) as usize)
}
