//! Hybrid-run encoders, the write-side mirror of [`super::HybridRleDecoder`].
//!
//! Level streams and dictionary indices are produced with these when
//! synthesizing test data; they follow the format spec byte-for-byte and
//! back the decoder's round-trip properties.

use std::io::Write;

use crate::encoding::{bitpacked, ceil8, uleb128};

/// Writes one bit-packed run holding every value of `values`.
///
/// The run header declares `ceil8(len)` groups of 8 values, and each group
/// packs to exactly `num_bits` bytes; values past the end of the input pad
/// the last group as zeros.
pub fn encode_bitpacked<W: Write, I: ExactSizeIterator<Item = u32>>(
    writer: &mut W,
    values: I,
    num_bits: u32,
) -> std::io::Result<()> {
    let num_bits = num_bits as usize;
    let groups = ceil8(values.len());
    write_run_header((groups as u64) << 1 | 1, writer)?;

    // stage values through the kernel block, one pack32 call per 32
    let mut bytes_left = groups * num_bits;
    let mut block = [0u32; 32];
    let mut scratch = [0u8; 32 * 4];
    let mut filled = 0usize;
    for value in values {
        block[filled] = value;
        filled += 1;
        if filled == block.len() {
            bitpacked::pack32(&block, num_bits, &mut scratch);
            writer.write_all(&scratch[..4 * num_bits])?;
            bytes_left -= 4 * num_bits;
            filled = 0;
        }
    }
    if filled > 0 {
        block[filled..].fill(0);
        bitpacked::pack32(&block, num_bits, &mut scratch);
        // a partial block still covers whole groups of 8, so only the bytes
        // the header accounts for are written
        writer.write_all(&scratch[..bytes_left])?;
    }
    Ok(())
}

/// Writes one repeated run of `value`, `run_length` times.
pub fn encode_rle<W: Write>(
    writer: &mut W,
    value: u32,
    run_length: usize,
    num_bits: u32,
) -> std::io::Result<()> {
    write_run_header((run_length as u64) << 1, writer)?;
    let value_bytes = value.to_le_bytes();
    writer.write_all(&value_bytes[..ceil8(num_bits as usize)])?;
    Ok(())
}

fn write_run_header<W: Write>(header: u64, writer: &mut W) -> std::io::Result<()> {
    let mut container = [0u8; 10];
    let used = uleb128::encode(header, &mut container);
    writer.write_all(&container[..used])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::hybrid_rle::HybridRleDecoder;

    #[test]
    fn test_definition_level_stream_bytes() {
        // the shape a data page's definition levels take: one bit per row
        let defined = [true, true, false, true, false, false, true, true];
        let mut stream = vec![];
        encode_bitpacked(&mut stream, defined.iter().map(|&d| d as u32), 1).unwrap();
        // one group of 8 => header 0x03, mask bits LSB-first
        assert_eq!(stream, vec![0x03, 0b1100_1011]);
    }

    #[test]
    fn test_dictionary_index_stream_bytes() {
        // five width-3 dictionary indices pad out to one group of 8
        let mut stream = vec![];
        encode_bitpacked(&mut stream, [5u32, 2, 7, 0, 4].into_iter(), 3).unwrap();
        assert_eq!(stream, vec![0x03, 0xd5, 0x41, 0x00]);
    }

    #[test]
    fn test_multi_block_round_trip() {
        // spans two kernel blocks plus a padded tail group
        let indices: Vec<u32> = (0..75).map(|i| i % 29).collect();
        let mut stream = vec![];
        encode_bitpacked(&mut stream, indices.iter().copied(), 5).unwrap();

        let mut decoder = HybridRleDecoder::try_new(&stream, 5).unwrap();
        let mut out = vec![0u32; indices.len()];
        let read = decoder.get_batch(&mut out).unwrap();
        assert_eq!(read, indices.len());
        assert_eq!(out, indices);
    }

    #[test]
    fn test_rle_run_bytes() {
        let mut vec = vec![];
        encode_rle(&mut vec, 1, 1, 1).unwrap();
        // "RLE, repeat 1, one-bit value 1"
        assert_eq!(vec, vec![0x02, 0x01]);

        let mut vec = vec![];
        encode_rle(&mut vec, 300, 10, 9).unwrap();
        assert_eq!(vec, vec![10 << 1, 0x2c, 0x01]);
    }
}
