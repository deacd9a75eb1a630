//! The RLE/bit-packing hybrid encoding used for definition levels and
//! dictionary indices.
//!
//! A stream is a sequence of runs, each prefixed by a ULEB128 header whose
//! low bit selects the run kind: `1` is a bit-packed run of
//! `(header >> 1) * 8` literal values, `0` is a repeated run of
//! `header >> 1` copies of one value stored in `ceil8(bit_width)`
//! little-endian bytes.

mod encoder;

pub use encoder::{encode_bitpacked, encode_rle};

use crate::encoding::{bitpacked, ceil8};
use crate::error::{fmt_err, ParquetResult};

/// Largest literal batch staged at once by the spaced decode path.
const LITERAL_BATCH: usize = 1024;

/// Output element of the hybrid decoder.
///
/// `u32` unpacks through the 32-wide kernels; `u8` (used for one-bit
/// definition levels landing in byte-per-value masks) takes a scalar
/// bit-at-a-time path.
pub trait Unpackable: Copy + Default {
    /// Widest bit-packed run this output type can take.
    const MAX_WIDTH: usize;

    fn from_u64(value: u64) -> Self;

    /// Unpacks `out.len()` values from the front of `data`, LSB-first.
    ///
    /// `data` must hold at least `ceil8(num_bits * out.len())` bytes and
    /// `num_bits` must not exceed [`Self::MAX_WIDTH`].
    fn unpack(data: &[u8], num_bits: usize, out: &mut [Self]);
}

impl Unpackable for u32 {
    const MAX_WIDTH: usize = 32;

    #[inline]
    fn from_u64(value: u64) -> Self {
        value as u32
    }

    fn unpack(data: &[u8], num_bits: usize, out: &mut [Self]) {
        // The kernels emit 32 values per pass and read num_bits * 4 bytes
        // each; the final block is staged through a zeroed buffer when the
        // slice ends short of that.
        let block_bytes = num_bits * 4;
        let mut unpacked = [0u32; 32];
        let mut pos = 0usize;
        for chunk in out.chunks_mut(32) {
            if data.len() >= pos + block_bytes {
                bitpacked::unpack32(&data[pos..], &mut unpacked, num_bits);
            } else {
                let mut padded = [0u8; 32 * 4];
                let available = data.len().saturating_sub(pos);
                padded[..available].copy_from_slice(&data[pos..]);
                bitpacked::unpack32(&padded, &mut unpacked, num_bits);
            }
            chunk.copy_from_slice(&unpacked[..chunk.len()]);
            pos += block_bytes;
        }
    }
}

impl Unpackable for u8 {
    const MAX_WIDTH: usize = 8;

    #[inline]
    fn from_u64(value: u64) -> Self {
        value as u8
    }

    fn unpack(data: &[u8], num_bits: usize, out: &mut [Self]) {
        debug_assert!(num_bits <= 8);
        let mut bit = 0usize;
        for item in out.iter_mut() {
            let mut value = 0u8;
            for j in 0..num_bits {
                value |= (1 & (data[bit / 8] >> (bit % 8))) << j;
                bit += 1;
            }
            *item = value;
        }
    }
}

/// Streaming decoder over one hybrid-encoded byte slice.
pub struct HybridRleDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    num_bits: usize,
    byte_encoded_len: usize,
    max_val: u64,
    current_value: u64,
    repeat_count: usize,
    literal_count: usize,
}

impl<'a> HybridRleDecoder<'a> {
    pub fn try_new(data: &'a [u8], num_bits: u32) -> ParquetResult<Self> {
        if num_bits >= 64 {
            return Err(fmt_err!(Unsupported, "bit width {} too large", num_bits));
        }
        Ok(Self {
            data,
            pos: 0,
            num_bits: num_bits as usize,
            byte_encoded_len: ceil8(num_bits as usize),
            max_val: (1u64 << num_bits) - 1,
            current_value: 0,
            repeat_count: 0,
            literal_count: 0,
        })
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// Decodes up to `out.len()` values, returning how many were filled.
    ///
    /// Running out of input at a run boundary yields a partial count; a run
    /// that promises more values than the slice holds is an error.
    pub fn get_batch<T: Unpackable>(&mut self, out: &mut [T]) -> ParquetResult<usize> {
        let mut read = 0usize;
        while read < out.len() {
            if self.repeat_count > 0 {
                let batch = (out.len() - read).min(self.repeat_count);
                out[read..read + batch].fill(T::from_u64(self.current_value));
                self.repeat_count -= batch;
                read += batch;
            } else if self.literal_count > 0 {
                let batch = (out.len() - read).min(self.literal_count);
                self.unpack_literals(&mut out[read..read + batch])?;
                self.literal_count -= batch;
                read += batch;
            } else if !self.next_counts()? {
                return Ok(read);
            }
        }
        Ok(read)
    }

    /// Decodes values for the positions flagged in `defined`, writing them
    /// at their dense output index; slots whose mask byte is 0 consume no
    /// input and their output is left unspecified.
    ///
    /// `defined` must hold at least `batch_size` entries of which exactly
    /// `null_count` are zero, and `out` at least `batch_size` slots.
    pub fn get_batch_spaced<T: Unpackable>(
        &mut self,
        batch_size: usize,
        null_count: usize,
        defined: &[u8],
        out: &mut [T],
    ) -> ParquetResult<usize> {
        debug_assert!(defined.len() >= batch_size);
        debug_assert!(out.len() >= batch_size);

        let mut values_read = 0usize;
        let mut remaining_nulls = null_count;
        let mut def_pos = 0usize;
        let mut out_pos = 0usize;

        while values_read < batch_size {
            let is_defined = defined[def_pos] != 0;
            def_pos += 1;

            if !is_defined {
                out_pos += 1;
                values_read += 1;
                remaining_nulls = remaining_nulls.saturating_sub(1);
                continue;
            }

            if self.repeat_count == 0 && self.literal_count == 0 && !self.next_counts()? {
                return Ok(values_read);
            }

            if self.repeat_count > 0 {
                // The slot at hand already consumed one repeat; extend the
                // group over following slots, where only defined ones drain
                // the run.
                let mut group = 1usize;
                self.repeat_count -= 1;
                while self.repeat_count > 0 && values_read + group < batch_size {
                    if defined[def_pos] != 0 {
                        self.repeat_count -= 1;
                    } else {
                        remaining_nulls = remaining_nulls.saturating_sub(1);
                    }
                    group += 1;
                    def_pos += 1;
                }
                out[out_pos..out_pos + group].fill(T::from_u64(self.current_value));
                out_pos += group;
                values_read += group;
            } else if self.literal_count > 0 {
                let literal_batch = (batch_size - values_read - remaining_nulls)
                    .min(self.literal_count)
                    .min(LITERAL_BATCH);
                if literal_batch == 0 {
                    return Err(fmt_err!(
                        Corrupt,
                        "definition mask disagrees with its null count"
                    ));
                }
                let mut scratch = [T::default(); LITERAL_BATCH];
                self.unpack_literals(&mut scratch[..literal_batch])?;

                // First literal lands on the slot at hand; scatter the rest
                // over the defined slots that follow.
                let mut skipped = 0usize;
                let mut literals_read = 1usize;
                out[out_pos] = scratch[0];
                out_pos += 1;
                while literals_read < literal_batch {
                    if defined[def_pos] != 0 {
                        out[out_pos] = scratch[literals_read];
                        literals_read += 1;
                    } else {
                        skipped += 1;
                    }
                    out_pos += 1;
                    def_pos += 1;
                }
                self.literal_count -= literal_batch;
                values_read += literal_batch + skipped;
                remaining_nulls = remaining_nulls.saturating_sub(skipped);
            }
        }
        Ok(values_read)
    }

    /// Unpacks `out.len()` literal values and advances the cursor by the
    /// bytes they occupy. Literal runs hold a multiple of 8 values, so
    /// full-run reads always land on a byte boundary.
    fn unpack_literals<T: Unpackable>(&mut self, out: &mut [T]) -> ParquetResult<()> {
        if self.num_bits > T::MAX_WIDTH {
            return Err(fmt_err!(
                Unsupported,
                "bit width {} too wide for the requested batch target",
                self.num_bits
            ));
        }
        let available_bits = (self.data.len() - self.pos) * 8;
        if available_bits < self.num_bits * out.len() {
            return Err(fmt_err!(
                Corrupt,
                "literal run ends before its {} declared values",
                out.len()
            ));
        }
        T::unpack(&self.data[self.pos..], self.num_bits, out);
        self.pos += self.num_bits * out.len() / 8;
        Ok(())
    }

    /// Reads the next run header. Returns false on a clean end of input.
    fn next_counts(&mut self) -> ParquetResult<bool> {
        let indicator = match self.read_indicator()? {
            Some(indicator) => indicator,
            None => return Ok(false),
        };
        if indicator & 1 == 1 {
            self.literal_count = (indicator as usize >> 1) * 8;
        } else {
            self.repeat_count = indicator as usize >> 1;
            if self.pos + self.byte_encoded_len > self.data.len() {
                return Err(fmt_err!(Corrupt, "truncated rle run value"));
            }
            let mut value = 0u64;
            for i in 0..self.byte_encoded_len {
                value |= (self.data[self.pos + i] as u64) << (i * 8);
            }
            self.pos += self.byte_encoded_len;
            if value > self.max_val {
                return Err(fmt_err!(
                    Corrupt,
                    "rle run value {} exceeds bit width {}",
                    value,
                    self.num_bits
                ));
            }
            self.current_value = value;
        }
        Ok(true)
    }

    fn read_indicator(&mut self) -> ParquetResult<Option<u32>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let mut result: u32 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.data[self.pos];
            self.pos += 1;
            result |= ((byte & 0x7f) as u32) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 32 {
                return Err(fmt_err!(Corrupt, "run header varint too large"));
            }
            if self.pos >= self.data.len() {
                return Err(fmt_err!(Corrupt, "truncated run header varint"));
            }
        }
        Ok(Some(result))
    }
}
