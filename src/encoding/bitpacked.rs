//! Fixed-width bit packing over 32-value blocks.
//!
//! The unpack kernel family decodes 32 packed little-endian values per call,
//! one kernel per bit width in `0..=32`. Callers batching fewer than 32
//! values round up and discard the surplus; buffers holding packed streams
//! are over-allocated accordingly (see `read`).

mod unpack32_impl {
    /// Unpacks 32 values packed at `NUM_BITS` bits each, LSB-first.
    pub fn unpack<const NUM_BITS: usize>(input: &[u8], output: &mut [u32; 32]) {
        if NUM_BITS == 0 {
            for out in output {
                *out = 0;
            }
            return;
        }

        assert!(NUM_BITS <= 32);
        assert!(input.len() >= NUM_BITS * 4);

        let mask = match NUM_BITS {
            32 => u32::MAX,
            _ => ((1 << NUM_BITS) - 1),
        };

        let r = |word_idx: usize| {
            u32::from_le_bytes(input[word_idx * 4..word_idx * 4 + 4].try_into().unwrap())
        };

        seq_macro::seq!(i in 0..32 {
            let start_bit = i * NUM_BITS;
            let end_bit = start_bit + NUM_BITS;

            let start_bit_offset = start_bit % 32;
            let end_bit_offset = end_bit % 32;
            let start_word = start_bit / 32;
            let end_word = end_bit / 32;
            if start_word != end_word && end_bit_offset != 0 {
                let val = r(start_word);
                let a = val >> start_bit_offset;
                let val = r(end_word);
                let b = val << (NUM_BITS - end_bit_offset);

                output[i] = a | (b & mask);
            } else {
                let val = r(start_word);
                output[i] = (val >> start_bit_offset) & mask;
            }
        });
    }
}

/// Unpacks 32 values from `input` at a bit width of `num_bits`.
///
/// `input` must hold at least `num_bits * 4` bytes.
pub fn unpack32(input: &[u8], output: &mut [u32; 32], num_bits: usize) {
    // This will get optimised into a jump table
    seq_macro::seq!(i in 0..=32 {
        if i == num_bits {
            return unpack32_impl::unpack::<i>(input, output);
        }
    });
    unreachable!("invalid num_bits {}", num_bits);
}

/// Packs 32 values into `output` at a bit width of `num_bits`, LSB-first.
///
/// The inverse of [`unpack32`]; values must fit in `num_bits` bits. `output`
/// must hold at least `num_bits * 4` bytes; exactly that many are written.
pub fn pack32(input: &[u32; 32], num_bits: usize, output: &mut [u8]) {
    if num_bits == 0 {
        return;
    }
    assert!(num_bits <= 32);
    let packed_len = num_bits * 4;
    assert!(output.len() >= packed_len);

    output[..packed_len].fill(0);
    let mut bit = 0usize;
    for &value in input {
        for j in 0..num_bits {
            if value & (1 << j) != 0 {
                output[bit / 8] |= 1 << (bit % 8);
            }
            bit += 1;
        }
    }
}
