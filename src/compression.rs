//! Page decompression.
//!
//! Pages declare their uncompressed size in the page header; the caller
//! allocates `output` accordingly and this module fills it.

use crate::error::{fmt_err, ParquetResult};
use crate::parquet_bridge::Compression;

/// Decompresses `input` into `output`, which must be sized to the page
/// header's `uncompressed_page_size`.
pub fn decompress(
    compression: Compression,
    input: &[u8],
    output: &mut [u8],
) -> ParquetResult<()> {
    match compression {
        Compression::Uncompressed => {
            if input.len() != output.len() {
                return Err(fmt_err!(
                    Corrupt,
                    "uncompressed page declared {} bytes but holds {}",
                    output.len(),
                    input.len()
                ));
            }
            output.copy_from_slice(input);
            Ok(())
        }
        Compression::Snappy => {
            let written = snap::raw::Decoder::new().decompress(input, output)?;
            if written != output.len() {
                return Err(fmt_err!(
                    Corrupt,
                    "snappy page decompressed to {} bytes, header declared {}",
                    written,
                    output.len()
                ));
            }
            Ok(())
        }
    }
}
