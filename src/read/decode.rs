//! Per-page decoding into the result buffers of one column chunk.

use crate::encoding::get_length;
use crate::encoding::hybrid_rle::HybridRleDecoder;
use crate::error::{fmt_err, ParquetResult};
use crate::parquet_bridge::{Encoding, PhysicalType};
use crate::read::result::ResultColumn;

/// Dictionary of one column chunk.
///
/// Fixed-width entries are kept as raw slots. Variable-length entries are
/// appended straight into the result column's string heap, so the heap
/// positions `0..len` double as the dictionary and index slots can store
/// heap positions directly.
enum Dictionary {
    Fixed { slot_width: usize, data: Vec<u8> },
    Strings { len: usize },
}

impl Dictionary {
    fn len(&self) -> usize {
        match self {
            Dictionary::Fixed { slot_width, data } => data.len() / slot_width,
            Dictionary::Strings { len } => *len,
        }
    }

    fn get(&self, idx: usize) -> &[u8] {
        match self {
            Dictionary::Fixed { slot_width, data } => {
                &data[idx * slot_width..(idx + 1) * slot_width]
            }
            Dictionary::Strings { .. } => {
                unreachable!("string dictionaries are read through the heap")
            }
        }
    }
}

/// Decoding state for one column chunk; dropped when the chunk scan ends.
pub(crate) struct ColumnScan {
    physical_type: PhysicalType,
    dict: Option<Dictionary>,
    page_start_row: usize,
}

impl ColumnScan {
    pub fn new(physical_type: PhysicalType) -> Self {
        Self {
            physical_type,
            dict: None,
            page_start_row: 0,
        }
    }

    /// Total data-page values decoded so far; must equal the row group's
    /// row count once the chunk is exhausted.
    pub fn rows_seen(&self) -> usize {
        self.page_start_row
    }

    pub fn scan_dict_page(
        &mut self,
        num_values: usize,
        encoding: Encoding,
        page: &[u8],
        col: &mut ResultColumn,
    ) -> ParquetResult<()> {
        match encoding {
            // PLAIN_DICTIONARY is the deprecated spelling of PLAIN here
            Encoding::Plain | Encoding::PlainDictionary => {}
            other => {
                return Err(fmt_err!(
                    Corrupt,
                    "dictionary page has unsupported/invalid encoding {:?}",
                    other
                ))
            }
        }
        if self.dict.is_some() {
            return Err(fmt_err!(Corrupt, "multiple dictionary pages for column chunk"));
        }
        // Index slots written by earlier pages would dangle if the heap or
        // the row cursor already moved.
        if self.page_start_row > 0 || !col.string_heap.is_empty() {
            return Err(fmt_err!(Corrupt, "dictionary page must precede all data pages"));
        }

        let dict = match self.physical_type {
            PhysicalType::Boolean
            | PhysicalType::Int32
            | PhysicalType::Int64
            | PhysicalType::Int96
            | PhysicalType::Float
            | PhysicalType::Double => {
                let slot_width = self.physical_type.slot_width();
                let total = num_values
                    .checked_mul(slot_width)
                    .ok_or_else(|| fmt_err!(Corrupt, "dictionary size overflow"))?;
                if total > page.len() {
                    return Err(fmt_err!(
                        Corrupt,
                        "dictionary of {} values overruns the page",
                        num_values
                    ));
                }
                Dictionary::Fixed {
                    slot_width,
                    data: page[..total].to_vec(),
                }
            }
            PhysicalType::ByteArray => {
                // entries land in the heap; positions 0..num_values are the
                // dictionary
                let mut pos = 0usize;
                for _ in 0..num_values {
                    if pos + 4 > page.len() {
                        return Err(fmt_err!(Corrupt, "dictionary string length truncated"));
                    }
                    let len =
                        u32::from_le_bytes(page[pos..pos + 4].try_into().unwrap()) as usize;
                    pos += 4;
                    if pos + len > page.len() {
                        return Err(fmt_err!(
                            Corrupt,
                            "declared string length exceeds payload size"
                        ));
                    }
                    col.string_heap.push(page[pos..pos + len].to_vec());
                    pos += len;
                }
                Dictionary::Strings { len: num_values }
            }
            PhysicalType::FixedLenByteArray(_) => {
                return Err(fmt_err!(
                    Unsupported,
                    "dictionaries for fixed-length byte arrays are not supported"
                ))
            }
        };
        self.dict = Some(dict);
        Ok(())
    }

    pub fn scan_data_page(
        &mut self,
        num_values: usize,
        def_encoding: Encoding,
        encoding: Encoding,
        page: &[u8],
        col: &mut ResultColumn,
    ) -> ParquetResult<()> {
        if num_values == 0 {
            return Ok(());
        }
        if self.page_start_row + num_values > col.num_rows() {
            return Err(fmt_err!(
                Corrupt,
                "page of {} values overruns the row group",
                num_values
            ));
        }

        // Definition levels first: a length-prefixed width-1 hybrid stream.
        // OPTIONAL leaves always carry them; repetition levels are absent in
        // a flat schema (max level 0, zero-length stream).
        if def_encoding != Encoding::Rle {
            return Err(fmt_err!(
                Unsupported,
                "definition level encoding {:?} is not supported",
                def_encoding
            ));
        }
        let def_length = get_length(page)
            .ok_or_else(|| fmt_err!(Corrupt, "page too short for definition levels"))?;
        let def_end = 4 + def_length;
        if def_end > page.len() {
            return Err(fmt_err!(Corrupt, "definition levels overrun the page"));
        }
        let start = self.page_start_row;
        // A stream that ends early leaves the remaining rows null.
        HybridRleDecoder::try_new(&page[4..def_end], 1)?
            .get_batch(&mut col.defined[start..start + num_values])?;

        let values = &page[def_end..];
        match encoding {
            Encoding::Plain => self.scan_plain(values, num_values, col)?,
            Encoding::RleDictionary | Encoding::PlainDictionary => {
                self.scan_dict_indices(values, num_values, col)?
            }
            other => {
                return Err(fmt_err!(
                    Unsupported,
                    "data page encoding {:?} is not supported",
                    other
                ))
            }
        }

        self.page_start_row += num_values;
        Ok(())
    }

    /// PLAIN values: contiguous little-endian slots for fixed widths,
    /// length-prefixed bytes for BYTE_ARRAY. Null rows consume no payload.
    fn scan_plain(
        &mut self,
        values: &[u8],
        num_values: usize,
        col: &mut ResultColumn,
    ) -> ParquetResult<()> {
        let start = self.page_start_row;
        let ResultColumn {
            data,
            defined,
            string_heap,
            ..
        } = col;

        match self.physical_type {
            PhysicalType::ByteArray => {
                let mut pos = 0usize;
                for i in 0..num_values {
                    if defined[start + i] == 0 {
                        continue;
                    }
                    if pos + 4 > values.len() {
                        return Err(fmt_err!(Corrupt, "string length truncated"));
                    }
                    let len =
                        u32::from_le_bytes(values[pos..pos + 4].try_into().unwrap()) as usize;
                    pos += 4;
                    if pos + len > values.len() {
                        return Err(fmt_err!(
                            Corrupt,
                            "declared string length exceeds payload size"
                        ));
                    }
                    string_heap.push(values[pos..pos + len].to_vec());
                    pos += len;

                    let row = start + i;
                    let heap_idx = (string_heap.len() - 1) as u64;
                    data[row * 8..(row + 1) * 8].copy_from_slice(&heap_idx.to_le_bytes());
                }
            }
            _ => {
                let width = self.physical_type.slot_width();
                let mut pos = 0usize;
                for i in 0..num_values {
                    if defined[start + i] == 0 {
                        continue;
                    }
                    if pos + width > values.len() {
                        return Err(fmt_err!(Corrupt, "plain values exhausted mid-page"));
                    }
                    let row = start + i;
                    data[row * width..(row + 1) * width]
                        .copy_from_slice(&values[pos..pos + width]);
                    pos += width;
                }
            }
        }
        Ok(())
    }

    /// Dictionary-encoded values: one leading byte gives the index bit
    /// width, the rest of the page is a hybrid stream of dictionary
    /// positions for the defined rows.
    fn scan_dict_indices(
        &mut self,
        values: &[u8],
        num_values: usize,
        col: &mut ResultColumn,
    ) -> ParquetResult<()> {
        let dict = self
            .dict
            .as_ref()
            .ok_or_else(|| fmt_err!(Corrupt, "missing dictionary page"))?;
        let start = self.page_start_row;

        let (first, rest) = values
            .split_first()
            .ok_or_else(|| fmt_err!(Corrupt, "dictionary index stream empty"))?;
        let num_bits = *first as u32;
        if num_bits > 32 {
            return Err(fmt_err!(
                Corrupt,
                "dictionary index bit width {} out of range",
                num_bits
            ));
        }

        // Offsets of null rows stay 0 and are never read back.
        let mut offsets = vec![0u32; num_values];
        if num_bits > 0 {
            let defined = &col.defined[start..start + num_values];
            let null_count = defined.iter().filter(|&&d| d == 0).count();
            let mut decoder = HybridRleDecoder::try_new(rest, num_bits)?;
            let read = if null_count > 0 {
                decoder.get_batch_spaced(num_values, null_count, defined, &mut offsets)?
            } else {
                decoder.get_batch(&mut offsets)?
            };
            if read != num_values {
                return Err(fmt_err!(
                    Corrupt,
                    "dictionary index stream holds {} of {} values",
                    read,
                    num_values
                ));
            }
        }

        match self.physical_type {
            PhysicalType::Int32
            | PhysicalType::Int64
            | PhysicalType::Int96
            | PhysicalType::Float
            | PhysicalType::Double => {
                let width = self.physical_type.slot_width();
                let ResultColumn { data, defined, .. } = col;
                for (i, &offset) in offsets.iter().enumerate() {
                    if defined[start + i] == 0 {
                        continue;
                    }
                    let offset = offset as usize;
                    if offset >= dict.len() {
                        return Err(fmt_err!(
                            Corrupt,
                            "dictionary index {} out of bounds {}",
                            offset,
                            dict.len()
                        ));
                    }
                    let row = start + i;
                    data[row * width..(row + 1) * width].copy_from_slice(dict.get(offset));
                }
            }
            PhysicalType::ByteArray => {
                // Dictionary entries occupy heap positions 0..len, so the
                // raw offsets double as heap indices.
                let dict_len = dict.len();
                let ResultColumn { data, defined, .. } = col;
                for (i, &offset) in offsets.iter().enumerate() {
                    let row = start + i;
                    if defined[start + i] != 0 && offset as usize >= dict_len {
                        return Err(fmt_err!(
                            Corrupt,
                            "dictionary index {} out of bounds {}",
                            offset,
                            dict_len
                        ));
                    }
                    data[row * 8..(row + 1) * 8]
                        .copy_from_slice(&(offset as u64).to_le_bytes());
                }
            }
            PhysicalType::Boolean | PhysicalType::FixedLenByteArray(_) => {
                return Err(fmt_err!(
                    Unsupported,
                    "dictionary-encoded {:?} data pages are not supported",
                    self.physical_type
                ))
            }
        }
        Ok(())
    }
}
