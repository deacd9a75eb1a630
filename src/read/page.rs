//! Walking the page sequence of one column chunk.

use std::io::Cursor;

use parquet_format_safe::thrift::protocol::TCompactInputProtocol;
use parquet_format_safe::PageHeader as ParquetPageHeader;

use crate::error::{fmt_err, ParquetResult};
use crate::parquet_bridge::{Encoding, PageType};

/// One page sliced out of a chunk buffer, payload still compressed.
pub(crate) struct CompressedPage<'a> {
    pub header: ParquetPageHeader,
    pub buffer: &'a [u8],
}

/// Typed view of a page header; modeling the dictionary/data split as a sum
/// type removes the "both subheaders set / neither set" states.
pub(crate) enum PageKind {
    Dictionary {
        num_values: usize,
        encoding: Encoding,
    },
    DataV1 {
        num_values: usize,
        def_encoding: Encoding,
        encoding: Encoding,
    },
}

/// Classifies a raw page header.
///
/// Returns `None` for pages the scan walks over without decoding: index
/// pages and unknown page-type extensions.
pub(crate) fn classify_page(header: &ParquetPageHeader) -> ParquetResult<Option<PageKind>> {
    let page_type = match PageType::try_from(header.type_) {
        Ok(page_type) => page_type,
        Err(_) => return Ok(None),
    };

    match page_type {
        PageType::IndexPage => Ok(None),
        PageType::DataPageV2 => Err(fmt_err!(Unsupported, "v2 data pages are not supported")),
        PageType::DictionaryPage => {
            if header.data_page_header.is_some() {
                return Err(fmt_err!(Corrupt, "dictionary page header mismatch"));
            }
            let dict = header
                .dictionary_page_header
                .as_ref()
                .ok_or_else(|| fmt_err!(Corrupt, "dictionary page header mismatch"))?;
            let num_values: usize = dict
                .num_values
                .try_into()
                .map_err(|_| fmt_err!(Corrupt, "negative dictionary size"))?;
            Ok(Some(PageKind::Dictionary {
                num_values,
                encoding: dict.encoding.try_into()?,
            }))
        }
        PageType::DataPage => {
            if header.dictionary_page_header.is_some() {
                return Err(fmt_err!(Corrupt, "data page header mismatch"));
            }
            if header.data_page_header_v2.is_some() {
                return Err(fmt_err!(Unsupported, "v2 data pages are not supported"));
            }
            let data = header
                .data_page_header
                .as_ref()
                .ok_or_else(|| fmt_err!(Corrupt, "data page header mismatch"))?;
            let num_values: usize = data
                .num_values
                .try_into()
                .map_err(|_| fmt_err!(Corrupt, "negative page value count"))?;
            Ok(Some(PageKind::DataV1 {
                num_values,
                def_encoding: data.definition_level_encoding.try_into()?,
                encoding: data.encoding.try_into()?,
            }))
        }
    }
}

/// Iterator over the pages of a chunk held in memory.
///
/// Each step parses one variable-length thrift header (the protocol reports
/// the bytes it consumed through the cursor position) and slices out the
/// following `compressed_page_size` payload bytes.
pub(crate) struct ChunkPageReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ChunkPageReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn read_next(&mut self) -> ParquetResult<Option<CompressedPage<'a>>> {
        if self.offset >= self.data.len() {
            return Ok(None);
        }

        let remaining = &self.data[self.offset..];
        let mut cursor = Cursor::new(remaining);
        let header = {
            // bounds what a malformed header may make the thrift reader
            // allocate
            let max_size = remaining.len() * 2 + 1024;
            let mut protocol = TCompactInputProtocol::new(&mut cursor, max_size);
            ParquetPageHeader::read_from_in_protocol(&mut protocol)?
        };
        self.offset += cursor.position() as usize;

        let payload_len: usize = header
            .compressed_page_size
            .try_into()
            .map_err(|_| fmt_err!(Corrupt, "negative compressed page size"))?;
        if self.offset + payload_len > self.data.len() {
            return Err(fmt_err!(
                Corrupt,
                "page payload of {} bytes extends past the chunk end",
                payload_len
            ));
        }
        let buffer = &self.data[self.offset..self.offset + payload_len];
        self.offset += payload_len;

        Ok(Some(CompressedPage { header, buffer }))
    }
}

impl<'a> Iterator for ChunkPageReader<'a> {
    type Item = ParquetResult<CompressedPage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}
