#![allow(dead_code)]

//! A minimal flat-file writer used to synthesize parquet bytes for the scan
//! tests: thrift metadata through `parquet-format-safe`, page payloads by
//! hand, hybrid level/index streams through the crate's own encoders.

use std::io::Write;

use parquet_format_safe::thrift::protocol::TCompactOutputProtocol;
use parquet_format_safe::{
    ColumnChunk, ColumnMetaData, CompressionCodec, DataPageHeader, DataPageHeaderV2,
    DictionaryPageHeader, Encoding, FieldRepetitionType, FileMetaData, IndexPageHeader,
    PageHeader, PageType, RowGroup, SchemaElement, Type,
};
use tempfile::NamedTempFile;

use parquet_scan::encoding::hybrid_rle::{encode_bitpacked, encode_rle};

pub const MAGIC: &[u8; 4] = b"PAR1";

/// `(name, physical type, type_length)` of one leaf column.
pub type ColumnDef = (&'static str, Type, Option<i32>);

pub struct ColumnChunkSpec {
    /// Serialized pages in file order, dictionary page first when present.
    pub pages: Vec<Vec<u8>>,
    pub has_dict: bool,
    pub codec: CompressionCodec,
    /// Record a dictionary page offset pointing into the leading magic, as
    /// some buggy writers do; the data page offset then covers the whole
    /// chunk.
    pub bogus_dict_offset: bool,
}

impl ColumnChunkSpec {
    pub fn new(pages: Vec<Vec<u8>>) -> Self {
        Self {
            pages,
            has_dict: false,
            codec: CompressionCodec::UNCOMPRESSED,
            bogus_dict_offset: false,
        }
    }

    pub fn with_dict(mut self) -> Self {
        self.has_dict = true;
        self
    }

    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_bogus_dict_offset(mut self) -> Self {
        self.bogus_dict_offset = true;
        self
    }
}

pub struct RowGroupSpec {
    pub num_rows: usize,
    pub chunks: Vec<ColumnChunkSpec>,
}

/// Length-prefixed width-1 hybrid stream for a definition mask, bit-packed.
pub fn def_levels(defined: &[bool]) -> Vec<u8> {
    let mut stream = vec![];
    encode_bitpacked(&mut stream, defined.iter().map(|&d| d as u32), 1).unwrap();
    prefix_length(stream)
}

/// Length-prefixed width-1 hybrid stream holding one repeated run.
pub fn def_levels_rle(value: bool, count: usize) -> Vec<u8> {
    let mut stream = vec![];
    encode_rle(&mut stream, value as u32, count, 1).unwrap();
    prefix_length(stream)
}

/// Length-prefixed stream from raw hybrid bytes.
pub fn def_levels_raw(stream: Vec<u8>) -> Vec<u8> {
    prefix_length(stream)
}

fn prefix_length(stream: Vec<u8>) -> Vec<u8> {
    let mut out = (stream.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(&stream);
    out
}

/// Dictionary-index stream: one width byte, then the packed indices of the
/// defined rows in order.
pub fn dict_indices(width: u8, indices: &[u32]) -> Vec<u8> {
    let mut out = vec![width];
    if width > 0 {
        encode_bitpacked(&mut out, indices.iter().copied(), width as u32).unwrap();
    }
    out
}

/// PLAIN payload of length-prefixed byte strings.
pub fn plain_byte_array(values: &[&[u8]]) -> Vec<u8> {
    let mut out = vec![];
    for value in values {
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        out.extend_from_slice(value);
    }
    out
}

fn serialize_header(header: &PageHeader) -> Vec<u8> {
    let mut buf = vec![];
    let mut protocol = TCompactOutputProtocol::new(&mut buf);
    header.write_to_out_protocol(&mut protocol).unwrap();
    buf
}

fn compress(codec: CompressionCodec, payload: &[u8]) -> Vec<u8> {
    match codec {
        CompressionCodec::SNAPPY => snap::raw::Encoder::new().compress_vec(payload).unwrap(),
        _ => payload.to_vec(),
    }
}

fn empty_page_header(type_: PageType, uncompressed: usize, compressed: usize) -> PageHeader {
    PageHeader {
        type_,
        uncompressed_page_size: uncompressed as i32,
        compressed_page_size: compressed as i32,
        crc: None,
        data_page_header: None,
        index_page_header: None,
        dictionary_page_header: None,
        data_page_header_v2: None,
    }
}

/// One serialized v1 data page; `payload` is the definition-level stream
/// followed by the encoded values.
pub fn data_page(
    encoding: Encoding,
    num_values: usize,
    payload: Vec<u8>,
    codec: CompressionCodec,
) -> Vec<u8> {
    let body = compress(codec, &payload);
    let mut header = empty_page_header(PageType::DATA_PAGE, payload.len(), body.len());
    header.data_page_header = Some(DataPageHeader {
        num_values: num_values as i32,
        encoding,
        definition_level_encoding: Encoding::RLE,
        repetition_level_encoding: Encoding::RLE,
        statistics: None,
    });
    let mut out = serialize_header(&header);
    out.extend_from_slice(&body);
    out
}

/// One serialized dictionary page.
pub fn dict_page(
    encoding: Encoding,
    num_values: usize,
    payload: Vec<u8>,
    codec: CompressionCodec,
) -> Vec<u8> {
    let body = compress(codec, &payload);
    let mut header = empty_page_header(PageType::DICTIONARY_PAGE, payload.len(), body.len());
    header.dictionary_page_header = Some(DictionaryPageHeader {
        num_values: num_values as i32,
        encoding,
        is_sorted: Some(false),
    });
    let mut out = serialize_header(&header);
    out.extend_from_slice(&body);
    out
}

/// An index page with an opaque payload; readers walk over these.
pub fn index_page(payload: Vec<u8>) -> Vec<u8> {
    let mut header = empty_page_header(PageType::INDEX_PAGE, payload.len(), payload.len());
    header.index_page_header = Some(IndexPageHeader {});
    let mut out = serialize_header(&header);
    out.extend_from_slice(&payload);
    out
}

/// A v2 data page stub; the reader must reject these.
pub fn data_page_v2(num_values: usize, payload: Vec<u8>) -> Vec<u8> {
    let mut header = empty_page_header(PageType::DATA_PAGE_V2, payload.len(), payload.len());
    header.data_page_header_v2 = Some(DataPageHeaderV2 {
        num_values: num_values as i32,
        num_nulls: 0,
        num_rows: num_values as i32,
        encoding: Encoding::PLAIN,
        definition_levels_byte_length: 0,
        repetition_levels_byte_length: 0,
        is_compressed: Some(false),
        statistics: None,
    });
    let mut out = serialize_header(&header);
    out.extend_from_slice(&payload);
    out
}

/// Root + one OPTIONAL leaf per column definition.
pub fn flat_schema(columns: &[ColumnDef]) -> Vec<SchemaElement> {
    let mut schema = vec![group_element("schema", columns.len() as i32)];
    for (name, type_, type_length) in columns {
        schema.push(leaf_element(name, *type_, *type_length));
    }
    schema
}

pub fn group_element(name: &str, num_children: i32) -> SchemaElement {
    SchemaElement {
        type_: None,
        type_length: None,
        repetition_type: None,
        name: name.to_string(),
        num_children: Some(num_children),
        converted_type: None,
        scale: None,
        precision: None,
        field_id: None,
        logical_type: None,
    }
}

pub fn leaf_element(name: &str, type_: Type, type_length: Option<i32>) -> SchemaElement {
    SchemaElement {
        type_: Some(type_),
        type_length,
        repetition_type: Some(FieldRepetitionType::OPTIONAL),
        name: name.to_string(),
        num_children: None,
        converted_type: None,
        scale: None,
        precision: None,
        field_id: None,
        logical_type: None,
    }
}

/// Serializes row-group payloads and a footer into complete file bytes.
pub fn write_file(columns: &[ColumnDef], row_groups: Vec<RowGroupSpec>) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    let mut rg_meta = vec![];

    for rg in &row_groups {
        assert_eq!(rg.chunks.len(), columns.len());
        let mut chunk_meta = vec![];
        let mut total_byte_size = 0i64;

        for (col_idx, chunk) in rg.chunks.iter().enumerate() {
            let chunk_start = out.len() as i64;
            let first_data_page_offset = if chunk.has_dict {
                chunk_start + chunk.pages[0].len() as i64
            } else {
                chunk_start
            };
            let mut total_compressed_size = 0i64;
            for page in &chunk.pages {
                out.extend_from_slice(page);
                total_compressed_size += page.len() as i64;
            }
            total_byte_size += total_compressed_size;

            let (name, type_, _) = columns[col_idx];
            let (data_page_offset, dictionary_page_offset) =
                match (chunk.has_dict, chunk.bogus_dict_offset) {
                    (false, _) => (chunk_start, None),
                    (true, false) => (first_data_page_offset, Some(chunk_start)),
                    (true, true) => (chunk_start, Some(0)),
                };

            chunk_meta.push(ColumnChunk {
                file_path: None,
                file_offset: chunk_start + total_compressed_size,
                meta_data: Some(ColumnMetaData {
                    type_,
                    encodings: vec![Encoding::PLAIN, Encoding::RLE],
                    path_in_schema: vec![name.to_string()],
                    codec: chunk.codec,
                    num_values: rg.num_rows as i64,
                    total_uncompressed_size: total_compressed_size,
                    total_compressed_size,
                    key_value_metadata: None,
                    data_page_offset,
                    index_page_offset: None,
                    dictionary_page_offset,
                    statistics: None,
                    encoding_stats: None,
                    bloom_filter_offset: None,
                }),
                offset_index_offset: None,
                offset_index_length: None,
                column_index_offset: None,
                column_index_length: None,
                crypto_metadata: None,
                encrypted_column_metadata: None,
            });
        }

        rg_meta.push(RowGroup {
            columns: chunk_meta,
            total_byte_size,
            num_rows: rg.num_rows as i64,
            sorting_columns: None,
            file_offset: None,
            total_compressed_size: None,
            ordinal: None,
        });
    }

    let num_rows: i64 = row_groups.iter().map(|rg| rg.num_rows as i64).sum();
    let metadata = FileMetaData {
        version: 1,
        schema: flat_schema(columns),
        num_rows,
        row_groups: rg_meta,
        key_value_metadata: None,
        created_by: Some("parquet-scan tests".to_string()),
        column_orders: None,
        encryption_algorithm: None,
        footer_signing_key_metadata: None,
    };
    assemble_file(out, metadata)
}

/// Appends the serialized footer, its length and the trailing magic.
pub fn assemble_file(mut body: Vec<u8>, metadata: FileMetaData) -> Vec<u8> {
    let mut footer = vec![];
    let mut protocol = TCompactOutputProtocol::new(&mut footer);
    metadata.write_to_out_protocol(&mut protocol).unwrap();
    body.extend_from_slice(&footer);
    body.extend_from_slice(&(footer.len() as u32).to_le_bytes());
    body.extend_from_slice(MAGIC);
    body
}

/// An empty body with a footer describing no row groups.
pub fn metadata_only_file(schema: Vec<SchemaElement>, num_rows: i64) -> Vec<u8> {
    let metadata = FileMetaData {
        version: 1,
        schema,
        num_rows,
        row_groups: vec![],
        key_value_metadata: None,
        created_by: Some("parquet-scan tests".to_string()),
        column_orders: None,
        encryption_algorithm: None,
        footer_signing_key_metadata: None,
    };
    assemble_file(MAGIC.to_vec(), metadata)
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(bytes).expect("write parquet bytes");
    file.flush().expect("flush parquet bytes");
    file
}
