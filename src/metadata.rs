//! Footer parsing and schema validation.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};

use parquet_format_safe::thrift::protocol::TCompactInputProtocol;
use parquet_format_safe::{FileMetaData as ThriftFileMetaData, RowGroup};

use crate::error::{fmt_err, ParquetResult};
use crate::parquet_bridge::{physical_type_from_thrift, PhysicalType, Repetition};

pub(crate) const PARQUET_MAGIC: [u8; 4] = *b"PAR1";
const HEADER_SIZE: u64 = PARQUET_MAGIC.len() as u64;
const FOOTER_SIZE: u64 = 8;

/// One leaf column of the (flat) schema.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Zero-based position among the leaves; also the chunk index inside
    /// every row group.
    pub id: usize,
    pub name: String,
    pub physical_type: PhysicalType,
}

/// Parsed footer. Built once at open, immutable afterwards.
#[derive(Debug)]
pub struct FileMetadata {
    pub(crate) num_rows: u64,
    pub(crate) row_groups: Vec<RowGroup>,
    pub(crate) columns: Vec<ColumnDescriptor>,
}

impl FileMetadata {
    pub fn num_rows(&self) -> u64 {
        self.num_rows
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }
}

/// Locates, deserializes and validates the footer.
///
/// Layout: `PAR1` magic, row-group payloads, thrift-compact `FileMetaData`,
/// its little-endian u32 length, `PAR1` magic.
pub(crate) fn read_metadata(file: &mut File) -> ParquetResult<FileMetadata> {
    let file_size = file.seek(SeekFrom::End(0))?;
    if file_size < HEADER_SIZE + FOOTER_SIZE {
        return Err(fmt_err!(Format, "file of {} bytes is too small to be parquet", file_size));
    }

    let mut magic = [0u8; 4];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut magic)?;
    if magic != PARQUET_MAGIC {
        return Err(fmt_err!(Format, "missing magic bytes at start of file"));
    }

    let mut trailer = [0u8; 8];
    file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
    file.read_exact(&mut trailer)?;
    if trailer[4..] != PARQUET_MAGIC {
        return Err(fmt_err!(Format, "missing magic bytes at end of file"));
    }

    let footer_len = u32::from_le_bytes(trailer[..4].try_into().unwrap()) as u64;
    if footer_len == 0 {
        return Err(fmt_err!(Format, "footer length can't be 0"));
    }
    if HEADER_SIZE + footer_len + FOOTER_SIZE > file_size {
        return Err(fmt_err!(
            Format,
            "footer of {} bytes exceeds the file size {}",
            footer_len,
            file_size
        ));
    }

    let mut footer = vec![0u8; footer_len as usize];
    file.seek(SeekFrom::End(-((footer_len + FOOTER_SIZE) as i64)))?;
    file.read_exact(&mut footer)?;

    let metadata = deserialize_footer(&footer)?;
    validate(metadata)
}

fn deserialize_footer(footer: &[u8]) -> ParquetResult<ThriftFileMetaData> {
    // bounds what a malformed footer may make the thrift reader allocate
    let max_size = footer.len() * 2 + 1024;
    let mut cursor = Cursor::new(footer);
    let mut protocol = TCompactInputProtocol::new(&mut cursor, max_size);
    let metadata = ThriftFileMetaData::read_from_in_protocol(&mut protocol)?;
    Ok(metadata)
}

fn validate(metadata: ThriftFileMetaData) -> ParquetResult<FileMetadata> {
    if metadata.encryption_algorithm.is_some() {
        return Err(fmt_err!(Unsupported, "encrypted parquet files are not supported"));
    }

    let schema = &metadata.schema;
    if schema.len() < 2 {
        return Err(fmt_err!(Unsupported, "need at least one column in the file"));
    }
    let root_children = schema[0].num_children.unwrap_or(0);
    if root_children as usize != schema.len() - 1 {
        return Err(fmt_err!(Unsupported, "only flat schemas are supported (no nesting)"));
    }

    let mut columns = Vec::with_capacity(schema.len() - 1);
    for (id, element) in schema.iter().skip(1).enumerate() {
        if element.num_children.unwrap_or(0) > 0 {
            return Err(fmt_err!(Unsupported, "only flat schemas are supported (no nesting)"));
        }
        let type_ = element
            .type_
            .ok_or_else(|| fmt_err!(Unsupported, "only flat schemas are supported (no nesting)"))?;

        let repetition = element
            .repetition_type
            .ok_or_else(|| fmt_err!(Format, "leaf {:?} lacks a repetition type", element.name))?;
        if Repetition::try_from(repetition)? != Repetition::Optional {
            return Err(fmt_err!(
                Unsupported,
                "column {:?} is not OPTIONAL; only OPTIONAL leaves are supported",
                element.name
            ));
        }

        columns.push(ColumnDescriptor {
            id,
            name: element.name.clone(),
            physical_type: physical_type_from_thrift(type_, element.type_length)?,
        });
    }

    let num_rows: u64 = metadata
        .num_rows
        .try_into()
        .map_err(|_| fmt_err!(Format, "negative row count {}", metadata.num_rows))?;

    Ok(FileMetadata {
        num_rows,
        row_groups: metadata.row_groups,
        columns,
    })
}
