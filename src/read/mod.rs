//! The file reader and its row-group scan loop.

mod decode;
mod page;
mod result;

pub use result::{ResultChunk, ResultColumn, ScanState};

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use log::debug;

use crate::compression;
use crate::error::{fmt_err, ParquetError, ParquetErrorExt, ParquetResult};
use crate::metadata::{read_metadata, ColumnDescriptor, FileMetadata};
use crate::parquet_bridge::Compression;
use crate::read::decode::ColumnScan;
use crate::read::page::{classify_page, ChunkPageReader, PageKind};

/// Trailing bytes added to chunk and decompressed-page buffers so the
/// 32-wide unpack kernels may batch past the last logical value.
const READ_PADDING: usize = 128;

/// A parquet file opened for scanning.
///
/// Scans are strictly sequential: each [`ParquetReader::scan`] call decodes
/// one row group, column by column in id order, into a caller-owned
/// [`ResultChunk`].
#[derive(Debug)]
pub struct ParquetReader {
    file: File,
    metadata: FileMetadata,
}

impl ParquetReader {
    /// Opens a file, validates its magic bytes and parses the footer.
    pub fn open(path: impl AsRef<Path>) -> ParquetResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let metadata = read_metadata(&mut file)?;
        debug!(
            "opened {}: {} columns, {} row groups, {} rows",
            path.display(),
            metadata.columns().len(),
            metadata.num_row_groups(),
            metadata.num_rows()
        );
        Ok(Self { file, metadata })
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        self.metadata.columns()
    }

    pub fn num_rows(&self) -> u64 {
        self.metadata.num_rows()
    }

    pub fn num_row_groups(&self) -> usize {
        self.metadata.num_row_groups()
    }

    /// Allocates a result chunk with one (empty) column slot per leaf.
    pub fn initialize_result(&self) -> ResultChunk {
        ResultChunk {
            nrows: 0,
            columns: self
                .metadata
                .columns()
                .iter()
                .map(|c| ResultColumn::new(c.id, c.physical_type))
                .collect(),
        }
    }

    /// Decodes the next row group into `chunk`.
    ///
    /// Returns `false` (leaving the chunk at zero rows) once every row group
    /// has been scanned. On error the reader's metadata stays valid, but
    /// `state` and `chunk` must be discarded.
    pub fn scan(&mut self, state: &mut ScanState, chunk: &mut ResultChunk) -> ParquetResult<bool> {
        if state.row_group_idx >= self.metadata.row_groups.len() {
            chunk.nrows = 0;
            return Ok(false);
        }
        let row_group_idx = state.row_group_idx;
        let num_rows: usize = self.metadata.row_groups[row_group_idx]
            .num_rows
            .try_into()
            .map_err(|_| fmt_err!(Format, "negative row group size"))?;
        debug!("scanning row group {} ({} rows)", row_group_idx, num_rows);

        chunk.nrows = num_rows;
        for col_idx in 0..chunk.columns.len() {
            let col = &mut chunk.columns[col_idx];
            col.reset(num_rows);
            self.scan_column(row_group_idx, num_rows, col)
                .with_context(|_| {
                    format!(
                        "decoding column {} of row group {}",
                        col_idx, row_group_idx
                    )
                })?;
        }

        state.row_group_idx += 1;
        Ok(true)
    }

    fn scan_column(
        &mut self,
        row_group_idx: usize,
        num_rows: usize,
        col: &mut ResultColumn,
    ) -> ParquetResult<()> {
        let row_group = &self.metadata.row_groups[row_group_idx];
        let chunk_meta = row_group
            .columns
            .get(col.id())
            .ok_or_else(|| fmt_err!(Format, "row group lacks a chunk for column {}", col.id()))?;
        if chunk_meta.file_path.is_some() {
            return Err(fmt_err!(
                Unsupported,
                "only inlined data files are supported (no references)"
            ));
        }
        let meta = chunk_meta
            .meta_data
            .as_ref()
            .ok_or_else(|| fmt_err!(Format, "column chunk carries no metadata"))?;
        if meta.path_in_schema.len() != 1 {
            return Err(fmt_err!(
                Unsupported,
                "only flat schemas are supported (no nesting)"
            ));
        }
        let codec: Compression = meta.codec.try_into()?;

        // The chunk begins at the dictionary page when one exists. Some
        // writers record a dictionary offset pointing into the leading
        // magic; offsets below 4 are treated as absent.
        let mut chunk_start = meta.data_page_offset;
        if let Some(dictionary_page_offset) = meta.dictionary_page_offset {
            if dictionary_page_offset >= 4 {
                chunk_start = dictionary_page_offset;
            }
        }
        let chunk_start: u64 = chunk_start
            .try_into()
            .map_err(|_| fmt_err!(Format, "negative chunk offset"))?;
        let chunk_len: usize = meta
            .total_compressed_size
            .try_into()
            .map_err(|_| fmt_err!(Format, "negative chunk size"))?;

        // Whole chunk in memory, over-allocated for the unpack kernels.
        let mut chunk_buf = vec![0u8; chunk_len + READ_PADDING];
        self.file.seek(SeekFrom::Start(chunk_start))?;
        self.file
            .read_exact(&mut chunk_buf[..chunk_len])
            .map_err(ParquetError::from)
            .context("could not read column chunk")?;

        let mut scan = ColumnScan::new(col.physical_type());
        let mut decompress_buf: Vec<u8> = Vec::new();

        for maybe_page in ChunkPageReader::new(&chunk_buf[..chunk_len]) {
            let page = maybe_page?;
            let kind = match classify_page(&page.header)? {
                Some(kind) => kind,
                // index pages and unknown page-type extensions
                None => continue,
            };

            let payload: &[u8] = match codec {
                Compression::Uncompressed => page.buffer,
                Compression::Snappy => {
                    let uncompressed_len: usize = page
                        .header
                        .uncompressed_page_size
                        .try_into()
                        .map_err(|_| fmt_err!(Corrupt, "negative uncompressed page size"))?;
                    decompress_buf.clear();
                    decompress_buf.resize(uncompressed_len + READ_PADDING, 0);
                    compression::decompress(
                        codec,
                        page.buffer,
                        &mut decompress_buf[..uncompressed_len],
                    )?;
                    &decompress_buf[..uncompressed_len]
                }
            };

            match kind {
                PageKind::Dictionary {
                    num_values,
                    encoding,
                } => scan.scan_dict_page(num_values, encoding, payload, col)?,
                PageKind::DataV1 {
                    num_values,
                    def_encoding,
                    encoding,
                } => scan.scan_data_page(num_values, def_encoding, encoding, payload, col)?,
            }
        }

        if scan.rows_seen() != num_rows {
            return Err(fmt_err!(
                Corrupt,
                "column chunk holds {} values, row group declares {}",
                scan.rows_seen(),
                num_rows
            ));
        }
        Ok(())
    }
}
