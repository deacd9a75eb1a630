//! Read-only columnar decoder for flat-schema parquet files.
//!
//! The reader walks a file one row group at a time and materializes each
//! column into caller-owned buffers with an explicit per-row definition
//! mask:
//!
//! ```no_run
//! use parquet_scan::{ParquetReader, ScanState};
//!
//! # fn main() -> parquet_scan::ParquetResult<()> {
//! let mut reader = ParquetReader::open("example.parquet")?;
//! let mut chunk = reader.initialize_result();
//! let mut state = ScanState::new();
//! while reader.scan(&mut state, &mut chunk)? {
//!     let col = chunk.column(0);
//!     for row in 0..chunk.num_rows() {
//!         if col.is_defined(row) {
//!             println!("{}", col.i64_at(row));
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Schemas must be flat: every leaf hangs off the root and is OPTIONAL.
//! Supported page encodings are PLAIN and RLE_DICTIONARY (with its
//! deprecated PLAIN_DICTIONARY spelling); pages may be uncompressed or
//! Snappy-compressed. Writing files, nested schemas, v2 data pages and
//! encrypted files are out of scope.

pub mod compression;
pub mod encoding;
pub mod error;
pub mod metadata;
pub mod parquet_bridge;
pub mod read;

pub use error::{ParquetError, ParquetResult};
pub use metadata::{ColumnDescriptor, FileMetadata};
pub use parquet_bridge::PhysicalType;
pub use read::{ParquetReader, ResultChunk, ResultColumn, ScanState};
