// Bridges structs from thrift-generated code to rust enums.

use parquet_format_safe::{
    CompressionCodec, Encoding as ParquetEncoding, FieldRepetitionType,
    PageType as ParquetPageType, Type as ParquetType,
};

use crate::error::{fmt_err, ParquetError};

/// The repetition of a parquet field.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum Repetition {
    Required,
    Optional,
    Repeated,
}

impl TryFrom<FieldRepetitionType> for Repetition {
    type Error = ParquetError;

    fn try_from(repetition: FieldRepetitionType) -> Result<Self, Self::Error> {
        Ok(match repetition {
            FieldRepetitionType::REQUIRED => Repetition::Required,
            FieldRepetitionType::OPTIONAL => Repetition::Optional,
            FieldRepetitionType::REPEATED => Repetition::Repeated,
            _ => return Err(fmt_err!(Format, "thrift repetition type out of range")),
        })
    }
}

/// Compression codecs this decoder can pass pages through.
///
/// Parquet defines more codecs; chunks using them are rejected at scan
/// time rather than silently mis-decoded.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum Compression {
    Uncompressed,
    Snappy,
}

impl TryFrom<CompressionCodec> for Compression {
    type Error = ParquetError;

    fn try_from(codec: CompressionCodec) -> Result<Self, Self::Error> {
        Ok(match codec {
            CompressionCodec::UNCOMPRESSED => Compression::Uncompressed,
            CompressionCodec::SNAPPY => Compression::Snappy,
            other => {
                return Err(fmt_err!(
                    Unsupported,
                    "compression codec {:?} not supported, use uncompressed or snappy",
                    other
                ))
            }
        })
    }
}

#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum PageType {
    DataPage,
    DataPageV2,
    DictionaryPage,
    IndexPage,
}

impl TryFrom<ParquetPageType> for PageType {
    type Error = ParquetError;

    fn try_from(type_: ParquetPageType) -> Result<Self, Self::Error> {
        Ok(match type_ {
            ParquetPageType::DATA_PAGE => PageType::DataPage,
            ParquetPageType::DATA_PAGE_V2 => PageType::DataPageV2,
            ParquetPageType::DICTIONARY_PAGE => PageType::DictionaryPage,
            ParquetPageType::INDEX_PAGE => PageType::IndexPage,
            _ => return Err(fmt_err!(Format, "thrift page type out of range")),
        })
    }
}

/// Value encodings defined by the format spec.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum Encoding {
    Plain,
    /// Deprecated dictionary encoding; equivalent to [`Encoding::Plain`] on
    /// dictionary pages and to [`Encoding::RleDictionary`] on data pages.
    PlainDictionary,
    Rle,
    BitPacked,
    DeltaBinaryPacked,
    DeltaLengthByteArray,
    DeltaByteArray,
    RleDictionary,
    ByteStreamSplit,
}

impl TryFrom<ParquetEncoding> for Encoding {
    type Error = ParquetError;

    fn try_from(encoding: ParquetEncoding) -> Result<Self, Self::Error> {
        Ok(match encoding {
            ParquetEncoding::PLAIN => Encoding::Plain,
            ParquetEncoding::PLAIN_DICTIONARY => Encoding::PlainDictionary,
            ParquetEncoding::RLE => Encoding::Rle,
            ParquetEncoding::BIT_PACKED => Encoding::BitPacked,
            ParquetEncoding::DELTA_BINARY_PACKED => Encoding::DeltaBinaryPacked,
            ParquetEncoding::DELTA_LENGTH_BYTE_ARRAY => Encoding::DeltaLengthByteArray,
            ParquetEncoding::DELTA_BYTE_ARRAY => Encoding::DeltaByteArray,
            ParquetEncoding::RLE_DICTIONARY => Encoding::RleDictionary,
            ParquetEncoding::BYTE_STREAM_SPLIT => Encoding::ByteStreamSplit,
            _ => return Err(fmt_err!(Format, "thrift encoding out of range")),
        })
    }
}

/// The physical type of a leaf column.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    /// Carries the schema's `type_length` in bytes.
    FixedLenByteArray(usize),
}

impl PhysicalType {
    /// Width in bytes of one slot in a result column's `data` buffer.
    ///
    /// Variable-length values are stored as `u64` indices into the string
    /// heap, hence 8 bytes for `ByteArray`.
    pub fn slot_width(&self) -> usize {
        match self {
            PhysicalType::Boolean => 1,
            PhysicalType::Int32 | PhysicalType::Float => 4,
            PhysicalType::Int64 | PhysicalType::Double => 8,
            PhysicalType::Int96 => 12,
            PhysicalType::ByteArray => 8,
            PhysicalType::FixedLenByteArray(length) => *length,
        }
    }
}

pub(crate) fn physical_type_from_thrift(
    type_: ParquetType,
    type_length: Option<i32>,
) -> Result<PhysicalType, ParquetError> {
    Ok(match type_ {
        ParquetType::BOOLEAN => PhysicalType::Boolean,
        ParquetType::INT32 => PhysicalType::Int32,
        ParquetType::INT64 => PhysicalType::Int64,
        ParquetType::INT96 => PhysicalType::Int96,
        ParquetType::FLOAT => PhysicalType::Float,
        ParquetType::DOUBLE => PhysicalType::Double,
        ParquetType::BYTE_ARRAY => PhysicalType::ByteArray,
        ParquetType::FIXED_LEN_BYTE_ARRAY => {
            let length = type_length
                .ok_or_else(|| fmt_err!(Format, "fixed-length byte array requires a type length"))?;
            let length: usize = length
                .try_into()
                .map_err(|_| fmt_err!(Format, "negative type length {}", length))?;
            PhysicalType::FixedLenByteArray(length)
        }
        _ => return Err(fmt_err!(Format, "thrift physical type out of range")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_rejection() {
        assert!(Compression::try_from(CompressionCodec::GZIP).is_err());
        assert!(Compression::try_from(CompressionCodec::ZSTD).is_err());
        assert_eq!(
            Compression::try_from(CompressionCodec::SNAPPY).unwrap(),
            Compression::Snappy
        );
    }

    #[test]
    fn test_fixed_len_requires_length() {
        assert!(physical_type_from_thrift(ParquetType::FIXED_LEN_BYTE_ARRAY, None).is_err());
        assert_eq!(
            physical_type_from_thrift(ParquetType::FIXED_LEN_BYTE_ARRAY, Some(16)).unwrap(),
            PhysicalType::FixedLenByteArray(16)
        );
    }

    #[test]
    fn test_slot_widths() {
        assert_eq!(PhysicalType::Boolean.slot_width(), 1);
        assert_eq!(PhysicalType::Int96.slot_width(), 12);
        assert_eq!(PhysicalType::ByteArray.slot_width(), 8);
        assert_eq!(PhysicalType::FixedLenByteArray(5).slot_width(), 5);
    }
}
