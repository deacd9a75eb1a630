//! Caller-owned output buffers for one row group.

use crate::parquet_bridge::PhysicalType;

/// Cursor over row groups; advanced by each successful
/// [`crate::read::ParquetReader::scan`].
#[derive(Debug, Default)]
pub struct ScanState {
    pub(crate) row_group_idx: usize,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One scanned row group, column-major.
///
/// Allocated once via [`crate::read::ParquetReader::initialize_result`] and
/// reused across scans; each scan resizes every column to the row group at
/// hand.
pub struct ResultChunk {
    pub(crate) nrows: usize,
    pub(crate) columns: Vec<ResultColumn>,
}

impl ResultChunk {
    pub fn num_rows(&self) -> usize {
        self.nrows
    }

    pub fn columns(&self) -> &[ResultColumn] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> &ResultColumn {
        &self.columns[idx]
    }
}

/// Decoded values of one column over one row group.
///
/// `data` holds `num_rows` fixed-width slots (see
/// [`PhysicalType::slot_width`]); `defined` holds one byte per row, 1 for
/// present, 0 for null. Slots of null rows are unspecified. Variable-length
/// values live in `string_heap`, and their slots store `u64` heap indices.
pub struct ResultColumn {
    pub(crate) id: usize,
    pub(crate) physical_type: PhysicalType,
    pub(crate) data: Vec<u8>,
    pub(crate) defined: Vec<u8>,
    pub(crate) string_heap: Vec<Vec<u8>>,
}

impl ResultColumn {
    pub(crate) fn new(id: usize, physical_type: PhysicalType) -> Self {
        Self {
            id,
            physical_type,
            data: Vec::new(),
            defined: Vec::new(),
            string_heap: Vec::new(),
        }
    }

    /// Re-initializes the buffers for a row group of `num_rows` rows: slots
    /// sized, definition mask zeroed, heap emptied.
    pub(crate) fn reset(&mut self, num_rows: usize) {
        let slot = self.physical_type.slot_width();
        self.data.clear();
        self.data.resize(num_rows * slot, 0);
        self.defined.clear();
        self.defined.resize(num_rows, 0);
        self.string_heap.clear();
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    pub fn num_rows(&self) -> usize {
        self.defined.len()
    }

    /// Raw slot storage, `num_rows × slot_width` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Byte-per-row definition mask.
    pub fn defined(&self) -> &[u8] {
        &self.defined
    }

    /// Owned byte sequences referenced by `u64` slot values; dictionary
    /// entries first, then any plain-encoded values in page order.
    pub fn string_heap(&self) -> &[Vec<u8>] {
        &self.string_heap
    }

    pub fn is_defined(&self, row: usize) -> bool {
        self.defined[row] != 0
    }

    #[inline]
    fn slot(&self, row: usize) -> &[u8] {
        let width = self.physical_type.slot_width();
        &self.data[row * width..(row + 1) * width]
    }

    pub fn bool_at(&self, row: usize) -> bool {
        debug_assert_eq!(self.physical_type, PhysicalType::Boolean);
        self.slot(row)[0] != 0
    }

    pub fn i32_at(&self, row: usize) -> i32 {
        debug_assert_eq!(self.physical_type, PhysicalType::Int32);
        i32::from_le_bytes(self.slot(row).try_into().unwrap())
    }

    pub fn i64_at(&self, row: usize) -> i64 {
        debug_assert_eq!(self.physical_type, PhysicalType::Int64);
        i64::from_le_bytes(self.slot(row).try_into().unwrap())
    }

    pub fn f32_at(&self, row: usize) -> f32 {
        debug_assert_eq!(self.physical_type, PhysicalType::Float);
        f32::from_le_bytes(self.slot(row).try_into().unwrap())
    }

    pub fn f64_at(&self, row: usize) -> f64 {
        debug_assert_eq!(self.physical_type, PhysicalType::Double);
        f64::from_le_bytes(self.slot(row).try_into().unwrap())
    }

    /// The raw 12-byte legacy timestamp value.
    pub fn int96_at(&self, row: usize) -> [u8; 12] {
        debug_assert_eq!(self.physical_type, PhysicalType::Int96);
        self.slot(row).try_into().unwrap()
    }

    /// The heap index stored in a variable-length slot.
    pub fn heap_index_at(&self, row: usize) -> u64 {
        debug_assert_eq!(self.physical_type, PhysicalType::ByteArray);
        u64::from_le_bytes(self.slot(row).try_into().unwrap())
    }

    /// The bytes of a `BYTE_ARRAY` or `FIXED_LEN_BYTE_ARRAY` value.
    ///
    /// Must only be called for defined rows; the slot of a null row holds an
    /// unspecified heap index.
    pub fn bytes_at(&self, row: usize) -> &[u8] {
        match self.physical_type {
            PhysicalType::ByteArray => &self.string_heap[self.heap_index_at(row) as usize],
            PhysicalType::FixedLenByteArray(_) => self.slot(row),
            other => unreachable!("bytes_at on {:?} column", other),
        }
    }
}
