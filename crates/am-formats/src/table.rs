//! Offset-derived table sizes and fixed-size record reads.

use std::io::{Read, Seek, SeekFrom};

use binrw::{BinRead, BinReaderExt};

use crate::FormatError;

/// Number of `record_size` records between two table offsets.
///
/// Offsets must be non-negative, `next` must not precede `this` and the span
/// must be a whole number of records. An empty span is a valid empty table.
pub fn derive_count(
    table: &'static str,
    this: i64,
    next: i64,
    record_size: usize,
) -> Result<usize, FormatError> {
    for offset in [this, next] {
        if offset < 0 {
            return Err(FormatError::NegativeOffset { table, offset });
        }
    }
    if next < this {
        return Err(FormatError::NonMonotonicOffsets { table, this, next });
    }
    let span = next - this;
    let size = record_size as i64;
    if size == 0 || span % size != 0 {
        return Err(FormatError::MisalignedTable {
            table,
            span,
            record_size,
        });
    }
    Ok((span / size) as usize)
}

/// Read `count` consecutive big-endian records starting at the current position.
pub(crate) fn read_records<T, R>(reader: &mut R, count: usize) -> Result<Vec<T>, FormatError>
where
    T: for<'a> BinRead<Args<'a> = ()>,
    R: Read + Seek,
{
    (0..count)
        .map(|_| reader.read_be::<T>().map_err(FormatError::from))
        .collect()
}

/// Read the table lying between `this` and `next`, both relative to `base`.
pub(crate) fn read_table<T, R>(
    reader: &mut R,
    base: u64,
    table: &'static str,
    this: i64,
    next: i64,
    record_size: usize,
) -> Result<Vec<T>, FormatError>
where
    T: for<'a> BinRead<Args<'a> = ()>,
    R: Read + Seek,
{
    let count = derive_count(table, this, next, record_size)?;
    log::debug!("{table}: {count} records at {this:#x}");
    reader.seek(SeekFrom::Start(base + this as u64))?;
    read_records(reader, count)
}
