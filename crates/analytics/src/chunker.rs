//! Partitioning strategies for the map stage.

use crate::dataset::{Partition, PartitionKey};
use salespulse_config::MonthOrder;
use salespulse_core::DatasetError;

/// Split a partition into `pieces` contiguous, near-equal chunks.
///
/// Sizes differ by at most one; the first `len % pieces` chunks carry the
/// extra record. Chunks may be empty when `pieces` exceeds the record count.
/// Zero pieces yields no chunks.
pub fn split_even<'a>(partition: &Partition<'a>, pieces: usize) -> Vec<Partition<'a>> {
    if pieces == 0 {
        return Vec::new();
    }
    let base = partition.len() / pieces;
    let extra = partition.len() % pieces;

    let mut start = 0;
    (0..pieces)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let chunk = partition.slice(PartitionKey::Chunk(i), start, size);
            start += size;
            chunk
        })
        .collect()
}

/// Split a partition into calendar-month buckets in the requested order.
pub fn split_by_month<'a>(
    partition: &Partition<'a>,
    order: MonthOrder,
) -> Result<Vec<Partition<'a>>, DatasetError> {
    let mut months = partition.group_by_month()?;
    if order == MonthOrder::Chronological {
        months.sort_by_key(|m| match m.key() {
            PartitionKey::Month { year, month } => (year, month),
            _ => (i32::MAX, u32::MAX),
        });
    }
    Ok(months)
}
