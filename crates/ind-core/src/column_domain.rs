//! [`ColumnDomain`] (C2): an ordered list of partitions for one (table,
//! column), and [`ColumnDomainIterator`] (C5): the merge-iterator over it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io;
use std::path::Path;

use crate::ids::{ColumnId, TableId};
use crate::partition::{DomainPartition, PartitionReader};

/// The full domain of one (table, column): the union of its partitions'
/// value sets, in partition order. Partitions may overlap in membership
/// (the same value can appear in more than one partition); the merge
/// iterator collapses duplicates, not this type.
pub struct ColumnDomain {
    table_id: TableId,
    column_id: ColumnId,
    partitions: Vec<DomainPartition>,
}

impl ColumnDomain {
    /// Construct from a non-empty partition list, in partition-id order.
    pub fn new(table_id: TableId, column_id: ColumnId, partitions: Vec<DomainPartition>) -> Self {
        debug_assert!(!partitions.is_empty(), "ColumnDomain requires a non-empty partition list");
        Self {
            table_id,
            column_id,
            partitions,
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn column_id(&self) -> ColumnId {
        self.column_id
    }

    /// Spill every still memory-resident partition. Idempotent.
    pub fn swap(&mut self, tmp_dir: &Path) -> io::Result<()> {
        for partition in &mut self.partitions {
            partition.try_swap(tmp_dir)?;
        }
        Ok(())
    }

    /// Sum of the memory estimate of all partitions (zero for spilled ones).
    pub fn memory_usage(&self) -> f64 {
        self.partitions.iter().map(DomainPartition::memory_usage).sum()
    }

    pub fn iter(&self) -> io::Result<ColumnDomainIterator> {
        ColumnDomainIterator::new(&self.partitions)
    }
}

/// A heap entry: the reader's current value plus its slot index, so ties
/// are broken deterministically and the heap need not store the reader by
/// reference.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    value: Box<[u8]>,
    slot: usize,
}

/// Merge-iterator unifying the partition readers of one [`ColumnDomain`]
/// into a single globally sorted stream of values. Does **not**
/// de-duplicate across partitions; a value present in two partitions is
/// yielded twice. Consumers requiring strict ascending-without-duplicates
/// (the sweep, `§4.7`) must coalesce equal successive values themselves.
pub struct ColumnDomainIterator {
    readers: Vec<PartitionReader>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl ColumnDomainIterator {
    fn new(partitions: &[DomainPartition]) -> io::Result<Self> {
        let mut readers = Vec::with_capacity(partitions.len());
        for partition in partitions {
            readers.push(partition.reader()?);
        }

        let mut heap = BinaryHeap::with_capacity(readers.len());
        for (slot, reader) in readers.iter().enumerate() {
            if let Some(value) = reader.value() {
                heap.push(Reverse(HeapEntry {
                    value: Box::from(value),
                    slot,
                }));
            }
        }

        Ok(Self { readers, heap })
    }

    /// The smallest value not yet consumed, or `None` once exhausted.
    pub fn value(&self) -> Option<&[u8]> {
        self.heap.peek().map(|Reverse(entry)| &*entry.value)
    }

    pub fn has_next(&self) -> bool {
        !self.heap.is_empty()
    }

    /// Pop the current minimum, advance its reader, and if it still has a
    /// value, push it back onto the heap.
    pub fn move_next(&mut self) -> io::Result<()> {
        let Some(Reverse(HeapEntry { slot, .. })) = self.heap.pop() else {
            return Ok(());
        };
        let reader = &mut self.readers[slot];
        reader.move_next()?;
        if let Some(value) = reader.value() {
            self.heap.push(Reverse(HeapEntry {
                value: Box::from(value),
                slot,
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::PartitionId;

    fn domain_from(values: Vec<Vec<&str>>) -> ColumnDomain {
        let table_id = TableId(0);
        let column_id = ColumnId(0);
        let partitions = values
            .into_iter()
            .enumerate()
            .map(|(i, vs)| {
                let mut part = DomainPartition::new(table_id, column_id, PartitionId(i as u64));
                for v in vs {
                    part.insert(v.as_bytes());
                }
                part
            })
            .collect();
        ColumnDomain::new(table_id, column_id, partitions)
    }

    fn collect(mut iter: ColumnDomainIterator) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(v) = iter.value() {
            out.push(v.to_vec());
            iter.move_next().unwrap();
        }
        out
    }

    #[test]
    fn merges_single_partition_in_order() {
        let domain = domain_from(vec![vec!["c", "a", "b"]]);
        assert_eq!(collect(domain.iter().unwrap()), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn merges_across_partitions_without_deduplicating() {
        let domain = domain_from(vec![vec!["b", "d"], vec!["a", "b", "c"]]);
        // "b" appears once per partition and both are yielded.
        assert_eq!(
            collect(domain.iter().unwrap()),
            vec![
                b"a".to_vec(),
                b"b".to_vec(),
                b"b".to_vec(),
                b"c".to_vec(),
                b"d".to_vec()
            ]
        );
    }

    #[test]
    fn empty_domain_has_no_values() {
        let domain = domain_from(vec![vec![]]);
        assert!(collect(domain.iter().unwrap()).is_empty());
    }
}
