//! [`mine`] (C7, "Spider"): the global sort-merge sweep across all
//! attributes, producing the complete unary IND set in one pass.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::io;

use log::debug;

use crate::attribute::Attribute;
use crate::column_domain::ColumnDomain;
use crate::ids::AttrId;
use crate::ind::{ColumnCombination, Uind};

/// A heap entry: a value snapshot plus the attribute id it was read from.
/// The sweep pops an attribute, mutates it, and may re-push it -- storing
/// a snapshot rather than a live reference sidesteps holding a mutable
/// borrow of `attrs` inside the heap, and lets the total order (value,
/// then id ascending) live on a plain, `Ord`-derived type.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct HeapKey {
    value: Box<[u8]>,
    id: AttrId,
}

/// Run the full sweep over `domains` and return every discovered unary
/// IND, excluding reflexive pairs. `domains[i]` must be the domain that
/// produced attribute `i` (i.e. attribute ids are domains' indices).
pub fn mine(domains: &[ColumnDomain]) -> io::Result<Vec<Uind>> {
    let total = domains.len();
    let mut attrs: Vec<Attribute> = Vec::with_capacity(total);
    for (id, domain) in domains.iter().enumerate() {
        attrs.push(Attribute::new(id, total, domain.iter()?));
    }

    let mut heap: BinaryHeap<Reverse<HeapKey>> = BinaryHeap::with_capacity(total);
    for attr in &attrs {
        if let Some(value) = attr.current_value() {
            heap.push(Reverse(HeapKey {
                value: Box::from(value),
                id: attr.id(),
            }));
        }
    }

    while let Some(Reverse(top)) = heap.pop() {
        let value = top.value;
        let mut group = vec![top.id];
        while let Some(Reverse(next)) = heap.peek() {
            if next.value != value {
                break;
            }
            group.push(next.id);
            heap.pop();
        }
        debug!("sweep: {} attribute(s) at value of length {}", group.len(), value.len());

        let group_set: HashSet<AttrId> = group.iter().copied().collect();
        for &id in &group {
            Attribute::intersect_refs(id, &group_set, &mut attrs);
        }

        for &id in &group {
            let attr = &mut attrs[id];
            if attr.has_finished() {
                continue;
            }
            attr.advance()?;
            if let Some(value) = attr.current_value() {
                heap.push(Reverse(HeapKey {
                    value: Box::from(value),
                    id,
                }));
            }
        }
    }

    let mut uinds = Vec::new();
    for attr in &attrs {
        let dependent_domain = &domains[attr.id()];
        for &referenced in attr.refs() {
            let referenced_domain = &domains[referenced];
            uinds.push(Uind {
                dependent: ColumnCombination::unary(dependent_domain.table_id(), dependent_domain.column_id()),
                referenced: ColumnCombination::unary(referenced_domain.table_id(), referenced_domain.column_id()),
            });
        }
    }
    Ok(uinds)
}
