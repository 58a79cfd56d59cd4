//! [`Attribute`] (C6): per-column sweep state -- a domain cursor plus the
//! two candidate sets that shrink monotonically as the sweep prunes them.

use std::collections::HashSet;
use std::io;

use crate::column_domain::ColumnDomainIterator;
use crate::ids::AttrId;

/// Processing state for one (table, column) attribute during the sweep.
///
/// `refs` is the set of attributes this one might still reference (i.e.
/// candidates `j` for which `domain(self) ⊆ domain(j)` might hold);
/// `deps` is the mirror set of attributes that might still reference this
/// one. Both start as "everyone but me" and only ever shrink.
pub struct Attribute {
    id: AttrId,
    domain: ColumnDomainIterator,
    refs: HashSet<AttrId>,
    deps: HashSet<AttrId>,
}

impl Attribute {
    pub fn new(id: AttrId, total_attr_count: usize, domain: ColumnDomainIterator) -> Self {
        let candidates: HashSet<AttrId> = (0..total_attr_count).filter(|&other| other != id).collect();
        Self {
            id,
            domain,
            refs: candidates.clone(),
            deps: candidates,
        }
    }

    pub fn id(&self) -> AttrId {
        self.id
    }

    pub fn refs(&self) -> &HashSet<AttrId> {
        &self.refs
    }

    pub fn deps(&self) -> &HashSet<AttrId> {
        &self.deps
    }

    /// The cursor's current value, or `None` if the domain is exhausted (or
    /// was empty to begin with).
    pub fn current_value(&self) -> Option<&[u8]> {
        self.domain.value()
    }

    pub fn advance(&mut self) -> io::Result<()> {
        self.domain.move_next()
    }

    /// True once the cursor is exhausted or both candidate sets are empty;
    /// such an attribute can never again affect, or be affected by, a
    /// pruning step and is dropped from the sweep's live queue.
    pub fn has_finished(&self) -> bool {
        self.domain.value().is_none() || (self.refs.is_empty() && self.deps.is_empty())
    }

    /// The pruning step: intersect this attribute's `refs` with `group`
    /// (the set of attributes currently sharing its cursor value), removing
    /// anything that falls out of `refs` from the corresponding peer's
    /// `deps` to maintain the mutual back-reference invariant.
    ///
    /// Takes the attribute's own id plus the full arena so it can reach
    /// the peers whose `deps` need updating; `attrs[id]` and `attrs[r]` are
    /// never borrowed simultaneously, only in sequence, so this needs no
    /// unsafe code despite mutating two elements of the same slice.
    pub fn intersect_refs(id: AttrId, group: &HashSet<AttrId>, attrs: &mut [Attribute]) {
        let stale: Vec<AttrId> = attrs[id].refs.iter().copied().filter(|r| !group.contains(r)).collect();
        for r in stale {
            attrs[id].refs.remove(&r);
            attrs[r].deps.remove(&id);
        }
    }
}
