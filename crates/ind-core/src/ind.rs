//! Output types shared by the miner (C7) and the verifier (C8).

use crate::ids::{ColumnId, TableId};

/// A set of columns on one table. The discovery engine only ever produces
/// single-column combinations (unary INDs); the type carries a `Vec` rather
/// than a single `ColumnId` so it composes with a future n-ary extension
/// without a breaking change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnCombination {
    pub table_id: TableId,
    pub columns: Vec<ColumnId>,
}

impl ColumnCombination {
    pub fn unary(table_id: TableId, column_id: ColumnId) -> Self {
        Self {
            table_id,
            columns: vec![column_id],
        }
    }
}

/// A discovered unary inclusion dependency: `dependent ⊆ referenced`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uind {
    pub dependent: ColumnCombination,
    pub referenced: ColumnCombination,
}
