//! [`DomainPartition`] (C1): a sorted, de-duplicated set of non-empty
//! values for one column, optionally spilled to disk.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::error;

/// Splits a buffered reader into `\n`-delimited byte chunks, the way
/// [`std::io::BufRead::lines`] does for `String`, but without assuming
/// UTF-8 validity -- swap files hold arbitrary value bytes.
fn read_byte_line(reader: &mut BufReader<fs::File>) -> io::Result<Option<Box<[u8]>>> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(Some(buf.into_boxed_slice()))
}

use crate::ids::{ColumnId, PartitionId, TableId};

/// Per-element bookkeeping overhead charged by [`DomainPartition::memory_usage`]
/// for each value held in the in-memory sorted set, on top of the value's own
/// byte length. This is a calibration constant for a `BTreeSet<Box<[u8]>>`
/// representation (node pointers, length prefix, allocator bookkeeping) --
/// not a measured size. It must be combined with the `5.0` container-overhead
/// multiplier below, the way the governor expects.
const NODE_OVERHEAD_BYTES: f64 = 48.0;

/// Experimentally-derived container-overhead factor applied on top of the
/// raw byte estimate. Preserve this value: the memory governor's swap
/// decisions were tuned against it.
const MEMORY_ESTIMATE_MULTIPLIER: f64 = 5.0;

/// Upper bound on bytes-in-container per input character, used by the
/// memory governor (not by `memory_usage` itself) to size ingest blocks.
pub const MAX_BYTES_PER_CHAR: f64 = 16.0;

enum Storage {
    Memory(BTreeSet<Box<[u8]>>),
    Swapped { path: PathBuf },
}

/// A sorted, de-duplicated set of non-empty values for one (table, column),
/// either held in memory or spilled to a single file under a temp
/// directory. Once spilled, a partition is immutable.
pub struct DomainPartition {
    table_id: TableId,
    column_id: ColumnId,
    partition_id: PartitionId,
    storage: Storage,
}

impl DomainPartition {
    pub fn new(table_id: TableId, column_id: ColumnId, partition_id: PartitionId) -> Self {
        Self {
            table_id,
            column_id,
            partition_id,
            storage: Storage::Memory(BTreeSet::new()),
        }
    }

    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    pub fn is_swapped(&self) -> bool {
        matches!(self.storage, Storage::Swapped { .. })
    }

    pub fn is_empty(&self) -> bool {
        match &self.storage {
            Storage::Memory(set) => set.is_empty(),
            // A swapped partition is never empty: try_swap refuses to spill
            // an empty one.
            Storage::Swapped { .. } => false,
        }
    }

    /// Insert `v` into the domain. A no-op for empty values (nulls are not
    /// part of the domain).
    ///
    /// The swap file format (`\n`-separated, one value per line) means a
    /// value containing a raw `\n` byte will not round-trip through a
    /// spill: ordinary delimited-text cells don't contain one, so this is
    /// not guarded against here.
    pub fn insert(&mut self, v: &[u8]) {
        if v.is_empty() {
            return;
        }
        match &mut self.storage {
            Storage::Memory(set) => {
                if !set.contains(v) {
                    set.insert(Box::from(v));
                }
            }
            Storage::Swapped { .. } => {
                unreachable!("insert on a swapped DomainPartition");
            }
        }
    }

    fn swap_path(&self, tmp_dir: &Path) -> PathBuf {
        tmp_dir.join(format!(
            "{}.{}.{}",
            self.table_id.0, self.column_id.0, self.partition_id.0
        ))
    }

    /// Spill this partition's values to `{tmp_dir}/{table}.{column}.{partition}`,
    /// one value per line, sorted ascending, no trailing newline. No-op
    /// (returns `false`) if already swapped or empty.
    pub fn try_swap(&mut self, tmp_dir: &Path) -> io::Result<bool> {
        let set = match &self.storage {
            Storage::Memory(set) if !set.is_empty() => set,
            _ => return Ok(false),
        };

        fs::create_dir_all(tmp_dir).inspect_err(|e| {
            error!("unable to create swap directory {}: {e}", tmp_dir.display());
        })?;
        let path = self.swap_path(tmp_dir);
        let write_result = (|| -> io::Result<()> {
            let file = fs::File::create(&path)?;
            let mut out = io::BufWriter::new(file);
            let mut first = true;
            for value in set {
                if !first {
                    out.write_all(b"\n")?;
                }
                first = false;
                out.write_all(value)?;
            }
            out.flush()
        })();
        write_result.inspect_err(|e| {
            error!(
                "failed to spill partition {}.{}.{} to {}: {e}",
                self.table_id, self.column_id, self.partition_id, path.display()
            );
        })?;

        self.storage = Storage::Swapped { path };
        Ok(true)
    }

    /// Estimated in-memory footprint in bytes. Always `0` once swapped.
    pub fn memory_usage(&self) -> f64 {
        match &self.storage {
            Storage::Memory(set) => {
                let count = set.len() as f64;
                let capacities: f64 = set.iter().map(|v| v.len() as f64).sum();
                (NODE_OVERHEAD_BYTES * count + capacities) * MEMORY_ESTIMATE_MULTIPLIER
            }
            Storage::Swapped { .. } => 0.0,
        }
    }

    /// Open a forward reader over this partition's values in ascending
    /// order. Safe to call repeatedly and concurrently with other readers.
    pub fn reader(&self) -> io::Result<PartitionReader> {
        match &self.storage {
            Storage::Memory(set) => Ok(PartitionReader::from_memory(set)),
            Storage::Swapped { path } => PartitionReader::from_file(path),
        }
    }
}

impl Drop for DomainPartition {
    fn drop(&mut self) {
        if let Storage::Swapped { path } = &self.storage {
            let _ = fs::remove_file(path);
        }
    }
}

/// A forward, single-pass reader over one partition's sorted values.
pub enum PartitionReader {
    Memory {
        values: Vec<Box<[u8]>>,
        pos: usize,
    },
    File {
        reader: BufReader<fs::File>,
        current: Option<Box<[u8]>>,
    },
}

impl PartitionReader {
    fn from_memory(set: &BTreeSet<Box<[u8]>>) -> Self {
        Self::Memory {
            values: set.iter().cloned().collect(),
            pos: 0,
        }
    }

    fn from_file(path: &Path) -> io::Result<Self> {
        let file = fs::File::open(path)?;
        let mut reader = PartitionReader::File {
            reader: BufReader::new(file),
            current: None,
        };
        reader.move_next()?;
        Ok(reader)
    }

    pub fn value(&self) -> Option<&[u8]> {
        match self {
            PartitionReader::Memory { values, pos } => values.get(*pos).map(|v| &**v),
            PartitionReader::File { current, .. } => current.as_deref(),
        }
    }

    pub fn has_next(&self) -> bool {
        self.value().is_some()
    }

    /// Advance to the next value. Returns `Ok(true)` as long as a value was
    /// already loaded before advancing, i.e. mirrors `try_move`'s success
    /// flag.
    pub fn move_next(&mut self) -> io::Result<bool> {
        match self {
            PartitionReader::Memory { values, pos } => {
                let had = *pos < values.len();
                if had {
                    *pos += 1;
                }
                Ok(had)
            }
            PartitionReader::File { reader, current } => {
                let had = current.is_some();
                *current = read_byte_line(reader)?;
                Ok(had)
            }
        }
    }

    /// Advance only if there is a next value; returns whether it advanced.
    pub fn try_move(&mut self) -> io::Result<bool> {
        if self.has_next() {
            self.move_next()?;
            Ok(self.has_next())
        } else {
            Ok(false)
        }
    }
}
