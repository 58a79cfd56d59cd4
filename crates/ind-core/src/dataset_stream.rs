//! The row-stream abstraction the engine consumes, and the block adapter
//! built on top of it.

use std::io;

use log::warn;

/// A source of rows the engine reads once (discovery) or twice (verifier,
/// for the RHS projection then the LHS projection).
///
/// This is an external collaborator: CSV/TSV parsing, network sources, or
/// anything else that can produce rows of raw cell bytes implements this.
/// Cells are raw bytes, not `String` -- the engine compares values as byte
/// strings and never assumes UTF-8 validity.
pub trait DatasetStream: Send {
    /// Rewind to the first row. Must be callable at any point, including
    /// mid-stream.
    fn reset(&mut self) -> io::Result<()>;

    /// Whether another row is available without consuming it.
    fn has_next_row(&mut self) -> io::Result<bool>;

    /// Consume and return the next row. Must not be called unless
    /// `has_next_row` last returned `true`.
    fn get_next_row(&mut self) -> io::Result<Vec<Box<[u8]>>>;

    /// The declared column count for this table. Rows of a different width
    /// are a shape error (see [`BlockDatasetStream`]).
    fn number_of_columns(&self) -> usize;
}

/// Column-major storage for one block of rows: `columns[c]` holds the cell
/// at column `c` for every row admitted into this block, in row order.
#[derive(Debug, Default, Clone)]
pub struct BlockData {
    pub columns: Vec<Vec<Box<[u8]>>>,
}

impl BlockData {
    fn with_columns(n: usize) -> Self {
        Self {
            columns: vec![Vec::new(); n],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }
}

fn row_byte_len(row: &[Box<[u8]>]) -> usize {
    row.iter().map(|cell| cell.len()).sum()
}

/// Adapts a [`DatasetStream`] into a sequence of byte-bounded row blocks.
///
/// Amortizes the per-row overhead of the memory governor in
/// [`crate::domain_manager::DomainManager`]: instead of accounting after
/// every single row, it accounts once per block.
pub struct BlockDatasetStream<S> {
    stream: S,
    capacity: usize,
    num_columns: usize,
    /// A row that was fetched but did not fit in the block under
    /// construction; the upstream stream has no "unread" operation, so we
    /// buffer it here for the next call to `get_next_block`.
    pending_row: Option<Vec<Box<[u8]>>>,
}

impl<S: DatasetStream> BlockDatasetStream<S> {
    pub fn new(stream: S, capacity: usize) -> Self {
        let num_columns = stream.number_of_columns();
        Self {
            stream,
            capacity,
            num_columns,
            pending_row: None,
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Fetch the next well-shaped row from the upstream stream, skipping
    /// (and logging) any row whose width doesn't match `num_columns`.
    fn next_row(&mut self) -> io::Result<Option<Vec<Box<[u8]>>>> {
        loop {
            if !self.stream.has_next_row()? {
                return Ok(None);
            }
            let row = self.stream.get_next_row()?;
            if row.len() != self.num_columns {
                warn!(
                    "skipping row with {} cells, expected {}",
                    row.len(),
                    self.num_columns
                );
                continue;
            }
            return Ok(Some(row));
        }
    }

    /// Return the next block, or `None` once the stream is drained.
    ///
    /// Stop rule: a row is appended unconditionally if the block under
    /// construction is still empty (guarantees forward progress even when a
    /// single row's byte size exceeds `capacity`); otherwise a row is only
    /// appended if doing so would not exceed `capacity`.
    pub fn get_next_block(&mut self) -> io::Result<Option<BlockData>> {
        let mut block = BlockData::with_columns(self.num_columns);
        let mut block_bytes = 0usize;

        loop {
            let row = match self.pending_row.take() {
                Some(row) => row,
                None => match self.next_row()? {
                    Some(row) => row,
                    None => break,
                },
            };

            let row_bytes = row_byte_len(&row);
            if !block.is_empty() && block_bytes + row_bytes > self.capacity {
                self.pending_row = Some(row);
                break;
            }

            for (col, cell) in row.into_iter().enumerate() {
                block.columns[col].push(cell);
            }
            block_bytes += row_bytes;
        }

        if block.is_empty() {
            Ok(None)
        } else {
            Ok(Some(block))
        }
    }
}
