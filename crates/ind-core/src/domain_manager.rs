//! [`DomainManager`] (C4): the memory governor. Ingests blocks, appends
//! values to per-column partitions, decides when to swap to disk, and
//! ultimately produces the vector of [`ColumnDomain`]s the sweep mines.

use std::io;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::column_domain::ColumnDomain;
use crate::config::DiscoveryConfig;
use crate::dataset_stream::{BlockData, BlockDatasetStream, DatasetStream};
use crate::ids::{ColumnId, TableId};
use crate::partition::{DomainPartition, MAX_BYTES_PER_CHAR};

/// Largest block capacity the governor will ever choose, regardless of how
/// generous `mem_limit_mb` is.
const MAX_BLOCK_CAPACITY: usize = 1 << 21;

fn block_capacity_for(mem_limit: f64) -> usize {
    let bound = (mem_limit / 32.0) as usize;
    if bound == 0 {
        return 1;
    }
    let mut cap = 1usize;
    while cap.saturating_mul(2) <= bound {
        cap *= 2;
    }
    cap.min(MAX_BLOCK_CAPACITY)
}

fn tail_mem_usage(columns: &[Vec<DomainPartition>]) -> f64 {
    columns
        .iter()
        .map(|partitions| partitions.last().map(DomainPartition::memory_usage).unwrap_or(0.0))
        .sum()
}

pub struct DomainManager {
    mem_limit: f64,
    block_capacity: usize,
    tmp_dir: PathBuf,
    pool: rayon::ThreadPool,
    domains: Vec<ColumnDomain>,
    swap_candidate: usize,
}

impl DomainManager {
    pub fn new(config: &DiscoveryConfig) -> io::Result<Self> {
        let mem_limit = (config.mem_limit_mb * (1 << 20)) as f64;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads_num)
            .build()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(Self {
            mem_limit,
            block_capacity: block_capacity_for(mem_limit),
            tmp_dir: config.tmp_dir.clone(),
            pool,
            domains: Vec::new(),
            swap_candidate: 0,
        })
    }

    pub fn block_capacity(&self) -> usize {
        self.block_capacity
    }

    pub fn domains(&self) -> &[ColumnDomain] {
        &self.domains
    }

    pub fn into_domains(self) -> Vec<ColumnDomain> {
        self.domains
    }

    fn finalized_mem_usage(&self) -> f64 {
        self.domains.iter().map(ColumnDomain::memory_usage).sum()
    }

    /// How many blocks to ingest before the next memory accounting pass.
    ///
    /// On the first pass since the last accounting (`processed_blocks == 0`)
    /// there is no per-block cost estimate yet, so fall back to the
    /// conservative bound derived from `MAX_BYTES_PER_CHAR`. Otherwise,
    /// extrapolate from the observed per-block cost so far.
    fn block_count(&self, mem_usage: f64, processed_blocks: u64) -> u64 {
        if processed_blocks == 0 {
            let estimate = self.mem_limit / (MAX_BYTES_PER_CHAR * self.block_capacity as f64);
            estimate.floor().max(1.0) as u64
        } else if mem_usage <= 0.0 {
            u64::MAX
        } else {
            let per_block = mem_usage / processed_blocks as f64;
            let remaining = self.mem_limit - mem_usage;
            if remaining <= 0.0 {
                0
            } else {
                (remaining / per_block).floor().max(0.0) as u64
            }
        }
    }

    /// SwapNext (§4.4): spill a not-yet-spilled finalized domain first, if
    /// any remain; only once all of those are spilled does the active
    /// ingest's tail partitions get perturbed.
    fn swap_next(
        &mut self,
        table_id: TableId,
        columns: &mut [Vec<DomainPartition>],
        processed_blocks: &mut u64,
    ) -> io::Result<()> {
        if self.swap_candidate < self.domains.len() {
            self.domains[self.swap_candidate].swap(&self.tmp_dir)?;
            self.swap_candidate += 1;
            return Ok(());
        }

        for (c, partitions) in columns.iter_mut().enumerate() {
            let tail = partitions.last_mut().expect("column always has a tail partition");
            if tail.try_swap(&self.tmp_dir)? {
                partitions.push(DomainPartition::new(table_id, ColumnId(c as u32), tail.partition_id().next()));
            }
        }
        // Forces the next accounting pass back to the conservative initial
        // block_count estimate rather than extrapolating from pre-spill cost.
        *processed_blocks = 0;
        Ok(())
    }

    fn ingest_block(&self, columns: &mut [Vec<DomainPartition>], block: BlockData) {
        self.pool.install(|| {
            columns
                .par_iter_mut()
                .zip(block.columns.into_par_iter())
                .for_each(|(partitions, cells)| {
                    let tail = partitions.last_mut().expect("column always has a tail partition");
                    for cell in cells {
                        tail.insert(&cell);
                    }
                });
        });
    }

    /// Ingest one table end to end, appending its finalized [`ColumnDomain`]s
    /// (one per column, in order) to this manager's running domain vector.
    pub fn ingest_table<S: DatasetStream>(&mut self, table_id: TableId, stream: S) -> io::Result<()> {
        let num_columns = stream.number_of_columns();
        let mut blocks = BlockDatasetStream::new(stream, self.block_capacity);
        let mut columns: Vec<Vec<DomainPartition>> = (0..num_columns)
            .map(|c| vec![DomainPartition::new(table_id, ColumnId(c as u32), crate::ids::PartitionId(0))])
            .collect();
        let mut processed_blocks: u64 = 0;

        'ingest: loop {
            let mut mem_usage = self.finalized_mem_usage() + tail_mem_usage(&columns);
            let mut count = self.block_count(mem_usage, processed_blocks);

            while count == 0 {
                self.swap_next(table_id, &mut columns, &mut processed_blocks)?;
                mem_usage = self.finalized_mem_usage() + tail_mem_usage(&columns);
                count = self.block_count(mem_usage, processed_blocks);
            }

            let mut consumed = 0u64;
            while consumed < count {
                match blocks.get_next_block()? {
                    Some(block) => {
                        self.ingest_block(&mut columns, block);
                        processed_blocks += 1;
                        consumed += 1;
                    }
                    None => break 'ingest,
                }
            }
        }

        for (c, partitions) in columns.into_iter().enumerate() {
            self.domains.push(ColumnDomain::new(table_id, ColumnId(c as u32), partitions));
        }
        Ok(())
    }
}
