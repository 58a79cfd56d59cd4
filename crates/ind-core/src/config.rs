//! Engine configuration: validated once, up front, before any stream is
//! touched. A `Config*Error` never depends on I/O.

use std::path::PathBuf;

use crate::error::ConfigError;

/// The minimum allowed `mem_limit_mb`. Below this the block capacity and
/// swap thresholds degenerate (see [`crate::domain_manager`]).
const MIN_MEM_LIMIT_MB: u64 = 16;

/// Configuration for a discovery run ([`crate::domain_manager::DomainManager`]
/// plus [`crate::miner::mine`]).
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Soft memory budget for in-memory column domains, in megabytes.
    pub mem_limit_mb: u64,
    /// Size of the rayon thread pool used to ingest blocks in parallel.
    pub threads_num: usize,
    /// Directory spilled partitions are written under. Created on first use.
    pub tmp_dir: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            mem_limit_mb: 2048,
            threads_num: 1,
            tmp_dir: PathBuf::from("./tmp"),
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mem_limit_mb < MIN_MEM_LIMIT_MB {
            return Err(ConfigError::MemLimitTooSmall(self.mem_limit_mb));
        }
        if self.threads_num == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }
}

/// Configuration for a single IND verification (`lhs ⊆ rhs` over a pair of
/// tables). `lhs_indices[i]` and `rhs_indices[i]` name the i-th column of
/// the combination on each side; for a unary check both have length 1.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub lhs_columns: usize,
    pub rhs_columns: usize,
    pub lhs_indices: Vec<usize>,
    pub rhs_indices: Vec<usize>,
    /// Reserved for a future null-aware comparison mode. Accepted but
    /// currently has no effect: empty cells are compared as ordinary values,
    /// same as everywhere else in this crate.
    pub equal_nulls: bool,
}

impl VerifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lhs_indices.is_empty() || self.rhs_indices.is_empty() {
            return Err(ConfigError::EmptyIndices);
        }
        if self.lhs_indices.len() != self.rhs_indices.len() {
            return Err(ConfigError::MismatchedIndexWidth {
                lhs: self.lhs_indices.len(),
                rhs: self.rhs_indices.len(),
            });
        }
        for &index in &self.lhs_indices {
            if index >= self.lhs_columns {
                return Err(ConfigError::LhsIndexOutOfRange {
                    index,
                    columns: self.lhs_columns,
                });
            }
        }
        for &index in &self.rhs_indices {
            if index >= self.rhs_columns {
                return Err(ConfigError::RhsIndexOutOfRange {
                    index,
                    columns: self.rhs_columns,
                });
            }
        }
        Ok(())
    }
}
