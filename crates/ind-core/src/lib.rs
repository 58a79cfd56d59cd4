//! Unary inclusion-dependency (UIND) discovery and verification over
//! tabular datasets.
//!
//! The two entry points are [`discover`] (the Spider sweep, C4+C7) and
//! [`verifier::verify`] (the two-pass hash join, C8). Both consume
//! [`DatasetStream`] implementations supplied by a caller -- this crate has
//! no opinion on where rows come from; see the `ind-cli` crate for a
//! CSV/TSV-backed one.

pub mod attribute;
pub mod column_domain;
pub mod config;
pub mod dataset_stream;
pub mod domain_manager;
pub mod error;
pub mod ids;
pub mod ind;
pub mod miner;
pub mod partition;
pub mod verifier;

pub use config::{DiscoveryConfig, VerifierConfig};
pub use dataset_stream::{BlockData, BlockDatasetStream, DatasetStream};
pub use domain_manager::DomainManager;
pub use error::{ConfigError, IndError, Result};
pub use ids::{AttrId, ColumnId, PartitionId, TableId};
pub use ind::{ColumnCombination, Uind};
pub use verifier::{verify, VerificationResult};

/// Run the full discovery pipeline (C4 then C7) over `tables`, one
/// [`DatasetStream`] per input table, in the order attribute ids should be
/// assigned.
///
/// Validates `config` before touching any stream.
pub fn discover<S: DatasetStream>(tables: Vec<S>, config: &DiscoveryConfig) -> Result<Vec<Uind>> {
    config.validate()?;
    if tables.is_empty() {
        return Err(ConfigError::NoInputTables.into());
    }

    let mut manager = DomainManager::new(config)?;
    for (index, stream) in tables.into_iter().enumerate() {
        manager.ingest_table(TableId(index as u32), stream)?;
    }
    let domains = manager.into_domains();
    Ok(miner::mine(&domains)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecStream {
        rows: Vec<Vec<&'static str>>,
        pos: usize,
        num_columns: usize,
    }

    impl VecStream {
        fn new(num_columns: usize, rows: Vec<Vec<&'static str>>) -> Self {
            Self {
                rows,
                pos: 0,
                num_columns,
            }
        }
    }

    impl DatasetStream for VecStream {
        fn reset(&mut self) -> std::io::Result<()> {
            self.pos = 0;
            Ok(())
        }
        fn has_next_row(&mut self) -> std::io::Result<bool> {
            Ok(self.pos < self.rows.len())
        }
        fn get_next_row(&mut self) -> std::io::Result<Vec<Box<[u8]>>> {
            let row = self.rows[self.pos].iter().map(|c| c.as_bytes().into()).collect();
            self.pos += 1;
            Ok(row)
        }
        fn number_of_columns(&self) -> usize {
            self.num_columns
        }
    }

    #[test]
    fn discover_end_to_end_two_table_subset() {
        let a = VecStream::new(1, vec![vec!["1"], vec!["2"], vec!["3"]]);
        let b = VecStream::new(1, vec![vec!["1"], vec!["2"], vec!["3"], vec!["4"]]);
        let uinds = discover(vec![a, b], &DiscoveryConfig::default()).unwrap();
        assert_eq!(uinds.len(), 1);
        assert_eq!(uinds[0].dependent.table_id, TableId(0));
        assert_eq!(uinds[0].referenced.table_id, TableId(1));
    }

    #[test]
    fn discover_rejects_invalid_config_before_reading_any_stream() {
        let a = VecStream::new(1, vec![vec!["1"]]);
        let config = DiscoveryConfig {
            threads_num: 0,
            ..DiscoveryConfig::default()
        };
        let err = discover(vec![a], &config).unwrap_err();
        assert!(matches!(err, IndError::Config(ConfigError::ZeroThreads)));
    }

    #[test]
    fn discover_rejects_an_empty_table_list() {
        let err = discover(Vec::<VecStream>::new(), &DiscoveryConfig::default()).unwrap_err();
        assert!(matches!(err, IndError::Config(ConfigError::NoInputTables)));
    }
}
