//! [`INDVerifier`] (C8): a two-pass hash join checking whether a candidate
//! IND actually holds over concrete data, and quantifying the violation
//! when it doesn't.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::config::VerifierConfig;
use crate::dataset_stream::DatasetStream;
use crate::error::IndError;

/// Outcome of one verification run. `equal_nulls` is not modeled here (see
/// [`VerifierConfig`]); empty cells participate in projections like any
/// other byte string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub holds: bool,
    pub error: f64,
    pub violating_rows: usize,
    pub violating_unique_rows: usize,
    pub violating_clusters: Vec<Vec<usize>>,
}

fn project(row: &[Box<[u8]>], indices: &[usize]) -> Vec<u8> {
    // Each cell is prefixed with its own byte length so that e.g.
    // `("a", "bc")` and `("ab", "c")` never collide once concatenated --
    // a plain delimiter byte wouldn't do, since cells are arbitrary bytes
    // and may themselves contain it.
    let mut key = Vec::new();
    for &index in indices {
        let cell = &row[index];
        key.extend_from_slice(&(cell.len() as u64).to_le_bytes());
        key.extend_from_slice(cell);
    }
    key
}

/// Check `lhs ⊆ rhs` (projected onto `config.lhs_indices` / `rhs_indices`
/// respectively) via a two-pass hash join: RHS projections populate a set
/// first, then LHS rows are streamed once and classified against it.
///
/// `lhs` and `rhs` may be the same table streamed twice; `lhs` is reset to
/// its beginning before its pass regardless, so it is safe to pass either
/// two independent streams or the same stream object for both.
pub fn verify<L, R>(lhs: &mut L, rhs: &mut R, config: &VerifierConfig) -> Result<VerificationResult, IndError>
where
    L: DatasetStream,
    R: DatasetStream,
{
    config.validate()?;

    let mut referenced: HashSet<Vec<u8>> = HashSet::new();
    rhs.reset()?;
    while rhs.has_next_row()? {
        let row = rhs.get_next_row()?;
        if row.len() != config.rhs_columns {
            warn!(
                "skipping rhs row with {} cells, expected {}",
                row.len(),
                config.rhs_columns
            );
            continue;
        }
        referenced.insert(project(&row, &config.rhs_indices));
    }

    lhs.reset()?;
    let mut distinct_lhs: HashSet<Vec<u8>> = HashSet::new();
    let mut cluster_of: HashMap<Vec<u8>, usize> = HashMap::new();
    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut violating_rows = 0usize;
    let mut current_row_id = 0usize;

    while lhs.has_next_row()? {
        let row = lhs.get_next_row()?;
        if row.len() != config.lhs_columns {
            warn!(
                "skipping lhs row with {} cells, expected {}",
                row.len(),
                config.lhs_columns
            );
            continue;
        }
        let key = project(&row, &config.lhs_indices);
        distinct_lhs.insert(key.clone());

        if !referenced.contains(&key) {
            let cluster_id = *cluster_of.entry(key).or_insert_with(|| {
                clusters.push(Vec::new());
                clusters.len() - 1
            });
            clusters[cluster_id].push(current_row_id);
            violating_rows += 1;
        }
        current_row_id += 1;
    }

    let violating_unique_rows = clusters.len();
    let denominator = distinct_lhs.len();
    let error = if denominator == 0 {
        0.0
    } else {
        violating_unique_rows as f64 / denominator as f64
    };

    Ok(VerificationResult {
        holds: error == 0.0,
        error,
        violating_rows,
        violating_unique_rows,
        violating_clusters: clusters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    use pretty_assertions::assert_eq;

    use crate::error::ConfigError;

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
        fn reset(&mut self) -> io::Result<()> {
            self.pos = 0;
            Ok(())
        }
        fn has_next_row(&mut self) -> io::Result<bool> {
            Ok(self.pos < self.rows.len())
        }
        fn get_next_row(&mut self) -> io::Result<Vec<Box<[u8]>>> {
            let row = self.rows[self.pos].iter().map(|c| c.as_bytes().into()).collect();
            self.pos += 1;
            Ok(row)
        }
        fn number_of_columns(&self) -> usize {
            self.num_columns
        }
    }

    fn config(lhs_columns: usize, rhs_columns: usize, lhs: Vec<usize>, rhs: Vec<usize>) -> VerifierConfig {
        VerifierConfig {
            lhs_columns,
            rhs_columns,
            lhs_indices: lhs,
            rhs_indices: rhs,
            equal_nulls: false,
        }
    }

    #[test]
    fn ind_that_fully_holds_has_zero_error() {
        let mut lhs = VecStream::new(1, vec![vec!["1"], vec!["2"], vec!["1"]]);
        let mut rhs = VecStream::new(1, vec![vec!["1"], vec!["2"], vec!["3"]]);
        let result = verify(&mut lhs, &mut rhs, &config(1, 1, vec![0], vec![0])).unwrap();
        assert_eq!(
            result,
            VerificationResult {
                holds: true,
                error: 0.0,
                violating_rows: 0,
                violating_unique_rows: 0,
                violating_clusters: vec![],
            }
        );
    }

    #[test]
    fn spec_example_five_rows_three_clusters() {
        // {col0} -> {col1}; rows: a/x, b/y, a/z, c/?, b/!
        let rows = vec![
            vec!["a", "x"],
            vec!["b", "y"],
            vec!["a", "z"],
            vec!["c", "?"],
            vec!["b", "!"],
        ];
        let mut lhs = VecStream::new(2, rows.clone());
        let mut rhs = VecStream::new(2, rows);
        let result = verify(&mut lhs, &mut rhs, &config(2, 2, vec![0], vec![1])).unwrap();

        assert_eq!(result.violating_rows, 5);
        assert_eq!(result.violating_unique_rows, 3);
        assert_eq!(result.error, 1.0);
        assert!(!result.holds);

        let mut sizes: Vec<usize> = result.violating_clusters.iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 2, 2]);
        let total: usize = result.violating_clusters.iter().map(Vec::len).sum();
        assert_eq!(total, result.violating_rows);
    }

    #[test]
    fn same_table_as_both_sides_holds_trivially() {
        let mut lhs = VecStream::new(1, vec![vec!["1"], vec!["2"], vec!["3"]]);
        let mut rhs_copy = VecStream::new(1, vec![vec!["1"], vec!["2"], vec!["3"]]);
        let result = verify(&mut lhs, &mut rhs_copy, &config(1, 1, vec![0], vec![0])).unwrap();
        assert!(result.holds);
    }

    #[test]
    fn ragged_rows_are_skipped_not_fatal() {
        // A row of the wrong width on either side is skipped and logged,
        // not a fatal `ConfigError`.
        let mut lhs = VecStream::new(2, vec![vec!["a", "x"], vec!["only-one"], vec!["b", "y"]]);
        let mut rhs = VecStream::new(2, vec![vec!["a", "x"], vec!["b", "y"], vec!["extra", "cell", "here"]]);
        let result = verify(&mut lhs, &mut rhs, &config(2, 2, vec![0], vec![0])).unwrap();
        assert!(result.holds);
        assert_eq!(result.error, 0.0);
        assert!(result.violating_clusters.is_empty());
    }

    #[test]
    fn invalid_config_is_rejected_before_any_stream_read() {
        let mut lhs = VecStream::new(1, vec![vec!["1"]]);
        let mut rhs = VecStream::new(1, vec![vec!["1"]]);
        let err = verify(&mut lhs, &mut rhs, &config(1, 1, vec![0, 1], vec![0])).unwrap_err();
        assert!(matches!(
            err,
            IndError::Config(ConfigError::MismatchedIndexWidth { lhs: 2, rhs: 1 })
        ));
    }
}
