//! `clap`-derived argument definitions for the two subcommands (C10).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ind", about = "Unary inclusion-dependency discovery and verification", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Discover all unary inclusion dependencies across one or more tables.
    Discover(DiscoverArgs),
    /// Check whether a candidate inclusion dependency holds between two tables.
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct DiscoverArgs {
    /// Input table, as `path` or `path:delimiter` (delimiter defaults to `,`).
    /// Repeatable; attribute ids are assigned in the order given.
    #[arg(long = "input", required = true)]
    pub inputs: Vec<String>,

    /// Soft in-memory budget for column domains, in megabytes. Must be >= 16.
    #[arg(long = "mem-limit-mb", default_value_t = 2048)]
    pub mem_limit_mb: u64,

    /// Size of the worker pool used to ingest blocks in parallel. Must be >= 1.
    #[arg(long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Directory spilled partitions are written under.
    #[arg(long = "tmp-dir", default_value = "./tmp")]
    pub tmp_dir: PathBuf,

    /// Treat each input's first row as a header rather than data.
    #[arg(long = "has-headers", default_value_t = true)]
    pub has_headers: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Input table, as `path` or `path:delimiter`. Pass exactly two; the
    /// same path twice is permitted for a self-referential check.
    #[arg(long = "input", required = true)]
    pub inputs: Vec<String>,

    /// Comma-separated left-hand column indices (0-based).
    #[arg(long = "lhs")]
    pub lhs: String,

    /// Comma-separated right-hand column indices (0-based), same length as `--lhs`.
    #[arg(long = "rhs")]
    pub rhs: String,

    /// Treat each input's first row as a header rather than data.
    #[arg(long = "has-headers", default_value_t = true)]
    pub has_headers: bool,
}

/// Splits a `path[:delimiter]` token. A single-byte suffix after the final
/// `:` is taken as the delimiter; anything else leaves the whole token as
/// the path and defaults the delimiter to `,`.
pub fn parse_input_spec(raw: &str) -> (PathBuf, u8) {
    if let Some((path, delim)) = raw.rsplit_once(':') {
        if delim.len() == 1 {
            return (PathBuf::from(path), delim.as_bytes()[0]);
        }
    }
    (PathBuf::from(raw), b',')
}

/// Parses a comma-separated list of 0-based column indices.
pub fn parse_indices(raw: &str) -> anyhow::Result<Vec<usize>> {
    raw.split(',')
        .map(|s| s.trim().parse::<usize>().map_err(|e| anyhow::anyhow!("invalid column index {s:?}: {e}")))
        .collect()
}
