pub mod cli;
pub mod csv_stream;
pub mod timing;

use std::io;

use anyhow::Context;
use clap::Parser;
use ind_core::{DiscoveryConfig, Uind, VerificationResult, VerifierConfig};

use cli::{parse_indices, parse_input_spec, Cli, Command, DiscoverArgs, VerifyArgs};
use csv_stream::CsvDatasetStream;
use timing::{StageTimings, Stopwatch};

pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Discover(args) => run_discover(args),
        Command::Verify(args) => run_verify(args),
    }
}

fn open_inputs(raw: &[String], has_headers: bool) -> io::Result<Vec<CsvDatasetStream>> {
    raw.iter()
        .map(|spec| {
            let (path, delimiter) = parse_input_spec(spec);
            CsvDatasetStream::open(path, delimiter, has_headers)
        })
        .collect()
}

fn format_uind(uind: &Uind) -> String {
    format!(
        "table{}.col{} ⊆ table{}.col{}",
        uind.dependent.table_id.0, uind.dependent.columns[0].0, uind.referenced.table_id.0, uind.referenced.columns[0].0
    )
}

fn run_discover(args: DiscoverArgs) -> anyhow::Result<()> {
    let total = Stopwatch::start();

    let load = Stopwatch::start();
    let streams = open_inputs(&args.inputs, args.has_headers).context("opening discovery input")?;
    let load_ms = load.elapsed_ms();

    let init = Stopwatch::start();
    let config = DiscoveryConfig {
        mem_limit_mb: args.mem_limit_mb,
        threads_num: args.threads,
        tmp_dir: args.tmp_dir,
    };
    config.validate().context("invalid discovery configuration")?;
    let init_ms = init.elapsed_ms();

    let compute = Stopwatch::start();
    let uinds = ind_core::discover(streams, &config).context("discovery failed")?;
    let compute_ms = compute.elapsed_ms();

    let timings = StageTimings {
        load_ms,
        init_ms,
        compute_ms,
        total_ms: total.elapsed_ms(),
    };
    timings.log("discover");

    for uind in &uinds {
        println!("{}", format_uind(uind));
    }
    eprintln!("{} unary inclusion dependencies found", uinds.len());

    Ok(())
}

fn run_verify(args: VerifyArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.inputs.len() == 2, "verify requires exactly two --input arguments, got {}", args.inputs.len());
    let total = Stopwatch::start();

    let load = Stopwatch::start();
    let mut streams = open_inputs(&args.inputs, args.has_headers).context("opening verification input")?;
    let mut rhs = streams.pop().expect("checked length == 2");
    let mut lhs = streams.pop().expect("checked length == 2");
    let load_ms = load.elapsed_ms();

    let init = Stopwatch::start();
    let lhs_indices = parse_indices(&args.lhs)?;
    let rhs_indices = parse_indices(&args.rhs)?;
    let config = VerifierConfig {
        lhs_columns: ind_core::DatasetStream::number_of_columns(&lhs),
        rhs_columns: ind_core::DatasetStream::number_of_columns(&rhs),
        lhs_indices,
        rhs_indices,
        equal_nulls: false,
    };
    config.validate().context("invalid verifier configuration")?;
    let init_ms = init.elapsed_ms();

    let compute = Stopwatch::start();
    let result: VerificationResult = ind_core::verify(&mut lhs, &mut rhs, &config).context("verification failed")?;
    let compute_ms = compute.elapsed_ms();

    let timings = StageTimings {
        load_ms,
        init_ms,
        compute_ms,
        total_ms: total.elapsed_ms(),
    };
    timings.log("verify");

    println!("holds: {}", result.holds);
    println!("error: {:.4}", result.error);
    println!("violating_rows: {}", result.violating_rows);
    println!("violating_unique_rows: {}", result.violating_unique_rows);
    eprintln!(
        "{} violating cluster(s) out of {} total rows checked",
        result.violating_clusters.len(),
        result.violating_rows
    );

    Ok(())
}
