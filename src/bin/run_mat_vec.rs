use clap::Parser;
use mat_vec::collective::{Communicator, LocalWorld};
use mat_vec::generate::random_vector;
use mat_vec::parallel::MatVecParallel;
use mat_vec::sequential::MatVecSequential;
use mat_vec::task::{execute, TaskData};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use std::error::Error;
use std::result::Result;
use std::time::Instant;
use tracing::info;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Parser)]
#[clap(version = "1.0", author = "Kyle <kmurf1999@gmail.com>")]
struct Opts {
    /// side length of the square matrix
    #[clap(long, default_value = "1000")]
    size: usize,
    /// number of ranks for the local backend
    #[clap(long, default_value = "4")]
    procs: usize,
    #[clap(long, default_value = "0")]
    root: usize,
    /// seed for the random inputs, entropy when omitted
    #[clap(long)]
    seed: Option<u64>,
    #[clap(long, default_value = "local")]
    backend: String,
    /// print the run report as json
    #[clap(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RunReport {
    size: usize,
    procs: usize,
    root: usize,
    parallel_ms: u64,
    sequential_ms: u64,
    matches_reference: bool,
    checksum: i64,
}

fn generate_inputs(opts: &Opts) -> (Vec<i32>, Vec<i32>) {
    let mut rng = match opts.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let vector = random_vector(opts.size, &mut rng);
    let matrix = random_vector(opts.size * opts.size, &mut rng);
    (matrix, vector)
}

/// Runs the distributed kernel on one rank, the root also checks it against the reference
fn run_rank<C: Communicator>(
    comm: &C,
    opts: &Opts,
    inputs: Option<(&[i32], &[i32])>,
) -> Result<Option<RunReport>, BoxError> {
    let is_root = comm.rank() == opts.root;
    let mut result = vec![0; opts.size];

    let start_time = Instant::now();
    let ok = {
        let data = match inputs {
            Some((matrix, vector)) if is_root => TaskData::new()
                .with_input(matrix)
                .with_input(vector)
                .with_output(&mut result),
            _ => TaskData::new(),
        };
        execute(&mut MatVecParallel::with_root(comm, data, opts.root))
    };
    if !ok {
        return Err(format!("distributed kernel failed on rank {}", comm.rank()).into());
    }
    if !is_root {
        return Ok(None);
    }
    let parallel_ms = start_time.elapsed().as_millis() as u64;

    let (matrix, vector) = inputs.ok_or("root rank has no input")?;
    let mut reference = vec![0; opts.size];
    let start_time = Instant::now();
    let ok = execute(&mut MatVecSequential::new(
        TaskData::new()
            .with_input(matrix)
            .with_input(vector)
            .with_output(&mut reference),
    ));
    if !ok {
        return Err("sequential kernel failed".into());
    }
    let sequential_ms = start_time.elapsed().as_millis() as u64;

    Ok(Some(RunReport {
        size: opts.size,
        procs: comm.size(),
        root: opts.root,
        parallel_ms,
        sequential_ms,
        matches_reference: result == reference,
        checksum: result.iter().map(|&x| i64::from(x)).sum(),
    }))
}

fn run_local(opts: &Opts) -> Result<Option<RunReport>, BoxError> {
    assert!(opts.procs > 0);
    assert!(opts.root < opts.procs);
    let (matrix, vector) = generate_inputs(opts);
    let inputs = Some((&matrix[..], &vector[..]));
    let mut report = None;
    for rank_report in LocalWorld::run(opts.procs, |comm| run_rank(&comm, opts, inputs))? {
        if let Some(r) = rank_report? {
            report = Some(r);
        }
    }
    Ok(report)
}

#[cfg(feature = "mpi")]
fn run_mpi(opts: &Opts) -> Result<Option<RunReport>, BoxError> {
    use mat_vec::collective::MpiWorld;

    let universe = mat_vec::collective::mpi::initialize().ok_or("MPI is already initialized")?;
    let world = MpiWorld::new(universe.world());
    assert!(opts.root < world.size());
    let inputs = if world.rank() == opts.root {
        Some(generate_inputs(opts))
    } else {
        None
    };
    run_rank(
        &world,
        opts,
        inputs.as_ref().map(|(matrix, vector)| (&matrix[..], &vector[..])),
    )
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_opts: &Opts) -> Result<Option<RunReport>, BoxError> {
    Err("built without the `mpi` feature".into())
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt::init();
    let opts: Opts = Opts::parse();
    assert!(opts.size > 0);

    let report = match opts.backend.as_str() {
        "local" => run_local(&opts)?,
        "mpi" => run_mpi(&opts)?,
        _ => panic!("invalid backend. Must be either \"local\" or \"mpi\""),
    };

    // only the root rank has a report
    if let Some(report) = report {
        if opts.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            info!(
                size = report.size,
                procs = report.procs,
                parallel_ms = report.parallel_ms,
                sequential_ms = report.sequential_ms,
                matches = report.matches_reference,
                "done"
            );
        }
        if !report.matches_reference {
            return Err("distributed result differs from the sequential reference".into());
        }
    }
    Ok(())
}
