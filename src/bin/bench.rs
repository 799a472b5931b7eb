//! Times repeated chunked scans over a Parquet file or dataset directory.
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pqchunk::error::Result;
use pqchunk::read::{count_rows, parquet_files, ChunkSpec, FileHandle};
use pqchunk::timing;

#[derive(Debug, Parser)]
#[command(
    name = "pqchunk-bench",
    version,
    about = "Time repeated chunked scans over a Parquet dataset"
)]
struct Args {
    /// Parquet file, or directory of Parquet files, to scan.
    input: PathBuf,
    /// Row groups decoded per chunk.
    #[arg(short, long, default_value = "1")]
    chunk_size: NonZeroUsize,
    /// Decode on rayon's thread pool.
    #[arg(short, long)]
    threads: bool,
    /// Restrict each scan to the first N columns of the schema.
    #[arg(long)]
    n_columns: Option<usize>,
    /// Number of timed trials.
    #[arg(long, default_value_t = 5)]
    repeats: usize,
}

fn run(args: Args) -> Result<()> {
    let files = parquet_files(&args.input)?;

    // the selection is resolved against the first file, outside of the timed loop
    let columns = match (args.n_columns, files.first()) {
        (Some(n), Some(first)) if n > 0 => {
            let handle = FileHandle::open(first)?;
            Some(
                handle
                    .schema()
                    .fields
                    .iter()
                    .take(n)
                    .map(|field| field.name.clone())
                    .collect::<Vec<_>>(),
            )
        }
        _ => None,
    };
    let spec = ChunkSpec {
        row_groups_per_chunk: args.chunk_size,
        parallel: args.threads,
        columns,
    };

    let mut trials = Vec::with_capacity(args.repeats);
    for _ in 0..args.repeats {
        let start = Instant::now();
        let rows = count_rows(&args.input, &spec)?;
        trials.push(start.elapsed());
        println!("n events = {rows}");
    }
    let summary = timing::summarize(&trials);
    println!(
        "Average of {} trials: {:.5} +/- {:.5} seconds",
        args.repeats, summary.mean, summary.std_dev
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let args = Args::parse();
    if let Err(error) = run(args) {
        eprintln!("ERROR: {error}");
        std::process::exit(1);
    }
}
