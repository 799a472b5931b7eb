//! Generates sample Parquet datasets of particle-physics events.
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pqchunk::error::Result;
use pqchunk::sample::{Compression, DatasetGenerator, GenerateOptions};

#[derive(Debug, Parser)]
#[command(
    name = "pqchunk-gen",
    version,
    about = "Generate a HEP-like sample dataset in the Parquet file format"
)]
struct Args {
    /// Name of the dataset, used for file naming.
    #[arg(long, default_value = "dummy")]
    name: String,
    /// Directory the files are written into.
    #[arg(short, long, default_value = "./dataset_gen")]
    outdir: PathBuf,
    /// Number of events per file.
    #[arg(short = 'n', long, default_value_t = 5000)]
    events: usize,
    /// Compression of the written pages.
    #[arg(short, long, default_value_t = Compression::Uncompressed)]
    compression: Compression,
    /// Number of events per Parquet row group; a heuristic when omitted.
    #[arg(short, long)]
    rows_per_group: Option<NonZeroUsize>,
    /// Number of files to write.
    #[arg(long, default_value_t = 1)]
    files: usize,
    /// Seed of the event sampler.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn run(args: Args) -> Result<()> {
    std::fs::create_dir_all(&args.outdir)?;
    let options = GenerateOptions {
        name: args.name.clone(),
        events: args.events,
        rows_per_group: args.rows_per_group,
        compression: args.compression,
        seed: args.seed,
    };
    let mut generator = DatasetGenerator::new(options);
    for index in 0..args.files {
        let path = args.outdir.join(format!("{}_{}.parquet", args.name, index));
        let summary = generator.write(&path)?;
        println!(
            "wrote {} ({} rows in {} row groups, {} bytes)",
            path.display(),
            summary.rows,
            summary.row_groups,
            summary.bytes
        );
    }
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
