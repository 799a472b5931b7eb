//! Prints the schema, footer metadata and leading rows of a Parquet file.
use std::num::NonZeroUsize;
use std::path::PathBuf;

use arrow2::io::print;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pqchunk::error::Result;
use pqchunk::read::{ChunkSpec, FileHandle};
use pqchunk::sample::METADATA_KEY;

#[derive(Debug, Parser)]
#[command(
    name = "pqchunk-read",
    version,
    about = "Print the schema, footer metadata and leading rows of a Parquet file"
)]
struct Args {
    /// Parquet file to inspect.
    input: PathBuf,
    /// Number of rows to print.
    #[arg(short = 'n', long, default_value_t = 10)]
    rows: usize,
    /// Comma-separated names of the columns to decode; all of them when omitted.
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,
    /// Row groups decoded per chunk.
    #[arg(short, long, default_value = "1")]
    chunk_size: NonZeroUsize,
    /// Decode on rayon's thread pool.
    #[arg(short, long)]
    threads: bool,
}

fn run(args: Args) -> Result<()> {
    let handle = FileHandle::open(&args.input)?;
    println!("file: {}", handle.path().display());
    println!(
        "rows: {} in {} row groups",
        handle.num_rows(),
        handle.num_row_groups()
    );
    println!("schema:");
    for field in &handle.schema().fields {
        println!("  {}: {:?}", field.name, field.data_type);
    }
    if let Some(raw) = handle.key_value(METADATA_KEY) {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value) => println!("metadata: {value:#}"),
            Err(_) => println!("metadata: {raw}"),
        }
    }

    let spec = ChunkSpec {
        row_groups_per_chunk: args.chunk_size,
        parallel: args.threads,
        columns: args.columns,
    };
    let chunk = handle.head(args.rows, &spec)?;
    let names = handle
        .schema()
        .fields
        .iter()
        .map(|field| field.name.as_str())
        .filter(|name| {
            spec.columns
                .as_ref()
                .map_or(true, |columns| columns.iter().any(|column| column == name))
        })
        .collect::<Vec<_>>();
    println!("showing {} of {} rows", chunk.len(), handle.num_rows());
    if !chunk.arrays().is_empty() {
        println!("{}", print::write(&[chunk], &names));
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
