use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use pqchunk::error::Result;
use pqchunk::sample::{Compression, DatasetGenerator, GenerateOptions};

/// Settings for a small test dataset. `rows_per_group == 0` selects the
/// generator's heuristic.
pub fn options(name: &str, events: usize, rows_per_group: usize, seed: u64) -> GenerateOptions {
    GenerateOptions {
        name: name.to_string(),
        events,
        rows_per_group: NonZeroUsize::new(rows_per_group),
        compression: Compression::Uncompressed,
        seed,
    }
}

/// Writes a single dataset file under `dir` and returns its path.
pub fn generate(dir: &Path, options: GenerateOptions) -> Result<PathBuf> {
    let path = dir.join(format!("{}_0.parquet", options.name));
    DatasetGenerator::new(options).write(&path)?;
    Ok(path)
}
