//! Generation of sample Parquet datasets of particle-physics events.
mod event;

pub use event::schema;

use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;

use arrow2::io::parquet::write::{
    transverse, CompressionOptions, Encoding, FileWriter, KeyValue, RowGroupIterator, Version,
    WriteOptions,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::read::FileHandle;

use event::{EventBuffer, EventSampler};

/// Key under which [`DatasetMetadata`] is stored in the file footer.
pub const METADATA_KEY: &str = "metadata";

/// Compression applied to the written pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Uncompressed,
    Snappy,
    Gzip,
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "uncompressed" => Ok(Self::Uncompressed),
            "snappy" => Ok(Self::Snappy),
            "gzip" => Ok(Self::Gzip),
            other => Err(format!(
                "unknown compression \"{other}\" (expected uncompressed, snappy or gzip)"
            )),
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uncompressed => write!(f, "uncompressed"),
            Self::Snappy => write!(f, "snappy"),
            Self::Gzip => write!(f, "gzip"),
        }
    }
}

impl From<Compression> for CompressionOptions {
    fn from(compression: Compression) -> Self {
        match compression {
            Compression::Uncompressed => CompressionOptions::Uncompressed,
            Compression::Snappy => CompressionOptions::Snappy,
            Compression::Gzip => CompressionOptions::Gzip(None),
        }
    }
}

/// Settings of a [`DatasetGenerator`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Name of the dataset, recorded in the footer of every file.
    pub name: String,
    /// Number of events written per file.
    pub events: usize,
    /// Number of events per row group. When unset, a heuristic of
    /// `250_000 / n_columns` events is used.
    pub rows_per_group: Option<NonZeroUsize>,
    /// Compression of the written pages.
    pub compression: Compression,
    /// Seed of the event sampler.
    pub seed: u64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            name: "dummy".to_string(),
            events: 5000,
            rows_per_group: None,
            compression: Compression::default(),
            seed: 0,
        }
    }
}

impl GenerateOptions {
    fn rows_per_group(&self) -> usize {
        match self.rows_per_group {
            Some(rows) => rows.get(),
            None => 250_000 / schema().fields.len(),
        }
    }
}

/// Description of a generated file, stored as JSON in its footer under
/// [`METADATA_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Dataset name.
    pub name: String,
    /// Version of the generator that wrote the file.
    pub tag: String,
    /// Seed the event sampler was created with.
    pub seed: u64,
    /// Number of events in the file.
    pub events: usize,
    /// RFC 3339 timestamp of when the file was written.
    pub created: String,
}

impl DatasetMetadata {
    /// Reads the dataset description of `handle`, when its footer carries one.
    ///
    /// # Error
    /// This function errors iff the stored value is not valid JSON.
    pub fn from_handle(handle: &FileHandle) -> Result<Option<Self>> {
        handle
            .key_value(METADATA_KEY)
            .map(|raw| serde_json::from_str(raw).map_err(Error::Metadata))
            .transpose()
    }
}

/// What [`DatasetGenerator::write`] wrote into a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSummary {
    /// Number of rows (events).
    pub rows: usize,
    /// Number of row groups.
    pub row_groups: usize,
    /// Size of the file in bytes.
    pub bytes: u64,
}

/// Writes Parquet files of randomly sampled events.
///
/// The sampler persists across files, so a sequence of
/// [`write`](DatasetGenerator::write) calls produces files with globally
/// increasing event ids.
#[derive(Debug)]
pub struct DatasetGenerator {
    options: GenerateOptions,
    sampler: EventSampler,
}

impl DatasetGenerator {
    /// Returns a new generator, seeding the sampler from `options`.
    pub fn new(options: GenerateOptions) -> Self {
        let sampler = EventSampler::new(options.seed);
        Self { options, sampler }
    }

    /// The settings this generator was created with.
    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Samples `options.events` events and writes them to a new file at
    /// `path`, flushing a row group every `options.rows_per_group` events.
    pub fn write(&mut self, path: &Path) -> Result<FileSummary> {
        let schema = schema();
        let rows_per_group = self.options.rows_per_group();
        let options = WriteOptions {
            write_statistics: true,
            version: Version::V2,
            compression: self.options.compression.into(),
            data_pagesize_limit: Some(10 * 1024 * 1024),
        };
        let encodings = schema
            .fields
            .iter()
            .map(|field| transverse(&field.data_type, |_| Encoding::Plain))
            .collect::<Vec<_>>();

        let file = File::create(path)?;
        let mut writer = FileWriter::try_new(file, schema.clone(), options)?;

        let mut rows = 0;
        let mut row_groups = 0;
        while rows < self.options.events {
            let batch = rows_per_group.min(self.options.events - rows);
            let mut buffer = EventBuffer::default();
            while buffer.len() < batch {
                buffer.push(&self.sampler.sample());
            }
            let chunk = buffer.into_chunk()?;
            let groups = RowGroupIterator::try_new(
                std::iter::once(Ok(chunk)),
                &schema,
                options,
                encodings.clone(),
            )?;
            for group in groups {
                writer.write(group?)?;
            }
            rows += batch;
            row_groups += 1;
            tracing::debug!(rows = batch, "wrote row group");
        }

        let description = DatasetMetadata {
            name: self.options.name.clone(),
            tag: env!("CARGO_PKG_VERSION").to_string(),
            seed: self.options.seed,
            events: rows,
            created: Utc::now().to_rfc3339(),
        };
        let entry = KeyValue {
            key: METADATA_KEY.to_string(),
            value: Some(serde_json::to_string(&description).map_err(Error::Metadata)?),
        };
        let bytes = writer.end(Some(vec![entry]))?;
        tracing::info!(path = %path.display(), rows, row_groups, bytes, "wrote parquet file");
        Ok(FileSummary {
            rows,
            row_groups,
            bytes,
        })
    }
}
