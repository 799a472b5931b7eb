//! APIs to open Parquet files and read them in row-group chunks.
mod chunks;

pub use chunks::{ChunkReader, ChunkSpec};

use std::fs::File;
use std::io::BufReader;
use std::ops::Range;
use std::path::{Path, PathBuf};

use arrow2::array::Array;
use arrow2::chunk::Chunk;
use arrow2::datatypes::Schema;
use arrow2::io::parquet::read::{infer_schema, read_metadata, FileMetaData};

use crate::error::{Error, Result};

use chunks::{project_fields, read_span};

/// A Parquet file whose footer has been read and validated.
///
/// The handle holds the file's path and decoded metadata, but no open file
/// descriptor; every read operation opens the file again. A handle can
/// therefore hand out any number of independent [`ChunkReader`]s.
#[derive(Debug, Clone)]
pub struct FileHandle {
    path: PathBuf,
    metadata: FileMetaData,
    schema: Schema,
}

impl FileHandle {
    /// Opens `path` and reads its footer.
    ///
    /// # Error
    /// This function errors with [`Error::InvalidInputPath`] when `path` is
    /// not an existing file, and with [`Error::Engine`] when the footer is
    /// not valid Parquet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InvalidInputPath(path.to_path_buf()));
        }
        let mut reader = BufReader::new(File::open(path)?);
        let metadata = read_metadata(&mut reader)?;
        let schema = infer_schema(&metadata)?;
        tracing::debug!(
            path = %path.display(),
            row_groups = metadata.row_groups.len(),
            rows = metadata.num_rows,
            "opened parquet file"
        );
        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            schema,
        })
    }

    /// The path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file's schema, inferred from its footer.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The file's decoded footer.
    pub fn metadata(&self) -> &FileMetaData {
        &self.metadata
    }

    /// Number of row groups in the file.
    pub fn num_row_groups(&self) -> usize {
        self.metadata.row_groups.len()
    }

    /// Number of rows in the file, as declared by its footer.
    pub fn num_rows(&self) -> usize {
        self.metadata.num_rows
    }

    /// The value stored in the footer's key-value metadata under `key`.
    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .key_value_metadata
            .as_ref()?
            .iter()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.value.as_deref())
    }

    /// Returns a lazy [`ChunkReader`] over the file's row groups.
    ///
    /// Nothing is decoded until the reader is first advanced. In particular,
    /// a selection naming an unknown column errors on the first
    /// [`next`](Iterator::next), not here.
    pub fn chunks(&self, spec: ChunkSpec) -> Result<ChunkReader<BufReader<File>>> {
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(ChunkReader::new(
            reader,
            self.metadata.row_groups.clone(),
            self.schema.clone(),
            spec,
        ))
    }

    /// Reads the row groups of `span` into a single [`Chunk`].
    ///
    /// # Error
    /// This function errors with [`Error::OutOfRange`] when `span` reaches
    /// beyond the file's row groups.
    pub fn read_row_groups(
        &self,
        span: Range<usize>,
        spec: &ChunkSpec,
    ) -> Result<Chunk<Box<dyn Array>>> {
        let fields = project_fields(&self.schema, spec.columns.as_deref())?;
        let mut reader = BufReader::new(File::open(&self.path)?);
        read_span(
            &mut reader,
            &self.metadata.row_groups,
            &fields,
            span,
            spec.parallel,
            None,
        )
    }

    /// Reads the first `rows` rows of the file into a single [`Chunk`],
    /// visiting only the row groups needed to fill them.
    pub fn head(&self, rows: usize, spec: &ChunkSpec) -> Result<Chunk<Box<dyn Array>>> {
        let fields = project_fields(&self.schema, spec.columns.as_deref())?;
        let mut reader = BufReader::new(File::open(&self.path)?);
        read_span(
            &mut reader,
            &self.metadata.row_groups,
            &fields,
            0..self.metadata.row_groups.len(),
            spec.parallel,
            Some(rows),
        )
    }
}

/// Returns the Parquet files under `path`, in lexicographic order.
///
/// A path to a file is returned as-is; a path to a directory is scanned,
/// non-recursively, for entries with a `parquet` extension.
///
/// # Error
/// This function errors with [`Error::InvalidInputPath`] when `path` does
/// not exist.
pub fn parquet_files<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(Error::InvalidInputPath(path.to_path_buf()));
    }
    let mut files = vec![];
    for entry in std::fs::read_dir(path)? {
        let entry = entry?.path();
        if entry.is_file() && entry.extension().map_or(false, |extension| extension == "parquet") {
            files.push(entry);
        }
    }
    files.sort();
    Ok(files)
}

/// Counts the rows of every Parquet file under `path` by decoding them
/// chunk by chunk.
///
/// The count is accumulated from the decoded chunks rather than taken from
/// the footers, so it exercises the full read path described by `spec`.
pub fn count_rows<P: AsRef<Path>>(path: P, spec: &ChunkSpec) -> Result<usize> {
    let mut rows = 0;
    for file in parquet_files(path)? {
        let handle = FileHandle::open(&file)?;
        for chunk in handle.chunks(spec.clone())? {
            rows += chunk?.len();
        }
    }
    Ok(rows)
}
