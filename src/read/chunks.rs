//! Lazy, chunked iteration over the row groups of a Parquet file.
use std::io::{Read, Seek};
use std::num::NonZeroUsize;
use std::ops::Range;

use arrow2::array::Array;
use arrow2::chunk::Chunk;
use arrow2::compute::concatenate::concatenate;
use arrow2::datatypes::{Field, Schema};
use arrow2::io::parquet::read::{read_columns_many, ArrayIter, RowGroupMetaData};
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Settings controlling how a [`ChunkReader`] walks a file.
#[derive(Debug, Clone)]
pub struct ChunkSpec {
    /// How many consecutive row groups are stitched into a single [`Chunk`].
    ///
    /// The last chunk of a file covers whatever remains and may span fewer
    /// row groups.
    pub row_groups_per_chunk: NonZeroUsize,
    /// Whether to decode the (row group, column) units of a chunk on rayon's
    /// thread pool. This changes neither the contents nor the order of the
    /// yielded chunks.
    pub parallel: bool,
    /// Names of the columns to decode, in any order. `None` decodes every
    /// column. An empty selection yields no chunks.
    pub columns: Option<Vec<String>>,
}

impl Default for ChunkSpec {
    fn default() -> Self {
        Self {
            row_groups_per_chunk: NonZeroUsize::MIN,
            parallel: false,
            columns: None,
        }
    }
}

/// Returns the row-group spans a file with `row_groups` row groups is split
/// into, `step` row groups at a time.
///
/// The spans are consecutive, disjoint and ascending, and cover every row
/// group exactly once; the last span is truncated to the end of the file.
pub(crate) fn spans(row_groups: usize, step: NonZeroUsize) -> Vec<Range<usize>> {
    let step = step.get();
    (0..row_groups)
        .step_by(step)
        .map(|start| start..row_groups.min(start + step))
        .collect()
}

/// Resolves `columns` against `schema`, preserving the schema's field order
/// and ignoring duplicates in the selection.
///
/// # Error
/// This function errors iff a name in `columns` does not exist in `schema`.
pub(crate) fn project_fields(schema: &Schema, columns: Option<&[String]>) -> Result<Vec<Field>> {
    let columns = match columns {
        None => return Ok(schema.fields.clone()),
        Some(columns) => columns,
    };
    if let Some(column) = columns
        .iter()
        .find(|column| !schema.fields.iter().any(|field| &field.name == *column))
    {
        return Err(Error::ColumnNotFound {
            column: column.clone(),
            available: schema.fields.iter().map(|field| field.name.clone()).collect(),
        });
    }
    Ok(schema
        .fields
        .iter()
        .filter(|field| columns.contains(&field.name))
        .cloned()
        .collect())
}

/// Decodes the single array a column-chunk deserializer was set up to yield.
fn decode(row_group: usize, iter: &mut ArrayIter<'static>) -> Result<Box<dyn Array>> {
    match iter.next() {
        Some(Ok(array)) => Ok(array),
        Some(Err(error)) => Err(Error::CorruptData {
            row_group,
            source: error,
        }),
        None => Err(Error::CorruptData {
            row_group,
            source: arrow2::error::Error::OutOfSpec(
                "the column chunk deserializer yielded no array".to_string(),
            ),
        }),
    }
}

/// Reads the row groups of `span` and decodes them into a single [`Chunk`],
/// reading at most `limit` rows when one is set.
///
/// # Implementation
/// Reading the column chunks is IO-bounded and always sequential. Decoding is
/// CPU-bounded and fans out over the (row group, column) units, on rayon's
/// thread pool when `parallel` is set.
///
/// # Error
/// This function errors with [`Error::OutOfRange`] when `span` reaches beyond
/// `row_groups`, and with [`Error::CorruptData`] when a row group of the span
/// cannot be decoded.
pub(crate) fn read_span<R: Read + Seek>(
    reader: &mut R,
    row_groups: &[RowGroupMetaData],
    fields: &[Field],
    span: Range<usize>,
    parallel: bool,
    limit: Option<usize>,
) -> Result<Chunk<Box<dyn Array>>> {
    if span.start > span.end || span.end > row_groups.len() {
        return Err(Error::OutOfRange {
            start: span.start,
            end: span.end,
            row_groups: row_groups.len(),
        });
    }
    if fields.is_empty() {
        return Ok(Chunk::new(vec![]));
    }

    let mut remaining = limit.unwrap_or(usize::MAX);
    let mut units = vec![];
    let mut groups = 0;
    for index in span {
        if remaining == 0 {
            break;
        }
        let row_group = &row_groups[index];
        let rows = row_group.num_rows().min(remaining);
        if rows == 0 {
            continue;
        }
        let columns = read_columns_many(reader, row_group, fields.to_vec(), None, Some(rows), None)
            .map_err(|error| Error::CorruptData {
                row_group: index,
                source: error,
            })?;
        remaining -= rows;
        groups += 1;
        units.extend(columns.into_iter().map(|iter| (index, iter)));
    }
    if groups == 0 {
        return Ok(Chunk::new(vec![]));
    }

    // unit order is row-group major, so `arrays[group * columns + column]`
    let arrays = if parallel {
        units
            .into_par_iter()
            .map(|(index, mut iter)| decode(index, &mut iter))
            .collect::<Result<Vec<_>>>()?
    } else {
        units
            .into_iter()
            .map(|(index, mut iter)| decode(index, &mut iter))
            .collect::<Result<Vec<_>>>()?
    };

    if groups == 1 {
        return Chunk::try_new(arrays).map_err(Error::Engine);
    }
    let columns = fields.len();
    let stitched = (0..columns)
        .map(|column| {
            let parts = (0..groups)
                .map(|group| arrays[group * columns + column].as_ref())
                .collect::<Vec<_>>();
            concatenate(&parts).map_err(Error::Engine)
        })
        .collect::<Result<Vec<_>>>()?;
    Chunk::try_new(stitched).map_err(Error::Engine)
}

/// A lazy [`Iterator`] of [`Chunk`]s, walking the row groups of a Parquet
/// file a fixed number of row groups at a time.
///
/// Each call to [`next`](Iterator::next) reads the column chunks of the next
/// row-group span from the file, decodes them and stitches the result into a
/// single [`Chunk`]. Nothing is read or decoded before the first call, each
/// span is visited exactly once, and the iterator cannot restart; create a
/// new reader to walk the file again.
///
/// # Implementation
/// The column selection is resolved on the first call to `next`, which is
/// where an unknown column name surfaces as [`Error::ColumnNotFound`].
pub struct ChunkReader<R: Read + Seek> {
    reader: R,
    row_groups: Vec<RowGroupMetaData>,
    schema: Schema,
    spec: ChunkSpec,
    spans: std::vec::IntoIter<Range<usize>>,
    projection: Option<Vec<Field>>,
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Returns a new [`ChunkReader`].
    pub fn new(reader: R, row_groups: Vec<RowGroupMetaData>, schema: Schema, spec: ChunkSpec) -> Self {
        // an empty selection yields no chunks, and `len` must agree with that
        let spans = if spec.columns.as_ref().map_or(false, |columns| columns.is_empty()) {
            vec![]
        } else {
            spans(row_groups.len(), spec.row_groups_per_chunk)
        }
        .into_iter();
        Self {
            reader,
            row_groups,
            schema,
            spec,
            spans,
            projection: None,
        }
    }

    /// The schema the column selection is resolved against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The settings this reader was created with.
    pub fn spec(&self) -> &ChunkSpec {
        &self.spec
    }

    fn fields(&mut self) -> Result<Vec<Field>> {
        let fields = match &mut self.projection {
            Some(fields) => fields,
            slot => slot.insert(project_fields(&self.schema, self.spec.columns.as_deref())?),
        };
        Ok(fields.clone())
    }

    fn _next(&mut self) -> Result<Option<Chunk<Box<dyn Array>>>> {
        let span = match self.spans.next() {
            Some(span) => span,
            None => return Ok(None),
        };
        let fields = self.fields()?;
        read_span(
            &mut self.reader,
            &self.row_groups,
            &fields,
            span,
            self.spec.parallel,
            None,
        )
        .map(Some)
    }
}

impl<R: Read + Seek> Iterator for ChunkReader<R> {
    type Item = Result<Chunk<Box<dyn Array>>>;

    fn next(&mut self) -> Option<Self::Item> {
        self._next().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.spans.size_hint()
    }
}

impl<R: Read + Seek> ExactSizeIterator for ChunkReader<R> {}
