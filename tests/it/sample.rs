use arrow2::array::{Array, StructArray, UInt64Array};
use arrow2::chunk::Chunk;

use pqchunk::error::Result;
use pqchunk::read::{ChunkSpec, FileHandle};
use pqchunk::sample::{schema, Compression, DatasetGenerator, METADATA_KEY};

use super::test_util::{generate, options};

fn read_all(handle: &FileHandle) -> Result<Vec<Chunk<Box<dyn Array>>>> {
    handle.chunks(ChunkSpec::default())?.collect()
}

/// The event ids of the "event" column, in row order.
fn event_ids(chunk: &Chunk<Box<dyn Array>>) -> Vec<u64> {
    let event = chunk.arrays()[3]
        .as_any()
        .downcast_ref::<StructArray>()
        .unwrap();
    event.values()[2]
        .as_any()
        .downcast_ref::<UInt64Array>()
        .unwrap()
        .values_iter()
        .copied()
        .collect()
}

#[test]
fn write_reports_the_file_layout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut generator = DatasetGenerator::new(options("layout", 50, 20, 0));
    let path = dir.path().join("layout_0.parquet");
    let summary = generator.write(&path)?;

    assert_eq!(summary.rows, 50);
    // 20 + 20 + 10
    assert_eq!(summary.row_groups, 3);
    assert_eq!(summary.bytes, std::fs::metadata(&path)?.len());

    let handle = FileHandle::open(path)?;
    assert_eq!(handle.num_rows(), 50);
    assert_eq!(handle.num_row_groups(), 3);
    assert_eq!(handle.schema().fields, schema().fields);
    Ok(())
}

#[test]
fn event_ids_continue_across_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut generator = DatasetGenerator::new(options("run", 30, 10, 0));

    let mut ids = vec![];
    for index in 0..2 {
        let path = dir.path().join(format!("run_{index}.parquet"));
        generator.write(&path)?;
        for chunk in read_all(&FileHandle::open(path)?)? {
            ids.extend(event_ids(&chunk));
        }
    }
    assert_eq!(ids, (0..60).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn the_same_seed_writes_the_same_rows() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let left = generate(dir.path(), options("left", 40, 10, 9))?;
    let right = generate(dir.path(), options("right", 40, 10, 9))?;

    let left = read_all(&FileHandle::open(left)?)?;
    let right = read_all(&FileHandle::open(right)?)?;
    assert_eq!(left.len(), right.len());
    for (left, right) in left.iter().zip(right.iter()) {
        for (left, right) in left.arrays().iter().zip(right.arrays().iter()) {
            assert_eq!(left.as_ref(), right.as_ref());
        }
    }
    Ok(())
}

#[test]
fn compressed_files_read_back() -> Result<()> {
    let dir = tempfile::tempdir()?;
    for compression in [Compression::Snappy, Compression::Gzip] {
        let mut options = options("compressed", 40, 10, 0);
        options.compression = compression;
        let path = dir
            .path()
            .join(format!("compressed_{compression}.parquet"));
        DatasetGenerator::new(options).write(&path)?;

        let handle = FileHandle::open(path)?;
        let rows: usize = read_all(&handle)?.iter().map(|chunk| chunk.len()).sum();
        assert_eq!(rows, 40);
    }
    Ok(())
}

#[test]
fn the_footer_carries_the_metadata_key() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = generate(dir.path(), options("keyed", 10, 10, 0))?;
    let handle = FileHandle::open(path)?;

    let raw = handle.key_value(METADATA_KEY).unwrap();
    let value: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(value["name"], "keyed");
    assert_eq!(value["events"], 10);
    Ok(())
}
