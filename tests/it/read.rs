use std::fs;

use pqchunk::error::{Error, Result};
use pqchunk::read::{count_rows, parquet_files, ChunkSpec, FileHandle};
use pqchunk::sample::{DatasetMetadata, METADATA_KEY};

use super::test_util::{generate, options};

#[test]
fn open_reports_the_file_layout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = generate(dir.path(), options("layout", 50, 20, 0))?;
    let handle = FileHandle::open(&path)?;

    assert_eq!(handle.path(), path);
    assert_eq!(handle.num_rows(), 50);
    assert_eq!(handle.num_row_groups(), 3);

    let names = handle
        .schema()
        .fields
        .iter()
        .map(|field| field.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, ["leptons", "jets", "met", "event"]);

    assert!(handle.key_value(METADATA_KEY).is_some());
    assert!(handle.key_value("no-such-key").is_none());
    Ok(())
}

#[test]
fn open_a_missing_path_fails() {
    let error = FileHandle::open("does-not-exist.parquet").unwrap_err();
    assert!(matches!(error, Error::InvalidInputPath(_)));
}

#[test]
fn open_a_directory_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let error = FileHandle::open(dir.path()).unwrap_err();
    assert!(matches!(error, Error::InvalidInputPath(_)));
    Ok(())
}

#[test]
fn listing_a_file_returns_it() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = generate(dir.path(), options("single", 10, 10, 0))?;
    assert_eq!(parquet_files(&path)?, vec![path]);
    Ok(())
}

#[test]
fn listing_a_directory_is_sorted_and_filtered() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let second = generate(dir.path(), options("b", 10, 10, 0))?;
    let first = generate(dir.path(), options("a", 10, 10, 0))?;
    fs::write(dir.path().join("notes.txt"), "not a parquet file")?;

    assert_eq!(parquet_files(dir.path())?, vec![first, second]);
    Ok(())
}

#[test]
fn listing_a_missing_path_fails() {
    let error = parquet_files("no/such/directory").unwrap_err();
    assert!(matches!(error, Error::InvalidInputPath(_)));
}

#[test]
fn count_rows_of_a_single_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = generate(dir.path(), options("counted", 100, 10, 0))?;
    assert_eq!(count_rows(path, &ChunkSpec::default())?, 100);
    Ok(())
}

#[test]
fn count_rows_aggregates_a_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    generate(dir.path(), options("a", 10, 10, 0))?;
    generate(dir.path(), options("b", 20, 10, 1))?;
    generate(dir.path(), options("c", 30, 10, 2))?;

    let spec = ChunkSpec {
        row_groups_per_chunk: std::num::NonZeroUsize::new(2).unwrap(),
        ..Default::default()
    };
    assert_eq!(count_rows(dir.path(), &spec)?, 60);
    Ok(())
}

#[test]
fn count_rows_with_a_projection() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = generate(dir.path(), options("projected", 100, 10, 0))?;
    let spec = ChunkSpec {
        columns: Some(vec!["event".to_string()]),
        ..Default::default()
    };
    assert_eq!(count_rows(path, &spec)?, 100);
    Ok(())
}

#[test]
fn an_empty_file_has_no_chunks() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = generate(dir.path(), options("empty", 0, 10, 0))?;
    let handle = FileHandle::open(&path)?;

    assert_eq!(handle.num_rows(), 0);
    assert_eq!(handle.num_row_groups(), 0);

    let mut reader = handle.chunks(ChunkSpec::default())?;
    assert_eq!(reader.len(), 0);
    assert!(reader.next().is_none());

    assert_eq!(count_rows(&path, &ChunkSpec::default())?, 0);
    assert_eq!(handle.head(5, &ChunkSpec::default())?.len(), 0);
    Ok(())
}

#[test]
fn the_footer_describes_the_dataset() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = generate(dir.path(), options("ttbar", 40, 20, 7))?;
    let handle = FileHandle::open(path)?;

    let metadata = DatasetMetadata::from_handle(&handle)?.unwrap();
    assert_eq!(metadata.name, "ttbar");
    assert_eq!(metadata.seed, 7);
    assert_eq!(metadata.events, 40);
    assert_eq!(metadata.tag, env!("CARGO_PKG_VERSION"));
    assert!(!metadata.created.is_empty());
    Ok(())
}
