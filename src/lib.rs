//! Chunked reading and generation of Parquet event datasets.
//!
//! The entry point for reading is [`read::FileHandle`]: it validates a file's
//! footer once and hands out lazy [`read::ChunkReader`]s that walk the file's
//! row groups a fixed number at a time, decoding each span into an arrow
//! [`Chunk`](arrow2::chunk::Chunk). [`sample::DatasetGenerator`] writes the
//! HEP-flavored sample datasets the readers are exercised and benchmarked
//! against.
//!
//! ```no_run
//! use pqchunk::read::{ChunkSpec, FileHandle};
//!
//! # fn main() -> pqchunk::error::Result<()> {
//! let handle = FileHandle::open("dataset_gen/dummy_0.parquet")?;
//! for chunk in handle.chunks(ChunkSpec::default())? {
//!     println!("read {} rows", chunk?.len());
//! }
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod read;
pub mod sample;
pub mod timing;
