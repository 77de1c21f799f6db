//! Chunk overlap compression engine for casemap.
//!
//! Splits an array into fixed-size blocks, deduplicates them and packs the
//! distinct blocks into one short buffer by overlapping them greedily.

pub mod array;
pub mod chunk;
pub mod compressor;
pub mod groups;
pub mod overlap;
pub mod sequences;

#[cfg(test)]
mod proptests;

pub use array::{ArrayStats, CompressedArray, compress_array};
pub use chunk::{Chunk, Element};
pub use compressor::{ChunkPair, ChunksCompressor};
pub use groups::Groups;
pub use overlap::{Overlap, OverlapCache};
pub use sequences::OverlappedSequences;
