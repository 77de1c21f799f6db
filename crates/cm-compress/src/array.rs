use std::collections::BTreeMap;

use crate::chunk::{Chunk, Element};
use crate::compressor::ChunksCompressor;
use crate::groups::Groups;
use crate::sequences::OverlappedSequences;

/// Tableau compressé : tampon `data` et offset de chaque bloc d'origine.
///
/// `offsets[i]` is where block `i` of the partitioned array starts in `data`,
/// so `array[i] == data[offsets[i / block_size] + i % block_size]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedArray<T> {
    pub block_size: usize,
    pub data: Vec<T>,
    pub offsets: Vec<usize>,
    pub chunk_offsets: BTreeMap<Chunk<T>, usize>,
}

/// Tailles d'un tableau compressé, en éléments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrayStats {
    pub data_length: usize,
    pub offsets_length: usize,
    pub distinct_blocks: usize,
    /// Elements saved by overlapping.
    pub overlap: isize,
}

impl<T: Element> CompressedArray<T> {
    /// Bind a compressed sequence to the block indices of `groups`.
    ///
    /// # Panics
    /// Panics if a chunk of `groups` is missing from `s`.
    #[must_use]
    pub fn from_overlapped_sequences(s: &OverlappedSequences<T>, groups: &Groups<T>) -> Self {
        let mut offsets = vec![0; groups.num_blocks()];
        for (chunk, indices) in groups.iter() {
            let offset = s.offsets()[chunk];
            for &i in indices {
                offsets[i] = offset;
            }
        }
        Self {
            block_size: groups.block_size(),
            data: s.data().to_vec(),
            offsets,
            chunk_offsets: s.offsets().clone(),
        }
    }

    /// Elements saved by overlapping distinct blocks.
    #[must_use]
    pub fn total_overlap(&self) -> isize {
        let chunks: usize = self.chunk_offsets.keys().map(|c| c.len()).sum();
        chunks as isize - self.data.len() as isize
    }

    #[must_use]
    pub fn stats(&self) -> ArrayStats {
        ArrayStats {
            data_length: self.data.len(),
            offsets_length: self.offsets.len(),
            distinct_blocks: self.chunk_offsets.len(),
            overlap: self.total_overlap(),
        }
    }

    /// Element `index` of the original array.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        let offset = *self.offsets.get(index / self.block_size)?;
        self.data.get(offset + index % self.block_size).copied()
    }
}

/// Partition `data` into blocks of `block_size`, compress the distinct
/// blocks and index them.
///
/// # Panics
/// Panics if `block_size` is zero.
///
/// # Example
/// ```
/// use cm_compress::{ChunksCompressor, compress_array};
/// let data = [0, 0, 1, 2, 0, 0, 2, 3];
/// let mut compressor = ChunksCompressor::new();
/// let a = compress_array(&mut compressor, 2, &data);
/// assert!(a.data.len() < data.len());
/// assert!((0..data.len()).all(|i| a.get(i) == Some(data[i])));
/// ```
pub fn compress_array<T: Element>(
    compressor: &mut ChunksCompressor<T>,
    block_size: usize,
    data: &[T],
) -> CompressedArray<T> {
    let groups = Groups::partition(block_size, data);
    let s = compressor.compress(groups.chunks().cloned());
    let array = CompressedArray::from_overlapped_sequences(&s, &groups);
    let stats = array.stats();
    log::trace!(
        "Bloc {block_size} : {} → {} éléments ({} blocs distincts, {} partagés)",
        data.len(),
        stats.data_length,
        stats.distinct_blocks,
        stats.overlap
    );
    array
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(items: &[i32]) -> Chunk<i32> {
        Chunk::new(items)
    }

    #[test]
    fn offsets_follow_block_order() {
        let (c1, c2, c3, c4) = (c(&[1, 2, 3, 4]), c(&[2, 3]), c(&[3, 4, 5]), c(&[1, 3]));
        let s = OverlappedSequences::from_ordered_chunks([c1.clone(), c2.clone(), c3.clone(), c4]);
        let groups = Groups::from_groups(4, [(c1, vec![0, 3]), (c2, vec![4]), (c3, vec![1, 2])]);
        let a = CompressedArray::from_overlapped_sequences(&s, &groups);
        assert_eq!(a.offsets, vec![0, 2, 2, 0, 1]);
        assert_eq!(a.data, s.data().to_vec());
        assert_eq!(&a.chunk_offsets, s.offsets());
    }

    #[test]
    fn every_block_decodes() {
        let groups = Groups::from_groups(
            3,
            [
                (c(&[1, 2, 3]), vec![0]),
                (c(&[-1, 0, 1]), vec![1]),
                (c(&[-2, -1, 0]), vec![2]),
                (c(&[3, 4, 5]), vec![3]),
                (c(&[0, 1, 2]), vec![4]),
                (c(&[2, 3, 5]), vec![5]),
            ],
        );
        let mut compressor = ChunksCompressor::new();
        let s = compressor.compress(groups.chunks().cloned());
        let a = CompressedArray::from_overlapped_sequences(&s, &groups);
        for (chunk, indices) in groups.iter() {
            for &i in indices {
                let o = a.offsets[i];
                assert_eq!(&a.data[o..o + chunk.len()], chunk.as_slice());
            }
        }
    }

    #[test]
    fn round_trip_with_short_final_block() {
        let data: Vec<u16> = (0..37).map(|i| (i % 5) as u16).collect();
        let mut compressor = ChunksCompressor::new();
        for block_size in [1, 2, 4, 8, 16, 64] {
            let a = compress_array(&mut compressor, block_size, &data);
            assert_eq!(a.offsets.len(), data.len().div_ceil(block_size));
            for (i, &v) in data.iter().enumerate() {
                assert_eq!(a.get(i), Some(v), "bloc {block_size}, index {i}");
            }
        }
    }

    #[test]
    fn total_overlap_counts_shared_elements() {
        let mut compressor = ChunksCompressor::new();
        let a = compress_array(&mut compressor, 2, &[1, 2, 2, 3]);
        assert_eq!(a.data, vec![1, 2, 3]);
        assert_eq!(a.total_overlap(), 1);
        assert_eq!(
            a.stats(),
            ArrayStats {
                data_length: 3,
                offsets_length: 2,
                distinct_blocks: 2,
                overlap: 1,
            }
        );
    }
}
