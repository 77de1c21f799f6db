use proptest::prelude::*;

use crate::{Chunk, ChunksCompressor, Groups, OverlappedSequences, compress_array};

prop_compose! {
    /// Small chunks over a small alphabet, so overlaps are frequent.
    fn arb_chunks()(
        chunks in prop::collection::vec(prop::collection::vec(0u8..4, 1..6), 0..12),
    ) -> Vec<Chunk<u8>> {
        chunks.into_iter().map(Chunk::from).collect()
    }
}

prop_compose! {
    /// Sparse array: zero runs with a few repeated non-zero values.
    fn arb_sparse()(
        values in prop::collection::vec(prop_oneof![4 => Just(0i16), 1 => -3i16..3], 0..200),
    ) -> Vec<i16> {
        values
    }
}

proptest! {
    /// Property: every input chunk is found at its recorded offset
    #[test]
    fn prop_compress_contains_every_chunk(chunks in arb_chunks()) {
        let mut compressor = ChunksCompressor::new();
        let s = compressor.compress(chunks.iter().cloned());
        prop_assert!(s.check());
        for c in &chunks {
            prop_assert!(s.offset_of(c).is_some());
        }
        let total: usize = s.offsets().keys().map(|c| c.len()).sum();
        prop_assert!(s.len() <= total);
    }

    /// Property: compressing the flattened result never loses overlap
    #[test]
    fn prop_recompress_is_idempotent(chunks in arb_chunks()) {
        let mut compressor = ChunksCompressor::new();
        let first = compressor.compress(chunks);
        let second = compressor.compress(first.flatten());
        prop_assert!(second.total_overlap() >= first.total_overlap());
    }

    /// Property: greedy and ordered folds both keep the containment invariant
    #[test]
    fn prop_folds_keep_containment(chunks in arb_chunks()) {
        prop_assert!(OverlappedSequences::from_chunks(chunks.iter().cloned()).check());
        prop_assert!(OverlappedSequences::from_ordered_chunks(chunks).check());
    }

    /// Property: groups cover every block exactly once
    #[test]
    fn prop_groups_cover_blocks(data in arb_sparse(), k in 0u32..5) {
        let groups = Groups::partition(1 << k, &data);
        prop_assert!(groups.is_covering());
        prop_assert_eq!(groups.num_blocks(), data.len().div_ceil(1 << k));
    }

    /// Property: every element of the array decodes from the compressed form
    #[test]
    fn prop_compressed_array_round_trip(data in arb_sparse(), k in 0u32..5) {
        let mut compressor = ChunksCompressor::new();
        let a = compress_array(&mut compressor, 1 << k, &data);
        for (i, &v) in data.iter().enumerate() {
            prop_assert_eq!(a.get(i), Some(v));
        }
    }
}
