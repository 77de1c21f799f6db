use std::collections::BTreeSet;

use crate::chunk::{Chunk, Element};
use crate::overlap::{Overlap, OverlapCache};
use crate::sequences::OverlappedSequences;

/// Deux chunks encore libres dont la fin de `first` recouvre le début de `second`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkPair<T> {
    pub first: Chunk<T>,
    pub second: Chunk<T>,
    pub overlap: usize,
}

impl<T: Element> ChunkPair<T> {
    #[must_use]
    pub fn contains(&self, chunk: &[T]) -> bool {
        self.first.as_slice() == chunk || self.second.as_slice() == chunk
    }

    /// Every pair of `chunks` with a positive suffix/prefix overlap, in
    /// either order.
    #[must_use]
    pub fn candidates(chunks: &[Chunk<T>]) -> Vec<Self> {
        let mut pairs = Vec::new();
        for (i, a) in chunks.iter().enumerate() {
            for b in &chunks[i + 1..] {
                for (first, second) in [(a, b), (b, a)] {
                    let overlap = Overlap::compute_simple(first, second);
                    if overlap > 0 {
                        pairs.push(Self {
                            first: first.clone(),
                            second: second.clone(),
                            overlap,
                        });
                    }
                }
            }
        }
        pairs
    }

    /// First pair with the largest overlap.
    fn best(pairs: &[Self]) -> Option<&Self> {
        pairs
            .iter()
            .reduce(|best, p| if p.overlap > best.overlap { p } else { best })
    }
}

/// Working state of one compression run.
#[derive(Debug)]
struct State<T> {
    pairs: Vec<ChunkPair<T>>,
    remaining: BTreeSet<Chunk<T>>,
    sequences: Vec<OverlappedSequences<T>>,
}

impl<T: Element> State<T> {
    fn new(chunks: BTreeSet<Chunk<T>>) -> Self {
        let ordered: Vec<Chunk<T>> = chunks.iter().cloned().collect();
        Self {
            pairs: ChunkPair::candidates(&ordered),
            remaining: chunks,
            sequences: Vec::new(),
        }
    }

    fn consume(&mut self, chunk: &Chunk<T>) {
        self.remaining.remove(chunk);
        self.pairs.retain(|p| !p.contains(chunk));
    }
}

#[derive(Clone, Debug)]
enum Move<T> {
    /// Chunk into sequence `index` (negative offset: prepend).
    Insert {
        chunk: Chunk<T>,
        index: usize,
        offset: isize,
        overlap: usize,
    },
    /// Sequence `index2` into sequence `index1`.
    Merge {
        index1: usize,
        index2: usize,
        offset: isize,
        overlap: usize,
    },
    NewSingleton(Chunk<T>),
    NewPair(ChunkPair<T>),
}

impl<T: Element> Move<T> {
    /// Apply the move and return the buffers it made obsolete.
    fn apply(self, state: &mut State<T>) -> Vec<Chunk<T>> {
        match self {
            Self::Insert {
                chunk,
                index,
                offset,
                overlap,
            } => {
                state.consume(&chunk);
                let s = &mut state.sequences[index];
                let old = s.data().clone();
                s.insert(offset, overlap, chunk);
                if s.len() == old.len() {
                    Vec::new()
                } else {
                    vec![old]
                }
            }
            Self::Merge {
                index1,
                index2,
                offset,
                overlap,
            } => {
                let other = state.sequences.remove(index2);
                let index1 = if index1 > index2 { index1 - 1 } else { index1 };
                let s = &mut state.sequences[index1];
                let old = s.data().clone();
                let mut stale = vec![other.data().clone()];
                s.merge(offset, overlap, other);
                if s.len() != old.len() {
                    stale.push(old);
                }
                stale
            }
            Self::NewSingleton(chunk) => {
                state.consume(&chunk);
                state
                    .sequences
                    .push(OverlappedSequences::from_singleton(chunk));
                Vec::new()
            }
            Self::NewPair(pair) => {
                state.remaining.remove(&pair.first);
                state.remaining.remove(&pair.second);
                state
                    .pairs
                    .retain(|p| !p.contains(&pair.first) && !p.contains(&pair.second));
                state.sequences.push(OverlappedSequences::from_pair(&pair));
                Vec::new()
            }
        }
    }
}

/// Moteur glouton de fusion de chunks par recouvrement.
///
/// Each step applies the move with the largest overlap among: inserting a
/// free chunk into a sequence (before it, inside it or after it), merging two
/// sequences, or starting a sequence from the best free pair. With no
/// overlapping move left, the smallest free chunk starts a new sequence.
/// Sequences left at the end share nothing and are concatenated in order.
///
/// Ties go to the first candidate in scan order, so a run is deterministic.
///
/// # Example
/// ```
/// use cm_compress::{Chunk, ChunksCompressor};
/// let mut compressor = ChunksCompressor::new();
/// let s = compressor.compress([
///     Chunk::from([1, 2, 3, 4]),
///     Chunk::from([2, 3, 4, 5]),
///     Chunk::from([0, 1, 2, 3]),
/// ]);
/// assert_eq!(s.data().as_slice(), &[0, 1, 2, 3, 4, 5]);
/// assert_eq!(s.offset_of(&[2, 3, 4, 5]), Some(2));
/// ```
#[derive(Debug)]
pub struct ChunksCompressor<T> {
    cache: OverlapCache<T>,
}

impl<T: Element> Default for ChunksCompressor<T> {
    fn default() -> Self {
        Self {
            cache: OverlapCache::new(),
        }
    }
}

impl<T: Element> ChunksCompressor<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cache(&self) -> &OverlapCache<T> {
        &self.cache
    }

    /// Drop memoized overlaps; results are unaffected.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Pack every distinct chunk into one sequence.
    ///
    /// Duplicates are collapsed. An empty input gives an empty sequence.
    pub fn compress<I>(&mut self, chunks: I) -> OverlappedSequences<T>
    where
        I: IntoIterator<Item = Chunk<T>>,
    {
        let mut state = State::new(chunks.into_iter().collect());
        let total = state.remaining.len();
        log::debug!(
            "Compression : {total} chunks distincts, {} paires candidates",
            state.pairs.len()
        );

        let mut moved = false;
        while !state.remaining.is_empty() || (state.sequences.len() > 1 && moved) {
            let next = self
                .best_move(&state)
                .or_else(|| state.remaining.first().cloned().map(Move::NewSingleton));
            moved = next.is_some();
            if let Some(m) = next {
                log::trace!(
                    "{}/{total} restants, {} séquences : {m:?}",
                    state.remaining.len(),
                    state.sequences.len()
                );
                for stale in m.apply(&mut state) {
                    self.cache.evict(&stale);
                }
            }
        }

        if state.sequences.len() > 1 {
            log::debug!(
                "Concaténation forcée de {} séquences",
                state.sequences.len()
            );
            debug_assert!(Self::no_mutual_overlap(&state.sequences));
        }
        while state.sequences.len() > 1 {
            let offset = state.sequences[0].len() as isize;
            Move::Merge {
                index1: 0,
                index2: 1,
                offset,
                overlap: 0,
            }
            .apply(&mut state);
        }

        let result = state.sequences.pop().unwrap_or_default();
        let (hits, misses) = self.cache.stats();
        log::debug!(
            "Compression terminée : {} éléments, recouvrement {} (cache {hits}/{misses})",
            result.len(),
            result.total_overlap()
        );
        result
    }

    fn best_move(&mut self, state: &State<T>) -> Option<Move<T>> {
        let mut best = None;
        let mut best_overlap = 0;

        for (n, s) in state.sequences.iter().enumerate() {
            for d in &state.remaining {
                let overlap = self.cache.simple(d, s.data());
                if overlap > best_overlap {
                    best_overlap = overlap;
                    best = Some(Move::Insert {
                        chunk: d.clone(),
                        index: n,
                        offset: overlap as isize - d.len() as isize,
                        overlap,
                    });
                }
                let o = self.cache.general(s.data(), d);
                if o.overlap > best_overlap {
                    best_overlap = o.overlap;
                    best = Some(Move::Insert {
                        chunk: d.clone(),
                        index: n,
                        offset: o.offset as isize,
                        overlap: o.overlap,
                    });
                }
            }
        }

        for (n1, s1) in state.sequences.iter().enumerate() {
            for (n2, s2) in state.sequences.iter().enumerate() {
                if n1 == n2 {
                    continue;
                }
                let o = self.cache.general(s1.data(), s2.data());
                if o.overlap > best_overlap {
                    best_overlap = o.overlap;
                    best = Some(Move::Merge {
                        index1: n1,
                        index2: n2,
                        offset: o.offset as isize,
                        overlap: o.overlap,
                    });
                }
            }
        }

        if let Some(pair) = ChunkPair::best(&state.pairs)
            && pair.overlap > best_overlap
        {
            best = Some(Move::NewPair(pair.clone()));
        }
        best
    }

    fn no_mutual_overlap(sequences: &[OverlappedSequences<T>]) -> bool {
        sequences.iter().enumerate().all(|(n1, s1)| {
            sequences
                .iter()
                .enumerate()
                .all(|(n2, s2)| n1 == n2 || Overlap::compute(s1.data(), s2.data()).overlap == 0)
        })
    }
}
