use std::collections::HashMap;
use std::collections::hash_map::Entry as MapEntry;

use crate::chunk::{Chunk, Element};

/// Alignement de deux séquences : `s2` commence à `offset` dans `s1` et
/// partage `overlap` éléments avec elle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Overlap {
    pub offset: usize,
    pub overlap: usize,
}

impl Overlap {
    /// Longest suffix of `s1` that is a prefix of `s2`.
    ///
    /// # Example
    /// ```
    /// use cm_compress::Overlap;
    /// assert_eq!(Overlap::compute_simple(&[1, 2, 3], &[2, 3, 4]), 2);
    /// assert_eq!(Overlap::compute_simple(&[1, 2, 3], &[4]), 0);
    /// ```
    #[must_use]
    pub fn compute_simple<T: PartialEq>(s1: &[T], s2: &[T]) -> usize {
        let max = s1.len().min(s2.len());
        (1..=max)
            .rev()
            .find(|&n| s1[s1.len() - n..] == s2[..n])
            .unwrap_or(0)
    }

    /// Best alignment of `s2` starting inside `s1`.
    ///
    /// Candidate starts are scanned in `0..len(s1)`; the first maximal overlap
    /// wins. `s2` may be contained in `s1` or run past its end. Without any
    /// match the result is `(len(s1), 0)`: append with nothing shared.
    ///
    /// # Example
    /// ```
    /// use cm_compress::Overlap;
    /// assert_eq!(Overlap::compute(&[1, 2, 3, 4], &[2, 3]), Overlap { offset: 1, overlap: 2 });
    /// assert_eq!(Overlap::compute(&[3, 2, 1], &[1, 2, 3, 4]), Overlap { offset: 2, overlap: 1 });
    /// assert_eq!(Overlap::compute(&[1, 2, 3, 4], &[1, 2, 4]), Overlap { offset: 4, overlap: 0 });
    /// ```
    #[must_use]
    pub fn compute<T: PartialEq>(s1: &[T], s2: &[T]) -> Self {
        let l1 = s1.len();
        let l2 = s2.len();
        let mut best = Self {
            offset: l1,
            overlap: 0,
        };
        for start in 0..l1 {
            let end = (start + l2).min(l1);
            let overlap = end - start;
            if overlap <= best.overlap {
                // Overlaps only shrink from here on.
                if start + l2 >= l1 {
                    break;
                }
                continue;
            }
            if s1[start..end] == s2[..overlap] {
                best = Self {
                    offset: start,
                    overlap,
                };
            }
        }
        best
    }
}

/// Table de mémoïsation des calculs de recouvrement.
///
/// Keyed by the value pair `(s1, s2)`. Owned by one compressor; results never
/// change meaning, so clearing only costs time.
#[derive(Debug)]
pub struct OverlapCache<T> {
    simple: HashMap<(Chunk<T>, Chunk<T>), usize>,
    general: HashMap<(Chunk<T>, Chunk<T>), Overlap>,
    hits: u64,
    misses: u64,
}

impl<T: Element> Default for OverlapCache<T> {
    fn default() -> Self {
        Self {
            simple: HashMap::new(),
            general: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<T: Element> OverlapCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized [`Overlap::compute_simple`].
    pub fn simple(&mut self, s1: &Chunk<T>, s2: &Chunk<T>) -> usize {
        match self.simple.entry((s1.clone(), s2.clone())) {
            MapEntry::Occupied(e) => {
                self.hits += 1;
                *e.get()
            }
            MapEntry::Vacant(e) => {
                self.misses += 1;
                *e.insert(Overlap::compute_simple(s1, s2))
            }
        }
    }

    /// Memoized [`Overlap::compute`].
    pub fn general(&mut self, s1: &Chunk<T>, s2: &Chunk<T>) -> Overlap {
        match self.general.entry((s1.clone(), s2.clone())) {
            MapEntry::Occupied(e) => {
                self.hits += 1;
                *e.get()
            }
            MapEntry::Vacant(e) => {
                self.misses += 1;
                *e.insert(Overlap::compute(s1, s2))
            }
        }
    }

    /// Forget every result involving `seq`, typically a buffer that was
    /// just replaced.
    pub fn evict(&mut self, seq: &[T]) {
        self.simple
            .retain(|(a, b), _| a.as_slice() != seq && b.as_slice() != seq);
        self.general
            .retain(|(a, b), _| a.as_slice() != seq && b.as_slice() != seq);
    }

    /// Number of memoized results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.simple.len() + self.general.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(hits, misses)` since creation or the last [`OverlapCache::clear`].
    #[must_use]
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.simple.clear();
        self.general.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_alignments() {
        let c1 = [1, 2, 3, 4];
        assert_eq!(
            Overlap::compute(&c1, &[3, 4, 5]),
            Overlap {
                offset: 2,
                overlap: 2
            }
        );
        assert_eq!(
            Overlap::compute(&[1, 2, 3], &c1),
            Overlap {
                offset: 0,
                overlap: 3
            }
        );
    }

    #[test]
    fn compute_prefers_first_start() {
        assert_eq!(
            Overlap::compute(&[7, 7, 7], &[7]),
            Overlap {
                offset: 0,
                overlap: 1
            }
        );
    }

    #[test]
    fn compute_with_empty_sequences() {
        let empty: [i32; 0] = [];
        assert_eq!(
            Overlap::compute(&empty, &[1, 2]),
            Overlap {
                offset: 0,
                overlap: 0
            }
        );
        assert_eq!(
            Overlap::compute(&[1, 2], &empty),
            Overlap {
                offset: 2,
                overlap: 0
            }
        );
        assert_eq!(Overlap::compute_simple(&empty, &[1]), 0);
    }

    #[test]
    fn compute_simple_is_suffix_prefix_only() {
        // (2, 3) is inside but not a suffix.
        assert_eq!(Overlap::compute_simple(&[1, 2, 3, 4], &[2, 3]), 0);
        assert_eq!(Overlap::compute_simple(&[6, 1], &[1, 2, 3]), 1);
        assert_eq!(Overlap::compute_simple(&[1, 2], &[1, 2]), 2);
    }

    #[test]
    fn cache_memoizes_by_value() {
        let mut cache = OverlapCache::new();
        let a = Chunk::from([1, 2, 3, 4]);
        let b = Chunk::from([3, 4, 5]);
        assert_eq!(cache.general(&a, &b).overlap, 2);
        // Same values, different allocations.
        let a2 = Chunk::from(vec![1, 2, 3, 4]);
        assert_eq!(cache.general(&a2, &b).offset, 2);
        assert_eq!(cache.simple(&a, &b), 2);
        assert_eq!(cache.stats(), (1, 2));
        assert_eq!(cache.len(), 2);
        cache.evict(&[3, 4, 5]);
        assert!(cache.is_empty());
        cache.general(&a, &b);
        cache.clear();
        assert!(cache.is_empty());
    }
}
