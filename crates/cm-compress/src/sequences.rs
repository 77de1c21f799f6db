use std::collections::BTreeMap;

use crate::chunk::{Chunk, Element};
use crate::compressor::ChunkPair;
use crate::overlap::Overlap;

/// Tampon compact contenant plusieurs chunks qui se recouvrent.
///
/// `offsets` maps every inserted chunk value to its position in `data`.
/// Invariant: `data[offset..offset + chunk.len()] == chunk` for every entry.
///
/// # Example
/// ```
/// use cm_compress::{Chunk, OverlappedSequences};
/// let s = OverlappedSequences::from_ordered_chunks([Chunk::from([1, 2, 3]), Chunk::from([3, 4])]);
/// assert_eq!(s.data().as_slice(), &[1, 2, 3, 4]);
/// assert_eq!(s.offset_of(&[3, 4]), Some(2));
/// assert_eq!(s.total_overlap(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlappedSequences<T> {
    data: Chunk<T>,
    offsets: BTreeMap<Chunk<T>, usize>,
}

impl<T: Element> Default for OverlappedSequences<T> {
    fn default() -> Self {
        Self {
            data: Chunk::empty(),
            offsets: BTreeMap::new(),
        }
    }
}

impl<T: Element> OverlappedSequences<T> {
    /// Empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a sequence from a buffer and its offset table.
    #[must_use]
    pub fn from_parts(data: Chunk<T>, offsets: BTreeMap<Chunk<T>, usize>) -> Self {
        let s = Self { data, offsets };
        debug_assert!(s.check(), "chunk absent de son offset : {s:?}");
        s
    }

    #[must_use]
    pub fn from_singleton(chunk: Chunk<T>) -> Self {
        Self {
            data: chunk.clone(),
            offsets: BTreeMap::from([(chunk, 0)]),
        }
    }

    /// `first` followed by the non-overlapping tail of `second`.
    #[must_use]
    pub fn from_pair(pair: &ChunkPair<T>) -> Self {
        let data = pair.first.concat(&pair.second[pair.overlap..]);
        let offsets = BTreeMap::from([
            (pair.first.clone(), 0),
            (pair.second.clone(), pair.first.len() - pair.overlap),
        ]);
        Self::from_parts(data, offsets)
    }

    /// Greedy fold of [`OverlappedSequences::add`].
    pub fn from_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Chunk<T>>,
    {
        chunks.into_iter().fold(Self::new(), |mut s, c| {
            s.add(c);
            s
        })
    }

    /// Fold of [`OverlappedSequences::append`], keeping the given order.
    pub fn from_ordered_chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Chunk<T>>,
    {
        chunks.into_iter().fold(Self::new(), |mut s, c| {
            s.append(c);
            s
        })
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &Chunk<T> {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn offsets(&self) -> &BTreeMap<Chunk<T>, usize> {
        &self.offsets
    }

    /// Offset of `chunk` in the buffer, if it was inserted.
    #[must_use]
    pub fn offset_of(&self, chunk: &[T]) -> Option<usize> {
        self.offsets.get(chunk).copied()
    }

    /// Length of the buffer.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge with `other` at the better of the two alignments
    /// (`other` in `self`, or `self` in `other`). Ties keep `self` first.
    #[must_use]
    pub fn extend(&self, other: &Self) -> Self {
        let forward = Overlap::compute(&self.data, &other.data);
        let backward = Overlap::compute(&other.data, &self.data);
        let (overlap, s1, s2) = if backward.overlap > forward.overlap {
            (backward, other, self)
        } else {
            (forward, self, other)
        };

        let data = if overlap.offset + s2.len() <= s1.len() {
            s1.data.clone()
        } else {
            s1.data.concat(&s2.data[overlap.overlap..])
        };
        let mut offsets = s1.offsets.clone();
        for (c, o) in &s2.offsets {
            offsets.insert(c.clone(), overlap.offset + o);
        }
        Self::from_parts(data, offsets)
    }

    /// Add `chunk` at its best alignment, possibly before the buffer.
    pub fn add(&mut self, chunk: Chunk<T>) {
        *self = self.extend(&Self::from_singleton(chunk));
    }

    /// Add `chunk` at its best alignment inside or after the buffer.
    ///
    /// # Example
    /// ```
    /// use cm_compress::{Chunk, OverlappedSequences};
    /// let mut s = OverlappedSequences::from_singleton(Chunk::from([1, 2, 3, 4]));
    /// s.append(Chunk::from([2, 3]));
    /// s.append(Chunk::from([1, 3]));
    /// assert_eq!(s.data().as_slice(), &[1, 2, 3, 4, 1, 3]);
    /// assert_eq!(s.offset_of(&[2, 3]), Some(1));
    /// ```
    pub fn append(&mut self, chunk: Chunk<T>) {
        let overlap = Overlap::compute(&self.data, &chunk);
        if overlap.offset + chunk.len() > self.len() {
            self.data = self.data.concat(&chunk[overlap.overlap..]);
        }
        self.offsets.insert(chunk, overlap.offset);
        debug_assert!(self.check());
    }

    /// Insert `chunk` at `offset`, sharing `overlap` elements with the buffer.
    ///
    /// A negative `offset` prepends the first `-offset` elements of `chunk`
    /// and shifts every recorded offset. A chunk that fits inside the buffer
    /// only records its offset. Otherwise the non-overlapping tail is
    /// appended.
    pub fn insert(&mut self, offset: isize, overlap: usize, chunk: Chunk<T>) {
        if offset < 0 {
            let shift = offset.unsigned_abs();
            self.data = Chunk::new(&chunk[..shift]).concat(&self.data);
            for o in self.offsets.values_mut() {
                *o += shift;
            }
            self.offsets.insert(chunk, 0);
        } else {
            let offset = offset as usize;
            if offset + chunk.len() > self.len() {
                self.data = self.data.concat(&chunk[overlap..]);
            }
            self.offsets.insert(chunk, offset);
        }
        debug_assert!(self.check(), "insertion invalide : {self:?}");
    }

    /// Merge the whole sequence `other` at `offset`, with the same three
    /// cases as [`OverlappedSequences::insert`].
    pub fn merge(&mut self, offset: isize, overlap: usize, other: Self) {
        if offset < 0 {
            let shift = offset.unsigned_abs();
            self.data = Chunk::new(&other.data[..shift]).concat(&self.data);
            for o in self.offsets.values_mut() {
                *o += shift;
            }
            self.offsets.extend(other.offsets);
        } else {
            let offset = offset as usize;
            if offset + other.len() > self.len() {
                self.data = self.data.concat(&other.data[overlap..]);
            }
            self.offsets
                .extend(other.offsets.into_iter().map(|(c, o)| (c, o + offset)));
        }
        debug_assert!(self.check(), "fusion invalide : {self:?}");
    }

    /// Chunks sorted by offset (then by value).
    pub fn flatten_iter(&self) -> impl Iterator<Item = &Chunk<T>> {
        let mut items: Vec<(usize, &Chunk<T>)> =
            self.offsets.iter().map(|(c, &o)| (o, c)).collect();
        items.sort_unstable();
        items.into_iter().map(|(_, c)| c)
    }

    #[must_use]
    pub fn flatten(&self) -> Vec<Chunk<T>> {
        self.flatten_iter().cloned().collect()
    }

    /// Flattened chunks grouped into runs where each chunk overlaps its
    /// predecessor.
    #[must_use]
    pub fn flatten_groups(&self) -> Vec<Vec<Chunk<T>>> {
        let mut groups: Vec<Vec<Chunk<T>>> = Vec::new();
        for c in self.flatten_iter() {
            match groups.last_mut() {
                Some(g)
                    if g.last()
                        .is_some_and(|prev| Overlap::compute(prev, c).overlap > 0) =>
                {
                    g.push(c.clone());
                }
                _ => groups.push(vec![c.clone()]),
            }
        }
        groups
    }

    /// Cut the buffer into independent sub-sequences: a new one starts where
    /// a chunk begins at or after the end of every previous chunk.
    ///
    /// # Example
    /// ```
    /// use cm_compress::{Chunk, OverlappedSequences};
    /// let s = OverlappedSequences::from_ordered_chunks([Chunk::from([1, 2]), Chunk::from([3])]);
    /// let parts = s.split();
    /// assert_eq!(parts.len(), 2);
    /// assert_eq!(parts[1].data().as_slice(), &[3]);
    /// ```
    #[must_use]
    pub fn split(&self) -> Vec<Self> {
        let mut parts = Vec::new();
        let mut pending = BTreeMap::new();
        let mut start = 0;
        let mut end = 0;
        for c in self.flatten_iter() {
            let i = self.offsets[c];
            if end > 0 && i >= end {
                let offsets = std::mem::take(&mut pending);
                parts.push(Self::from_parts(
                    Chunk::new(&self.data[start..end]),
                    offsets,
                ));
                start = i;
            }
            pending.insert(c.clone(), i - start);
            end = end.max(i + c.len());
        }
        if !pending.is_empty() {
            parts.push(Self::from_parts(Chunk::new(&self.data[start..end]), pending));
        }
        parts
    }

    /// Elements saved by overlapping: sum of chunk lengths minus buffer length.
    #[must_use]
    pub fn total_overlap(&self) -> isize {
        let chunks: usize = self.offsets.keys().map(|c| c.len()).sum();
        chunks as isize - self.len() as isize
    }

    /// Containment invariant: every chunk is found at its recorded offset.
    #[must_use]
    pub fn check(&self) -> bool {
        self.offsets
            .iter()
            .all(|(c, &o)| self.data.get(o..o + c.len()) == Some(c.as_slice()))
    }
}
