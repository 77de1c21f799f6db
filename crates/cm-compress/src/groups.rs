use std::collections::HashMap;

use crate::chunk::{Chunk, Element};

/// Blocs distincts d'un tableau partitionné, avec les indices qui les produisent.
///
/// Groups keep first-appearance order and each index list is ascending, so
/// identical input always gives identical groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Groups<T> {
    block_size: usize,
    num_blocks: usize,
    groups: Vec<(Chunk<T>, Vec<usize>)>,
}

impl<T: Element> Groups<T> {
    /// Split `data` into consecutive blocks of `block_size` and group equal blocks.
    ///
    /// The final block is shorter when `data.len()` is not a multiple of
    /// `block_size`.
    ///
    /// # Panics
    /// Panics if `block_size` is zero.
    ///
    /// # Example
    /// ```
    /// use cm_compress::Groups;
    /// let g = Groups::partition(2, &[0, 0, 1, 2, 0, 0, 1]);
    /// assert_eq!(g.num_blocks(), 4);
    /// assert_eq!(g.len(), 3);
    /// assert_eq!(g.indices(&[0, 0]), Some(&[0, 2][..]));
    /// ```
    #[must_use]
    pub fn partition(block_size: usize, data: &[T]) -> Self {
        assert!(block_size > 0, "block_size doit être > 0");
        let mut index: HashMap<Chunk<T>, usize> = HashMap::new();
        let mut groups: Vec<(Chunk<T>, Vec<usize>)> = Vec::new();
        let mut num_blocks = 0;
        for (n, block) in data.chunks(block_size).enumerate() {
            num_blocks += 1;
            if let Some(&g) = index.get(block) {
                groups[g].1.push(n);
            } else {
                let chunk = Chunk::new(block);
                index.insert(chunk.clone(), groups.len());
                groups.push((chunk, vec![n]));
            }
        }
        Self {
            block_size,
            num_blocks,
            groups,
        }
    }

    /// Build groups from explicit `(chunk, indices)` pairs.
    #[must_use]
    pub fn from_groups<I>(block_size: usize, groups: I) -> Self
    where
        I: IntoIterator<Item = (Chunk<T>, Vec<usize>)>,
    {
        let groups: Vec<_> = groups.into_iter().collect();
        let num_blocks = groups.iter().map(|(_, idx)| idx.len()).sum();
        Self {
            block_size,
            num_blocks,
            groups,
        }
    }

    #[inline]
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks of the partition.
    #[inline]
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Number of distinct blocks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Chunk<T>, &[usize])> {
        self.groups.iter().map(|(c, idx)| (c, idx.as_slice()))
    }

    /// Distinct chunks, in first-appearance order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk<T>> {
        self.groups.iter().map(|(c, _)| c)
    }

    /// Block indices holding `chunk`.
    #[must_use]
    pub fn indices(&self, chunk: &[T]) -> Option<&[usize]> {
        self.groups
            .iter()
            .find(|(c, _)| c.as_slice() == chunk)
            .map(|(_, idx)| idx.as_slice())
    }

    /// Chunk of every block, in block order. `None` marks an uncovered index.
    #[must_use]
    pub fn block_chunks(&self) -> Vec<Option<&Chunk<T>>> {
        let mut blocks = vec![None; self.num_blocks];
        for (chunk, idx) in &self.groups {
            for &i in idx {
                if let Some(slot) = blocks.get_mut(i) {
                    *slot = Some(chunk);
                }
            }
        }
        blocks
    }

    /// Every block index in `0..num_blocks` belongs to exactly one group.
    #[must_use]
    pub fn is_covering(&self) -> bool {
        let mut seen = vec![false; self.num_blocks];
        for &i in self.groups.iter().flat_map(|(_, idx)| idx) {
            match seen.get_mut(i) {
                Some(s) if !*s => *s = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|s| s)
    }
}
