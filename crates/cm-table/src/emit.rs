use cm_core::entry::{Domain, PackedEntry};
use serde::{Deserialize, Serialize};

use crate::solution::{Solution, shr};
use crate::width::IntWidth;

/// Tables prêtes à être embarquées : tableaux compactés et constantes de décodage.
///
/// Data words hold `delta << 2 | upper << 1 | lower` in `data_width` bits;
/// offsets are plain unsigned values of their own widths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedTables {
    pub domain: Domain,
    pub k1: u32,
    pub k2: u32,
    /// `k1 + k2`.
    pub shift: u32,
    pub mask1: u32,
    pub mask2: u32,
    pub max_key: u32,
    pub data_width: IntWidth,
    pub offsets1_width: IntWidth,
    pub offsets2_width: IntWidth,
    pub data: Vec<u64>,
    pub offsets1: Vec<u64>,
    pub offsets2: Vec<u64>,
    /// Total size in bits.
    pub total_bits: u64,
}

impl EmittedTables {
    /// Pack a solution at its own data width.
    #[must_use]
    pub fn from_solution(solution: &Solution) -> Self {
        Self::with_data_width(solution, solution.data_width)
    }

    /// Pack a solution at `data_width`, widened to the solution's own width
    /// if narrower. Both domains share one entry layout at runtime.
    #[must_use]
    pub fn with_data_width(solution: &Solution, data_width: IntWidth) -> Self {
        let data_width = data_width.max(solution.data_width);
        let widen = |v: &[usize]| v.iter().map(|&x| x as u64).collect::<Vec<_>>();
        let mut stats = solution.stats();
        stats.data_width = data_width;
        Self {
            domain: solution.domain,
            k1: solution.k1,
            k2: solution.k2,
            shift: solution.shift(),
            mask1: solution.mask1(),
            mask2: solution.mask2(),
            max_key: solution.max_key,
            data_width,
            offsets1_width: solution.offsets1_width,
            offsets2_width: solution.offsets2_width,
            data: solution.packed_data(data_width),
            offsets1: widen(&solution.offsets1),
            offsets2: widen(&solution.offsets2),
            total_bits: stats.total(),
        }
    }

    /// Packed entry of `key`, or `None` outside `0..=max_key`.
    ///
    /// # Example
    /// ```
    /// use cm_core::entry::{Domain, Entry};
    /// use cm_core::input::DomainEntries;
    /// use cm_table::{EmittedTables, Optimizer};
    ///
    /// let mut entries = vec![Entry::ZERO; 0x80];
    /// entries[0x41] = Entry::new(32, 0, false, true);
    /// entries[0x61] = Entry::new(0, 32, true, false);
    /// let domain = DomainEntries::from_dense(Domain::Legacy, entries).unwrap();
    /// let (solution, _) = Optimizer::default().optimize(&domain).unwrap();
    /// let tables = EmittedTables::from_solution(&solution);
    /// let a = tables.lookup(0x41).unwrap();
    /// assert!(a.lower && !a.upper);
    /// assert_eq!(a.to_lower(0x41), 0x61);
    /// ```
    #[must_use]
    pub fn lookup(&self, key: u32) -> Option<PackedEntry> {
        if key > self.max_key {
            return None;
        }
        let slot = *self.offsets2.get(shr(key, self.shift) as usize)? as usize
            + (shr(key, self.k1) & self.mask2) as usize;
        let base = *self.offsets1.get(slot)? as usize;
        let word = *self.data.get(base + (key & self.mask1) as usize)?;
        Some(PackedEntry::from_bits(word, self.data_width.bits()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_core::entry::Entry;

    fn solution() -> Solution {
        Solution {
            domain: Domain::Unicode,
            k1: 1,
            k2: 1,
            data: vec![Entry::ZERO, Entry::new(-5, 0, false, true), Entry::new(0, -5, true, false)],
            data_width: IntWidth::W8,
            data_overlap: 1,
            offsets1: vec![0, 1],
            offsets1_width: IntWidth::W8,
            offsets2: vec![0],
            offsets2_width: IntWidth::W8,
            max_key: 3,
        }
    }

    #[test]
    fn packed_lookup_matches_solution() {
        let s = solution();
        let t = EmittedTables::from_solution(&s);
        assert_eq!((t.shift, t.mask1, t.mask2), (2, 1, 1));
        for key in 0..=3 {
            let entry = s.lookup(key).unwrap();
            assert_eq!(t.lookup(key), Some(PackedEntry::from(entry)));
        }
        assert_eq!(t.lookup(4), None);
        assert_eq!(t.total_bits, s.total());
    }

    #[test]
    fn negative_deltas_survive_packing() {
        let t = EmittedTables::from_solution(&solution());
        let p = t.lookup(2).unwrap();
        assert_eq!(p.delta, -5);
        assert_eq!(p.to_lower(10), 5);
    }

    #[test]
    fn shared_width_only_widens() {
        let s = solution();
        let wide = EmittedTables::with_data_width(&s, IntWidth::W32);
        assert_eq!(wide.data_width, IntWidth::W32);
        assert_eq!(wide.total_bits, s.total() + 3 * 24);
        assert_eq!(wide.lookup(3), EmittedTables::from_solution(&s).lookup(3));
        let narrow = EmittedTables::with_data_width(&s, IntWidth::W8);
        assert_eq!(narrow.data_width, IntWidth::W8);
    }

    #[test]
    fn serializes_to_json() {
        let t = EmittedTables::from_solution(&solution());
        let json = serde_json::to_string(&t).unwrap();
        let back: EmittedTables = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
