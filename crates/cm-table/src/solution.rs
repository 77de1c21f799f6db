use cm_core::entry::{Domain, Entry, PackedEntry};
use cm_core::error::TableError;
use cm_core::input::DomainEntries;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::optimizer::Stats;
use crate::width::IntWidth;

/// Meilleure table à deux niveaux trouvée pour un domaine.
///
/// Decode formula, with `mask1 = 2^k1 - 1` and `mask2 = 2^k2 - 1`:
///
/// ```text
/// slot  = offsets2[key >> (k1 + k2)] + ((key >> k1) & mask2)
/// entry = data[offsets1[slot] + (key & mask1)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub domain: Domain,
    /// Exposant de bloc du tableau de données.
    pub k1: u32,
    /// Exposant de bloc du tableau d'offsets.
    pub k2: u32,
    pub data: Vec<Entry>,
    pub data_width: IntWidth,
    /// Elements saved by overlapping data blocks.
    pub data_overlap: isize,
    pub offsets1: Vec<usize>,
    pub offsets1_width: IntWidth,
    pub offsets2: Vec<usize>,
    pub offsets2_width: IntWidth,
    /// Plus grande clé couverte.
    pub max_key: u32,
}

impl Solution {
    /// Right shift selecting the `offsets2` slot.
    #[inline]
    #[must_use]
    pub const fn shift(&self) -> u32 {
        self.k1.saturating_add(self.k2)
    }

    #[inline]
    #[must_use]
    pub const fn mask1(&self) -> u32 {
        low_mask(self.k1)
    }

    #[inline]
    #[must_use]
    pub const fn mask2(&self) -> u32 {
        low_mask(self.k2)
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        Stats {
            data_length: self.data.len(),
            data_width: self.data_width,
            data_overlap: self.data_overlap,
            offsets1_length: self.offsets1.len(),
            offsets1_width: self.offsets1_width,
            offsets2_length: self.offsets2.len(),
            offsets2_width: self.offsets2_width,
        }
    }

    /// Total encoded size in bits.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.stats().total()
    }

    /// Entry of `key`, or `None` outside `0..=max_key`.
    #[must_use]
    pub fn lookup(&self, key: u32) -> Option<Entry> {
        if key > self.max_key {
            return None;
        }
        let slot = *self.offsets2.get(shr(key, self.shift()) as usize)?
            + (shr(key, self.k1) & self.mask2()) as usize;
        let base = *self.offsets1.get(slot)?;
        self.data.get(base + (key & self.mask1()) as usize).copied()
    }

    /// Lower-case counterpart of `key`; `key` itself if uncased.
    #[must_use]
    pub fn to_lower(&self, key: u32) -> u32 {
        self.lookup(key).map_or(key, |e| e.to_lower(key))
    }

    /// Upper-case counterpart of `key`; `key` itself if uncased.
    #[must_use]
    pub fn to_upper(&self, key: u32) -> u32 {
        self.lookup(key).map_or(key, |e| e.to_upper(key))
    }

    /// Data array packed at `width` bits per entry.
    #[must_use]
    pub fn packed_data(&self, width: IntWidth) -> Vec<u64> {
        self.data
            .iter()
            .map(|&e| PackedEntry::from(e).to_bits(width.bits()))
            .collect()
    }
}

/// `2^bits - 1`, all ones from 32 bits up.
#[inline]
pub(crate) const fn low_mask(bits: u32) -> u32 {
    match 1u32.checked_shl(bits) {
        Some(b) => b - 1,
        None => u32::MAX,
    }
}

/// `key >> bits`, zero from 32 bits up.
#[inline]
pub(crate) const fn shr(key: u32, bits: u32) -> u32 {
    match key.checked_shr(bits) {
        Some(v) => v,
        None => 0,
    }
}

/// Vérifie l'aller-retour complet d'une solution.
///
/// Every key of `original` must decode to its entry, and every data entry
/// must survive packing at the chosen width.
///
/// # Errors
/// [`TableError::RoundTripMismatch`] for the smallest failing key, or
/// [`TableError::PackingMismatch`] for the first unpackable entry.
pub fn verify(solution: &Solution, original: &DomainEntries) -> Result<(), TableError> {
    let mismatch = (0..=original.max_key).into_par_iter().find_first(|&key| {
        solution.lookup(key) != Some(original.get(key))
    });
    if let Some(key) = mismatch {
        let expected = original.get(key);
        let got = solution.lookup(key);
        log::error!(
            "{} : clé 0x{key:04x} attendue {expected}, obtenue {got:?}",
            solution.domain
        );
        return Err(TableError::RoundTripMismatch { key, expected, got });
    }

    let width = solution.data_width.bits();
    if let Some(index) = solution.data.iter().position(|&e| {
        let p = PackedEntry::from(e);
        PackedEntry::from_bits(p.to_bits(width), width) != p
    }) {
        return Err(TableError::PackingMismatch { index, width });
    }

    log::debug!(
        "{} : aller-retour vérifié sur {} clés",
        solution.domain,
        u64::from(original.max_key) + 1
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built table: k1 = 1, k2 = 1, keys 0..=7.
    fn tiny() -> Solution {
        let a = Entry::new(1, 0, false, true);
        let b = Entry::new(0, 1, true, false);
        Solution {
            domain: Domain::Legacy,
            k1: 1,
            k2: 1,
            // Blocks: [Z, Z] at 0, [a, b] at 1 (shares nothing with Z).
            data: vec![Entry::ZERO, Entry::ZERO, a, b],
            data_width: IntWidth::W8,
            data_overlap: 0,
            // offsets1 blocks of 2: [0, 0] and [2, 0].
            offsets1: vec![0, 0, 2, 0],
            offsets1_width: IntWidth::W8,
            offsets2: vec![0, 2],
            offsets2_width: IntWidth::W8,
            max_key: 5,
        }
    }

    #[test]
    fn decode_formula() {
        let s = tiny();
        assert_eq!((s.shift(), s.mask1(), s.mask2()), (2, 1, 1));
        assert_eq!(s.lookup(0), Some(Entry::ZERO));
        assert_eq!(s.lookup(4), Some(Entry::new(1, 0, false, true)));
        assert_eq!(s.lookup(5), Some(Entry::new(0, 1, true, false)));
        assert_eq!(s.lookup(6), None);
        assert_eq!(s.to_lower(4), 5);
        assert_eq!(s.to_upper(5), 4);
        assert_eq!(s.to_lower(1), 1);
    }

    #[test]
    fn masks_saturate_at_full_width() {
        let s = Solution {
            k1: 32,
            k2: 3,
            ..tiny()
        };
        assert_eq!((s.mask1(), s.mask2(), s.shift()), (u32::MAX, 7, 35));
        assert_eq!(low_mask(0), 0);
        assert_eq!(shr(u32::MAX, 35), 0);
        assert_eq!(s.lookup(3), Some(Entry::new(0, 1, true, false)));
    }

    #[test]
    fn verify_accepts_and_rejects() {
        let s = tiny();
        let mut entries = vec![Entry::ZERO; 6];
        entries[4] = Entry::new(1, 0, false, true);
        entries[5] = Entry::new(0, 1, true, false);
        let original = DomainEntries::from_dense(Domain::Legacy, entries.clone()).unwrap();
        assert!(verify(&s, &original).is_ok());

        entries[2] = Entry::new(3, 0, false, true);
        let other = DomainEntries::from_dense(Domain::Legacy, entries).unwrap();
        assert_eq!(
            verify(&s, &other),
            Err(TableError::RoundTripMismatch {
                key: 2,
                expected: Entry::new(3, 0, false, true),
                got: Some(Entry::ZERO),
            })
        );
    }

    #[test]
    fn verify_checks_packing_width() {
        let mut s = tiny();
        s.data[2] = Entry::new(100, 0, false, true);
        s.data[3] = Entry::new(0, 0, true, false);
        let mut entries = vec![Entry::ZERO; 6];
        entries[4] = s.data[2];
        entries[5] = s.data[3];
        let original = DomainEntries::from_dense(Domain::Legacy, entries).unwrap();
        assert_eq!(
            verify(&s, &original),
            Err(TableError::PackingMismatch { index: 2, width: 8 })
        );
    }

    #[test]
    fn packed_data_layout() {
        let s = tiny();
        let packed = s.packed_data(IntWidth::W8);
        assert_eq!(packed[0], 0);
        // delta 1, lower flag.
        assert_eq!(packed[2], 0b101);
        // delta 1, upper flag.
        assert_eq!(packed[3], 0b110);
    }
}
