use cm_core::entry::PackedEntry;
use serde::{Deserialize, Serialize};

use crate::emit::EmittedTables;
use crate::solution::Solution;

/// Décalage des keysyms Unicode : `keysym = UNICODE_OFFSET + point de code`.
pub const UNICODE_OFFSET: u32 = 0x0100_0000;
/// Plus petit keysym Unicode ; en dessous, les keysyms historiques s'appliquent.
pub const UNICODE_MIN: u32 = 0x0100_0100;
/// Plus grand keysym Unicode.
pub const UNICODE_MAX: u32 = 0x0110_FFFF;

/// Tables des deux domaines, avec la sélection de domaine du code généré.
///
/// Keysyms up to the legacy `max_key` use the legacy table. Keysyms in
/// `UNICODE_MIN..=UNICODE_OFFSET + unicode.max_key` use the Unicode table at
/// `keysym - UNICODE_OFFSET`; a mapped result falling below `UNICODE_MIN`
/// is folded back to its legacy keysym. Everything else is uncased.
///
/// # Example
/// ```
/// use cm_core::entry::{Domain, Entry};
/// use cm_core::input::DomainEntries;
/// use cm_table::{CaseMappingTables, Optimizer};
///
/// let mut entries = vec![Entry::ZERO; 0x80];
/// entries[0x41] = Entry::new(32, 0, false, true);
/// entries[0x61] = Entry::new(0, 32, true, false);
/// let legacy = DomainEntries::from_dense(Domain::Legacy, entries).unwrap();
/// let (solution, _) = Optimizer::default().optimize(&legacy).unwrap();
/// let tables = CaseMappingTables::from_solutions(Some(&solution), None);
/// assert_eq!(tables.to_lower(0x41), 0x61);
/// assert!(tables.is_lower(0x61));
/// assert_eq!(tables.to_upper(0x0100_0061), 0x0100_0061);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMappingTables {
    pub legacy: Option<EmittedTables>,
    pub unicode: Option<EmittedTables>,
}

impl CaseMappingTables {
    /// Emit both domains with one data width, the wider of the two.
    #[must_use]
    pub fn from_solutions(legacy: Option<&Solution>, unicode: Option<&Solution>) -> Self {
        let shared = legacy.iter().chain(&unicode).map(|s| s.data_width).max();
        let emit = |s: &Solution| match shared {
            Some(width) => EmittedTables::with_data_width(s, width),
            None => EmittedTables::from_solution(s),
        };
        if let Some(width) = shared {
            log::debug!("Largeur commune des données : {width}");
        }
        Self {
            legacy: legacy.map(emit),
            unicode: unicode.map(emit),
        }
    }

    /// Entry of `keysym` and whether it came from the Unicode table.
    fn entry(&self, keysym: u32) -> Option<(PackedEntry, bool)> {
        if let Some(legacy) = &self.legacy
            && keysym <= legacy.max_key
        {
            return legacy.lookup(keysym).map(|e| (e, false));
        }
        let unicode = self.unicode.as_ref()?;
        if (UNICODE_MIN..=UNICODE_OFFSET.saturating_add(unicode.max_key)).contains(&keysym) {
            return unicode.lookup(keysym - UNICODE_OFFSET).map(|e| (e, true));
        }
        None
    }

    fn fold(keysym: u32, unicode: bool) -> u32 {
        if unicode && keysym < UNICODE_MIN {
            keysym.wrapping_sub(UNICODE_OFFSET)
        } else {
            keysym
        }
    }

    #[must_use]
    pub fn to_lower(&self, keysym: u32) -> u32 {
        match self.entry(keysym) {
            Some((e, unicode)) if e.lower => Self::fold(e.to_lower(keysym), unicode),
            _ => keysym,
        }
    }

    #[must_use]
    pub fn to_upper(&self, keysym: u32) -> u32 {
        match self.entry(keysym) {
            Some((e, unicode)) if e.upper => Self::fold(e.to_upper(keysym), unicode),
            _ => keysym,
        }
    }

    /// Has an upper case and no lower case. Title case letters have both.
    #[must_use]
    pub fn is_lower(&self, keysym: u32) -> bool {
        self.entry(keysym).is_some_and(|(e, _)| e.upper && !e.lower)
    }

    /// Has a lower case.
    #[must_use]
    pub fn is_upper_or_title(&self, keysym: u32) -> bool {
        self.entry(keysym).is_some_and(|(e, _)| e.lower)
    }

    /// Taille totale des tables émises, en bits.
    #[must_use]
    pub fn total_bits(&self) -> u64 {
        self.legacy.iter().chain(&self.unicode).map(|t| t.total_bits).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::Optimizer;
    use crate::width::IntWidth;
    use cm_core::entry::{Domain, Entry};
    use cm_core::input::DomainEntries;

    const SHARP_S: u32 = 0xDF;
    const CAPITAL_SHARP_S: u32 = 0x1E9E;

    fn legacy() -> Solution {
        let mut entries = vec![Entry::ZERO; 0x7B];
        for k in 0x41..=0x5A {
            entries[k] = Entry::new(32, 0, false, true);
            entries[k + 32] = Entry::new(0, 32, true, false);
        }
        let domain = DomainEntries::from_dense(Domain::Legacy, entries).unwrap();
        Optimizer::default().optimize(&domain).unwrap().0
    }

    fn unicode() -> Solution {
        let mut entries = vec![Entry::ZERO; CAPITAL_SHARP_S as usize + 1];
        let delta = i64::from(SHARP_S) - i64::from(CAPITAL_SHARP_S);
        entries[SHARP_S as usize] = Entry::new(0, delta, true, false);
        entries[CAPITAL_SHARP_S as usize] = Entry::new(delta, 0, false, true);
        // Ā / ā
        entries[0x100] = Entry::new(1, 0, false, true);
        entries[0x101] = Entry::new(0, 1, true, false);
        // ǅ: title case, both mappings.
        entries[0x1C4] = Entry::new(2, 0, false, true);
        entries[0x1C5] = Entry::new(1, 1, false, true);
        entries[0x1C6] = Entry::new(0, 2, true, false);
        let domain = DomainEntries::from_dense(Domain::Unicode, entries).unwrap();
        Optimizer::default().optimize(&domain).unwrap().0
    }

    fn tables() -> CaseMappingTables {
        CaseMappingTables::from_solutions(Some(&legacy()), Some(&unicode()))
    }

    #[test]
    fn legacy_keysyms() {
        let t = tables();
        assert_eq!(t.to_lower(0x41), 0x61);
        assert_eq!(t.to_upper(0x61), 0x41);
        assert_eq!(t.to_lower(0x61), 0x61);
        assert!(t.is_lower(0x61));
        assert!(t.is_upper_or_title(0x41));
        assert!(!t.is_lower(0x30));
    }

    #[test]
    fn unicode_keysyms() {
        let t = tables();
        assert_eq!(t.to_lower(0x0100_0100), 0x0100_0101);
        assert_eq!(t.to_upper(0x0100_0101), 0x0100_0100);
        assert!(t.is_lower(0x0100_0101));
        assert!(t.is_upper_or_title(0x0100_0100));
    }

    #[test]
    fn title_case_has_both_mappings() {
        let t = tables();
        let dz = UNICODE_OFFSET + 0x1C5;
        assert_eq!(t.to_lower(dz), UNICODE_OFFSET + 0x1C6);
        assert_eq!(t.to_upper(dz), UNICODE_OFFSET + 0x1C4);
        assert!(t.is_upper_or_title(dz));
        assert!(!t.is_lower(dz));
    }

    #[test]
    fn results_below_unicode_min_fold_to_legacy() {
        let t = tables();
        let capital = UNICODE_OFFSET + CAPITAL_SHARP_S;
        assert_eq!(t.to_lower(capital), SHARP_S);
        assert_eq!(t.to_upper(capital), capital);
        assert!(t.is_upper_or_title(capital));
    }

    #[test]
    fn out_of_range_is_uncased() {
        let t = tables();
        for ks in [0x7B, 0x0100_0041, UNICODE_MIN - 1, UNICODE_OFFSET + 0x1E9F, UNICODE_MAX, u32::MAX] {
            assert_eq!(t.to_lower(ks), ks, "0x{ks:x}");
            assert_eq!(t.to_upper(ks), ks, "0x{ks:x}");
            assert!(!t.is_lower(ks) && !t.is_upper_or_title(ks));
        }
        let empty = CaseMappingTables::default();
        assert_eq!(empty.to_lower(0x41), 0x41);
        assert_eq!(empty.total_bits(), 0);
    }

    #[test]
    fn domains_share_data_width() {
        let t = tables();
        let (l, u) = (t.legacy.as_ref().unwrap(), t.unicode.as_ref().unwrap());
        assert_eq!(l.data_width, u.data_width);
        assert_eq!(u.data_width, IntWidth::W16);
        assert_eq!(t.total_bits(), l.total_bits + u.total_bits);
    }
}
