use crate::entry::{Domain, Entry};
use crate::error::TableError;
use crate::input::DomainEntries;

/// Exceptions aux correspondances simples en majuscule.
pub const TO_UPPER_EXCEPTIONS: &[(char, char)] = &[('ß', 'ẞ')];

/// Lettres en casse de titre (catégorie générale `Lt`).
const TITLECASE: &[(u32, u32)] = &[
    (0x01C5, 0x01C5),
    (0x01C8, 0x01C8),
    (0x01CB, 0x01CB),
    (0x01F2, 0x01F2),
    (0x1F88, 0x1F8F),
    (0x1F98, 0x1F9F),
    (0x1FA8, 0x1FAF),
    (0x1FBC, 0x1FBC),
    (0x1FCC, 0x1FCC),
    (0x1FFC, 0x1FFC),
];

/// True for title case letters (`Lt`), such as `ǅ`.
#[must_use]
pub fn is_titlecase(c: char) -> bool {
    let cp = u32::from(c);
    TITLECASE.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Simple mappings hidden by `SpecialCasing.txt`: `char::to_lowercase` and
/// `char::to_uppercase` return the full (multi-character) mapping for these
/// code points, while `UnicodeData.txt` has a one-to-one mapping.
fn special_lower(c: char) -> Option<char> {
    (c == '\u{130}').then_some('i')
}

fn special_upper(c: char) -> Option<char> {
    let cp = u32::from(c);
    let upper = match cp {
        // ᾀ..ᾇ, ᾐ..ᾗ, ᾠ..ᾧ → ᾈ..ᾏ, ᾘ..ᾟ, ᾨ..ᾯ
        0x1F80..=0x1F87 | 0x1F90..=0x1F97 | 0x1FA0..=0x1FA7 => cp + 8,
        // ᾳ ῃ ῳ → ᾼ ῌ ῼ
        0x1FB3 | 0x1FC3 | 0x1FF3 => cp + 9,
        _ => return None,
    };
    char::from_u32(upper)
}

/// Single code point of a case iterator, `None` for a multi-character result.
fn single(mut it: impl Iterator<Item = char>) -> Option<char> {
    match (it.next(), it.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Simple (one-to-one) lower-case mapping; `c` itself if it has none.
///
/// # Example
/// ```
/// use cm_core::unicode::simple_lower;
/// assert_eq!(simple_lower('A'), 'a');
/// assert_eq!(simple_lower('İ'), 'i');
/// ```
#[must_use]
pub fn simple_lower(c: char) -> char {
    special_lower(c)
        .or_else(|| single(c.to_lowercase()))
        .unwrap_or(c)
}

/// Simple upper-case mapping, with [`TO_UPPER_EXCEPTIONS`] applied first.
///
/// # Example
/// ```
/// use cm_core::unicode::simple_upper;
/// assert_eq!(simple_upper('a'), 'A');
/// assert_eq!(simple_upper('ß'), 'ẞ');
/// assert_eq!(simple_upper('ᾳ'), 'ᾼ');
/// assert_eq!(simple_upper('ŉ'), 'ŉ'); // "ʼN" seulement
/// ```
#[must_use]
pub fn simple_upper(c: char) -> char {
    if let Some(&(_, u)) = TO_UPPER_EXCEPTIONS.iter().find(|(from, _)| *from == c) {
        return u;
    }
    special_upper(c)
        .or_else(|| single(c.to_uppercase()))
        .unwrap_or(c)
}

impl Entry {
    /// Case-mapping entry of a Unicode scalar value.
    ///
    /// `is_upper` covers title case letters too.
    ///
    /// # Example
    /// ```
    /// use cm_core::Entry;
    /// let e = Entry::from_char('Ǆ');
    /// assert_eq!(e.lower, 2);
    /// assert!(e.is_upper && !e.is_lower);
    /// ```
    #[must_use]
    pub fn from_char(c: char) -> Self {
        let cp = i64::from(u32::from(c));
        Self::new(
            i64::from(u32::from(simple_lower(c))) - cp,
            cp - i64::from(u32::from(simple_upper(c))),
            c.is_lowercase(),
            c.is_uppercase() || is_titlecase(c),
        )
    }
}

/// Unicode domain derived from the standard library's case tables.
///
/// Surrogates are uncased. Intended for tooling and tests; the release
/// tables come from the external data loader.
///
/// # Errors
/// Propagates the validation of [`DomainEntries::from_dense`].
pub fn unicode_entries_from_std() -> Result<DomainEntries, TableError> {
    let entries: Vec<Entry> = (0..=u32::from(char::MAX))
        .map(|cp| char::from_u32(cp).map_or(Entry::ZERO, Entry::from_char))
        .collect();
    let d = DomainEntries::from_dense(Domain::Unicode, entries)?;
    log::info!(
        "Unicode (std) : {} points de code casés, max U+{:04X}",
        d.cased_count(),
        d.max_key
    );
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_letters() {
        let a = Entry::from_char('A');
        assert_eq!(a, Entry::new(32, 0, false, true));
        let z = Entry::from_char('z');
        assert_eq!(z, Entry::new(0, 32, true, false));
        assert_eq!(Entry::from_char('1'), Entry::ZERO);
    }

    #[test]
    fn sharp_s_uses_upper_exception() {
        let e = Entry::from_char('ß');
        assert_eq!(e.upper, 0xdf - 0x1e9e);
        assert_eq!(e.to_upper(0xdf), 0x1e9e);
    }

    #[test]
    fn title_case_has_equal_deltas() {
        let e = Entry::from_char('ǅ');
        assert_eq!((e.lower, e.upper), (1, 1));
        assert!(e.is_upper && !e.is_lower);
        assert!(e.is_consistent());
    }

    #[test]
    fn dotted_capital_i_lowers_to_i() {
        let e = Entry::from_char('\u{130}');
        assert_eq!(e, Entry::new(0x69 - 0x130, 0, false, true));
        assert_eq!(e.to_lower(0x130), 0x69);
    }

    #[test]
    fn iota_subscript_letters_keep_simple_upper() {
        let e = Entry::from_char('\u{1FB3}');
        assert_eq!(e, Entry::new(0, -9, true, false));
        assert_eq!(e.to_upper(0x1FB3), 0x1FBC);
        assert_eq!(simple_upper('\u{1F80}'), '\u{1F88}');
        assert_eq!(simple_upper('\u{1FF3}'), '\u{1FFC}');
        // No simple upper for ᾲ, only "ᾺΙ".
        assert_eq!(simple_upper('\u{1FB2}'), '\u{1FB2}');

        // Title case counterpart: lower mapping only.
        let title = Entry::from_char('\u{1FBC}');
        assert_eq!(title, Entry::new(-9, 0, false, true));
    }

    #[test]
    fn titlecase_letters() {
        for c in ['ǅ', 'ǈ', 'ǋ', 'ǲ', '\u{1F88}', '\u{1FAF}', '\u{1FFC}'] {
            assert!(is_titlecase(c), "{c}");
            assert!(Entry::from_char(c).is_upper, "{c}");
        }
        assert!(!is_titlecase('A') && !is_titlecase('ǆ'));
    }

    #[test]
    fn std_domain_is_consistent() {
        let d = unicode_entries_from_std().unwrap();
        assert!(d.max_key > 0x1_0000);
        assert_eq!(d.get(0x41).to_lower(0x41), 0x61);
        assert!(d.entries.iter().all(Entry::is_consistent));
    }
}
