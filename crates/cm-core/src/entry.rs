use std::fmt;

use serde::{Deserialize, Serialize};

/// Deltas de casse d'un keysym ou d'un point de code.
///
/// `lower` is the signed offset to the lower-case counterpart, `upper` the
/// signed offset *from* the upper-case counterpart (`key - upper`). The two
/// flags record the case class of the symbol itself.
///
/// Field order matters: entries are ordered lexicographically on
/// `(lower, upper, is_lower, is_upper)`.
///
/// # Example
/// ```
/// use cm_core::entry::Entry;
/// let a = Entry::new(32, 0, false, true);
/// assert_eq!(a.to_lower(0x41), 0x61);
/// assert!(a.is_cased());
/// assert!(!Entry::ZERO.is_cased());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Entry {
    /// Delta vers la minuscule (`key + lower`).
    pub lower: i64,
    /// Delta depuis la majuscule (`key - upper`).
    pub upper: i64,
    /// Le symbole est lui-même en minuscule.
    pub is_lower: bool,
    /// Le symbole est en majuscule ou en casse de titre.
    pub is_upper: bool,
}

impl Entry {
    /// Entrée neutre : pas de casse.
    pub const ZERO: Self = Self::new(0, 0, false, false);

    #[must_use]
    pub const fn new(lower: i64, upper: i64, is_lower: bool, is_upper: bool) -> Self {
        Self {
            lower,
            upper,
            is_lower,
            is_upper,
        }
    }

    /// True if any delta is non-zero or any case flag is set.
    #[inline]
    #[must_use]
    pub const fn is_cased(&self) -> bool {
        self.lower != 0 || self.upper != 0 || self.is_lower || self.is_upper
    }

    /// A symbol cannot have two different case-changing deltas.
    ///
    /// # Example
    /// ```
    /// use cm_core::entry::Entry;
    /// assert!(Entry::new(1, 1, false, true).is_consistent());
    /// assert!(Entry::new(0, 5, true, false).is_consistent());
    /// assert!(!Entry::new(1, 2, false, false).is_consistent());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.lower == 0 || self.upper == 0 || self.lower == self.upper
    }

    /// The single delta stored in the packed form.
    #[inline]
    #[must_use]
    pub const fn delta(&self) -> i64 {
        if self.lower != 0 { self.lower } else { self.upper }
    }

    /// Smallest and largest delta of this entry.
    #[inline]
    #[must_use]
    pub fn delta_range(&self) -> (i64, i64) {
        (self.lower.min(self.upper), self.lower.max(self.upper))
    }

    #[inline]
    #[must_use]
    pub fn to_lower(&self, key: u32) -> u32 {
        (i64::from(key) + self.lower) as u32
    }

    #[inline]
    #[must_use]
    pub fn to_upper(&self, key: u32) -> u32 {
        (i64::from(key) - self.upper) as u32
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, lower={}, upper={})",
            self.lower, self.upper, self.is_lower, self.is_upper
        )
    }
}

/// Entrée compactée telle que consommée par le code généré.
///
/// `lower` means "has a lower-case mapping", `upper` means "has an
/// upper-case mapping". Packed into a `width`-bit word as
/// `delta << 2 | upper << 1 | lower`.
///
/// # Example
/// ```
/// use cm_core::entry::{Entry, PackedEntry};
/// let p = PackedEntry::from(Entry::new(0, 32, true, false));
/// assert_eq!(p, PackedEntry { lower: false, upper: true, delta: 32 });
/// assert_eq!(PackedEntry::from_bits(p.to_bits(16), 16), p);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedEntry {
    /// Possède une correspondance en minuscule.
    pub lower: bool,
    /// Possède une correspondance en majuscule.
    pub upper: bool,
    /// Delta signé, sur `width - 2` bits une fois compacté.
    pub delta: i64,
}

impl From<Entry> for PackedEntry {
    fn from(e: Entry) -> Self {
        Self {
            lower: e.is_upper || e.lower != 0,
            upper: e.is_lower || e.upper != 0,
            delta: e.delta(),
        }
    }
}

impl PackedEntry {
    /// Number of bits reserved for the two flags.
    pub const FLAG_BITS: u32 = 2;

    /// Pack into the low `width` bits of a word.
    ///
    /// # Panics
    /// Panics in debug builds if `width` is not in `3..=64`.
    #[must_use]
    pub fn to_bits(self, width: u32) -> u64 {
        debug_assert!((3..=64).contains(&width), "invalid packed width {width}");
        let mask = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        (((self.delta as u64) << Self::FLAG_BITS)
            | (u64::from(self.upper) << 1)
            | u64::from(self.lower))
            & mask
    }

    /// Inverse of [`PackedEntry::to_bits`], sign-extending the delta.
    #[must_use]
    pub fn from_bits(bits: u64, width: u32) -> Self {
        let unused = 64 - width.clamp(3, 64);
        Self {
            lower: bits & 1 != 0,
            upper: bits & 0b10 != 0,
            delta: ((bits << unused) as i64) >> (unused + Self::FLAG_BITS),
        }
    }

    #[inline]
    #[must_use]
    pub fn to_lower(self, key: u32) -> u32 {
        if self.lower {
            (i64::from(key) + self.delta) as u32
        } else {
            key
        }
    }

    #[inline]
    #[must_use]
    pub fn to_upper(self, key: u32) -> u32 {
        if self.upper {
            (i64::from(key) - self.delta) as u32
        } else {
            key
        }
    }
}

/// Domaine de clés compressé indépendamment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    /// Keysyms hors de la plage Unicode.
    Legacy,
    /// Points de code Unicode.
    Unicode,
}

impl Domain {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Legacy => "legacy_keysyms",
            Self::Unicode => "unicode",
        }
    }

    /// Largest key accepted in this domain: keysyms are 29-bit values,
    /// Unicode stops at `char::MAX`.
    #[must_use]
    pub const fn key_limit(self) -> u32 {
        match self {
            Self::Legacy => 0x1FFF_FFFF,
            Self::Unicode => char::MAX as u32,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
