use std::fmt;

use cm_core::entry::{Entry, PackedEntry};
use cm_core::error::TableError;
use serde::{Deserialize, Serialize};

/// Largeur d'entier d'un tableau émis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    /// All widths, narrowest first.
    pub const ALL: [Self; 4] = [Self::W8, Self::W16, Self::W32, Self::W64];

    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::W8 => 8,
            Self::W16 => 16,
            Self::W32 => 32,
            Self::W64 => 64,
        }
    }

    /// Narrowest signed width holding `[min, max]` once shifted left by
    /// `reserved_bits`.
    ///
    /// # Errors
    /// [`TableError::WidthOverflow`] if even 64 bits are not enough.
    ///
    /// # Example
    /// ```
    /// use cm_table::IntWidth;
    /// assert_eq!(IntWidth::signed_width(-32, 31, 2).unwrap(), IntWidth::W8);
    /// assert_eq!(IntWidth::signed_width(-32, 32, 2).unwrap(), IntWidth::W16);
    /// ```
    pub fn signed_width(min: i64, max: i64, reserved_bits: u32) -> Result<Self, TableError> {
        let min = i128::from(min) << reserved_bits;
        let max = i128::from(max) << reserved_bits;
        Self::ALL
            .into_iter()
            .find(|w| {
                let lo = -(1i128 << (w.bits() - 1));
                let hi = -lo - 1;
                lo <= min && max <= hi
            })
            .ok_or(TableError::WidthOverflow { min, max })
    }

    /// Narrowest unsigned width holding `max`.
    ///
    /// # Example
    /// ```
    /// use cm_table::IntWidth;
    /// assert_eq!(IntWidth::unsigned_width(255), IntWidth::W8);
    /// assert_eq!(IntWidth::unsigned_width(256), IntWidth::W16);
    /// ```
    #[must_use]
    pub fn unsigned_width(max: u64) -> Self {
        Self::ALL
            .into_iter()
            .find(|w| w.bits() == 64 || max < (1u64 << w.bits()))
            .unwrap_or(Self::W64)
    }

    /// Width of a packed data array: both deltas plus the two flag bits.
    ///
    /// # Errors
    /// [`TableError::WidthOverflow`] if a delta does not fit in 62 bits.
    pub fn for_entries(entries: &[Entry]) -> Result<Self, TableError> {
        let (min, max) = entries
            .iter()
            .map(Entry::delta_range)
            .fold((0, 0), |(lo, hi), (a, b)| (lo.min(a), hi.max(b)));
        Self::signed_width(min, max, PackedEntry::FLAG_BITS)
    }

    /// Width of an offsets array.
    ///
    /// # Errors
    /// [`TableError::WidthOverflow`] if an offset does not fit in 64 bits.
    pub fn for_offsets(offsets: &[usize]) -> Result<Self, TableError> {
        let max = offsets.iter().copied().max().unwrap_or(0);
        let max = u64::try_from(max).map_err(|_| TableError::WidthOverflow {
            min: 0,
            max: max as i128,
        })?;
        Ok(Self::unsigned_width(max))
    }
}

impl fmt::Display for IntWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.bits())
    }
}
