use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::entry::{Domain, Entry};
use crate::error::TableError;

/// One sparse input record. Missing fields default to zero/false.
///
/// # Example
/// ```
/// use cm_core::input::Record;
/// let r: Record = serde_json::from_str(r#"{"key": 65, "lower": 32, "is_upper": true}"#).unwrap();
/// assert_eq!(r.entry().lower, 32);
/// assert!(!r.entry().is_lower);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    /// Keysym ou point de code.
    pub key: u32,
    #[serde(default)]
    pub lower: i64,
    #[serde(default)]
    pub upper: i64,
    #[serde(default)]
    pub is_lower: bool,
    #[serde(default)]
    pub is_upper: bool,
}

impl Record {
    #[must_use]
    pub const fn entry(&self) -> Entry {
        Entry::new(self.lower, self.upper, self.is_lower, self.is_upper)
    }
}

/// Tableau dense des entrées d'un domaine, indexé par clé.
///
/// Covers `0..=max_key`, where `max_key` is the largest cased key. Absent keys
/// hold [`Entry::ZERO`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainEntries {
    pub domain: Domain,
    pub entries: Vec<Entry>,
    pub max_key: u32,
}

impl DomainEntries {
    /// Build a dense domain from sparse records.
    ///
    /// # Errors
    /// [`TableError::KeyOutOfRange`] on a key above [`Domain::key_limit`]
    /// (checked before the dense array is allocated),
    /// [`TableError::DuplicateKey`] on a repeated key,
    /// [`TableError::ConflictingDeltas`] listing every ambiguous key, and
    /// [`TableError::EmptyDomain`] if no record is cased.
    ///
    /// # Example
    /// ```
    /// use cm_core::entry::Domain;
    /// use cm_core::input::{DomainEntries, Record};
    /// let records = [Record { key: 3, lower: 1, upper: 0, is_lower: false, is_upper: true }];
    /// let d = DomainEntries::from_records(Domain::Legacy, records).unwrap();
    /// assert_eq!(d.entries.len(), 4);
    /// assert_eq!(d.get(3).lower, 1);
    /// assert_eq!(d.get(100), cm_core::Entry::ZERO);
    /// ```
    pub fn from_records<I>(domain: Domain, records: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut seen = HashSet::new();
        let mut cased = Vec::new();
        let limit = domain.key_limit();
        for r in records {
            if r.key > limit {
                return Err(TableError::KeyOutOfRange {
                    key: r.key,
                    limit,
                    domain,
                });
            }
            if !seen.insert(r.key) {
                return Err(TableError::DuplicateKey { key: r.key, domain });
            }
            let entry = r.entry();
            if entry.is_cased() {
                cased.push((r.key, entry));
            }
        }
        let max_key = cased
            .iter()
            .map(|&(k, _)| k)
            .max()
            .ok_or(TableError::EmptyDomain { domain })?;

        let mut entries = vec![Entry::ZERO; max_key as usize + 1];
        for (k, e) in cased {
            entries[k as usize] = e;
        }
        Self::from_dense(domain, entries)
    }

    /// Build a domain from a dense array, trimming trailing uncased keys.
    ///
    /// # Errors
    /// [`TableError::ConflictingDeltas`], [`TableError::EmptyDomain`] or
    /// [`TableError::KeyOutOfRange`].
    pub fn from_dense(domain: Domain, mut entries: Vec<Entry>) -> Result<Self, TableError> {
        let last = entries
            .iter()
            .rposition(Entry::is_cased)
            .ok_or(TableError::EmptyDomain { domain })?;
        entries.truncate(last + 1);
        let max_key = u32::try_from(last).unwrap_or(u32::MAX);
        let limit = domain.key_limit();
        if max_key > limit {
            return Err(TableError::KeyOutOfRange {
                key: max_key,
                limit,
                domain,
            });
        }

        let keys: Vec<u32> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_consistent())
            .map(|(k, _)| k as u32)
            .collect();
        if !keys.is_empty() {
            log::error!("{} clé(s) avec des deltas contradictoires dans {domain}", keys.len());
            return Err(TableError::ConflictingDeltas { keys });
        }

        Ok(Self {
            domain,
            max_key,
            entries,
        })
    }

    /// Entry at `key`; [`Entry::ZERO`] beyond the covered range.
    #[inline]
    #[must_use]
    pub fn get(&self, key: u32) -> Entry {
        self.entries.get(key as usize).copied().unwrap_or_default()
    }

    /// Number of cased keys.
    #[must_use]
    pub fn cased_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_cased()).count()
    }
}

/// Fichier d'entrée JSON : un tableau de records par domaine.
#[derive(Deserialize)]
struct EntryFile {
    #[serde(default)]
    legacy: Vec<Record>,
    #[serde(default)]
    unicode: Vec<Record>,
}

/// Both domains of one input file; an empty record list gives `None`.
#[derive(Clone, Debug, Default)]
pub struct InputEntries {
    pub legacy: Option<DomainEntries>,
    pub unicode: Option<DomainEntries>,
}

impl InputEntries {
    /// Iterate over the present domains, legacy first.
    pub fn iter(&self) -> impl Iterator<Item = &DomainEntries> {
        self.legacy.iter().chain(self.unicode.iter())
    }
}

/// Parse a JSON entry document.
///
/// # Errors
/// Returns an error on malformed JSON or invalid records.
///
/// # Example
/// ```
/// use cm_core::input::parse_entries;
/// let input = parse_entries(r#"{"unicode": [{"key": 97, "upper": 32, "is_lower": true}]}"#).unwrap();
/// assert!(input.legacy.is_none());
/// assert_eq!(input.unicode.unwrap().max_key, 97);
/// ```
pub fn parse_entries(content: &str) -> Result<InputEntries> {
    let file: EntryFile = serde_json::from_str(content).context("Erreur de parsing JSON")?;
    let load_domain = |domain: Domain, records: Vec<Record>| -> Result<Option<DomainEntries>> {
        if records.is_empty() {
            return Ok(None);
        }
        let d = DomainEntries::from_records(domain, records)
            .with_context(|| format!("Entrées invalides pour {domain}"))?;
        log::info!(
            "{domain} : {} clés casées, max 0x{:04x}",
            d.cased_count(),
            d.max_key
        );
        Ok(Some(d))
    };
    Ok(InputEntries {
        legacy: load_domain(Domain::Legacy, file.legacy)?,
        unicode: load_domain(Domain::Unicode, file.unicode)?,
    })
}

/// Charge un fichier d'entrées JSON.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_entries(path: &Path) -> Result<InputEntries> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_entries(&content).with_context(|| format!("Fichier d'entrées invalide : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: u32, lower: i64, upper: i64) -> Record {
        Record {
            key,
            lower,
            upper,
            is_lower: upper != 0,
            is_upper: lower != 0,
        }
    }

    #[test]
    fn dense_array_is_trimmed_to_last_cased_key() {
        let mut entries = vec![Entry::ZERO; 10];
        entries[4] = Entry::new(1, 0, false, true);
        let d = DomainEntries::from_dense(Domain::Unicode, entries).unwrap();
        assert_eq!(d.max_key, 4);
        assert_eq!(d.entries.len(), 5);
    }

    #[test]
    fn flags_alone_make_a_key_cased() {
        let d = DomainEntries::from_records(
            Domain::Legacy,
            [Record {
                key: 7,
                lower: 0,
                upper: 0,
                is_lower: true,
                is_upper: false,
            }],
        )
        .unwrap();
        assert_eq!(d.max_key, 7);
    }

    #[test]
    fn conflicting_deltas_report_every_key() {
        let err = DomainEntries::from_records(
            Domain::Legacy,
            [record(1, 2, 3), record(2, 1, 0), record(5, -1, 4)],
        )
        .unwrap_err();
        assert_eq!(err, TableError::ConflictingDeltas { keys: vec![1, 5] });
    }

    #[test]
    fn equal_deltas_are_accepted() {
        assert!(DomainEntries::from_records(Domain::Unicode, [record(0x1c5, 1, 1)]).is_ok());
    }

    #[test]
    fn duplicate_and_empty_domains_are_errors() {
        let err =
            DomainEntries::from_records(Domain::Legacy, [record(1, 1, 0), record(1, 1, 0)])
                .unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateKey {
                key: 1,
                domain: Domain::Legacy
            }
        );
        let err = DomainEntries::from_records(Domain::Unicode, [record(3, 0, 0)]).unwrap_err();
        assert_eq!(
            err,
            TableError::EmptyDomain {
                domain: Domain::Unicode
            }
        );
    }

    #[test]
    fn keys_beyond_the_domain_are_rejected_before_allocation() {
        let err = DomainEntries::from_records(Domain::Legacy, [record(u32::MAX, 1, 0)])
            .unwrap_err();
        assert_eq!(
            err,
            TableError::KeyOutOfRange {
                key: u32::MAX,
                limit: 0x1FFF_FFFF,
                domain: Domain::Legacy
            }
        );
        let err = DomainEntries::from_records(Domain::Unicode, [record(0x11_0000, 1, 0)])
            .unwrap_err();
        assert!(matches!(err, TableError::KeyOutOfRange { key: 0x11_0000, .. }));
        assert!(DomainEntries::from_records(Domain::Unicode, [record(0x10_FFFF, 1, 0)]).is_ok());
    }

    #[test]
    fn huge_key_in_json_is_an_error() {
        let err = parse_entries(r#"{"legacy": [{"key": 4294967295, "lower": 1}]}"#).unwrap_err();
        assert!(format!("{err:#}").contains("hors du domaine"));
    }

    #[test]
    fn load_entries_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        std::fs::write(
            &path,
            r#"{"legacy": [{"key": 65, "lower": 32, "is_upper": true},
                           {"key": 97, "upper": 32, "is_lower": true}]}"#,
        )
        .unwrap();
        let input = load_entries(&path).unwrap();
        let legacy = input.legacy.unwrap();
        assert_eq!(legacy.max_key, 97);
        assert_eq!(legacy.get(65).to_lower(65), 97);
        assert!(input.unicode.is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_entries("{\"legacy\": [{\"lower\": 1}]}").is_err());
    }
}
