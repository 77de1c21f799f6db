use thiserror::Error;

use crate::entry::{Domain, Entry};

/// Errors raised while loading, compressing or verifying case-mapping tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Some keys carry two different non-zero deltas.
    #[error("Deltas de casse contradictoires (minuscule ≠ majuscule) pour les clés : {keys:x?}")]
    ConflictingDeltas {
        /// Offending keys, ascending.
        keys: Vec<u32>,
    },

    /// The same key appears twice in one domain.
    #[error("Clé dupliquée 0x{key:04x} dans le domaine {domain}")]
    DuplicateKey {
        /// Duplicated key.
        key: u32,
        /// Domain of the record.
        domain: Domain,
    },

    /// A key lies beyond what the domain can hold.
    #[error("Clé 0x{key:x} hors du domaine {domain} (max 0x{limit:x})")]
    KeyOutOfRange {
        /// Offending key.
        key: u32,
        /// Largest accepted key, see [`Domain::key_limit`].
        limit: u32,
        /// Domain of the record.
        domain: Domain,
    },

    /// No key of the domain has a case mapping.
    #[error("Aucune correspondance de casse dans le domaine {domain}")]
    EmptyDomain {
        /// Empty domain.
        domain: Domain,
    },

    /// A value range does not fit in a 64-bit integer.
    #[error("Dépassement de largeur entière : [{min}, {max}] ne tient pas sur 64 bits")]
    WidthOverflow {
        /// Smallest value (after reserved bits).
        min: i128,
        /// Largest value (after reserved bits).
        max: i128,
    },

    /// No block-size pair produced a feasible table.
    #[error("Aucune solution réalisable pour le domaine {domain}")]
    SearchExhausted {
        /// Domain being compressed.
        domain: Domain,
    },

    /// The decode formula does not reproduce the input.
    #[error("Échec de l'aller-retour pour la clé 0x{key:04x} : attendu {expected}, obtenu {got:?}")]
    RoundTripMismatch {
        /// First failing key.
        key: u32,
        /// Entry of the input array.
        expected: Entry,
        /// Entry produced by the decode formula, if any.
        got: Option<Entry>,
    },

    /// A data entry does not survive bit packing at the chosen width.
    #[error("Entrée {index} non représentable sur {width} bits")]
    PackingMismatch {
        /// Index in the data array.
        index: usize,
        /// Chosen data width in bits.
        width: u32,
    },
}
