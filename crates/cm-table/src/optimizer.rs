use std::ops::RangeInclusive;

use cm_compress::{ChunksCompressor, CompressedArray, compress_array};
use cm_core::config::{CompressionConfig, MAX_BLOCK_LOG2};
use cm_core::entry::{Domain, Entry};
use cm_core::error::TableError;
use cm_core::input::DomainEntries;
use rayon::prelude::*;
use serde::Serialize;

use crate::solution::Solution;
use crate::width::IntWidth;

/// Taille bits naïve par clé : tableau direct de mots de 32 bits.
pub const NAIVE_BITS_PER_KEY: u64 = 32;

/// Tailles d'une table candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub data_length: usize,
    pub data_width: IntWidth,
    pub data_overlap: isize,
    pub offsets1_length: usize,
    pub offsets1_width: IntWidth,
    pub offsets2_length: usize,
    pub offsets2_width: IntWidth,
}

impl Stats {
    #[must_use]
    pub fn data_size(&self) -> u64 {
        self.data_length as u64 * u64::from(self.data_width.bits())
    }

    #[must_use]
    pub fn offsets1_size(&self) -> u64 {
        self.offsets1_length as u64 * u64::from(self.offsets1_width.bits())
    }

    #[must_use]
    pub fn offsets2_size(&self) -> u64 {
        self.offsets2_length as u64 * u64::from(self.offsets2_width.bits())
    }

    /// Total size in bits.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.data_size() + self.offsets1_size() + self.offsets2_size()
    }

    /// Widest of the three arrays.
    #[must_use]
    pub fn max_width(&self) -> IntWidth {
        self.data_width
            .max(self.offsets1_width)
            .max(self.offsets2_width)
    }

    /// Ranking key: smaller total first, then narrower widest array.
    fn rank(&self) -> (u64, u32) {
        (self.total(), self.max_width().bits())
    }
}

/// Block-size exponents explored by the search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchParams {
    /// Data block exponents, ascending.
    pub data_block_log2: RangeInclusive<u32>,
    /// Offsets block exponents, in search order (coarsest first).
    pub offsets_block_log2: Vec<u32>,
    /// Run the data block exponents on the rayon pool.
    pub parallel: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::from(&CompressionConfig::default())
    }
}

impl From<&CompressionConfig> for SearchParams {
    fn from(config: &CompressionConfig) -> Self {
        Self {
            data_block_log2: config.data_block_range(),
            offsets_block_log2: config.offsets_block_exponents(),
            parallel: config.parallel,
        }
    }
}

/// Result of one search step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Candidate table with its sizes.
    Feasible(Stats),
    /// Some array does not fit in 64-bit integers.
    Infeasible(TableError),
    /// The data array alone already reaches `bound`; no `k2` was tried.
    Pruned { data_size: u64, bound: u64 },
}

/// One `(k1, k2)` step; `k2` is `None` when the whole `k1` was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateReport {
    pub k1: u32,
    pub k2: Option<u32>,
    pub outcome: Outcome,
}

/// A strict improvement of the best table during the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BestUpdate {
    pub k1: u32,
    pub k2: u32,
    pub total: u64,
}

/// Déroulé d'une recherche, dans l'ordre de recherche.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchReport {
    pub domain: Domain,
    /// Initial bound: the naive direct array, in bits.
    pub bound: u64,
    pub candidates: Vec<CandidateReport>,
    pub history: Vec<BestUpdate>,
}

impl SearchReport {
    /// Best totals in the order they were found; never increasing.
    pub fn best_totals(&self) -> impl Iterator<Item = u64> + '_ {
        self.history.iter().map(|u| u.total)
    }

    /// Number of feasible candidates.
    #[must_use]
    pub fn feasible_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|c| matches!(c.outcome, Outcome::Feasible(_)))
            .count()
    }
}

/// Best second level of one `k1`, with its first level.
struct Best {
    k2: u32,
    stats: Stats,
    data: CompressedArray<Entry>,
    offsets: CompressedArray<usize>,
}

/// Everything one `k1` produced.
struct K1Search {
    reports: Vec<CandidateReport>,
    best: Option<Best>,
}

/// Recherche des exposants de blocs minimisant la taille totale.
///
/// For each `k1` the entry array is compressed once, then its offsets are
/// compressed again for each `k2`. A candidate wins over the current best if
/// its total is lower, or equal with a narrower widest array; remaining ties
/// go to the earlier candidate in search order (`k1` ascending, then `k2` in
/// the configured order). Parallel and sequential runs pick the same table.
///
/// # Example
/// ```
/// use cm_core::entry::{Domain, Entry};
/// use cm_core::input::DomainEntries;
/// use cm_table::{Optimizer, SearchParams, verify};
///
/// let mut entries = vec![Entry::ZERO; 300];
/// for k in 0x41..=0x5a {
///     entries[k] = Entry::new(32, 0, false, true);
///     entries[k + 32] = Entry::new(0, 32, true, false);
/// }
/// let domain = DomainEntries::from_dense(Domain::Legacy, entries).unwrap();
/// let (solution, report) = Optimizer::new(SearchParams::default()).optimize(&domain).unwrap();
/// assert!(solution.total() < report.bound);
/// verify(&solution, &domain).unwrap();
/// ```
#[derive(Clone, Debug, Default)]
pub struct Optimizer {
    params: SearchParams,
}

impl Optimizer {
    /// Exponents above [`MAX_BLOCK_LOG2`] are brought back to it.
    #[must_use]
    pub fn new(mut params: SearchParams) -> Self {
        let (lo, hi) = params.data_block_log2.clone().into_inner();
        let k2_max = params.offsets_block_log2.iter().copied().max().unwrap_or(0);
        if hi.max(k2_max) > MAX_BLOCK_LOG2 {
            log::warn!("Exposants de bloc ramenés à {MAX_BLOCK_LOG2} au plus");
        }
        params.data_block_log2 = lo.min(MAX_BLOCK_LOG2)..=hi.min(MAX_BLOCK_LOG2);
        for k2 in &mut params.offsets_block_log2 {
            *k2 = (*k2).min(MAX_BLOCK_LOG2);
        }
        params.offsets_block_log2.dedup();
        Self { params }
    }

    #[must_use]
    pub fn from_config(config: &CompressionConfig) -> Self {
        Self::new(SearchParams::from(config))
    }

    #[must_use]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Find the smallest two-level table for `entries`.
    ///
    /// # Errors
    /// [`TableError::SearchExhausted`] if no candidate is feasible and within
    /// the naive bound.
    pub fn optimize(&self, entries: &DomainEntries) -> Result<(Solution, SearchReport), TableError> {
        let domain = entries.domain;
        let bound = NAIVE_BITS_PER_KEY * entries.entries.len() as u64;
        let k2_values = &self.params.offsets_block_log2;
        log::info!(
            "{domain} : recherche sur k1 ∈ {:?}, k2 ∈ {k2_values:?} ({} clés, borne {bound} bits)",
            self.params.data_block_log2,
            entries.entries.len()
        );

        let searches: Vec<(u32, K1Search)> = if self.params.parallel {
            self.params
                .data_block_log2
                .clone()
                .into_par_iter()
                .map(|k1| (k1, search_k1(k1, &entries.entries, k2_values, bound)))
                .collect()
        } else {
            // Sequential runs can also skip a k1 that cannot beat the best so far.
            let mut best_total = bound;
            let mut out = Vec::new();
            for k1 in self.params.data_block_log2.clone() {
                let search = search_k1(k1, &entries.entries, k2_values, best_total);
                if let Some(b) = &search.best {
                    best_total = best_total.min(b.stats.total());
                }
                out.push((k1, search));
            }
            out
        };

        let mut report = SearchReport {
            domain,
            bound,
            candidates: Vec::new(),
            history: Vec::new(),
        };
        // Any width beats the initial bound at equal total.
        let mut best_rank = (bound, u32::MAX);
        let mut winner: Option<(u32, Best)> = None;
        for (k1, search) in searches {
            let mut improved = false;
            for c in &search.reports {
                if let (Some(k2), Outcome::Feasible(stats)) = (c.k2, &c.outcome)
                    && stats.rank() < best_rank
                {
                    best_rank = stats.rank();
                    improved = true;
                    report.history.push(BestUpdate {
                        k1,
                        k2,
                        total: stats.total(),
                    });
                    log::debug!(
                        "{domain} : nouveau meilleur k1={k1} k2={k2} total={}",
                        stats.total()
                    );
                }
            }
            report.candidates.extend(search.reports);
            if improved {
                winner = search.best.map(|b| (k1, b));
            }
        }

        let (k1, best) = winner.ok_or(TableError::SearchExhausted { domain })?;
        let solution = Solution {
            domain,
            k1,
            k2: best.k2,
            data_width: best.stats.data_width,
            data_overlap: best.data.total_overlap(),
            data: best.data.data,
            offsets1: best.offsets.data,
            offsets1_width: best.stats.offsets1_width,
            offsets2: best.offsets.offsets,
            offsets2_width: best.stats.offsets2_width,
            max_key: entries.max_key,
        };
        log::info!(
            "{domain} : k1={} k2={} data={} ({}) offsets1={} ({}) offsets2={} ({}) total={} bits ({} octets)",
            solution.k1,
            solution.k2,
            solution.data.len(),
            solution.data_width,
            solution.offsets1.len(),
            solution.offsets1_width,
            solution.offsets2.len(),
            solution.offsets2_width,
            solution.total(),
            solution.total() / 8
        );
        Ok((solution, report))
    }
}

/// Compress the entries at `2^k1`, then the first-level offsets at each `2^k2`.
fn search_k1(k1: u32, entries: &[Entry], k2_values: &[u32], bound: u64) -> K1Search {
    let mut data_compressor = ChunksCompressor::new();
    let ca1 = compress_array(&mut data_compressor, 1 << k1, entries);
    let skipped = |outcome| K1Search {
        reports: vec![CandidateReport {
            k1,
            k2: None,
            outcome,
        }],
        best: None,
    };

    let data_width = match IntWidth::for_entries(&ca1.data) {
        Ok(w) => w,
        Err(e) => {
            log::debug!("k1={k1} : données non représentables ({e})");
            return skipped(Outcome::Infeasible(e));
        }
    };
    let data_size = ca1.data.len() as u64 * u64::from(data_width.bits());
    if data_size >= bound {
        log::debug!("k1={k1} : données {data_size} bits ≥ {bound}, ignoré");
        return skipped(Outcome::Pruned { data_size, bound });
    }

    let mut offsets_compressor = ChunksCompressor::new();
    let mut reports = Vec::with_capacity(k2_values.len());
    let mut best: Option<(u32, Stats, CompressedArray<usize>)> = None;
    for &k2 in k2_values {
        let ca2 = compress_array(&mut offsets_compressor, 1 << k2, &ca1.offsets);
        let widths = IntWidth::for_offsets(&ca2.data)
            .and_then(|w1| Ok((w1, IntWidth::for_offsets(&ca2.offsets)?)));
        let outcome = match widths {
            Ok((offsets1_width, offsets2_width)) => {
                let stats = Stats {
                    data_length: ca1.data.len(),
                    data_width,
                    data_overlap: ca1.total_overlap(),
                    offsets1_length: ca2.data.len(),
                    offsets1_width,
                    offsets2_length: ca2.offsets.len(),
                    offsets2_width,
                };
                log::debug!("k1={k1} k2={k2} : total {} bits", stats.total());
                if best.as_ref().is_none_or(|(_, b, _)| stats.rank() < b.rank()) {
                    best = Some((k2, stats, ca2));
                }
                Outcome::Feasible(stats)
            }
            Err(e) => Outcome::Infeasible(e),
        };
        reports.push(CandidateReport {
            k1,
            k2: Some(k2),
            outcome,
        });
    }

    K1Search {
        reports,
        best: best.map(|(k2, stats, offsets)| Best {
            k2,
            stats,
            data: ca1,
            offsets,
        }),
    }
}
