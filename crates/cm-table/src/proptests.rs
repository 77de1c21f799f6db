use cm_core::entry::{Domain, Entry, PackedEntry};
use cm_core::input::DomainEntries;
use proptest::prelude::*;

use crate::{EmittedTables, Optimizer, SearchParams, verify};

fn arb_entry() -> impl Strategy<Value = Entry> {
    prop_oneof![
        12 => Just(Entry::ZERO),
        2 => (-30i64..30).prop_map(|d| Entry::new(d, 0, false, true)),
        2 => (-30i64..30).prop_map(|d| Entry::new(0, d, true, false)),
        1 => (-30i64..30).prop_map(|d| Entry::new(d, d, false, true)),
    ]
}

prop_compose! {
    /// Sparse domain ending with a cased key, so it is never empty.
    fn arb_domain()(
        mut entries in prop::collection::vec(arb_entry(), 0..300),
        last in (1i64..30).prop_map(|d| Entry::new(d, 0, false, true)),
    ) -> DomainEntries {
        entries.push(last);
        DomainEntries::from_dense(Domain::Unicode, entries).unwrap()
    }
}

fn params(parallel: bool) -> SearchParams {
    SearchParams {
        data_block_log2: 1..=4,
        offsets_block_log2: vec![4, 3, 2],
        parallel,
    }
}

proptest! {
    /// Property: every key decodes to its original entry, packed or not
    #[test]
    fn prop_optimized_tables_round_trip(domain in arb_domain()) {
        let (solution, report) = Optimizer::new(params(true)).optimize(&domain).unwrap();
        prop_assert!(verify(&solution, &domain).is_ok());
        prop_assert!(solution.total() <= report.bound);

        let emitted = EmittedTables::from_solution(&solution);
        for key in 0..=domain.max_key {
            let expected = domain.get(key);
            prop_assert_eq!(solution.lookup(key), Some(expected));
            prop_assert_eq!(emitted.lookup(key), Some(PackedEntry::from(expected)));
        }
        prop_assert_eq!(emitted.lookup(domain.max_key + 1), None);
    }

    /// Property: the best total never increases and ends at the solution
    #[test]
    fn prop_search_history_is_monotonic(domain in arb_domain()) {
        let (solution, report) = Optimizer::new(params(false)).optimize(&domain).unwrap();
        let totals: Vec<u64> = report.best_totals().collect();
        prop_assert!(totals.windows(2).all(|w| w[1] <= w[0]));
        prop_assert_eq!(totals.last().copied(), Some(solution.total()));
    }

    /// Property: parallel and sequential searches pick the same table
    #[test]
    fn prop_parallel_matches_sequential(domain in arb_domain()) {
        let (par, _) = Optimizer::new(params(true)).optimize(&domain).unwrap();
        let (seq, _) = Optimizer::new(params(false)).optimize(&domain).unwrap();
        prop_assert_eq!(par, seq);
    }
}
