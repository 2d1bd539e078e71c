//! Parallel attack power search.
//!
//! Candidates are evaluated in batches of consecutive powers on a rayon
//! pool. Every worker replays its own copy of the template, so no battle
//! state is shared. A single atomic holds the lowest power known to
//! succeed; workers above it cancel between rounds.
//!
//! The reported power is always the minimum successful power, exactly as
//! the sequential scan would find it. Batches are processed in increasing
//! order and the lowest success inside a batch wins, so a higher power
//! that happens to finish first is never accepted.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;
use skirmish_core::error::{CombatError, Result};
use skirmish_core::search::{CandidateOutcome, OutcomeSearch, SearchResult};
use tracing::{debug, info};

/// Sentinel meaning no candidate has succeeded yet.
const NO_SUCCESS: u32 = u32::MAX;

/// Run `search` on `parallelism` threads.
///
/// A `parallelism` of 0 or 1 falls back to the sequential scan.
///
/// # Errors
///
/// Returns [`CombatError::SearchExhausted`] if no candidate succeeds, or
/// [`CombatError::InvalidState`] if the thread pool cannot be built.
pub fn run_parallel_search(search: &OutcomeSearch<'_>, parallelism: usize) -> Result<SearchResult> {
    if parallelism <= 1 {
        debug!("Running attack power search sequentially");
        return search.run();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism)
        .build()
        .map_err(|e| CombatError::InvalidState(format!("Failed to build thread pool: {e}")))?;

    info!(
        protected = %search.protected(),
        start = search.start_power(),
        max = search.max_power(),
        threads = parallelism,
        "Starting parallel attack power search"
    );

    let best = AtomicU32::new(NO_SUCCESS);
    let evaluated = AtomicU32::new(0);
    let batch_size = u32::try_from(parallelism).unwrap_or(u32::MAX);

    for batch in batches(search.powers(), batch_size) {
        let (first, last) = (*batch.start(), *batch.end());
        let found = pool.install(|| {
            batch
                .into_par_iter()
                .filter_map(|power| evaluate_candidate(search, power, &best, &evaluated))
                .min_by_key(|result| result.power)
        });

        if let Some(result) = found {
            info!(
                power = result.power,
                outcome = %result.outcome,
                evaluated = evaluated.load(Ordering::Relaxed),
                "Found casualty-free attack power"
            );
            return Ok(result);
        }
        debug!(first, last, "Batch produced no clean win");
    }

    Err(CombatError::SearchExhausted {
        max_power: search.max_power(),
    })
}

/// Split `powers` into consecutive runs of at most `size` candidates.
fn batches(powers: RangeInclusive<u32>, size: u32) -> impl Iterator<Item = RangeInclusive<u32>> {
    let (start, end) = powers.into_inner();
    let step = size.max(1) - 1;
    let mut next = (start <= end).then_some(start);

    std::iter::from_fn(move || {
        let first = next?;
        let last = first.saturating_add(step).min(end);
        next = (last < end).then(|| last + 1);
        Some(first..=last)
    })
}

fn evaluate_candidate(
    search: &OutcomeSearch<'_>,
    power: u32,
    best: &AtomicU32,
    evaluated: &AtomicU32,
) -> Option<SearchResult> {
    let outcome = search.evaluate(power, || best.load(Ordering::Relaxed) < power);
    evaluated.fetch_add(1, Ordering::Relaxed);

    match outcome {
        CandidateOutcome::Survived(outcome) => {
            best.fetch_min(power, Ordering::Relaxed);
            Some(SearchResult { power, outcome })
        }
        CandidateOutcome::Lost { rounds, casualties } => {
            debug!(power, rounds, casualties, "Candidate lost units");
            None
        }
        CandidateOutcome::Cancelled => {
            debug!(power, "Candidate cancelled by a lower success");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::battlefield::Battlefield;
    use skirmish_core::faction::Faction;
    use skirmish_core::rules::CombatRules;
    use skirmish_core::search::SearchConfig;

    const SAMPLE: [&str; 7] = [
        "#######", //
        "#.G...#", //
        "#...EG#", //
        "#.#.#G#", //
        "#..G#E#", //
        "#.....#", //
        "#######",
    ];

    fn template() -> Battlefield {
        Battlefield::parse(&SAMPLE, &CombatRules::default()).unwrap()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let field = template();
        let search = OutcomeSearch::new(&field, &CombatRules::default(), SearchConfig::default());
        let sequential = search.run().unwrap();

        for threads in [0, 1, 2, 3, 4, 8] {
            assert_eq!(
                run_parallel_search(&search, threads).unwrap(),
                sequential,
                "{threads} threads"
            );
        }
    }

    #[test]
    fn test_batch_minimum_wins() {
        // One batch covers 4..=19, so several powers above 15 also succeed.
        let field = template();
        let search = OutcomeSearch::new(&field, &CombatRules::default(), SearchConfig::default());
        let result = run_parallel_search(&search, 16).unwrap();
        assert_eq!(result.power, 15);
    }

    #[test]
    fn test_batches_cover_range_in_order() {
        let all: Vec<_> = batches(4..=12, 4).collect();
        assert_eq!(all, vec![4..=7, 8..=11, 12..=12]);

        assert_eq!(batches(5..=4, 3).count(), 0);
        assert_eq!(batches(7..=7, 3).collect::<Vec<_>>(), vec![7..=7]);
    }

    #[test]
    fn test_batches_stop_at_u32_max() {
        let tail: Vec<_> = batches(u32::MAX - 4..=u32::MAX, 3).collect();
        assert_eq!(tail, vec![u32::MAX - 4..=u32::MAX - 2, u32::MAX - 1..=u32::MAX]);

        let mut huge = batches(4..=u32::MAX, 8);
        assert_eq!(huge.next(), Some(4..=11));
        assert_eq!(huge.next(), Some(12..=19));
    }

    #[test]
    fn test_unbounded_max_power_finds_minimum() {
        let field = template();
        let config = SearchConfig {
            protected: Faction::Elf,
            start_power: None,
            max_power: Some(u32::MAX),
        };
        let search = OutcomeSearch::new(&field, &CombatRules::default(), config);
        assert_eq!(run_parallel_search(&search, 4).unwrap().power, 15);
    }

    #[test]
    fn test_parallel_exhausted() {
        let field = template();
        let config = SearchConfig {
            protected: Faction::Elf,
            start_power: Some(4),
            max_power: Some(9),
        };
        let search = OutcomeSearch::new(&field, &CombatRules::default(), config);
        assert_eq!(
            run_parallel_search(&search, 4).unwrap_err(),
            CombatError::SearchExhausted { max_power: 9 }
        );
    }
}
