//! Determinism testing utilities.
//!
//! Provides a harness for verifying that battles produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Battle outcomes must be exactly reproducible. The parallel attack power
//! search relies on it, as do the snapshot tests. Sources of
//! non-determinism to guard against:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Turn order always comes from sorting by reading order.
//!
//! - **Shared state between battles**: each battle owns its grid and
//!   units; candidates never share counters.
//!
//! - **Thread scheduling**: parallel runs must agree with sequential ones.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual rules (tie-breaks, movement, attacks)
//! 2. **Property tests**: random maps must still replay identically
//! 3. **Integration tests**: sample battles reproduce documented outcomes
//! 4. **Parallel tests**: running N battles on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use skirmish_core::battle::{Battle, Outcome};

/// Rounds after which harness helpers give up on a battle.
pub const MAX_ROUNDS: u32 = 1_000;

/// One playthrough recorded by [`replay_rounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTrace {
    /// Every round's `state_hash`, folded in order, starting with the
    /// state before the first round.
    pub trace_hash: u64,
    /// Rounds completed when the playthrough stopped.
    pub rounds: u32,
    /// Final outcome, or `None` if the round cap was hit first.
    pub outcome: Option<Outcome>,
}

/// Traces from several playthroughs of the same battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayComparison {
    /// Round cap each playthrough ran under.
    pub max_rounds: u32,
    /// One trace per playthrough, in run order.
    pub traces: Vec<RoundTrace>,
}

impl ReplayComparison {
    /// True if every playthrough left the same trace.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.traces.windows(2).all(|w| w[0] == w[1])
    }

    /// Number of different traces seen.
    #[must_use]
    pub fn distinct_traces(&self) -> usize {
        let mut keys: Vec<(u64, u32)> = self
            .traces
            .iter()
            .map(|t| (t.trace_hash, t.rounds))
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    /// # Panics
    ///
    /// Panics naming the first playthrough that differs from the first one.
    pub fn assert_replays_match(&self) {
        let Some(first) = self.traces.first() else {
            return;
        };
        if let Some(run) = self.traces.iter().position(|t| t != first) {
            panic!(
                "Replay {run} diverged from replay 0 (cap {} rounds)\n\
                 replay 0: {first:?}\n\
                 replay {run}: {:?}",
                self.max_rounds, self.traces[run]
            );
        }
    }
}

/// Play one battle round by round until it finishes or `max_rounds` have
/// been completed, folding the state hash after every round.
pub fn trace_rounds(battle: &mut Battle, max_rounds: u32) -> RoundTrace {
    let mut hasher = DefaultHasher::new();
    battle.state_hash().hash(&mut hasher);

    while !battle.is_finished() && battle.rounds_completed() < max_rounds {
        battle.run_round();
        battle.state_hash().hash(&mut hasher);
    }

    RoundTrace {
        trace_hash: hasher.finish(),
        rounds: battle.rounds_completed(),
        outcome: battle.is_finished().then(|| battle.outcome()),
    }
}

/// Build `runs` battles from `setup` and trace each with [`trace_rounds`].
pub fn replay_rounds<F>(runs: usize, max_rounds: u32, setup: F) -> ReplayComparison
where
    F: Fn() -> Battle,
{
    let traces = (0..runs)
        .map(|_| trace_rounds(&mut setup(), max_rounds))
        .collect();
    ReplayComparison { max_rounds, traces }
}

/// Result of parallel battle runs.
#[derive(Debug, Clone)]
pub struct ParallelBattleResult {
    /// Final state hash from each battle.
    pub hashes: Vec<u64>,
    /// Final outcome from each battle.
    pub outcomes: Vec<Outcome>,
}

impl ParallelBattleResult {
    /// Check if all battles produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
            && self.outcomes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all battles matched.
    ///
    /// # Panics
    ///
    /// Panics if battles produced different hashes or outcomes.
    pub fn assert_deterministic(&self) {
        assert!(
            self.is_deterministic(),
            "Parallel battles diverged!\n\
             Battles: {}\n\
             Hashes: {:?}\n\
             Outcomes: {:?}",
            self.hashes.len(),
            self.hashes,
            self.outcomes
        );
    }
}

/// Play a battle to the end, bounded by [`MAX_ROUNDS`].
///
/// Returns `None` if the battle did not finish within the bound.
pub fn run_bounded(battle: &mut Battle) -> Option<Outcome> {
    battle.run_until(|b| b.rounds_completed() >= MAX_ROUNDS)
}

/// Play the same battle twice and compare final hashes and outcomes.
///
/// # Returns
///
/// `true` if both runs ended identically.
pub fn verify_battle_determinism<F>(setup_fn: F) -> bool
where
    F: Fn() -> Battle,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    let a = run_bounded(&mut first);
    let b = run_bounded(&mut second);

    a == b && first.state_hash() == second.state_hash()
}

/// Run N copies of a battle on scoped threads and collect final hashes.
///
/// Catches any hidden shared state between battles.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_battles_scoped<F>(setup_fn: F, num_battles: usize) -> ParallelBattleResult
where
    F: Fn() -> Battle + Sync,
{
    let results: Vec<(u64, Option<Outcome>)> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| {
                s.spawn(|| {
                    let mut battle = setup_fn();
                    let outcome = run_bounded(&mut battle);
                    (battle.state_hash(), outcome)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    ParallelBattleResult {
        hashes: results.iter().map(|(hash, _)| *hash).collect(),
        outcomes: results
            .iter()
            .filter_map(|(_, outcome)| *outcome)
            .collect(),
    }
}

/// Compare two battle runs round by round, finding the first divergence.
///
/// # Returns
///
/// `None` if the battles stay identical for `max_rounds`, `Some(round)` if
/// they diverge after that many rounds.
pub fn find_first_divergence<F>(setup_fn: F, max_rounds: u32) -> Option<u32>
where
    F: Fn() -> Battle,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for round in 1..=max_rounds {
        let report_a = a.run_round();
        let report_b = b.run_round();

        if report_a != report_b || a.state_hash() != b.state_hash() {
            tracing::debug!(round, "Battles diverged");
            return Some(round);
        }
        if a.is_finished() {
            break;
        }
    }

    None
}

/// Verify that a snapshot taken mid-battle resumes to the same result.
///
/// Plays `rounds` rounds, snapshots, then finishes both the original and
/// the restored battle.
pub fn verify_serialization_determinism<F>(setup_fn: F, rounds: u32) -> bool
where
    F: Fn() -> Battle,
{
    let mut battle = setup_fn();
    for _ in 0..rounds {
        battle.run_round();
    }

    let hash_before = battle.state_hash();

    let Ok(bytes) = battle.serialize() else {
        return false;
    };
    let Ok(mut restored) = Battle::deserialize(&bytes) else {
        return false;
    };

    if restored.state_hash() != hash_before {
        return false;
    }

    run_bounded(&mut battle) == run_bounded(&mut restored)
        && battle.state_hash() == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for battle testing.
///
/// These generate random but reproducible maps for property-based testing.
pub mod strategies {
    use proptest::prelude::*;

    /// Generate a single interior map character, mostly open floor.
    pub fn arb_cell() -> impl Strategy<Value = char> {
        prop_oneof![
            6 => Just('.'),
            2 => Just('#'),
            1 => Just('E'),
            1 => Just('G'),
        ]
    }

    /// Generate a walled rectangular map holding at least one unit of
    /// each faction.
    ///
    /// Width ranges over `4..=max_width` and height over `3..=max_height`,
    /// both including the outer wall.
    pub fn arb_map(max_width: u32, max_height: u32) -> impl Strategy<Value = Vec<String>> {
        (4..=max_width.max(4), 3..=max_height.max(3))
            .prop_flat_map(|(width, height)| {
                let interior = ((width - 2) * (height - 2)) as usize;
                (
                    Just(width),
                    proptest::collection::vec(arb_cell(), interior),
                    0..interior,
                    0..interior,
                )
            })
            .prop_map(|(width, mut cells, elf, goblin)| {
                let interior = cells.len();
                cells[elf] = 'E';
                let goblin = if goblin == elf {
                    (goblin + 1) % interior
                } else {
                    goblin
                };
                cells[goblin] = 'G';

                let inner = (width - 2) as usize;
                let wall = "#".repeat(width as usize);
                let mut lines = vec![wall.clone()];
                for row in cells.chunks(inner) {
                    let mut line = String::with_capacity(width as usize);
                    line.push('#');
                    line.extend(row);
                    line.push('#');
                    lines.push(line);
                }
                lines.push(wall);
                lines
            })
    }

    /// Generate an attack power in a useful range.
    pub fn arb_attack_power() -> impl Strategy<Value = u32> {
        1u32..=60u32
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{OUTCOME_SAMPLES, WALKTHROUGH};
    use proptest::prelude::*;
    use skirmish_core::battlefield::Battlefield;
    use skirmish_core::faction::Faction;
    use skirmish_core::rules::CombatRules;

    fn walkthrough() -> Battle {
        Battle::from_lines(WALKTHROUGH, &CombatRules::default()).unwrap()
    }

    #[test]
    fn test_walkthrough_replays_match() {
        let comparison = replay_rounds(4, MAX_ROUNDS, walkthrough);
        comparison.assert_replays_match();
        assert_eq!(comparison.distinct_traces(), 1);

        let trace = comparison.traces[0];
        assert_eq!(trace.rounds, 47);
        assert_eq!(trace.outcome.map(|o| o.score()), Some(27730));
    }

    #[test]
    fn test_trace_stops_at_round_cap() {
        let trace = trace_rounds(&mut walkthrough(), 10);
        assert_eq!(trace.rounds, 10);
        assert_eq!(trace.outcome, None);
    }

    #[test]
    fn test_trace_covers_every_round() {
        // Same final state is not enough; the path there is hashed too.
        let full = trace_rounds(&mut walkthrough(), MAX_ROUNDS);
        let mut resumed = walkthrough();
        for _ in 0..20 {
            resumed.run_round();
        }
        let tail = trace_rounds(&mut resumed, MAX_ROUNDS);

        assert_eq!(full.outcome, tail.outcome);
        assert_eq!(full.rounds, tail.rounds);
        assert_ne!(full.trace_hash, tail.trace_hash);
    }

    fn alternating_powers() -> (impl Fn() -> Battle, std::rc::Rc<std::cell::Cell<u32>>) {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0u32));
        let counter = std::rc::Rc::clone(&calls);
        let setup = move || {
            counter.set(counter.get() + 1);
            let power = if counter.get() % 2 == 0 { 15 } else { 3 };
            let rules = CombatRules::default().with_attack_power(Faction::Elf, power);
            Battle::from_lines(WALKTHROUGH, &rules).unwrap()
        };
        (setup, calls)
    }

    #[test]
    fn test_diverging_setups_detected() {
        let (setup, calls) = alternating_powers();
        let comparison = replay_rounds(4, MAX_ROUNDS, setup);

        assert_eq!(calls.get(), 4);
        assert!(!comparison.is_deterministic());
        assert_eq!(comparison.distinct_traces(), 2);
        assert_eq!(comparison.traces[0], comparison.traces[2]);
    }

    #[test]
    #[should_panic(expected = "Replay 1 diverged")]
    fn test_assert_names_diverging_replay() {
        let (setup, _) = alternating_powers();
        replay_rounds(2, MAX_ROUNDS, setup).assert_replays_match();
    }

    #[test]
    fn test_sample_battles_are_deterministic() {
        for sample in OUTCOME_SAMPLES {
            let field = sample.battlefield();
            assert!(
                verify_battle_determinism(|| Battle::new(field.clone())),
                "{}",
                sample.name
            );
        }
    }

    #[test]
    fn test_no_divergence_on_walkthrough() {
        assert_eq!(find_first_divergence(walkthrough, 60), None);
    }

    #[test]
    fn test_snapshot_resumes_identically() {
        for rounds in [0, 1, 10, 46, 47, 48] {
            assert!(
                verify_serialization_determinism(walkthrough, rounds),
                "snapshot after {rounds} rounds"
            );
        }
    }

    #[test]
    fn test_parallel_battles_match() {
        let result = run_parallel_battles_scoped(walkthrough, 8);
        result.assert_deterministic();
        assert_eq!(result.outcomes.len(), 8);
        assert_eq!(result.outcomes[0].score(), 27730);
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }

    proptest! {
        #[test]
        fn prop_generated_maps_parse(map in arb_map(12, 10)) {
            let field = Battlefield::parse(&map, &CombatRules::default());
            prop_assert!(field.is_ok(), "{:?}", field.err());
        }

        #[test]
        fn prop_random_battles_replay_identically(
            map in arb_map(10, 8),
            elf_power in arb_attack_power(),
        ) {
            let rules = CombatRules::default().with_attack_power(Faction::Elf, elf_power);
            let field = Battlefield::parse(&map, &rules).unwrap();
            prop_assert!(verify_battle_determinism(|| Battle::new(field.clone())));
        }

        #[test]
        fn prop_conservation_of_hit_points(
            map in arb_map(10, 8),
            goblin_power in arb_attack_power(),
        ) {
            let rules = CombatRules::default().with_attack_power(Faction::Goblin, goblin_power);
            let field = Battlefield::parse(&map, &rules).unwrap();
            let initial: u64 = field.units().iter().map(|u| u64::from(u.hit_points)).sum();

            let mut battle = Battle::new(field);
            let mut event_damage = 0u64;
            while !battle.is_finished() && battle.rounds_completed() < MAX_ROUNDS {
                for event in battle.run_round().events {
                    if let skirmish_core::battle::CombatEvent::Attacked { power, damage, .. } = event {
                        prop_assert!(damage <= power);
                        event_damage += u64::from(damage);
                    }
                }
            }

            let remaining: u64 = battle
                .battlefield()
                .units()
                .iter()
                .map(|u| u64::from(u.hit_points))
                .sum();
            prop_assert_eq!(initial - remaining, event_damage);
            prop_assert_eq!(battle.stats().damage_dealt, event_damage);
        }

        #[test]
        fn prop_occupancy_invariant_holds(map in arb_map(10, 8)) {
            let mut battle = Battle::from_lines(&map, &CombatRules::default()).unwrap();
            for _ in 0..50 {
                battle.run_round();
                prop_assert!(battle.battlefield().verify_occupancy().is_ok());
                if battle.is_finished() {
                    break;
                }
            }
        }
    }
}
