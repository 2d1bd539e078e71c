//! Headless battle runner for CI verification and parameter sweeps.
//!
//! This crate wraps [`skirmish_core`] with everything that touches the
//! outside world:
//!
//! - **Scenarios**: RON files bundling a map, rules and expected answers
//! - **Parallel search**: the attack power search spread over a rayon pool
//! - **Reports**: JSON summaries of battles and searches
//!
//! Answer lines and JSON go to stdout; logs go to stderr.
//!
//! # Example
//!
//! ```bash
//! # Play a map to the end
//! cargo run -p skirmish_headless -- fight maps/walkthrough.txt
//!
//! # Find the lowest casualty-free elf attack power on 8 threads
//! cargo run -p skirmish_headless -- search maps/walkthrough.txt --parallel 8
//!
//! # Run a scenario and check its expected answers
//! cargo run -p skirmish_headless -- scenario scenarios/walkthrough.ron
//! ```

pub mod parallel;
pub mod report;
pub mod scenario;

pub use parallel::run_parallel_search;
pub use report::{BattleReport, SearchReport};
pub use scenario::{Scenario, ScenarioError, ScenarioReport};
