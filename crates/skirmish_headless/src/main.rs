//! Headless battle runner.
//!
//! Plays battles and attack power searches from the command line. Answer
//! lines (or JSON with `--json`) go to stdout, logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Play a map to the end
//! cargo run -p skirmish_headless -- fight maps/walkthrough.txt
//!
//! # Log the annotated map after every round
//! cargo run -p skirmish_headless -- fight maps/walkthrough.txt --trace
//!
//! # Lowest casualty-free goblin attack power, sequential scan
//! cargo run -p skirmish_headless -- search maps/walkthrough.txt --faction goblin --parallel 0
//!
//! # Run a scenario and check its expected answers
//! cargo run -p skirmish_headless -- scenario scenarios/walkthrough.ron --json
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish_core::prelude::*;
use skirmish_headless::{run_parallel_search, BattleReport, Scenario, SearchReport};

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Headless elves-versus-goblins battle runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a map until one faction is wiped out
    Fight {
        /// Map file
        map: PathBuf,

        /// RON file with combat rules
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Log the annotated map after every round
        #[arg(long)]
        trace: bool,

        /// Print a JSON report instead of the answer line
        #[arg(long)]
        json: bool,
    },

    /// Find the lowest attack power that wins without losses
    Search {
        /// Map file
        map: PathBuf,

        /// RON file with combat rules
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Faction that must not lose a unit
        #[arg(short, long, default_value = "elf")]
        faction: Faction,

        /// First attack power to try
        #[arg(long)]
        start: Option<u32>,

        /// Last attack power to try
        #[arg(long)]
        max: Option<u32>,

        /// Worker threads (0 = sequential, default = all cores)
        #[arg(short, long)]
        parallel: Option<usize>,

        /// Print a JSON report instead of the answer line
        #[arg(long)]
        json: bool,
    },

    /// Run a RON scenario and verify its expected answers
    Scenario {
        /// Scenario file
        file: PathBuf,

        /// Worker threads for the search (0 = sequential, default = all cores)
        #[arg(short, long)]
        parallel: Option<usize>,

        /// Print a JSON report instead of the answer lines
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for answers)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Fight {
            map,
            rules,
            trace,
            json,
        } => cmd_fight(&map, rules.as_deref(), trace, json),
        Commands::Search {
            map,
            rules,
            faction,
            start,
            max,
            parallel,
            json,
        } => {
            let config = SearchConfig {
                protected: faction,
                start_power: start,
                max_power: max,
            };
            cmd_search(&map, rules.as_deref(), config, parallel, json);
        }
        Commands::Scenario {
            file,
            parallel,
            json,
        } => cmd_scenario(&file, parallel, json),
    }
}

/// Log an error and exit with status 1.
fn fail(context: &str, error: &dyn std::fmt::Display) -> ! {
    tracing::error!(error = %error, "{context}");
    eprintln!("FATAL: {context}: {error}");
    std::process::exit(1);
}

fn load_rules(path: Option<&Path>) -> CombatRules {
    let Some(path) = path else {
        return CombatRules::default();
    };
    let contents = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(&format!("Cannot read rules '{}'", path.display()), &e));
    CombatRules::from_ron_str(&contents)
        .unwrap_or_else(|e| fail(&format!("Invalid rules '{}'", path.display()), &e))
}

fn load_map(path: &Path, rules: &CombatRules) -> Battlefield {
    let contents = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(&format!("Cannot read map '{}'", path.display()), &e));
    let field = Battlefield::parse_str(&contents, rules)
        .unwrap_or_else(|e| fail(&format!("Invalid map '{}'", path.display()), &e));

    tracing::info!(
        map = %path.display(),
        width = field.grid().width(),
        height = field.grid().height(),
        elves = field.living(Faction::Elf).count(),
        goblins = field.living(Faction::Goblin).count(),
        "Map loaded"
    );
    field
}

fn resolve_parallelism(parallel: Option<usize>) -> usize {
    parallel.unwrap_or_else(rayon::current_num_threads)
}

fn print_json<T: Serialize>(report: &T) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => fail("Failed to encode report", &e),
    }
}

/// Play a single battle to the end
fn cmd_fight(map: &Path, rules: Option<&Path>, trace: bool, json: bool) {
    let rules = load_rules(rules);
    let mut battle = Battle::new(load_map(map, &rules));

    if trace {
        tracing::info!("Initial state\n{}", battle.battlefield().render_with_hit_points());
        while !battle.is_finished() {
            let report = battle.run_round();
            tracing::info!(
                round = battle.rounds_completed(),
                outcome = ?report.outcome,
                events = report.events.len(),
                "\n{}",
                battle.battlefield().render_with_hit_points()
            );
        }
    } else {
        battle.run_to_end();
    }

    let report = BattleReport::from_battle(&battle);
    tracing::info!(
        winner = ?report.winner,
        rounds = report.rounds,
        hit_points = report.hit_points,
        kills = report.stats.kills,
        "Battle finished"
    );

    if json {
        print_json(&report);
    } else {
        println!("{}", report.line);
    }
}

/// Search for the lowest casualty-free attack power
fn cmd_search(
    map: &Path,
    rules: Option<&Path>,
    config: SearchConfig,
    parallel: Option<usize>,
    json: bool,
) {
    config
        .validate()
        .unwrap_or_else(|e| fail("Invalid search bounds", &e));
    let rules = load_rules(rules);
    let template = load_map(map, &rules);
    let parallelism = resolve_parallelism(parallel);

    let search = OutcomeSearch::new(&template, &rules, config);
    let result = run_parallel_search(&search, parallelism)
        .unwrap_or_else(|e| fail("Attack power search failed", &e));

    let report = SearchReport::new(config.protected, &result, parallelism);
    if json {
        print_json(&report);
    } else {
        println!("{}", report.line);
    }
}

/// Run a scenario and compare against its expected answers
fn cmd_scenario(file: &Path, parallel: Option<usize>, json: bool) {
    let scenario = Scenario::load(file)
        .unwrap_or_else(|e| fail(&format!("Cannot load scenario '{}'", file.display()), &e));
    tracing::info!(name = %scenario.name, description = %scenario.description, "Scenario loaded");

    let report = scenario
        .run(resolve_parallelism(parallel))
        .unwrap_or_else(|e| fail(&format!("Scenario '{}' failed", scenario.name), &e));

    if json {
        print_json(&report);
    } else {
        println!("{}", report.battle.line);
        if let Some(search) = &report.search {
            println!("{}", search.line);
        }
    }

    if report.passed() {
        tracing::info!(name = %report.name, "Scenario passed");
    } else {
        for mismatch in &report.mismatches {
            eprintln!(
                "MISMATCH: expected '{}', got '{}'",
                mismatch.expected, mismatch.actual
            );
        }
        std::process::exit(1);
    }
}
