//! Sample maps with documented results.
//!
//! These are the worked examples of the combat puzzle. Every map comes with
//! the exact output line the simulator must print.

use skirmish_core::battlefield::Battlefield;
use skirmish_core::rules::CombatRules;

/// A map together with its expected answer line.
#[derive(Debug, Clone, Copy)]
pub struct SampleBattle {
    /// Short label for test output.
    pub name: &'static str,
    /// Map rows.
    pub map: &'static [&'static str],
    /// Expected output line.
    pub expected: &'static str,
}

impl SampleBattle {
    /// Parse the map with default rules.
    ///
    /// # Panics
    ///
    /// Panics if the fixture map is malformed.
    #[must_use]
    pub fn battlefield(&self) -> Battlefield {
        Battlefield::parse(self.map, &CombatRules::default())
            .unwrap_or_else(|e| panic!("fixture '{}' failed to parse: {e}", self.name))
    }
}

/// The 7x7 walkthrough map: three goblins against two elves.
pub const WALKTHROUGH: &[&str] = &[
    "#######", //
    "#.G...#", //
    "#...EG#", //
    "#.#.#G#", //
    "#..G#E#", //
    "#.....#", //
    "#######",
];

/// Second sample of the puzzle.
pub const SAMPLE_B: &[&str] = &[
    "#######", //
    "#G..#E#", //
    "#E#E.E#", //
    "#G.##.#", //
    "#...#E#", //
    "#...E.#", //
    "#######",
];

/// Third sample of the puzzle.
pub const SAMPLE_C: &[&str] = &[
    "#######", //
    "#E..EG#", //
    "#.#G.E#", //
    "#E.##E#", //
    "#G..#.#", //
    "#..E#.#", //
    "#######",
];

/// Fourth sample of the puzzle.
pub const SAMPLE_D: &[&str] = &[
    "#######", //
    "#E.G#.#", //
    "#.#G..#", //
    "#G.#.G#", //
    "#G..#.#", //
    "#...E.#", //
    "#######",
];

/// Fifth sample of the puzzle.
pub const SAMPLE_E: &[&str] = &[
    "#######", //
    "#.E...#", //
    "#.#..G#", //
    "#.###.#", //
    "#E#G#G#", //
    "#...#G#", //
    "#######",
];

/// Sixth sample of the puzzle, on a 9x9 map.
pub const SAMPLE_F: &[&str] = &[
    "#########", //
    "#G......#", //
    "#.E.#...#", //
    "#..##..G#", //
    "#...##..#", //
    "#...#...#", //
    "#.G...G.#", //
    "#.....G.#", //
    "#########",
];

/// Full battles with default attack power.
pub const OUTCOME_SAMPLES: &[SampleBattle] = &[
    SampleBattle {
        name: "walkthrough",
        map: WALKTHROUGH,
        expected: "Outcome: 47 * 590 = 27730",
    },
    SampleBattle {
        name: "sample_b",
        map: SAMPLE_B,
        expected: "Outcome: 37 * 982 = 36334",
    },
    SampleBattle {
        name: "sample_c",
        map: SAMPLE_C,
        expected: "Outcome: 46 * 859 = 39514",
    },
    SampleBattle {
        name: "sample_d",
        map: SAMPLE_D,
        expected: "Outcome: 35 * 793 = 27755",
    },
    SampleBattle {
        name: "sample_e",
        map: SAMPLE_E,
        expected: "Outcome: 54 * 536 = 28944",
    },
    SampleBattle {
        name: "sample_f",
        map: SAMPLE_F,
        expected: "Outcome: 20 * 937 = 18740",
    },
];

/// Attack power searches protecting the elves.
pub const SEARCH_SAMPLES: &[SampleBattle] = &[
    SampleBattle {
        name: "walkthrough",
        map: WALKTHROUGH,
        expected: "Needed AttackPower: 15, Outcome: 29 * 172 = 4988",
    },
    SampleBattle {
        name: "sample_c",
        map: SAMPLE_C,
        expected: "Needed AttackPower: 4, Outcome: 33 * 948 = 31284",
    },
    SampleBattle {
        name: "sample_d",
        map: SAMPLE_D,
        expected: "Needed AttackPower: 15, Outcome: 37 * 94 = 3478",
    },
    SampleBattle {
        name: "sample_e",
        map: SAMPLE_E,
        expected: "Needed AttackPower: 12, Outcome: 39 * 166 = 6474",
    },
    SampleBattle {
        name: "sample_f",
        map: SAMPLE_F,
        expected: "Needed AttackPower: 34, Outcome: 30 * 38 = 1140",
    },
];

/// Walkthrough state after rounds 1 and 2 and at the end, as
/// [`Battlefield::render_with_hit_points`] prints it.
pub const WALKTHROUGH_ROUNDS: &[(u32, &[&str])] = &[
    (
        1,
        &[
            "#######",
            "#..G..#   G(200)",
            "#...EG#   E(197), G(197)",
            "#.#G#G#   G(200), G(197)",
            "#...#E#   E(197)",
            "#.....#",
            "#######",
        ],
    ),
    (
        2,
        &[
            "#######",
            "#...G.#   G(200)",
            "#..GEG#   G(200), E(188), G(194)",
            "#.#.#G#   G(194)",
            "#...#E#   E(194)",
            "#.....#",
            "#######",
        ],
    ),
    (
        47,
        &[
            "#######",
            "#G....#   G(200)",
            "#.G...#   G(131)",
            "#.#.#G#   G(59)",
            "#...#.#",
            "#....G#   G(200)",
            "#######",
        ],
    ),
];

/// Movement-only walkthrough: eight goblins closing on one elf.
pub const MOVEMENT: &[&str] = &[
    "#########", //
    "#G..G..G#", //
    "#.......#", //
    "#.......#", //
    "#G..E..G#", //
    "#.......#", //
    "#.......#", //
    "#G..G..G#", //
    "#########",
];

/// Unit positions `(marker, x, y)` on [`MOVEMENT`] after rounds 0 to 3.
pub const MOVEMENT_POSITIONS: [&[(char, u32, u32)]; 4] = [
    &[
        ('G', 1, 1),
        ('G', 4, 1),
        ('G', 7, 1),
        ('G', 1, 4),
        ('E', 4, 4),
        ('G', 7, 4),
        ('G', 1, 7),
        ('G', 4, 7),
        ('G', 7, 7),
    ],
    &[
        ('G', 2, 1),
        ('G', 4, 2),
        ('G', 6, 1),
        ('G', 2, 4),
        ('E', 4, 3),
        ('G', 7, 3),
        ('G', 1, 6),
        ('G', 4, 6),
        ('G', 7, 6),
    ],
    &[
        ('G', 3, 1),
        ('G', 4, 2),
        ('G', 5, 1),
        ('G', 2, 3),
        ('E', 4, 3),
        ('G', 6, 3),
        ('G', 1, 5),
        ('G', 4, 5),
        ('G', 7, 5),
    ],
    &[
        ('G', 3, 2),
        ('G', 4, 2),
        ('G', 5, 2),
        ('G', 3, 3),
        ('E', 4, 3),
        ('G', 5, 3),
        ('G', 1, 4),
        ('G', 4, 4),
        ('G', 7, 5),
    ],
];

/// [`MOVEMENT`] as printed after rounds 1 to 3.
pub const MOVEMENT_MAPS: [&[&str]; 3] = [
    &[
        "#########", //
        "#.G...G.#", //
        "#...G...#", //
        "#...E..G#", //
        "#.G.....#", //
        "#.......#", //
        "#G..G..G#", //
        "#.......#", //
        "#########",
    ],
    &[
        "#########", //
        "#..G.G..#", //
        "#...G...#", //
        "#.G.E.G.#", //
        "#.......#", //
        "#G..G..G#", //
        "#.......#", //
        "#.......#", //
        "#########",
    ],
    &[
        "#########", //
        "#.......#", //
        "#..GGG..#", //
        "#..GEG..#", //
        "#G..G...#", //
        "#......G#", //
        "#.......#", //
        "#.......#", //
        "#########",
    ],
];
