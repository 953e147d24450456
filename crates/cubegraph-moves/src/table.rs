//! Facelet permutation tables.
//!
//! Nine base quarter turns (U D R L F B E M S) are given as explicit
//! `(from, to)` pair lists. Every other token is derived from them:
//! - prime: each pair reversed
//! - wide: the face plus its adjacent slice, turned the same way
//! - x y z: the three parallel layers of an axis
//! - double: the quarter turn composed with itself
//!
//! The table is built once, on first use, and never mutated.

use std::sync::LazyLock;

use crate::facelets::Facelets;
use crate::token::{Layer, Modifier, MoveBase, MoveToken};
use crate::FACELET_COUNT;

/// A `(from, to)` facelet pair: the facelet in slot `from` moves to slot `to`.
pub type FaceletMove = (u8, u8);

const U_TURN: [FaceletMove; 20] = [
    (6, 15), (7, 16), (8, 17), (15, 24),
    (16, 25), (17, 26), (24, 33), (25, 34),
    (26, 35), (33, 6), (34, 7), (35, 8),
    (36, 42), (39, 43), (42, 44), (37, 39),
    (43, 41), (38, 36), (41, 37), (44, 38),
];

const D_TURN: [FaceletMove; 20] = [
    (0, 27), (1, 28), (2, 29), (9, 0),
    (10, 1), (11, 2), (18, 9), (19, 10),
    (20, 11), (27, 18), (28, 19), (29, 20),
    (45, 51), (48, 52), (51, 53), (46, 48),
    (52, 50), (47, 45), (50, 46), (53, 47),
];

const R_TURN: [FaceletMove; 20] = [
    (2, 38), (5, 41), (8, 44), (38, 24),
    (41, 21), (44, 18), (24, 47), (21, 50),
    (18, 53), (47, 2), (50, 5), (53, 8),
    (27, 33), (30, 34), (33, 35), (28, 30),
    (34, 32), (29, 27), (32, 28), (35, 29),
];

const L_TURN: [FaceletMove; 20] = [
    (0, 45), (3, 48), (6, 51), (36, 0),
    (39, 3), (42, 6), (26, 36), (23, 39),
    (20, 42), (45, 26), (48, 23), (51, 20),
    (11, 9), (14, 10), (17, 11), (10, 12),
    (16, 14), (9, 15), (12, 16), (15, 17),
];

const F_TURN: [FaceletMove; 20] = [
    (36, 33), (37, 30), (38, 27), (33, 53),
    (30, 52), (27, 51), (53, 11), (52, 14),
    (51, 17), (11, 36), (14, 37), (17, 38),
    (0, 6), (3, 7), (6, 8), (1, 3),
    (7, 5), (2, 0), (5, 1), (8, 2),
];

const B_TURN: [FaceletMove; 20] = [
    (44, 15), (43, 12), (42, 9), (15, 45),
    (12, 46), (9, 47), (45, 29), (46, 32),
    (47, 35), (29, 44), (32, 43), (35, 42),
    (18, 24), (21, 25), (24, 26), (19, 21),
    (25, 23), (20, 18), (23, 19), (26, 20),
];

const E_TURN: [FaceletMove; 12] = [
    (3, 30), (4, 31), (5, 32), (12, 3),
    (13, 4), (14, 5), (21, 12), (22, 13),
    (23, 14), (30, 21), (31, 22), (32, 23),
];

const M_TURN: [FaceletMove; 12] = [
    (1, 46), (4, 49), (7, 52), (37, 1),
    (40, 4), (43, 7), (25, 37), (22, 40),
    (19, 43), (46, 25), (49, 22), (52, 19),
];

const S_TURN: [FaceletMove; 12] = [
    (39, 34), (40, 31), (41, 28), (34, 50),
    (31, 49), (28, 48), (50, 10), (49, 13),
    (48, 16), (10, 39), (13, 40), (16, 41),
];

static TABLE: LazyLock<PermutationTable> = LazyLock::new(PermutationTable::build);

/// One table entry: the pair list and the full slot mapping derived from it.
struct Entry {
    pairs: Vec<FaceletMove>,
    /// `sources[to] = from`, identity for uncovered slots
    sources: [u8; FACELET_COUNT],
}

impl Entry {
    fn from_pairs(pairs: Vec<FaceletMove>) -> Self {
        let mut sources: [u8; FACELET_COUNT] = std::array::from_fn(|slot| slot as u8);
        for &(from, to) in &pairs {
            sources[to as usize] = from;
        }
        Self { pairs, sources }
    }

    fn doubled(&self) -> Self {
        let pairs = (0..FACELET_COUNT)
            .filter_map(|to| {
                let from = self.sources[self.sources[to] as usize];
                (from as usize != to).then_some((from, to as u8))
            })
            .collect();
        Self::from_pairs(pairs)
    }
}

/// Immutable mapping from every move token to its facelet permutation.
pub struct PermutationTable {
    entries: Vec<Entry>,
}

impl PermutationTable {
    /// The process-wide table.
    pub fn global() -> &'static PermutationTable {
        &TABLE
    }

    fn build() -> Self {
        let mut entries: Vec<Option<Entry>> = (0..MoveToken::COUNT).map(|_| None).collect();

        for base in MoveBase::all() {
            let plain = Entry::from_pairs(quarter_turn(base));
            let prime = Entry::from_pairs(inverted(&plain.pairs));
            let double = plain.doubled();

            entries[MoveToken::new(base, Modifier::Plain).index()] = Some(plain);
            entries[MoveToken::new(base, Modifier::Prime).index()] = Some(prime);
            entries[MoveToken::new(base, Modifier::Double).index()] = Some(double);
        }

        Self {
            entries: entries.into_iter().flatten().collect(),
        }
    }

    /// The `(from, to)` pairs of a token.
    pub fn pairs(&self, token: MoveToken) -> &[FaceletMove] {
        &self.entries[token.index()].pairs
    }

    /// Apply a token to a permutation: `new[to] = old[from]` for every pair.
    pub fn apply(&self, token: MoveToken, facelets: &Facelets) -> Facelets {
        facelets.permute(&self.entries[token.index()].sources)
    }
}

/// Pairs for one plain quarter turn of `base`.
fn quarter_turn(base: MoveBase) -> Vec<FaceletMove> {
    let layer = base.layer();
    if base.is_wide() {
        // Face plus adjacent slice; the slice sign follows the face.
        return match layer {
            Layer::U => join(&[&U_TURN, &inverted(&E_TURN)]),
            Layer::D => join(&[&D_TURN, &E_TURN]),
            Layer::R => join(&[&R_TURN, &inverted(&M_TURN)]),
            Layer::L => join(&[&L_TURN, &M_TURN]),
            Layer::F => join(&[&F_TURN, &S_TURN]),
            Layer::B => join(&[&B_TURN, &inverted(&S_TURN)]),
            // MoveBase rejects wide slices and rotations.
            _ => Vec::new(),
        };
    }

    match layer {
        Layer::U => U_TURN.to_vec(),
        Layer::D => D_TURN.to_vec(),
        Layer::R => R_TURN.to_vec(),
        Layer::L => L_TURN.to_vec(),
        Layer::F => F_TURN.to_vec(),
        Layer::B => B_TURN.to_vec(),
        Layer::E => E_TURN.to_vec(),
        Layer::M => M_TURN.to_vec(),
        Layer::S => S_TURN.to_vec(),
        Layer::X => join(&[&inverted(&L_TURN), &inverted(&M_TURN), &R_TURN]),
        Layer::Y => join(&[&U_TURN, &inverted(&E_TURN), &inverted(&D_TURN)]),
        Layer::Z => join(&[&F_TURN, &S_TURN, &inverted(&B_TURN)]),
    }
}

fn inverted(pairs: &[FaceletMove]) -> Vec<FaceletMove> {
    pairs.iter().map(|&(from, to)| (to, from)).collect()
}

fn join(parts: &[&[FaceletMove]]) -> Vec<FaceletMove> {
    parts.concat()
}
