//! Cubegraph Move Algebra
//!
//! Move vocabulary, move-path canonicalization and facelet permutation tables
//! for the 3x3x3 cube.
//!
//! # Move Paths
//!
//! A move path is a string of tokens following the grammar
//! `base['w']['\''...][digits]`:
//! - faces `U D R L F B` (optionally wide with `w`)
//! - slices `E M S`
//! - whole-cube rotations `x y z`
//!
//! Primes toggle direction; a trailing count repeats the token. Normalization
//! folds runs of the same base into a single canonical token (`U`, `U2`, `U'`)
//! or drops them entirely when they cancel.
//!
//! # Facelet Layout
//!
//! A cube state is a permutation of the 54 facelets, numbered face by face:
//!
//! | face | indices | center |
//! |------|---------|--------|
//! | F    | 0-8     | 4      |
//! | L    | 9-17    | 13     |
//! | B    | 18-26   | 22     |
//! | R    | 27-35   | 31     |
//! | U    | 36-44   | 40     |
//! | D    | 45-53   | 49     |
//!
//! Applying a move writes `new[to] = old[from]` for each `(from, to)` pair of
//! the move's table entry; uncovered facelets are copied unchanged.

mod algebra;
mod error;
mod facelets;
mod table;
mod token;

pub use algebra::{normalize, reverse, tokenize, MoveSequence};
pub use error::{MoveError, Result};
pub use facelets::Facelets;
pub use table::{FaceletMove, PermutationTable};
pub use token::{Layer, Modifier, MoveBase, MoveToken};

/// Facelets per cube face
pub const FACELETS_PER_FACE: usize = 9;

/// Number of cube faces
pub const FACE_COUNT: usize = 6;

/// Total facelets in a cube state (invariant: always 54)
pub const FACELET_COUNT: usize = 54;

// Compile-time assertion of the facelet count
const _: () = assert!(FACELETS_PER_FACE * FACE_COUNT == FACELET_COUNT);
