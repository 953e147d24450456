//! Facelet permutation arrays.

use std::fmt;
use std::ops::Index;

use crate::algebra::MoveSequence;
use crate::error::{MoveError, Result};
use crate::table::PermutationTable;
use crate::token::MoveToken;
use crate::FACELET_COUNT;

/// One cube state: which original facelet sits in each of the 54 slots.
///
/// Always a bijection of `0..54`; the only constructors are the identity,
/// validated slices, and move application.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "Vec<u8>", try_from = "Vec<u8>")
)]
pub struct Facelets([u8; FACELET_COUNT]);

impl Facelets {
    /// The solved cube.
    pub const IDENTITY: Self = Self::identity();

    const fn identity() -> Self {
        let mut slots = [0u8; FACELET_COUNT];
        let mut i = 0;
        while i < FACELET_COUNT {
            slots[i] = i as u8;
            i += 1;
        }
        Self(slots)
    }

    /// Build from raw slot values, checking that they form a permutation.
    pub fn from_slice(values: &[u8]) -> Result<Self> {
        if values.len() != FACELET_COUNT {
            return Err(MoveError::InvalidPermutation(format!(
                "expected {} facelets, got {}",
                FACELET_COUNT,
                values.len()
            )));
        }

        let mut seen = [false; FACELET_COUNT];
        let mut slots = [0u8; FACELET_COUNT];
        for (slot, &value) in values.iter().enumerate() {
            let index = value as usize;
            if index >= FACELET_COUNT {
                return Err(MoveError::InvalidPermutation(format!(
                    "facelet {value} out of range at slot {slot}"
                )));
            }
            if seen[index] {
                return Err(MoveError::InvalidPermutation(format!(
                    "facelet {value} repeated at slot {slot}"
                )));
            }
            seen[index] = true;
            slots[slot] = value;
        }

        Ok(Self(slots))
    }

    /// The raw slot values.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Whether this is the solved cube.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// The permutation after turning `token`. Does not modify `self`.
    pub fn apply(&self, token: MoveToken) -> Self {
        PermutationTable::global().apply(token, self)
    }

    /// The permutation after turning every token of `moves` in order.
    pub fn apply_sequence(&self, moves: &MoveSequence) -> Self {
        moves.iter().fold(*self, |facelets, &token| facelets.apply(token))
    }

    /// Rearrange slots so that `new[i] = self[sources[i]]`.
    pub(crate) fn permute(&self, sources: &[u8; FACELET_COUNT]) -> Self {
        Self(std::array::from_fn(|slot| self.0[sources[slot] as usize]))
    }
}

impl Default for Facelets {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Index<usize> for Facelets {
    type Output = u8;

    fn index(&self, slot: usize) -> &u8 {
        &self.0[slot]
    }
}

impl fmt::Debug for Facelets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl From<Facelets> for Vec<u8> {
    fn from(facelets: Facelets) -> Self {
        facelets.0.to_vec()
    }
}

impl TryFrom<Vec<u8>> for Facelets {
    type Error = MoveError;

    fn try_from(values: Vec<u8>) -> Result<Self> {
        Self::from_slice(&values)
    }
}
