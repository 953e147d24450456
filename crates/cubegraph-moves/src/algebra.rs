//! Move-path tokenizing, reversal and normalization.

use std::fmt;
use std::str::FromStr;

use crate::error::{MoveError, Result};
use crate::token::{Layer, Modifier, MoveBase, MoveToken};

/// Split a move path into unit tokens with their repeat counts.
///
/// Each entry is a plain or prime quarter turn; an odd number of primes makes
/// it prime. Whitespace between tokens is ignored. A missing count means one.
pub fn tokenize(path: &str) -> Result<Vec<(MoveToken, usize)>> {
    let mut runs = Vec::new();
    let mut chars = path.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }
        let layer = Layer::from_symbol(ch).ok_or(MoveError::UnexpectedChar { ch, offset })?;

        let wide = chars.next_if(|&(_, c)| c == 'w').is_some();
        let base = MoveBase::new(layer, wide)?;

        let mut primes = 0usize;
        while chars.next_if(|&(_, c)| c == '\'').is_some() {
            primes += 1;
        }

        let mut digits = String::new();
        let mut digits_at = offset;
        while let Some((at, c)) = chars.next_if(|&(_, c)| c.is_ascii_digit()) {
            if digits.is_empty() {
                digits_at = at;
            }
            digits.push(c);
        }
        let count = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| MoveError::InvalidRepeat {
                digits: digits.clone(),
                offset: digits_at,
            })?
        };

        let modifier = if primes % 2 == 1 {
            Modifier::Prime
        } else {
            Modifier::Plain
        };
        runs.push((MoveToken::new(base, modifier), count));
    }

    Ok(runs)
}

/// Reverse a move path: reverse the order and invert every token.
///
/// Counts fold into their token first, so `"U2"` reverses to `"U2"` and
/// `"U'3"` to `"U'"`.
pub fn reverse(path: &str) -> Result<String> {
    let reversed: MoveSequence = tokenize(path)?
        .into_iter()
        .rev()
        .filter_map(|(unit, count)| fold_run(unit, count))
        .map(MoveToken::inverse)
        .collect();
    Ok(reversed.to_string())
}

/// Canonicalize a move path.
///
/// Expands counts, then merges each run of tokens sharing a base into one
/// token for the net quarter turns (mod 4), dropping runs that cancel. A
/// dropped run lets its neighbours merge, so `"URR'U"` becomes `"U2"`.
pub fn normalize(path: &str) -> Result<String> {
    Ok(path.parse::<MoveSequence>()?.normalized().to_string())
}

fn fold_run(unit: MoveToken, count: usize) -> Option<MoveToken> {
    // Only the count mod 4 matters.
    let turns = unit.quarter_turns() * (count % 4) as i64;
    MoveToken::from_quarter_turns(unit.base(), turns)
}

/// An ordered sequence of move tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MoveSequence(Vec<MoveToken>);

impl MoveSequence {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// The tokens in order.
    pub fn tokens(&self) -> &[MoveToken] {
        &self.0
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a token.
    pub fn push(&mut self, token: MoveToken) {
        self.0.push(token);
    }

    /// Iterate over the tokens.
    pub fn iter(&self) -> std::slice::Iter<'_, MoveToken> {
        self.0.iter()
    }

    /// Merge runs of the same base into canonical tokens.
    ///
    /// No two adjacent tokens of the result share a base.
    pub fn normalized(&self) -> MoveSequence {
        let mut out: Vec<MoveToken> = Vec::with_capacity(self.0.len());

        for &token in &self.0 {
            match out.last().copied() {
                Some(top) if top.base() == token.base() => {
                    out.pop();
                    let turns = top.quarter_turns() + token.quarter_turns();
                    if let Some(merged) = MoveToken::from_quarter_turns(token.base(), turns) {
                        out.push(merged);
                    }
                }
                _ => out.push(token),
            }
        }

        MoveSequence(out)
    }

    /// The sequence that undoes this one.
    pub fn reversed(&self) -> MoveSequence {
        self.0.iter().rev().map(|t| t.inverse()).collect()
    }
}

impl FromStr for MoveSequence {
    type Err = MoveError;

    /// Tokenize and expand repeat counts into unit tokens. Counts are taken
    /// mod 4, since four quarter turns of one base are the identity.
    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        for (unit, count) in tokenize(s)? {
            tokens.extend(std::iter::repeat(unit).take(count % 4));
        }
        Ok(MoveSequence(tokens))
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.0 {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl FromIterator<MoveToken> for MoveSequence {
    fn from_iter<I: IntoIterator<Item = MoveToken>>(iter: I) -> Self {
        MoveSequence(iter.into_iter().collect())
    }
}

impl From<Vec<MoveToken>> for MoveSequence {
    fn from(tokens: Vec<MoveToken>) -> Self {
        MoveSequence(tokens)
    }
}

impl<'a> IntoIterator for &'a MoveSequence {
    type Item = &'a MoveToken;
    type IntoIter = std::slice::Iter<'a, MoveToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
