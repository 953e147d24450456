//! Move tokens.
//!
//! A token is a base (layer plus wide flag) and a modifier. Tokens are a closed
//! vocabulary: 18 bases times 3 modifiers, each with a fixed table index.

use std::fmt;
use std::str::FromStr;

use crate::algebra::tokenize;
use crate::error::{MoveError, Result};

/// The layer a move turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    U,
    D,
    R,
    L,
    F,
    B,
    /// Slice between U and D, turning like D
    E,
    /// Slice between R and L, turning like L
    M,
    /// Slice between F and B, turning like F
    S,
    /// Whole-cube rotation following R
    X,
    /// Whole-cube rotation following U
    Y,
    /// Whole-cube rotation following F
    Z,
}

impl Layer {
    /// All layers in table order.
    pub const ALL: [Layer; 12] = [
        Layer::U,
        Layer::D,
        Layer::R,
        Layer::L,
        Layer::F,
        Layer::B,
        Layer::E,
        Layer::M,
        Layer::S,
        Layer::X,
        Layer::Y,
        Layer::Z,
    ];

    /// The six outer faces, the only layers with wide variants.
    pub const FACES: [Layer; 6] = [Layer::U, Layer::D, Layer::R, Layer::L, Layer::F, Layer::B];

    /// Notation character for this layer.
    pub const fn symbol(self) -> char {
        match self {
            Layer::U => 'U',
            Layer::D => 'D',
            Layer::R => 'R',
            Layer::L => 'L',
            Layer::F => 'F',
            Layer::B => 'B',
            Layer::E => 'E',
            Layer::M => 'M',
            Layer::S => 'S',
            Layer::X => 'x',
            Layer::Y => 'y',
            Layer::Z => 'z',
        }
    }

    /// Parse a notation character.
    pub fn from_symbol(ch: char) -> Option<Self> {
        Self::ALL.into_iter().find(|layer| layer.symbol() == ch)
    }

    /// Whether this is an outer face.
    pub const fn is_face(self) -> bool {
        matches!(
            self,
            Layer::U | Layer::D | Layer::R | Layer::L | Layer::F | Layer::B
        )
    }
}

/// Direction and amount of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Modifier {
    /// One clockwise quarter turn
    #[default]
    Plain,
    /// One counter-clockwise quarter turn
    Prime,
    /// Half turn
    Double,
}

impl Modifier {
    /// All modifiers in table order.
    pub const ALL: [Modifier; 3] = [Modifier::Plain, Modifier::Prime, Modifier::Double];

    /// Notation suffix.
    pub const fn suffix(self) -> &'static str {
        match self {
            Modifier::Plain => "",
            Modifier::Prime => "'",
            Modifier::Double => "2",
        }
    }

    /// Signed quarter turns: +1, -1 or 2.
    pub const fn quarter_turns(self) -> i64 {
        match self {
            Modifier::Plain => 1,
            Modifier::Prime => -1,
            Modifier::Double => 2,
        }
    }

    /// Modifier for a net number of quarter turns, `None` when they cancel.
    pub fn from_quarter_turns(turns: i64) -> Option<Self> {
        match turns.rem_euclid(4) {
            1 => Some(Modifier::Plain),
            2 => Some(Modifier::Double),
            3 => Some(Modifier::Prime),
            _ => None,
        }
    }

    /// The modifier that undoes this one.
    pub const fn inverse(self) -> Self {
        match self {
            Modifier::Plain => Modifier::Prime,
            Modifier::Prime => Modifier::Plain,
            Modifier::Double => Modifier::Double,
        }
    }

    const fn index(self) -> usize {
        match self {
            Modifier::Plain => 0,
            Modifier::Prime => 1,
            Modifier::Double => 2,
        }
    }
}

/// A layer together with its wide flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MoveBase {
    layer: Layer,
    wide: bool,
}

impl MoveBase {
    /// Number of distinct bases: 6 faces, 6 wide faces, 3 slices, 3 rotations.
    pub const COUNT: usize = 18;

    /// A single-layer base.
    pub const fn single(layer: Layer) -> Self {
        Self { layer, wide: false }
    }

    /// Create a base, rejecting wide slices and rotations.
    pub fn new(layer: Layer, wide: bool) -> Result<Self> {
        if wide && !layer.is_face() {
            return Err(MoveError::WideSlice(layer.symbol()));
        }
        Ok(Self { layer, wide })
    }

    /// The turned layer.
    pub const fn layer(self) -> Layer {
        self.layer
    }

    /// Whether the adjacent slice turns along with the face.
    pub const fn is_wide(self) -> bool {
        self.wide
    }

    /// Table index in `0..COUNT`.
    pub const fn index(self) -> usize {
        let layer = self.layer as usize;
        if self.wide {
            6 + layer
        } else if layer < 6 {
            layer
        } else {
            // E M S x y z follow the wide faces
            layer + 6
        }
    }

    /// Every base in table order.
    pub fn all() -> impl Iterator<Item = MoveBase> {
        let faces = Layer::FACES.into_iter().map(MoveBase::single);
        let wide = Layer::FACES.into_iter().map(|layer| MoveBase { layer, wide: true });
        let rest = Layer::ALL[6..].iter().copied().map(MoveBase::single);
        faces.chain(wide).chain(rest)
    }
}

impl fmt::Display for MoveBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.layer.symbol())?;
        if self.wide {
            write!(f, "w")?;
        }
        Ok(())
    }
}

/// A canonical move: base plus modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub struct MoveToken {
    base: MoveBase,
    modifier: Modifier,
}

impl MoveToken {
    /// Number of distinct tokens.
    pub const COUNT: usize = MoveBase::COUNT * 3;

    /// Create a token.
    pub const fn new(base: MoveBase, modifier: Modifier) -> Self {
        Self { base, modifier }
    }

    /// A plain quarter turn of a single layer.
    pub const fn quarter(layer: Layer) -> Self {
        Self::new(MoveBase::single(layer), Modifier::Plain)
    }

    /// The base of this token.
    pub const fn base(self) -> MoveBase {
        self.base
    }

    /// The modifier of this token.
    pub const fn modifier(self) -> Modifier {
        self.modifier
    }

    /// Whether this token turns counter-clockwise.
    pub const fn is_reverse(self) -> bool {
        matches!(self.modifier, Modifier::Prime)
    }

    /// The same base with no modifier.
    pub const fn unmodified(self) -> Self {
        Self::new(self.base, Modifier::Plain)
    }

    /// The token that undoes this one.
    pub const fn inverse(self) -> Self {
        Self::new(self.base, self.modifier.inverse())
    }

    /// Signed quarter turns of this token.
    pub const fn quarter_turns(self) -> i64 {
        self.modifier.quarter_turns()
    }

    /// Token for `turns` net quarter turns of `base`, `None` when they cancel.
    pub fn from_quarter_turns(base: MoveBase, turns: i64) -> Option<Self> {
        Modifier::from_quarter_turns(turns).map(|modifier| Self::new(base, modifier))
    }

    /// Table index in `0..COUNT`.
    pub const fn index(self) -> usize {
        self.base.index() * 3 + self.modifier.index()
    }

    /// Every token in table order.
    pub fn all() -> impl Iterator<Item = MoveToken> {
        MoveBase::all().flat_map(|base| Modifier::ALL.map(|modifier| MoveToken::new(base, modifier)))
    }
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.modifier.suffix())
    }
}

impl FromStr for MoveToken {
    type Err = MoveError;

    /// Parse one token. Repeat counts and stacked primes reduce to the net
    /// quarter turn, so `"U'3"` parses as `U` and `"UU"` is rejected.
    fn from_str(s: &str) -> Result<Self> {
        match tokenize(s)?.as_slice() {
            [(unit, count)] => {
                let count = i64::try_from(*count)
                    .map_err(|_| MoveError::NotSingleToken(s.to_string()))?;
                MoveToken::from_quarter_turns(unit.base(), unit.quarter_turns() * count)
                    .ok_or_else(|| MoveError::IdentityToken(s.to_string()))
            }
            _ => Err(MoveError::NotSingleToken(s.to_string())),
        }
    }
}

impl From<MoveToken> for String {
    fn from(token: MoveToken) -> Self {
        token.to_string()
    }
}

impl TryFrom<String> for MoveToken {
    type Error = MoveError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_unique() {
        let mut seen = [false; MoveToken::COUNT];
        for token in MoveToken::all() {
            assert!(!seen[token.index()], "duplicate index for {token}");
            seen[token.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn base_indices_follow_table_order() {
        for (i, base) in MoveBase::all().enumerate() {
            assert_eq!(base.index(), i);
        }
    }

    #[test]
    fn display_round_trips() {
        for token in MoveToken::all() {
            let text = token.to_string();
            assert_eq!(text.parse::<MoveToken>().unwrap(), token);
        }
    }

    #[test]
    fn parse_reduces_counts() {
        let u = MoveToken::quarter(Layer::U);
        assert_eq!("U'3".parse::<MoveToken>().unwrap(), u);
        assert_eq!("U2".parse::<MoveToken>().unwrap().modifier(), Modifier::Double);
        assert_eq!("U''".parse::<MoveToken>().unwrap(), u);
        assert_eq!("Rw'".parse::<MoveToken>().unwrap().to_string(), "Rw'");
    }

    #[test]
    fn parse_rejects_non_tokens() {
        assert_eq!(
            "U4".parse::<MoveToken>(),
            Err(MoveError::IdentityToken("U4".into()))
        );
        assert_eq!(
            "UR".parse::<MoveToken>(),
            Err(MoveError::NotSingleToken("UR".into()))
        );
        assert_eq!(
            "".parse::<MoveToken>(),
            Err(MoveError::NotSingleToken("".into()))
        );
        assert_eq!("Mw".parse::<MoveToken>(), Err(MoveError::WideSlice('M')));
        assert!(matches!(
            "Q".parse::<MoveToken>(),
            Err(MoveError::UnexpectedChar { ch: 'Q', offset: 0 })
        ));
    }

    #[test]
    fn inverse_flips_prime_only() {
        let r = MoveToken::quarter(Layer::R);
        assert_eq!(r.inverse().to_string(), "R'");
        assert_eq!(r.inverse().inverse(), r);

        let r2 = MoveToken::new(r.base(), Modifier::Double);
        assert_eq!(r2.inverse(), r2);
    }

    #[test]
    fn helpers() {
        let token: MoveToken = "Fw'".parse().unwrap();
        assert!(token.is_reverse());
        assert_eq!(token.unmodified().to_string(), "Fw");
        assert!(!token.unmodified().is_reverse());
    }

    #[test]
    fn wide_requires_face() {
        assert!(MoveBase::new(Layer::U, true).is_ok());
        assert_eq!(MoveBase::new(Layer::X, true), Err(MoveError::WideSlice('x')));
    }
}
