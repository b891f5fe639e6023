use crate::chess::{Piece, Promotion, Role, Square};
use derive_more::{Debug, Deref, Display, Error};
use std::str::FromStr;

/// The context of a chess move, as applied to a [`Board`][`crate::chess::Board`].
///
/// Holds the [`Piece`] moved as it stood before the move, the captured piece along with
/// the [`Square`] it was captured on, and the [`Role`] a pawn was promoted to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deref)]
pub struct MoveContext(
    #[deref] pub Move,
    pub Piece,
    pub Option<(Piece, Square)>,
    pub Option<Role>,
);

impl MoveContext {
    /// The [`Piece`] moved.
    pub fn piece(&self) -> Piece {
        self.1
    }

    /// The [`Piece`] captured and where it stood, if any.
    pub fn capture(&self) -> Option<(Piece, Square)> {
        self.2
    }

    /// The [`Role`] the pawn was promoted to, if any.
    pub fn promotion(&self) -> Option<Role> {
        self.3
    }

    /// Whether this is a castling move.
    pub fn is_castling(&self) -> bool {
        let (_, cols) = self.whither() - self.whence();
        self.piece().role() == Role::King && cols.abs() > 1
    }

    /// Whether this is a capture move.
    pub fn is_capture(&self) -> bool {
        self.capture().is_some()
    }

    /// Whether this is an en passant capture move.
    pub fn is_en_passant(&self) -> bool {
        self.capture().is_some_and(|(_, s)| self.whither() != s)
    }

    /// Whether this is a promotion move.
    pub fn is_promotion(&self) -> bool {
        self.promotion().is_some()
    }

    /// Whether this is a pawn advancing two squares.
    pub fn is_double_step(&self) -> bool {
        let (rows, _) = self.whither() - self.whence();
        self.piece().role() == Role::Pawn && rows.abs() == 2
    }

    /// Where the rook stands before and after castling, if this is a castling move.
    pub fn castling_rook(&self) -> Option<(Square, Square)> {
        if !self.is_castling() {
            return None;
        }

        let (whence, whither) = (self.whence(), self.whither());
        let corner = if whither > whence { 7 } else { 0 };
        let rook = Square::at(whence.row(), corner);
        let landing = Square::at(whence.row(), (whence.col() + whither.col()) / 2);
        Some((rook, landing))
    }
}

/// A chess move in [pure coordinate notation].
///
/// [pure coordinate notation]: https://www.chessprogramming.org/Algebraic_Chess_Notation#Pure_coordinate_notation
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[cfg_attr(test, filter(#self.0 != #self.1))]
#[debug("Move({self})")]
#[display("{_0}{_1}{_2}")]
pub struct Move(pub Square, pub Square, pub Promotion);

impl Move {
    /// A move without a promotion specifier.
    pub fn new(whence: Square, whither: Square) -> Self {
        Move(whence, whither, Promotion::None)
    }

    /// The source [`Square`].
    pub fn whence(&self) -> Square {
        self.0
    }

    /// The destination [`Square`].
    pub fn whither(&self) -> Square {
        self.1
    }

    /// The [`Promotion`] specifier.
    pub fn promotion(&self) -> Promotion {
        self.2
    }
}

/// The reason why the string is not a valid move.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse move, expected something like `e2 e4` or `e7e8q`")]
pub struct ParseMoveError;

impl FromStr for Move {
    type Err = ParseMoveError;

    /// Parses moves such as `e2e4`, `e2 e4`, `e7e8q` or `e7 e8 q`, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = String::from_iter(s.split_whitespace()).to_ascii_lowercase();
        let (Some(whence), Some(whither), Some(promotion)) = (s.get(..2), s.get(2..4), s.get(4..))
        else {
            return Err(ParseMoveError);
        };

        Ok(Move(
            whence.parse().map_err(|_| ParseMoveError)?,
            whither.parse().map_err(|_| ParseMoveError)?,
            promotion.parse().map_err(|_| ParseMoveError)?,
        ))
    }
}
