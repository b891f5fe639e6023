use crate::chess::{Color, Move, MoveContext, Piece, Promotion, Role, Square};
use derive_more::{Display, Error};
use std::fmt::{self, Write};
use std::ops::Index;
use tracing::{debug, instrument};

/// The layout of the back rank at the start of a game, from the `a` file to the `h` file.
pub const STARTING_COORD: [Role; 8] = [
    Role::Rook,
    Role::Knight,
    Role::Bishop,
    Role::Queen,
    Role::King,
    Role::Bishop,
    Role::Knight,
    Role::Rook,
];

/// The reason why a [`Move`] is illegal on a given [`Board`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum IllegalMoveReason {
    #[display("there is no piece to move")]
    EmptySquare,
    #[display("the piece belongs to the opponent")]
    OpponentPiece,
    #[display("the piece cannot reach the destination")]
    Unreachable,
    #[display("the king would be left in check")]
    SelfCheck,
    #[display("the king cannot castle out of or through check")]
    CastlingThroughCheck,
}

/// Represents an illegal [`Move`] on a given [`Board`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display("move `{_0}` is illegal: {_1}")]
pub struct IllegalMove(#[error(not(source))] pub Move, #[error(not(source))] pub IllegalMoveReason);

/// The chess board.
///
/// Cloning a board yields an independent copy, which is how moves are tried out
/// without disturbing the game in progress.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct Board {
    grid: [[Option<Piece>; 8]; 8],
    #[cfg_attr(test, strategy(proptest::strategy::Just(None)))]
    prev_move: Option<MoveContext>,
}

impl Default for Board {
    fn default() -> Self {
        let mut board = Board::empty();
        board.initialize_pieces();
        board
    }
}

impl Board {
    /// A board set up for a new game.
    pub fn new() -> Self {
        Self::default()
    }

    /// A board without any pieces.
    pub fn empty() -> Self {
        Board {
            grid: [[None; 8]; 8],
            prev_move: None,
        }
    }

    /// Resets the board to the standard starting position.
    pub fn initialize_pieces(&mut self) {
        self.grid = [[None; 8]; 8];
        self.prev_move = None;

        for c in Color::iter() {
            for (col, &role) in STARTING_COORD.iter().enumerate() {
                let back = Square::at(c.back_row(), col as u8);
                let pawn = Square::at(c.pawn_row(), col as u8);
                self.set(back, Some(Piece::new(role, c)));
                self.set(pawn, Some(Piece::new(Role::Pawn, c)));
            }
        }
    }

    /// The contents of every square, row by row starting at `a8`.
    #[inline(always)]
    pub fn grid(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.grid
    }

    /// The [`Piece`] on the given [`Square`], if any.
    #[inline(always)]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self[sq]
    }

    /// Places a piece on a square, or clears it, returning what stood there.
    #[inline(always)]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) -> Option<Piece> {
        let cell = &mut self.grid[sq.row() as usize][sq.col() as usize];
        std::mem::replace(cell, piece)
    }

    /// The last move applied to this board, if any.
    #[inline(always)]
    pub fn prev_move(&self) -> Option<&MoveContext> {
        self.prev_move.as_ref()
    }

    /// An iterator over the pieces of a [`Color`] and the squares they stand on.
    pub fn pieces(&self, side: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(move |sq| match self[sq] {
            Some(p) if p.color() == side => Some((sq, p)),
            _ => None,
        })
    }

    /// [`Square`] occupied by the king of a [`Color`].
    pub fn king(&self, side: Color) -> Option<Square> {
        self.pieces(side)
            .find(|(_, p)| p.role() == Role::King)
            .map(|(sq, _)| sq)
    }

    /// Whether a [`Square`] is attacked by any piece of a [`Color`].
    pub fn in_check(&self, sq: Square, by: Color) -> bool {
        self.pieces(by)
            .any(|(whence, p)| p.attacks(whence, self).contains(&sq))
    }

    /// Whether the king of a [`Color`] is attacked.
    ///
    /// A side without a king is never in check.
    pub fn is_check(&self, side: Color) -> bool {
        self.king(side).is_some_and(|k| self.in_check(k, !side))
    }

    /// Checks whether a [`Color`] may play a [`Move`] on this board.
    ///
    /// Returns the context the move would be applied with, without touching the board.
    pub fn check(&self, m: Move, side: Color) -> Result<MoveContext, IllegalMove> {
        use IllegalMoveReason::*;

        let (whence, whither) = (m.whence(), m.whither());
        let piece = self[whence].ok_or(IllegalMove(m, EmptySquare))?;

        if piece.color() != side {
            return Err(IllegalMove(m, OpponentPiece));
        } else if !piece.can_move(whence, whither, self) {
            return Err(IllegalMove(m, Unreachable));
        }

        let mc = self.context(m, piece);

        if mc.is_castling()
            && (self.in_check(whence, !side)
                || Square::between(whence, whither).any(|sq| self.in_check(sq, !side)))
        {
            return Err(IllegalMove(m, CastlingThroughCheck));
        }

        if self.simulate(m).is_check(side) {
            return Err(IllegalMove(m, SelfCheck));
        }

        Ok(mc)
    }

    /// Whether a [`Color`] may play a [`Move`] on this board.
    pub fn is_legal(&self, m: Move, side: Color) -> bool {
        self.check(m, side).is_ok()
    }

    /// Plays a [`Move`] on behalf of a [`Color`] if legal, otherwise leaves the board untouched.
    #[instrument(level = "trace", skip(self), ret, err)]
    pub fn update(&mut self, m: Move, side: Color) -> Result<MoveContext, IllegalMove> {
        let mc = self.check(m, side).map_err(|e| {
            debug!(%e, "rejected move");
            e
        })?;

        self.apply(&mc);
        Ok(mc)
    }

    /// The board that would result from a [`Move`], without checking its legality.
    ///
    /// This board is left untouched.
    pub fn simulate(&self, m: Move) -> Board {
        let mut next = self.clone();

        if let Some(piece) = self[m.whence()] {
            next.apply(&self.context(m, piece));
        }

        next
    }

    /// Every legal move available to a [`Color`].
    ///
    /// Pawn promotions are listed once for every possible choice of piece.
    pub fn legal_moves(&self, side: Color) -> Vec<MoveContext> {
        let mut moves = Vec::new();

        for (whence, piece) in self.pieces(side) {
            for whither in piece.moves(whence, self) {
                let Ok(mc) = self.check(Move::new(whence, whither), side) else {
                    continue;
                };

                if mc.is_promotion() {
                    for p in Promotion::CHOICES {
                        moves.extend(self.check(Move(whence, whither, p), side));
                    }
                } else {
                    moves.push(mc);
                }
            }
        }

        moves
    }

    /// Whether a [`Color`] has at least one legal move.
    pub fn has_legal_moves(&self, side: Color) -> bool {
        self.pieces(side).any(|(whence, piece)| {
            piece
                .moves(whence, self)
                .into_iter()
                .any(|whither| self.is_legal(Move::new(whence, whither), side))
        })
    }

    /// Whether a [`Color`] is [checkmated].
    ///
    /// [checkmated]: https://www.chessprogramming.org/Checkmate
    #[instrument(level = "trace", skip(self), ret)]
    pub fn is_checkmate(&self, side: Color) -> bool {
        self.is_check(side) && !self.has_legal_moves(side)
    }

    /// Whether a [`Color`] is [stalemated].
    ///
    /// [stalemated]: https://www.chessprogramming.org/Stalemate
    #[instrument(level = "trace", skip(self), ret)]
    pub fn is_stalemate(&self, side: Color) -> bool {
        !self.is_check(side) && !self.has_legal_moves(side)
    }

    fn context(&self, m: Move, piece: Piece) -> MoveContext {
        let (whence, whither) = (m.whence(), m.whither());

        let capture = match self[whither] {
            Some(p) => Some((p, whither)),
            None if piece.role() == Role::Pawn && whence.col() != whither.col() => {
                let victim = Square::at(whence.row(), whither.col());
                self[victim].map(|p| (p, victim))
            }
            None => None,
        };

        let last_row = (!piece.color()).back_row();
        let promotion = (piece.role() == Role::Pawn && whither.row() == last_row)
            .then(|| m.promotion().role_or_queen());

        MoveContext(m, piece, capture, promotion)
    }

    fn apply(&mut self, mc: &MoveContext) {
        for p in self.grid.iter_mut().flatten().flatten() {
            p.en_passant = false;
        }

        if let Some((_, sq)) = mc.capture() {
            self.set(sq, None);
        }

        let mut piece = mc.piece();
        piece.has_not_moved = false;
        piece.en_passant = mc.is_double_step();

        if let Some(role) = mc.promotion() {
            piece = Piece::new(role, piece.color()).moved();
        }

        self.set(mc.whence(), None);
        self.set(mc.whither(), Some(piece));

        if let Some((whence, whither)) = mc.castling_rook() {
            if let Some(rook) = self.set(whence, None) {
                self.set(whither, Some(rook.moved()));
            }
        }

        self.prev_move = Some(*mc);
    }
}

/// Retrieves the [`Piece`] at a given [`Square`], if any.
impl Index<Square> for Board {
    type Output = Option<Piece>;

    #[inline(always)]
    fn index(&self, sq: Square) -> &Self::Output {
        &self.grid[sq.row() as usize][sq.col() as usize]
    }
}

/// Draws the board as text, with ranks on the right and files underneath.
///
/// Empty dark squares are drawn as `##`.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.grid.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                match cell {
                    Some(p) => write!(f, "{p} ")?,
                    None if row % 2 == col % 2 => f.write_str("   ")?,
                    None => f.write_str("## ")?,
                }
            }

            writeln!(f, "{}", 8 - row)?;
        }

        for file in 'a'..='h' {
            f.write_char(' ')?;
            f.write_char(file)?;
            f.write_char(' ')?;
        }

        f.write_char('\n')
    }
}
