use crate::chess::{Board, Color, Role, Square};
use arrayvec::ArrayVec;
use derive_more::Display;

/// The most squares a single piece can ever reach, a queen in the middle of an empty board.
pub const MAX_MOVES: usize = 27;

/// A chess [piece][`Role`] of a certain [`Color`], along with its move history flags.
///
/// Only the [`Board`] mutates the flags, as moves are applied.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[display("{}{}", color.symbol(), role.name())]
pub struct Piece {
    color: Color,
    role: Role,
    pub(crate) has_not_moved: bool,
    pub(crate) en_passant: bool,
}

impl Piece {
    /// Constructs a [`Piece`] that has yet to move.
    #[inline(always)]
    pub fn new(role: Role, color: Color) -> Self {
        Piece {
            color,
            role,
            has_not_moved: true,
            en_passant: false,
        }
    }

    /// This piece marked as having already moved.
    ///
    /// Useful for setting up positions where castling or double-steps are no longer possible.
    #[inline(always)]
    pub fn moved(self) -> Self {
        Piece {
            has_not_moved: false,
            ..self
        }
    }

    /// This piece's [`Color`].
    #[inline(always)]
    pub fn color(&self) -> Color {
        self.color
    }

    /// This piece's [`Role`].
    #[inline(always)]
    pub fn role(&self) -> Role {
        self.role
    }

    /// The letter this piece is drawn with.
    #[inline(always)]
    pub fn name(&self) -> char {
        self.role.name()
    }

    /// Whether this piece has yet to make its first move.
    #[inline(always)]
    pub fn has_not_moved(&self) -> bool {
        self.has_not_moved
    }

    /// Whether this pawn advanced two squares on the previous ply.
    #[inline(always)]
    pub fn en_passant(&self) -> bool {
        self.en_passant
    }

    /// Whether this piece could move from one square to another on the given [`Board`].
    ///
    /// This only checks the piece's movement rules, it does not check
    /// whether the move would leave its own king in check.
    pub fn can_move(&self, whence: Square, whither: Square, board: &Board) -> bool {
        if whence == whither || board[whither].is_some_and(|p| p.color == self.color) {
            return false;
        }

        let (rows, cols) = whither - whence;

        match self.role {
            Role::Pawn => self.can_pawn_move(whence, whither, board),
            Role::Knight => matches!((rows.abs(), cols.abs()), (1, 2) | (2, 1)),
            Role::Bishop => rows.abs() == cols.abs() && self.is_path_clear(whence, whither, board),
            Role::Rook => (rows == 0 || cols == 0) && self.is_path_clear(whence, whither, board),
            Role::Queen => {
                (rows == 0 || cols == 0 || rows.abs() == cols.abs())
                    && self.is_path_clear(whence, whither, board)
            }
            Role::King => {
                (rows.abs() <= 1 && cols.abs() <= 1) || self.can_castle(whence, whither, board)
            }
        }
    }

    /// Whether every square strictly between two squares is empty.
    ///
    /// Knights jump, so their path is always clear.
    pub fn is_path_clear(&self, whence: Square, whither: Square, board: &Board) -> bool {
        match self.role {
            Role::Knight => true,
            _ => Square::between(whence, whither).all(|sq| board[sq].is_none()),
        }
    }

    /// Every [`Square`] this piece could move to from where it stands.
    pub fn moves(&self, whence: Square, board: &Board) -> ArrayVec<Square, MAX_MOVES> {
        Square::iter()
            .filter(|&whither| self.can_move(whence, whither, board))
            .collect()
    }

    /// Every [`Square`] this piece attacks from where it stands.
    ///
    /// Pawns attack diagonally whether or not there is something to capture,
    /// and kings never attack by castling.
    pub fn attacks(&self, whence: Square, board: &Board) -> ArrayVec<Square, MAX_MOVES> {
        match self.role {
            Role::Pawn => {
                let forward = self.color.forward();
                [-1, 1]
                    .into_iter()
                    .filter_map(|cols| whence.offset(forward, cols))
                    .collect()
            }

            Role::King => [-1, 0, 1]
                .into_iter()
                .flat_map(|rows| [-1, 0, 1].map(|cols| (rows, cols)))
                .filter(|&offset| offset != (0, 0))
                .filter_map(|(rows, cols)| whence.offset(rows, cols))
                .collect(),

            _ => self.moves(whence, board),
        }
    }

    fn can_pawn_move(&self, whence: Square, whither: Square, board: &Board) -> bool {
        let (rows, cols) = whither - whence;

        match (rows * self.color.forward(), cols.abs()) {
            (1, 0) => board[whither].is_none(),
            (2, 0) => {
                self.has_not_moved
                    && board[whither].is_none()
                    && self.is_path_clear(whence, whither, board)
            }
            (1, 1) => board[whither].is_some() || self.can_capture_en_passant(whence, whither, board),
            _ => false,
        }
    }

    /// Whether the square beside this pawn, on the destination's column, holds
    /// an enemy pawn that just advanced two squares.
    fn can_capture_en_passant(&self, whence: Square, whither: Square, board: &Board) -> bool {
        let victim = Square::at(whence.row(), whither.col());
        board[victim].is_some_and(|p| {
            p.color != self.color && p.role == Role::Pawn && p.en_passant
        })
    }

    fn can_castle(&self, whence: Square, whither: Square, board: &Board) -> bool {
        let (rows, cols) = whither - whence;
        if !self.has_not_moved || rows != 0 || cols.abs() != 2 {
            return false;
        }

        let corner = if cols > 0 { 7 } else { 0 };
        let rook = Square::at(whence.row(), corner);

        board[rook].is_some_and(|p| {
            p.color == self.color && p.role == Role::Rook && p.has_not_moved
        }) && Square::between(whence, rook).all(|sq| board[sq].is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::ParseSquareError;
    use test_strategy::proptest;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn place(pieces: &[(&str, Piece)]) -> Board {
        let mut board = Board::empty();
        for &(s, p) in pieces {
            board.set(sq(s), Some(p));
        }

        board
    }

    #[proptest]
    fn moves_contains_exactly_the_squares_accepted_by_can_move(b: Board, whence: Square) {
        if let Some(p) = b[whence] {
            let moves = p.moves(whence, &b);
            for whither in Square::iter() {
                assert_eq!(moves.contains(&whither), p.can_move(whence, whither, &b));
            }
        }
    }

    #[proptest]
    fn pieces_never_move_onto_pieces_of_the_same_color(
        b: Board,
        #[filter(#b[#whence].is_some())] whence: Square,
        #[filter(#b[#whither].map(|p| p.color()) == #b[#whence].map(|p| p.color()))]
        whither: Square,
    ) {
        let p = b[whence].unwrap();
        assert!(!p.can_move(whence, whither, &b));
    }

    #[proptest]
    fn pieces_never_move_onto_their_own_square(b: Board, whence: Square, p: Piece) {
        assert!(!p.can_move(whence, whence, &b));
    }

    #[proptest]
    fn moves_never_exceed_the_bound(b: Board, whence: Square, p: Piece) {
        assert!(p.moves(whence, &b).len() <= MAX_MOVES);
    }

    #[proptest]
    fn knight_path_is_always_clear(b: Board, whence: Square, whither: Square, c: Color) {
        assert!(Piece::new(Role::Knight, c).is_path_clear(whence, whither, &b));
    }

    #[proptest]
    fn attacks_of_sliders_and_knights_match_their_moves(
        b: Board,
        whence: Square,
        #[filter(!matches!(#p.role(), Role::Pawn | Role::King))] p: Piece,
    ) {
        assert_eq!(p.attacks(whence, &b), p.moves(whence, &b));
    }

    #[test]
    fn piece_is_displayed_with_color_prefix() {
        assert_eq!(Piece::new(Role::King, Color::White).to_string(), "wK");
        assert_eq!(Piece::new(Role::Pawn, Color::Black).to_string(), "bp");
        assert_eq!(Piece::new(Role::Knight, Color::Black).to_string(), "bN");
    }

    #[test]
    fn moved_clears_has_not_moved_only() {
        let p = Piece::new(Role::Rook, Color::White).moved();
        assert!(!p.has_not_moved());
        assert!(!p.en_passant());
        assert_eq!(p.role(), Role::Rook);
    }

    #[test]
    fn pawn_advances_one_or_two_squares_from_its_start() {
        let pawn = Piece::new(Role::Pawn, Color::White);
        let b = place(&[("e2", pawn)]);
        assert_eq!(Vec::from_iter(pawn.moves(sq("e2"), &b)), vec![sq("e4"), sq("e3")]);
    }

    #[test]
    fn pawn_cannot_double_step_after_moving() {
        let pawn = Piece::new(Role::Pawn, Color::Black).moved();
        let b = place(&[("d7", pawn)]);
        assert_eq!(Vec::from_iter(pawn.moves(sq("d7"), &b)), vec![sq("d6")]);
    }

    #[test]
    fn pawn_cannot_double_step_through_a_piece() {
        let pawn = Piece::new(Role::Pawn, Color::White);
        let blocker = Piece::new(Role::Knight, Color::Black);
        let b = place(&[("e2", pawn), ("e3", blocker)]);
        assert!(pawn.moves(sq("e2"), &b).is_empty());
    }

    #[test]
    fn pawn_captures_diagonally_only_onto_enemies() {
        let pawn = Piece::new(Role::Pawn, Color::White).moved();
        let b = place(&[
            ("d4", pawn),
            ("c5", Piece::new(Role::Bishop, Color::Black)),
            ("e5", Piece::new(Role::Bishop, Color::White)),
            ("d5", Piece::new(Role::Knight, Color::Black)),
        ]);

        assert_eq!(Vec::from_iter(pawn.moves(sq("d4"), &b)), vec![sq("c5")]);
    }

    #[test]
    fn pawn_captures_en_passant_only_beside_a_flagged_pawn() {
        let pawn = Piece::new(Role::Pawn, Color::White).moved();
        let mut victim = Piece::new(Role::Pawn, Color::Black).moved();
        victim.en_passant = true;

        let b = place(&[("e5", pawn), ("d5", victim)]);
        assert!(pawn.can_move(sq("e5"), sq("d6"), &b));

        let mut friend = pawn;
        friend.en_passant = true;
        let b = place(&[("e5", pawn), ("d5", friend)]);
        assert!(!pawn.can_move(sq("e5"), sq("d6"), &b));

        victim.en_passant = false;
        let b = place(&[("e5", pawn), ("d5", victim)]);
        assert!(!pawn.can_move(sq("e5"), sq("d6"), &b));
    }

    #[test]
    fn pawn_never_moves_backwards() {
        let pawn = Piece::new(Role::Pawn, Color::Black);
        let b = place(&[("e5", pawn), ("d4", Piece::new(Role::Pawn, Color::White))]);
        assert!(!pawn.can_move(sq("e5"), sq("e6"), &b));
        assert!(!pawn.can_move(sq("e5"), sq("d6"), &b));
        assert!(pawn.can_move(sq("e5"), sq("d4"), &b));
    }

    #[test]
    fn knight_jumps_over_pieces() {
        let b = Board::default();
        let knight = b[sq("g1")].unwrap();
        assert_eq!(
            Vec::from_iter(knight.moves(sq("g1"), &b)),
            vec![sq("f3"), sq("h3")]
        );
    }

    #[test]
    fn rook_is_blocked_by_pieces_in_its_path() -> Result<(), ParseSquareError> {
        let rook = Piece::new(Role::Rook, Color::White);
        let b = place(&[("a1", rook), ("a4", Piece::new(Role::Pawn, Color::Black))]);
        assert!(rook.can_move("a1".parse()?, "a4".parse()?, &b));
        assert!(!rook.can_move("a1".parse()?, "a5".parse()?, &b));
        assert!(rook.can_move("a1".parse()?, "h1".parse()?, &b));
        assert!(!rook.can_move("a1".parse()?, "b2".parse()?, &b));
        Ok(())
    }

    #[test]
    fn bishop_moves_only_along_diagonals() {
        let bishop = Piece::new(Role::Bishop, Color::Black);
        let b = place(&[("c8", bishop)]);
        assert_eq!(bishop.moves(sq("c8"), &b).len(), 7);
        assert!(bishop.can_move(sq("c8"), sq("h3"), &b));
        assert!(!bishop.can_move(sq("c8"), sq("c1"), &b));
    }

    #[test]
    fn queen_in_the_middle_of_an_empty_board_reaches_the_most_squares() {
        let queen = Piece::new(Role::Queen, Color::White);
        let b = place(&[("d4", queen)]);
        assert_eq!(queen.moves(sq("d4"), &b).len(), MAX_MOVES);
    }

    #[test]
    fn king_steps_to_adjacent_squares() {
        let king = Piece::new(Role::King, Color::White).moved();
        let b = place(&[("e4", king)]);
        assert_eq!(king.moves(sq("e4"), &b).len(), 8);
        assert_eq!(king.attacks(sq("e4"), &b).len(), 8);
        assert!(!king.can_move(sq("e4"), sq("e6"), &b));
    }

    #[test]
    fn king_castles_towards_an_unmoved_rook_over_empty_squares() {
        let king = Piece::new(Role::King, Color::White);
        let rook = Piece::new(Role::Rook, Color::White);
        let b = place(&[("e1", king), ("h1", rook), ("a1", rook)]);
        assert!(king.can_move(sq("e1"), sq("g1"), &b));
        assert!(king.can_move(sq("e1"), sq("c1"), &b));
        assert!(!king.attacks(sq("e1"), &b).contains(&sq("g1")));
    }

    #[test]
    fn king_cannot_castle_if_either_piece_has_moved() {
        let king = Piece::new(Role::King, Color::Black);
        let rook = Piece::new(Role::Rook, Color::Black);

        let b = place(&[("e8", king), ("h8", rook.moved())]);
        assert!(!king.can_move(sq("e8"), sq("g8"), &b));

        let b = place(&[("e8", king.moved()), ("h8", rook)]);
        assert!(!king.moved().can_move(sq("e8"), sq("g8"), &b));
    }

    #[test]
    fn king_cannot_castle_over_pieces() {
        let king = Piece::new(Role::King, Color::White);
        let rook = Piece::new(Role::Rook, Color::White);
        let knight = Piece::new(Role::Knight, Color::White);
        let b = place(&[("e1", king), ("a1", rook), ("b1", knight)]);
        assert!(!king.can_move(sq("e1"), sq("c1"), &b));
    }

    #[test]
    fn king_cannot_castle_with_an_enemy_rook() {
        let king = Piece::new(Role::King, Color::White);
        let rook = Piece::new(Role::Rook, Color::Black);
        let b = place(&[("e1", king), ("h1", rook)]);
        assert!(!king.can_move(sq("e1"), sq("g1"), &b));
    }

    #[test]
    fn pawns_attack_diagonally_forward_even_when_empty() {
        let pawn = Piece::new(Role::Pawn, Color::Black);
        let b = place(&[("a7", pawn)]);
        assert_eq!(Vec::from_iter(pawn.attacks(sq("a7"), &b)), vec![sq("b6")]);
    }
}
