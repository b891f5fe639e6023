use crate::chess::{Board, Color, IllegalMove, Move, MoveContext, Outcome, Role};
use derive_more::{Display, Error, From};
use std::str::FromStr;
use tracing::{info, instrument};

/// The possible actions a player can take.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, From)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Action {
    /// Move a piece on the board.
    #[display("{_0}")]
    Move(Move),

    /// Resign the game in favor of the opponent.
    #[display("resign")]
    #[from(ignore)]
    Resign,

    /// Offer the opponent a draw, which they may accept on their next turn.
    #[display("draw?")]
    #[from(ignore)]
    OfferDraw,

    /// Accept the draw offered by the opponent.
    #[display("draw")]
    #[from(ignore)]
    AcceptDraw,
}

/// The reason why parsing [`Action`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse action, expected a move, `resign`, `draw?` or `draw`")]
pub struct ParseActionError;

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resign" => Ok(Action::Resign),
            "draw?" => Ok(Action::OfferDraw),
            "draw" => Ok(Action::AcceptDraw),
            m => Ok(Action::Move(m.parse().map_err(|_| ParseActionError)?)),
        }
    }
}

/// The reason why a player [`Action`] was rejected.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error, From)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum InvalidAction {
    #[display("the game has already ended in a {_0}")]
    GameHasEnded(#[error(not(source))] Outcome),

    #[display("{_0}")]
    IllegalMove(#[error(not(source))] IllegalMove),

    #[display("there is no draw offer to accept")]
    #[from(ignore)]
    NoDrawOffer,
}

/// The reason why a [`Board`] cannot be played on.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum IllegalPosition {
    #[display("the {_0} side has no king")]
    MissingKing(#[error(not(source))] Color),
    #[display("the {_0} side has multiple kings")]
    TooManyKings(#[error(not(source))] Color),
    #[display("the player in check is not to move")]
    OppositeCheck,
}

/// The state of a game of chess.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum GameState {
    #[display("initialized")]
    Initialized,
    #[display("in progress")]
    InProgress,
    #[display("check")]
    Check,
    #[display("checkmate")]
    Checkmate,
    #[display("stalemate")]
    Stalemate,
    #[display("resigned")]
    Resigned,
    #[display("drawn")]
    Drawn,
}

impl GameState {
    /// Whether no further moves may be played.
    pub fn is_over(&self) -> bool {
        use GameState::*;
        matches!(self, Checkmate | Stalemate | Resigned | Drawn)
    }
}

/// A game of chess between two players taking turns on a [`Board`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Game {
    board: Board,
    turn: Color,
    state: GameState,
    outcome: Option<Outcome>,
    draw_offer: Option<Color>,
}

impl Default for Game {
    fn default() -> Self {
        Game {
            board: Board::default(),
            turn: Color::White,
            state: GameState::Initialized,
            outcome: None,
            draw_offer: None,
        }
    }
}

impl Game {
    /// A new game from the standard starting position, white to move.
    pub fn new() -> Self {
        Self::default()
    }

    /// A game resuming from an arbitrary [`Board`] with the given side to move.
    ///
    /// Each side must have exactly one king and the side not to move cannot be in check.
    pub fn from_board(board: Board, turn: Color) -> Result<Self, IllegalPosition> {
        for c in Color::iter() {
            match board.pieces(c).filter(|(_, p)| p.role() == Role::King).count() {
                0 => return Err(IllegalPosition::MissingKing(c)),
                1 => {}
                _ => return Err(IllegalPosition::TooManyKings(c)),
            }
        }

        if board.is_check(!turn) {
            return Err(IllegalPosition::OppositeCheck);
        }

        let mut game = Game {
            board,
            turn,
            ..Game::default()
        };

        game.advance();
        if game.state == GameState::InProgress {
            game.state = GameState::Initialized;
        }

        Ok(game)
    }

    /// The current [`Board`].
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// The current [`GameState`].
    pub fn state(&self) -> GameState {
        self.state
    }

    /// The [`Outcome`] of the game, if it has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// The side whose draw offer is pending, if any.
    pub fn draw_offer(&self) -> Option<Color> {
        self.draw_offer
    }

    /// Executes a player [`Action`] on behalf of the side to move.
    pub fn execute(&mut self, action: Action) -> Result<(), InvalidAction> {
        match action {
            Action::Move(m) => self.play(m).map(drop),
            Action::Resign => self.resign(),
            Action::OfferDraw => self.offer_draw(),
            Action::AcceptDraw => self.accept_draw(),
        }
    }

    /// Plays a [`Move`] on behalf of the side to move, if legal.
    #[instrument(level = "trace", skip(self), ret, err)]
    pub fn play(&mut self, m: Move) -> Result<MoveContext, InvalidAction> {
        self.ensure_ongoing()?;
        let mc = self.board.update(m, self.turn)?;

        if self.draw_offer == Some(!self.turn) {
            self.draw_offer = None;
        }

        self.turn = !self.turn;
        self.advance();
        Ok(mc)
    }

    /// The side to move resigns.
    pub fn resign(&mut self) -> Result<(), InvalidAction> {
        self.ensure_ongoing()?;
        self.finish(GameState::Resigned, Outcome::Resignation(self.turn));
        Ok(())
    }

    /// The side to move offers a draw.
    ///
    /// The offer stands until the opponent either accepts it or makes a move.
    pub fn offer_draw(&mut self) -> Result<(), InvalidAction> {
        self.ensure_ongoing()?;
        self.draw_offer = Some(self.turn);
        Ok(())
    }

    /// The side to move accepts the draw offered by the opponent.
    pub fn accept_draw(&mut self) -> Result<(), InvalidAction> {
        self.ensure_ongoing()?;

        if self.draw_offer != Some(!self.turn) {
            return Err(InvalidAction::NoDrawOffer);
        }

        self.finish(GameState::Drawn, Outcome::DrawByAgreement);
        Ok(())
    }

    fn ensure_ongoing(&self) -> Result<(), InvalidAction> {
        match self.outcome {
            Some(o) => Err(InvalidAction::GameHasEnded(o)),
            None => Ok(()),
        }
    }

    fn advance(&mut self) {
        let side = self.turn;

        if self.board.is_checkmate(side) {
            self.finish(GameState::Checkmate, Outcome::Checkmate(!side));
        } else if self.board.is_stalemate(side) {
            self.finish(GameState::Stalemate, Outcome::Stalemate);
        } else if self.board.is_check(side) {
            self.state = GameState::Check;
        } else {
            self.state = GameState::InProgress;
        }
    }

    fn finish(&mut self, state: GameState, outcome: Outcome) {
        info!(%outcome, "game over");
        self.state = state;
        self.outcome = Some(outcome);
        self.draw_offer = None;
    }
}
