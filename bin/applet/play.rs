use crate::io::Io;
use anyhow::Error as Anyhow;
use clap::Parser;
use derive_more::{Display, Error};
use lib::chess::{Action, Color, Game, GameState, InvalidAction};
use std::io::{stdin, stdout, Read, Write};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Plays a game between two people taking turns at the same terminal.
#[derive(Debug, Default, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Play {}

impl Play {
    #[instrument(level = "trace", skip(self), err)]
    pub fn execute(self) -> Result<(), Anyhow> {
        let io = Io::new(stdout().lock(), stdin().lock());
        Session::new(io).run()
    }
}

/// A line of player input.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Command {
    action: Action,
    offer_draw: bool,
}

#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse command")]
struct ParseCommandError;

impl FromStr for Command {
    type Err = ParseCommandError;

    /// Parses `e2 e4`, `e7 e8 n`, `resign`, `draw` or `draw?`, optionally following a move.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();

        match s.strip_suffix("draw?").map(str::trim_end) {
            Some(m) if !m.is_empty() => Ok(Command {
                action: Action::Move(m.parse().map_err(|_| ParseCommandError)?),
                offer_draw: true,
            }),

            _ => Ok(Command {
                action: s.parse().map_err(|_| ParseCommandError)?,
                offer_draw: false,
            }),
        }
    }
}

fn title(side: Color) -> &'static str {
    match side {
        Color::White => "White",
        Color::Black => "Black",
    }
}

struct Session<W: Write, R: Read> {
    game: Game,
    io: Io<W, R>,
}

impl<W: Write, R: Read> Session<W, R> {
    fn new(io: Io<W, R>) -> Self {
        Session {
            game: Game::new(),
            io,
        }
    }

    fn execute(&mut self, cmd: Command) -> Result<(), InvalidAction> {
        if !cmd.offer_draw {
            return self.game.execute(cmd.action);
        }

        // The offer only stands if the move that comes with it is legal.
        let mut next = self.game.clone();
        next.offer_draw()?;
        next.execute(cmd.action)?;
        self.game = next;
        Ok(())
    }

    #[instrument(level = "trace", skip(self), err)]
    fn run(&mut self) -> Result<(), Anyhow> {
        self.io.send(self.game.board())?;

        let outcome = loop {
            if let Some(o) = self.game.outcome() {
                break o;
            }

            self.io.prompt(format_args!("{}'s move: ", title(self.game.turn())))?;

            let Some(line) = self.io.recv()? else {
                debug!("input exhausted before the game ended");
                return Ok(());
            };

            let result = match line.parse::<Command>() {
                Ok(cmd) => self.execute(cmd).map(|_| cmd).map_err(Anyhow::from),
                Err(e) => Err(e.into()),
            };

            match result {
                Err(e) => {
                    debug!(%line, error = %e, "rejected player input");
                    self.io.send("Illegal move, try again")?;
                }

                Ok(cmd) => {
                    if let Action::Move(_) = cmd.action {
                        self.io.send("")?;
                        self.io.send(self.game.board())?;
                    }

                    match self.game.state() {
                        GameState::Check => self.io.send("Check")?,
                        GameState::Checkmate => self.io.send("Checkmate")?,
                        GameState::Stalemate => self.io.send("Stalemate")?,
                        _ => {}
                    }
                }
            }
        };

        match outcome.winner() {
            Some(c) => self.io.send(format_args!("{} wins", title(c)))?,
            None => self.io.send("Draw")?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::chess::{Move, ParseMoveError};

    fn session(input: &str) -> String {
        let mut buf = Vec::new();
        Session::new(Io::new(&mut buf, input.as_bytes()))
            .run()
            .unwrap();

        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn moves_parse_with_or_without_a_draw_offer() -> Result<(), ParseMoveError> {
        for m in ["e2e4", "E7 E8 N", "a7 b8 q"] {
            let cmd = Command {
                action: Action::Move(m.parse::<Move>()?),
                offer_draw: false,
            };

            assert_eq!(m.parse(), Ok(cmd));

            let offer = Command {
                offer_draw: true,
                ..cmd
            };

            assert_eq!(format!("{m} draw?").parse(), Ok(offer));
            assert_eq!(format!("{m}draw?").parse(), Ok(offer));
        }

        Ok(())
    }

    #[test]
    fn parses_plain_commands() {
        let cmd = |action| Command {
            action,
            offer_draw: false,
        };

        assert_eq!("resign".parse(), Ok(cmd(Action::Resign)));
        assert_eq!(" draw? ".parse(), Ok(cmd(Action::OfferDraw)));
        assert_eq!("DRAW".parse(), Ok(cmd(Action::AcceptDraw)));
        assert_eq!("e2 e4 x".parse::<Command>(), Err(ParseCommandError));
        assert_eq!("draw? draw?".parse::<Command>(), Err(ParseCommandError));
    }

    #[test]
    fn fools_mate_is_announced() {
        let out = session("f2 f3\ne7 e5\ng2 g4\nd8 h4\n");
        assert!(out.ends_with("Checkmate\nBlack wins\n"), "{out}");
    }

    #[test]
    fn illegal_moves_are_retried() {
        let out = session("e2 e5\ne7 e5\nfoo\n");
        assert_eq!(out.matches("Illegal move, try again").count(), 3);
        assert_eq!(out.matches("White's move: ").count(), 4);
    }

    #[test]
    fn check_is_announced() {
        let out = session("e2 e4\nf7 f6\nd1 h5\n");
        assert!(out.ends_with("Check\nBlack's move: "), "{out}");
    }

    #[test]
    fn resigning_hands_the_win_to_the_opponent() {
        let out = session("e2 e4\nresign\n");
        assert!(out.ends_with("Black's move: White wins\n"), "{out}");
    }

    #[test]
    fn accepted_draw_offer_ends_the_game() {
        let out = session("e2 e4 draw?\ndraw\n");
        assert!(out.ends_with("Black's move: Draw\n"), "{out}");
    }

    #[test]
    fn draw_offer_with_an_illegal_move_is_withdrawn() {
        let out = session("e2 e5 draw?\ne2 e4\ndraw\n");
        assert!(out.ends_with("Illegal move, try again\nBlack's move: "), "{out}");
    }

    #[test]
    fn starting_board_is_shown_before_the_first_move() {
        let out = session("");
        assert!(out.starts_with("bR bN bB bQ bK bB bN bR 8\n"), "{out}");
        assert!(out.ends_with("White's move: "), "{out}");
    }
}
