mod board;
mod color;
mod game;
mod r#move;
mod outcome;
mod piece;
mod promotion;
mod role;
mod square;

pub use board::*;
pub use color::*;
pub use game::*;
pub use outcome::*;
pub use piece::*;
pub use promotion::*;
pub use r#move::*;
pub use role::*;
pub use square::*;
