use derive_more::{Debug, Display, Error};
use std::{fmt, ops::Sub, str::FromStr};

/// A square on the chess board, addressed by row and column.
///
/// Row `0` holds the eighth rank and row `7` the first, so black starts on the top rows.
/// Column `0` is the `a` file.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[debug("{self}")]
pub struct Square {
    #[cfg_attr(test, strategy(0u8..8))]
    row: u8,
    #[cfg_attr(test, strategy(0u8..8))]
    col: u8,
}

/// Represents coordinates that do not address a [`Square`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
#[display("coordinates `({row}, {col})` are outside of the board")]
pub struct OutOfBounds {
    pub row: i8,
    pub col: i8,
}

impl Square {
    /// Constructs [`Square`] from a pair of row and column, if both are in the range `0..8`.
    #[inline(always)]
    pub fn new(row: i8, col: i8) -> Result<Self, OutOfBounds> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Ok(Square::at(row as u8, col as u8))
        } else {
            Err(OutOfBounds { row, col })
        }
    }

    #[inline(always)]
    pub(crate) fn at(row: u8, col: u8) -> Self {
        debug_assert!(row < 8 && col < 8);
        Square { row, col }
    }

    /// This square's row.
    #[inline(always)]
    pub fn row(&self) -> u8 {
        self.row
    }

    /// This square's column.
    #[inline(always)]
    pub fn col(&self) -> u8 {
        self.col
    }

    /// The square displaced by some number of rows and columns, if still on the board.
    #[inline(always)]
    pub fn offset(&self, rows: i8, cols: i8) -> Option<Self> {
        let row = (self.row as i8).checked_add(rows)?;
        let col = (self.col as i8).checked_add(cols)?;
        Square::new(row, col).ok()
    }

    /// An iterator over all squares, row by row starting at `a8`.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..64).map(|i| Square::at(i / 8, i % 8))
    }

    /// An iterator over the squares strictly between two squares.
    ///
    /// Yields nothing unless both squares share a row, a column or a diagonal.
    pub fn between(whence: Self, whither: Self) -> impl Iterator<Item = Self> {
        let (rows, cols) = whither - whence;
        let aligned = rows == 0 || cols == 0 || rows.abs() == cols.abs();
        let distance = if aligned { rows.abs().max(cols.abs()) } else { 0 };
        let (dr, dc) = (rows.signum(), cols.signum());

        (1..distance).filter_map(move |i| whence.offset(i * dr, i * dc))
    }
}

/// The displacement `(rows, columns)` from one square to another.
impl Sub for Square {
    type Output = (i8, i8);

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        (
            self.row as i8 - rhs.row as i8,
            self.col as i8 - rhs.col as i8,
        )
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = char::from(b'a' + self.col);
        let rank = 8 - self.row;
        write!(f, "{file}{rank}")
    }
}

/// The reason why parsing [`Square`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
pub enum ParseSquareError {
    #[display("failed to parse square, expected file in the range `(a..=h)`")]
    InvalidFile,
    #[display("failed to parse square, expected rank in the range `(1..=8)`")]
    InvalidRank,
    #[display("failed to parse square, expected exactly two characters")]
    InvalidLength,
}

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ParseSquareError::InvalidLength);
        };

        let col = match file.to_ascii_lowercase() {
            c @ 'a'..='h' => c as u8 - b'a',
            _ => return Err(ParseSquareError::InvalidFile),
        };

        let row = match rank {
            c @ '1'..='8' => b'8' - c as u8,
            _ => return Err(ParseSquareError::InvalidRank),
        };

        Ok(Square::at(row, col))
    }
}
