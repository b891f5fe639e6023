use crate::chess::Role;
use derive_more::{Display, Error};
use std::str::FromStr;

/// A promotion specifier.
#[derive(Debug, Display, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Promotion {
    #[default]
    #[display("")]
    None,
    #[display("n")]
    Knight,
    #[display("b")]
    Bishop,
    #[display("r")]
    Rook,
    #[display("q")]
    Queen,
}

impl Promotion {
    /// Every specifier that names a piece, strongest first.
    pub const CHOICES: [Promotion; 4] = [
        Promotion::Queen,
        Promotion::Rook,
        Promotion::Bishop,
        Promotion::Knight,
    ];

    /// The [`Role`] a pawn is promoted to, falling back to a queen if unspecified.
    pub fn role_or_queen(&self) -> Role {
        Option::<Role>::from(*self).unwrap_or(Role::Queen)
    }
}

impl From<Promotion> for Option<Role> {
    fn from(p: Promotion) -> Self {
        match p {
            Promotion::None => None,
            Promotion::Knight => Some(Role::Knight),
            Promotion::Bishop => Some(Role::Bishop),
            Promotion::Rook => Some(Role::Rook),
            Promotion::Queen => Some(Role::Queen),
        }
    }
}

/// The reason why parsing [`Promotion`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse promotion, expected one of `n`, `b`, `r` or `q`")]
pub struct ParsePromotionError;

impl FromStr for Promotion {
    type Err = ParsePromotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Promotion::None),
            "n" => Ok(Promotion::Knight),
            "b" => Ok(Promotion::Bishop),
            "r" => Ok(Promotion::Rook),
            "q" => Ok(Promotion::Queen),
            _ => Err(ParsePromotionError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn parsing_printed_promotion_is_an_identity(p: Promotion) {
        assert_eq!(p.to_string().parse(), Ok(p));
    }

    #[proptest]
    fn promotion_never_yields_pawns_or_kings(p: Promotion) {
        assert!(!matches!(p.role_or_queen(), Role::Pawn | Role::King));
    }

    #[test]
    fn unspecified_promotion_defaults_to_queen() {
        assert_eq!(Promotion::None.role_or_queen(), Role::Queen);
        assert_eq!(Promotion::Knight.role_or_queen(), Role::Knight);
    }

    #[proptest]
    fn parsing_promotion_fails_if_not_one_of_lowercase_nbrq(
        #[filter(!["", "n", "b", "r", "q"].contains(&#s.as_str()))] s: String,
    ) {
        assert_eq!(s.parse::<Promotion>(), Err(ParsePromotionError));
    }
}
