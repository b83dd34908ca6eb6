use std::{
    fmt::{Display, Write},
    str::FromStr,
};

use thiserror::Error;

use super::{PieceType, Square};

/// A move as an immutable value: origin and destination squares, plus an
/// optional promotion target and an optional drop piece.
///
/// The encoding doubles as the Universal Chess Interface (UCI) move format:
///
/// * `e2e4` -- a regular move
/// * `e7e8q` -- a promotion
/// * `0000` -- the null move, represented as `(a1, a1)` with no piece at the
///   origin
/// * `N@f3` -- a crazyhouse-style drop, represented with `from` pinned to a1
///   and `drop` set
///
/// A [`Move`] carries no information about the piece being moved or
/// captured; it is only meaningful in the context of a position.
///
/// ```
/// # use skakbok_core::board::{Move, Square};
/// assert_eq!(
///     "e2e4".parse(),
///     Ok(Move::new(Square::E2, Square::E4))
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
    pub drop: Option<PieceType>,
}

impl Move {
    /// The null move, `0000`.
    pub const NULL: Move = Move {
        from: Square::A1,
        to: Square::A1,
        promotion: None,
        drop: None,
    };

    /// A regular move from `from` to `to`.
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            drop: None,
        }
    }

    /// A pawn move from `from` to `to` promoting to `promotion`.
    pub const fn promoting(from: Square, to: Square, promotion: PieceType) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
            drop: None,
        }
    }

    /// A drop of `piece_type` onto `to`.
    pub const fn new_drop(piece_type: PieceType, to: Square) -> Self {
        Self {
            from: Square::A1,
            to,
            promotion: None,
            drop: Some(piece_type),
        }
    }

    /// Returns true if this is the null move.
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// Returns true if this is a drop.
    pub const fn is_drop(self) -> bool {
        self.drop.is_some()
    }

    /// The UCI encoding of this move. Equivalent to `to_string`.
    pub fn uci(self) -> String {
        self.to_string()
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            return f.write_str("0000");
        }
        if let Some(piece_type) = self.drop {
            f.write_char(piece_type.as_uppercase_char())?;
            f.write_char('@')?;
            return self.to.fmt(f);
        }

        self.from.fmt(f)?;
        self.to.fmt(f)?;
        if let Some(promotion) = self.promotion {
            f.write_char(promotion.as_lowercase_char())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseUciMoveError {
    #[error("expected 4 or 5 characters")]
    IncorrectLength,
    #[error("invalid square {0:?}")]
    InvalidSquare(String),
    #[error("invalid promotion target {0:?}")]
    InvalidPromoTarget(char),
    #[error("invalid drop piece {0:?}")]
    InvalidDropPiece(char),
}

impl FromStr for Move {
    type Err = ParseUciMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "0000" {
            return Ok(Move::NULL);
        }

        let chars = s.chars().collect::<Vec<_>>();

        // <Piece>@<square>, e.g. `N@f3`.
        if chars.len() == 4 && chars[1] == '@' {
            let piece_type = match chars[0] {
                c if c.is_ascii_uppercase() => PieceType::try_from_char(c)
                    .ok_or(ParseUciMoveError::InvalidDropPiece(c))?,
                c => return Err(ParseUciMoveError::InvalidDropPiece(c)),
            };
            let to_str = String::from_iter(&chars[2..4]);
            let to = to_str
                .parse()
                .map_err(|_| ParseUciMoveError::InvalidSquare(to_str))?;
            return Ok(Move::new_drop(piece_type, to));
        }

        if chars.len() != 4 && chars.len() != 5 {
            return Err(ParseUciMoveError::IncorrectLength);
        }

        let from_str = String::from_iter(&chars[0..2]);
        let from = from_str
            .parse()
            .map_err(|_| ParseUciMoveError::InvalidSquare(from_str))?;

        let to_str = String::from_iter(&chars[2..4]);
        let to = to_str
            .parse()
            .map_err(|_| ParseUciMoveError::InvalidSquare(to_str))?;

        let promotion = match chars.get(4) {
            Some(&c) => Some(match c {
                'n' => PieceType::Knight,
                'b' => PieceType::Bishop,
                'r' => PieceType::Rook,
                'q' => PieceType::Queen,
                _ => return Err(ParseUciMoveError::InvalidPromoTarget(c)),
            }),
            None => None,
        };

        Ok(Self {
            from,
            to,
            promotion,
            drop: None,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_normal_move() {
        assert_eq!("e2e4".parse(), Ok(Move::new(Square::E2, Square::E4)));
        assert_eq!("b8c6".parse(), Ok(Move::new(Square::B8, Square::C6)));
    }

    #[test]
    fn parse_promotion() {
        assert_eq!(
            "e7e8q".parse(),
            Ok(Move::promoting(Square::E7, Square::E8, PieceType::Queen))
        );
        assert_eq!(
            "a2a1n".parse(),
            Ok(Move::promoting(Square::A2, Square::A1, PieceType::Knight))
        );
    }

    #[test]
    fn parse_null_move() {
        assert_eq!("0000".parse(), Ok(Move::NULL));
        assert!(Move::NULL.is_null());
        assert!(!Move::new(Square::E2, Square::E4).is_null());
    }

    #[test]
    fn parse_drop() {
        assert_eq!(
            "N@f3".parse(),
            Ok(Move::new_drop(PieceType::Knight, Square::F3))
        );
        assert_eq!(
            "P@e4".parse(),
            Ok(Move::new_drop(PieceType::Pawn, Square::E4))
        );
        assert!(Move::new_drop(PieceType::Pawn, Square::E4).is_drop());
    }

    #[test]
    fn parse_invalid_cases() {
        assert_eq!(Move::from_str(""), Err(ParseUciMoveError::IncorrectLength));
        assert_eq!(
            Move::from_str("e7e8qq"),
            Err(ParseUciMoveError::IncorrectLength)
        );
        assert_eq!(
            Move::from_str("a9e4"),
            Err(ParseUciMoveError::InvalidSquare("a9".to_string())),
        );
        assert_eq!(
            Move::from_str("e7e8x"),
            Err(ParseUciMoveError::InvalidPromoTarget('x'))
        );
        assert_eq!(
            Move::from_str("e7e8k"),
            Err(ParseUciMoveError::InvalidPromoTarget('k'))
        );
        assert_eq!(
            Move::from_str("q@e4"),
            Err(ParseUciMoveError::InvalidDropPiece('q'))
        );
    }

    #[test]
    fn uci_round_trip() {
        for uci in ["e2e4", "b8c6", "e7e8q", "a2a1n", "0000", "N@f3", "P@e4"] {
            let parsed: Move = uci.parse().unwrap();
            assert_eq!(parsed.uci(), uci);
            assert_eq!(Move::from_str(&parsed.uci()), Ok(parsed));
        }
    }
}
