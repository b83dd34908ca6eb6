use bitflags::bitflags;

use super::Color;

bitflags! {
    /// Represents which directions castling moves can still be played for
    /// both players.
    ///
    /// These flags only track the history of the game: whether the king and
    /// the corresponding rook are still on their home squares having never
    /// moved (and whether the rook's home square was ever captured on). They
    /// do not take into account temporary reasons a castle may be barred,
    /// e.g. pieces between king and rook or attacked transit squares; move
    /// generation checks those.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Castling: u8 {
        /// White is allowed to castle kingside.
        const WHITE_KINGSIDE  = 0b0001;
        /// White is allowed to castle queenside.
        const WHITE_QUEENSIDE = 0b0010;
        /// Black is allowed to castle kingside.
        const BLACK_KINGSIDE  = 0b0100;
        /// Black is allowed to castle queenside.
        const BLACK_QUEENSIDE = 0b1000;

        const WHITE = Self::WHITE_KINGSIDE.bits() | Self::WHITE_QUEENSIDE.bits();
        const BLACK = Self::BLACK_KINGSIDE.bits() | Self::BLACK_QUEENSIDE.bits();
    }
}

impl Default for Castling {
    fn default() -> Self {
        Self::all()
    }
}

impl Castling {
    /// Both rights held by `color`.
    pub const fn for_color(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE,
            Color::Black => Self::BLACK,
        }
    }

    /// The kingside right of `color`.
    pub const fn kingside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    /// The queenside right of `color`.
    pub const fn queenside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns the castling state as the 3rd field in Forsyth-Edwards
    /// Notation.
    ///
    /// If neither side can castle, returns `-`. Otherwise, returns a string
    /// that contains `K` if white can castle kingside, `Q` if white can
    /// castle queenside, `k` if black can castle kingside, and `q` if black
    /// can castle queenside.
    pub fn as_fen_str(self) -> String {
        if self.is_empty() {
            "-".to_owned()
        } else {
            let mut result = String::with_capacity(4);
            if self.contains(Self::WHITE_KINGSIDE) {
                result.push('K');
            }
            if self.contains(Self::WHITE_QUEENSIDE) {
                result.push('Q');
            }
            if self.contains(Self::BLACK_KINGSIDE) {
                result.push('k');
            }
            if self.contains(Self::BLACK_QUEENSIDE) {
                result.push('q');
            }
            result
        }
    }

    /// Parses the 3rd FEN field. Characters outside `KQkq` are ignored
    /// (Chess960 rights are not modeled), so any castling string is
    /// accepted.
    pub fn from_fen_str(s: &str) -> Self {
        let mut flags = Self::empty();
        for c in s.chars() {
            match c {
                'K' => flags |= Self::WHITE_KINGSIDE,
                'Q' => flags |= Self::WHITE_QUEENSIDE,
                'k' => flags |= Self::BLACK_KINGSIDE,
                'q' => flags |= Self::BLACK_QUEENSIDE,
                _ => {}
            }
        }
        flags
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn castling_as_fen_str() {
        assert_eq!(Castling::empty().as_fen_str(), "-");
        assert_eq!(Castling::WHITE_KINGSIDE.as_fen_str(), "K");
        assert_eq!(Castling::BLACK_QUEENSIDE.as_fen_str(), "q");
        assert_eq!(Castling::WHITE.as_fen_str(), "KQ");
        assert_eq!(Castling::BLACK.as_fen_str(), "kq");
        assert_eq!(
            (Castling::WHITE_KINGSIDE | Castling::BLACK_QUEENSIDE).as_fen_str(),
            "Kq"
        );
        assert_eq!(Castling::all().as_fen_str(), "KQkq");
    }

    #[test]
    fn castling_from_fen_str() {
        assert_eq!(Castling::from_fen_str("-"), Castling::empty());
        assert_eq!(Castling::from_fen_str("KQkq"), Castling::all());
        assert_eq!(
            Castling::from_fen_str("Kq"),
            Castling::WHITE_KINGSIDE | Castling::BLACK_QUEENSIDE
        );
        // Unknown characters (e.g. Chess960 file letters) are ignored.
        assert_eq!(Castling::from_fen_str("AHkq"), Castling::BLACK);
    }

    #[test]
    fn castling_per_color_helpers() {
        assert_eq!(Castling::for_color(Color::White), Castling::WHITE);
        assert_eq!(Castling::kingside(Color::Black), Castling::BLACK_KINGSIDE);
        assert_eq!(Castling::queenside(Color::White), Castling::WHITE_QUEENSIDE);
    }
}
