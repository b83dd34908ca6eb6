use std::{
    fmt::{Debug, Display, Write},
    num::NonZeroU8,
};

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// The kind of a piece, without its color.
///
/// Kinds are numbered 1-6 in increasing material order, which keeps
/// promotion lists stably ordered, fits in 3 bits, and leaves 0 free so
/// [`Option<PieceType>`] needs no extra byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive, ToPrimitive)]
pub enum PieceType {
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl PieceType {
    /// A [`Piece`] of this kind in the given color.
    pub const fn with_color(self, color: Color) -> Piece {
        Piece::new(color, self)
    }

    /// The lowercase piece letter, as black pieces appear in FEN.
    pub const fn as_lowercase_char(self) -> char {
        match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        }
    }

    /// The uppercase piece letter, as white pieces appear in FEN and as SAN
    /// writes piece kinds.
    pub const fn as_uppercase_char(self) -> char {
        self.as_lowercase_char().to_ascii_uppercase()
    }

    /// The piece kind named by a FEN letter of either case.
    pub fn try_from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceType::Pawn),
            'n' => Some(PieceType::Knight),
            'b' => Some(PieceType::Bishop),
            'r' => Some(PieceType::Rook),
            'q' => Some(PieceType::Queen),
            'k' => Some(PieceType::King),
            _ => None,
        }
    }
}

/// One of the two sides. White moves first.
///
/// The discriminants (0 and 8) are the color bit of the packed [`Piece`]
/// representation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    White = 0,
    Black = 8,
}

impl Color {
    /// Returns true if this is [`Color::White`].
    pub const fn is_white(self) -> bool {
        matches!(self, Color::White)
    }

    /// Returns true if this is [`Color::Black`].
    pub const fn is_black(self) -> bool {
        matches!(self, Color::Black)
    }

    /// The other side.
    pub const fn flip(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// The rank delta a pawn of this color advances by.
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The rank pawns of this color start on.
    pub const fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// The rank pawns of this color promote on.
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// The rank this color's pieces start on.
    pub const fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

/// A colored piece: kind and side packed into one nonzero byte.
///
/// Bits 0-2 hold the [`PieceType`] (1-6) and bit 3 the [`Color`], so the
/// byte is never zero and `Option<Piece>` costs nothing extra -- the whole
/// 64-square table is 64 bytes.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Piece(NonZeroU8);

impl Piece {
    /// A piece of the given color and kind.
    pub const fn new(color: Color, piece_type: PieceType) -> Self {
        match NonZeroU8::new(color as u8 | piece_type as u8) {
            Some(bits) => Self(bits),
            // A piece kind is 1-6, so the low bits are never all zero.
            None => unreachable!(),
        }
    }

    /// A pawn of the given color.
    pub const fn pawn(color: Color) -> Self {
        Self::new(color, PieceType::Pawn)
    }

    /// A rook of the given color.
    pub const fn rook(color: Color) -> Self {
        Self::new(color, PieceType::Rook)
    }

    /// A king of the given color.
    pub const fn king(color: Color) -> Self {
        Self::new(color, PieceType::King)
    }

    /// The side this piece belongs to.
    pub const fn color(self) -> Color {
        if self.0.get() & 8 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// The kind of this piece.
    pub fn piece_type(self) -> PieceType {
        PieceType::from_u8(self.0.get() & 0x07)
            .expect("piece representation always holds a valid piece type")
    }

    /// Returns true if this piece has the given kind.
    pub fn is(self, piece_type: PieceType) -> bool {
        self.piece_type() == piece_type
    }

    /// The piece's FEN letter: uppercase for white, lowercase for black.
    pub fn as_fen_char(self) -> char {
        match self.color() {
            Color::White => self.piece_type().as_uppercase_char(),
            Color::Black => self.piece_type().as_lowercase_char(),
        }
    }

    /// The piece's Unicode figurine, e.g. `♘` or `♞`.
    pub fn as_unicode_char(self) -> char {
        match (self.color(), self.piece_type()) {
            (Color::White, PieceType::King) => '♔',
            (Color::White, PieceType::Queen) => '♕',
            (Color::White, PieceType::Rook) => '♖',
            (Color::White, PieceType::Bishop) => '♗',
            (Color::White, PieceType::Knight) => '♘',
            (Color::White, PieceType::Pawn) => '♙',
            (Color::Black, PieceType::King) => '♚',
            (Color::Black, PieceType::Queen) => '♛',
            (Color::Black, PieceType::Rook) => '♜',
            (Color::Black, PieceType::Bishop) => '♝',
            (Color::Black, PieceType::Knight) => '♞',
            (Color::Black, PieceType::Pawn) => '♟',
        }
    }

    /// The piece named by a FEN letter: case selects the color.
    pub fn try_from_fen_char(c: char) -> Option<Self> {
        let piece_type = PieceType::try_from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Self::new(color, piece_type))
    }
}

/// Constants for each of the twelve pieces.
impl Piece {
    pub const WHITE_PAWN: Piece = Piece::new(Color::White, PieceType::Pawn);
    pub const WHITE_KNIGHT: Piece = Piece::new(Color::White, PieceType::Knight);
    pub const WHITE_BISHOP: Piece = Piece::new(Color::White, PieceType::Bishop);
    pub const WHITE_ROOK: Piece = Piece::new(Color::White, PieceType::Rook);
    pub const WHITE_QUEEN: Piece = Piece::new(Color::White, PieceType::Queen);
    pub const WHITE_KING: Piece = Piece::new(Color::White, PieceType::King);
    pub const BLACK_PAWN: Piece = Piece::new(Color::Black, PieceType::Pawn);
    pub const BLACK_KNIGHT: Piece = Piece::new(Color::Black, PieceType::Knight);
    pub const BLACK_BISHOP: Piece = Piece::new(Color::Black, PieceType::Bishop);
    pub const BLACK_ROOK: Piece = Piece::new(Color::Black, PieceType::Rook);
    pub const BLACK_QUEEN: Piece = Piece::new(Color::Black, PieceType::Queen);
    pub const BLACK_KING: Piece = Piece::new(Color::Black, PieceType::King);
}

impl Debug for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Piece")
            .field("color", &self.color())
            .field("piece_type", &self.piece_type())
            .finish()
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char(self.as_fen_char())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use num_traits::ToPrimitive;
    use pretty_assertions::assert_eq;

    const KINDS: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    #[test]
    fn piece_type_ordering_is_stable() {
        // Promotion lists rely on pawn < knight < bishop < rook < queen < king.
        let codes: Vec<u8> = KINDS.iter().map(|t| t.to_u8().unwrap()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6]);
        assert!(PieceType::Pawn < PieceType::Knight);
        assert!(PieceType::Queen < PieceType::King);
    }

    #[test]
    fn piece_type_letters_round_trip() {
        for kind in KINDS {
            let lower = kind.as_lowercase_char();
            let upper = kind.as_uppercase_char();

            assert!(lower.is_ascii_lowercase());
            assert_eq!(upper, lower.to_ascii_uppercase());
            assert_eq!(PieceType::try_from_char(lower), Some(kind));
            assert_eq!(PieceType::try_from_char(upper), Some(kind));
        }

        assert_eq!("pnbrqk", KINDS.map(PieceType::as_lowercase_char).iter().collect::<String>());
        assert_eq!(PieceType::try_from_char('x'), None);
    }

    #[test]
    fn color_flip_and_predicates() {
        assert_eq!(Color::White.flip(), Color::Black);
        assert_eq!(Color::Black.flip(), Color::White);
        assert!(Color::White.is_white() && !Color::White.is_black());
        assert!(Color::Black.is_black() && !Color::Black.is_white());
        assert_eq!(Color::default(), Color::White);
    }

    #[test]
    fn color_pawn_geometry() {
        assert_eq!(Color::White.pawn_direction(), 1);
        assert_eq!(Color::Black.pawn_direction(), -1);
        assert_eq!(Color::White.pawn_rank(), 1);
        assert_eq!(Color::Black.pawn_rank(), 6);
        assert_eq!(Color::White.promotion_rank(), 7);
        assert_eq!(Color::Black.promotion_rank(), 0);
        assert_eq!(Color::White.back_rank(), 0);
        assert_eq!(Color::Black.back_rank(), 7);
    }

    #[test]
    fn pack_and_unpack_every_piece() {
        for color in [Color::White, Color::Black] {
            for kind in KINDS {
                let piece = Piece::new(color, kind);
                assert_eq!(piece.color(), color);
                assert_eq!(piece.piece_type(), kind);
                assert!(piece.is(kind));
            }
        }
    }

    #[test]
    fn fen_letters_round_trip() {
        let cases = [
            ('P', Piece::WHITE_PAWN),
            ('B', Piece::WHITE_BISHOP),
            ('K', Piece::WHITE_KING),
            ('n', Piece::BLACK_KNIGHT),
            ('r', Piece::BLACK_ROOK),
            ('q', Piece::BLACK_QUEEN),
        ];
        for (letter, piece) in cases {
            assert_eq!(piece.as_fen_char(), letter);
            assert_eq!(Piece::try_from_fen_char(letter), Some(piece));
            assert_eq!(piece.to_string(), letter.to_string());
        }

        assert_eq!(Piece::try_from_fen_char('x'), None);
        assert_eq!(Piece::try_from_fen_char('1'), None);
    }

    #[test]
    fn unicode_figurines() {
        assert_eq!(Piece::WHITE_PAWN.as_unicode_char(), '♙');
        assert_eq!(Piece::WHITE_KING.as_unicode_char(), '♔');
        assert_eq!(Piece::BLACK_KNIGHT.as_unicode_char(), '♞');
        assert_eq!(Piece::BLACK_QUEEN.as_unicode_char(), '♛');
    }

    #[test]
    fn convenience_constructors_pick_the_kind() {
        assert_eq!(Piece::pawn(Color::Black), Piece::BLACK_PAWN);
        assert_eq!(Piece::rook(Color::White), Piece::WHITE_ROOK);
        assert_eq!(Piece::king(Color::Black), Piece::BLACK_KING);
        assert_eq!(PieceType::Queen.with_color(Color::White), Piece::WHITE_QUEEN);
    }
}
