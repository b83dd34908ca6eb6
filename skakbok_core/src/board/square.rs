use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use paste::paste;
use seq_macro::seq;
use thiserror::Error;

/// A board square, stored as its index 0-63 with a1 = 0 and h8 = 63.
///
/// The file is `index & 7` and the rank is `index >> 3`, so indices run
/// a1, b1, ... h1, a2, ... h8.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    /// Home square of the white queenside rook.
    pub const WHITE_QUEENSIDE_ROOK: Self = Self::A1;
    /// Home square of the white kingside rook.
    pub const WHITE_KINGSIDE_ROOK: Self = Self::H1;
    /// Home square of the black queenside rook.
    pub const BLACK_QUEENSIDE_ROOK: Self = Self::A8;
    /// Home square of the black kingside rook.
    pub const BLACK_KINGSIDE_ROOK: Self = Self::H8;

    /// The square at `rank` and `file`, both counted from zero (rank 0 is
    /// rank 1, file 0 is the a-file).
    ///
    /// Out-of-range coordinates are masked into range, which is never the
    /// square you want; callers pass coordinates they already know are
    /// valid. Use [`Square::new`] for checked construction.
    pub const fn at(rank: u8, file: u8) -> Self {
        Self(((rank & 7) << 3) | (file & 7))
    }

    /// The square at `rank` and `file`, or [`None`] if either coordinate is
    /// 8 or more.
    pub const fn new(rank: u8, file: u8) -> Option<Self> {
        if rank < 8 && file < 8 {
            Some(Self::at(rank, file))
        } else {
            None
        }
    }

    /// The 0-63 index of this square as a [`usize`], for square-table
    /// lookups.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The rank of this square, 0-7 from rank 1 up.
    pub const fn rank(self) -> u8 {
        self.0 >> 3
    }

    /// The file of this square, 0-7 from the a-file across.
    pub const fn file(self) -> u8 {
        self.0 & 7
    }

    /// All 64 squares, a1 through h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }

    /// Steps by a signed rank and file delta, or [`None`] when the step
    /// leaves the board.
    ///
    /// This is the one primitive square-table move generation walks on: a
    /// knight hop is `try_offset(2, 1)`, a bishop ray repeats
    /// `try_offset(1, 1)`, and so on. Offsetting the raw index instead
    /// (say by +1 for "one file right") would wrap h4 around to a5, so
    /// every step goes through the coordinate check here.
    pub const fn try_offset(self, d_rank: i8, d_file: i8) -> Option<Self> {
        let rank = self.rank() as i8 + d_rank;
        let file = self.file() as i8 + d_file;
        if rank < 0 || rank >= 8 || file < 0 || file >= 8 {
            None
        } else {
            Some(Self::at(rank as u8, file as u8))
        }
    }
}

/// The `A1`..`H8` square constants.
#[allow(clippy::eq_op, clippy::char_lit_as_u8)]
impl Square {
    seq!(RANK in 1..=8 {
        seq!(FILE in 'A'..='H' {
            paste! {
                pub const [<FILE RANK>]: Square = Square::at(RANK - 1, FILE as u8 - b'A');
            }
        });
    });
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

impl Debug for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("invalid square")]
pub struct ParseSquareError;

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            &[file @ b'a'..=b'h', rank @ b'1'..=b'8'] => Ok(Square::at(rank - b'1', file - b'a')),
            _ => Err(ParseSquareError),
        }
    }
}
