use thiserror::Error;

use super::{Board, Castling, Color, Piece, Square};

/// Errors from parsing a Forsyth-Edwards Notation string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFenError {
    #[error("empty FEN string")]
    Empty,
    #[error("expected 8 ranks in the piece placement, got {0}")]
    WrongRankCount(usize),
    #[error("invalid piece placement character {0:?}")]
    InvalidPlacement(char),
    #[error("rank {0} does not describe exactly 8 squares")]
    WrongRankWidth(u8),
    #[error("invalid side to move {0:?}")]
    InvalidSideToMove(String),
    #[error("invalid en passant square {0:?}")]
    InvalidEnPassant(String),
    #[error("invalid halfmove clock {0:?}")]
    InvalidHalfmoveClock(String),
    #[error("invalid fullmove number {0:?}")]
    InvalidFullmoveNumber(String),
}

pub(super) struct ParsedFen {
    pub pieces: [Option<Piece>; 64],
    pub turn: Color,
    pub castling: Castling,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

pub(super) fn board_to_fen(board: &Board) -> String {
    let mut result = String::new();

    for rank in (0..8).rev() {
        let mut empty_squares = 0;
        for file in 0..8 {
            let square = Square::at(rank, file);
            match board.piece_at(square) {
                None => empty_squares += 1,
                Some(piece) => {
                    if empty_squares > 0 {
                        result.push((empty_squares + b'0') as _);
                    }
                    result.push(piece.as_fen_char());
                    empty_squares = 0;
                }
            }
        }
        if empty_squares > 0 {
            result.push((empty_squares + b'0') as _);
        }
        if rank > 0 {
            result.push('/');
        }
    }

    result.push(' ');
    result.push(if board.turn().is_white() { 'w' } else { 'b' });
    result.push(' ');
    result.push_str(&board.castling().as_fen_str());
    result.push(' ');
    match board.en_passant() {
        Some(square) => result.push_str(&square.to_string()),
        None => result.push('-'),
    };

    result.push(' ');
    result.push_str(&board.halfmove_clock().to_string());
    result.push(' ');
    result.push_str(&board.fullmove_number().to_string());

    result
}

/// Parses the (up to) six FEN fields. Missing trailing fields default to
/// white to move, no rights, no en-passant square, and clocks of 0 and 1.
pub(super) fn parse_fen(fen: &str) -> Result<ParsedFen, ParseFenError> {
    let mut fields = fen.split_ascii_whitespace();

    let placement = fields.next().ok_or(ParseFenError::Empty)?;

    let ranks: Vec<_> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(ParseFenError::WrongRankCount(ranks.len()));
    }

    let mut pieces = [None; 64];
    for (rank_index, rank_pieces) in ranks.into_iter().enumerate() {
        let rank = 7 - rank_index as u8;
        let mut file = 0u8;
        for c in rank_pieces.chars() {
            if let Some(digit) = c.to_digit(10).filter(|&d| (1..=8).contains(&d)) {
                file += digit as u8;
            } else {
                let piece =
                    Piece::try_from_fen_char(c).ok_or(ParseFenError::InvalidPlacement(c))?;
                if file >= 8 {
                    return Err(ParseFenError::WrongRankWidth(rank + 1));
                }
                pieces[Square::at(rank, file).index()] = Some(piece);
                file += 1;
            }
        }

        if file != 8 {
            return Err(ParseFenError::WrongRankWidth(rank + 1));
        }
    }

    let turn = match fields.next().unwrap_or("w") {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(ParseFenError::InvalidSideToMove(other.to_owned())),
    };

    let castling = Castling::from_fen_str(fields.next().unwrap_or("-"));

    let en_passant = match fields.next().unwrap_or("-") {
        "-" => None,
        square => Some(
            square
                .parse()
                .map_err(|_| ParseFenError::InvalidEnPassant(square.to_owned()))?,
        ),
    };

    let halfmove_clock = match fields.next() {
        Some(value) => value
            .parse()
            .map_err(|_| ParseFenError::InvalidHalfmoveClock(value.to_owned()))?,
        None => 0,
    };

    let fullmove_number = match fields.next() {
        Some(value) => value
            .parse()
            .map_err(|_| ParseFenError::InvalidFullmoveNumber(value.to_owned()))?,
        None => 1,
    };

    Ok(ParsedFen {
        pieces,
        turn,
        castling,
        en_passant,
        halfmove_clock,
        fullmove_number,
    })
}
