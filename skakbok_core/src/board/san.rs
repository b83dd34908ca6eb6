//! Standard Algebraic Notation in the context of a position.

use std::fmt::Write;

use super::{Board, Move, MoveError, Piece, PieceType, Square};

impl Board {
    /// Renders the canonical SAN for a move legal in the current position,
    /// including disambiguation, the capture marker, a promotion suffix, and
    /// `+`/`#` judged on the resulting position.
    ///
    /// The null move renders as `--` and drops render as `P@e4`-style
    /// strings; neither is checked for legality.
    pub fn san(&self, the_move: Move) -> Result<String, MoveError> {
        if the_move.is_null() {
            return Ok("--".to_owned());
        }
        if let Some(piece_type) = the_move.drop {
            return Ok(format!("{}@{}", piece_type.as_uppercase_char(), the_move.to));
        }

        let legal_moves: Vec<Move> = self.legal_moves().collect();
        if !legal_moves.contains(&the_move) {
            return Err(MoveError::IllegalMove(the_move.uci()));
        }
        let piece = self
            .piece_at(the_move.from)
            .ok_or(MoveError::NoPieceToMove(the_move.from))?;

        let mut san = String::new();

        if piece.is(PieceType::King) && the_move.from.file().abs_diff(the_move.to.file()) == 2 {
            san.push_str(if the_move.to.file() == 6 { "O-O" } else { "O-O-O" });
        } else {
            let piece_type = piece.piece_type();
            let is_capture = self.piece_at(the_move.to).is_some()
                || (piece.is(PieceType::Pawn) && Some(the_move.to) == self.en_passant());

            if piece_type == PieceType::Pawn {
                // Pawn captures always name the file of origin.
                if is_capture {
                    san.push((the_move.from.file() + b'a') as char);
                }
            } else {
                san.push(piece_type.as_uppercase_char());

                // Disambiguate against the other legal moves of the same
                // piece type to the same destination.
                let mut any_other = false;
                let mut shares_file = false;
                let mut shares_rank = false;
                for m in &legal_moves {
                    if m.from != the_move.from
                        && m.to == the_move.to
                        && self
                            .piece_at(m.from)
                            .is_some_and(|p| p.piece_type() == piece_type)
                    {
                        any_other = true;
                        shares_file |= m.from.file() == the_move.from.file();
                        shares_rank |= m.from.rank() == the_move.from.rank();
                    }
                }
                if shares_file {
                    san.push((the_move.from.rank() + b'1') as char);
                } else if shares_rank || any_other {
                    san.push((the_move.from.file() + b'a') as char);
                }
            }

            if is_capture {
                san.push('x');
            }
            let _ = write!(san, "{}", the_move.to);
            if let Some(promotion) = the_move.promotion {
                san.push('=');
                san.push(promotion.as_uppercase_char());
            }
        }

        let mut board = self.copy();
        board.push(the_move)?;
        if board.is_checkmate() {
            san.push('#');
        } else if board.is_check() {
            san.push('+');
        }

        Ok(san)
    }

    /// Resolves a SAN string to a legal move in the current position.
    ///
    /// Tolerates trailing `+`, `#`, `!` and `?` decorations, accepts `0-0`
    /// spellings of the castles, the null move as `--` or `Z0`, and
    /// `P@e4`-style drops (which resolve to a drop shape without a legality
    /// check). Fails with [`MoveError::IllegalMove`] when no legal move
    /// matches, or when the notation remains ambiguous after disambiguation.
    pub fn parse_san(&self, san: &str) -> Result<Move, MoveError> {
        let illegal = || MoveError::IllegalMove(san.to_owned());

        let stripped = san.trim_end_matches(['+', '#', '!', '?']);

        match stripped {
            "O-O" | "0-0" => return self.castling_move(6).ok_or_else(illegal),
            "O-O-O" | "0-0-0" => return self.castling_move(2).ok_or_else(illegal),
            "--" | "Z0" => return Ok(Move::NULL),
            _ => {}
        }

        // Drops parse to a move shape; the board never applies them.
        if let Some((piece_str, square_str)) = stripped.split_once('@') {
            let mut piece_chars = piece_str.chars();
            let piece_type = piece_chars
                .next()
                .filter(char::is_ascii_uppercase)
                .and_then(PieceType::try_from_char)
                .ok_or_else(illegal)?;
            if piece_chars.next().is_some() {
                return Err(illegal());
            }
            let to = square_str.parse().map_err(|_| illegal())?;
            return Ok(Move::new_drop(piece_type, to));
        }

        let chars: Vec<char> = stripped.chars().collect();
        let mut start = 0;
        let mut end = chars.len();

        let piece_type = match chars.first() {
            Some('K') => {
                start = 1;
                PieceType::King
            }
            Some('Q') => {
                start = 1;
                PieceType::Queen
            }
            Some('R') => {
                start = 1;
                PieceType::Rook
            }
            Some('B') => {
                start = 1;
                PieceType::Bishop
            }
            Some('N') => {
                start = 1;
                PieceType::Knight
            }
            _ => PieceType::Pawn,
        };

        // A destination always ends in a rank digit, so a trailing letter is
        // a promotion target, optionally preceded by `=`.
        let mut promotion = None;
        if end > start && chars[end - 1].is_ascii_alphabetic() {
            let target = PieceType::try_from_char(chars[end - 1]).ok_or_else(illegal)?;
            if matches!(target, PieceType::Pawn | PieceType::King) {
                return Err(illegal());
            }
            promotion = Some(target);
            end -= 1;
            if end > start && chars[end - 1] == '=' {
                end -= 1;
            }
        }

        if end < start + 2 {
            return Err(illegal());
        }
        let to: Square = chars[end - 2..end]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| illegal())?;
        end -= 2;

        if end > start && chars[end - 1] == 'x' {
            end -= 1;
        }

        // Zero, one, or two disambiguation characters: a file letter and/or
        // a rank digit.
        let mut from_file = None;
        let mut from_rank = None;
        for &c in &chars[start..end] {
            match c {
                'a'..='h' => from_file = Some(c as u8 - b'a'),
                '1'..='8' => from_rank = Some(c as u8 - b'1'),
                _ => return Err(illegal()),
            }
        }

        let mut matches = self.legal_moves().filter(|m| {
            let piece = match self.piece_at(m.from) {
                Some(piece) => piece,
                None => return false,
            };
            piece.piece_type() == piece_type
                && m.to == to
                && m.promotion == promotion
                && from_file.map_or(true, |file| m.from.file() == file)
                && from_rank.map_or(true, |rank| m.from.rank() == rank)
                // Castles only resolve through their O-O spellings.
                && !(piece.is(PieceType::King) && m.from.file().abs_diff(m.to.file()) == 2)
        });

        let the_move = matches.next().ok_or_else(illegal)?;
        if matches.next().is_some() {
            return Err(illegal());
        }
        Ok(the_move)
    }

    fn castling_move(&self, target_file: u8) -> Option<Move> {
        let color = self.turn();
        let from = Square::at(color.back_rank(), 4);
        let to = Square::at(color.back_rank(), target_file);
        let the_move = Move::new(from, to);

        if self.piece_at(from) == Some(Piece::king(color))
            && self.legal_moves().any(|m| m == the_move)
        {
            Some(the_move)
        } else {
            None
        }
    }
}
