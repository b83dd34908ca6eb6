//! Structs and functions related to the board representation.

mod castling;
mod fen;
mod move_repr;
mod piece;
mod san;
mod square;

pub use castling::Castling;
pub use fen::ParseFenError;
pub use move_repr::{Move, ParseUciMoveError};
pub use piece::{Color, Piece, PieceType};
pub use square::{ParseSquareError, Square};

use std::fmt::{Display, Write};

use thiserror::Error;

pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Errors from applying or resolving a move on a [`Board`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    /// `push` was invoked with an empty origin square.
    #[error("no piece to move on {0}")]
    NoPieceToMove(Square),
    /// A SAN or UCI string did not resolve to a legal move in the current
    /// position, or a drop was applied.
    #[error("illegal move {0:?}")]
    IllegalMove(String),
}

/// Errors from [`Board::push_uci`], which can fail at the grammar level or at
/// the legality level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushUciError {
    #[error(transparent)]
    Parse(#[from] ParseUciMoveError),
    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Holds everything needed to undo a move: the move itself, the piece it
/// captured (if any), and a complete snapshot of the pre-move state.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UnmakeData {
    the_move: Move,
    captured: Option<Piece>,
    pieces: [Option<Piece>; 64],
    turn: Color,
    castling: Castling,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

/// Represents the current game state.
///
/// Contains a square-table representation of the board (one [`Option<Piece>`]
/// per square), along with the side to move, castling rights, the en-passant
/// target square, the clocks, and the stack of applied moves.
///
/// [`Board::push`] applies a move without checking its legality; callers
/// resolve moves through [`Board::legal_moves`], [`Board::parse_san`] or
/// [`Board::push_uci`] first. [`Board::pop`] restores every state field from
/// the undo snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pieces: [Option<Piece>; 64],
    turn: Color,
    castling: Castling,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,

    move_stack: Vec<UnmakeData>,
}

impl Board {
    /// Returns a [`Board`] representing the starting position of a standard
    /// chess game.
    pub fn new() -> Self {
        Self::from_fen(STARTING_POSITION_FEN).unwrap()
    }

    /// Parses a [`Board`] from Forsyth-Edwards Notation.
    ///
    /// Trailing fields may be omitted; they default to white to move, no
    /// castling rights, no en-passant square, and clocks of 0 and 1.
    pub fn from_fen(fen: &str) -> Result<Self, ParseFenError> {
        let parsed = fen::parse_fen(fen)?;
        Ok(Self {
            pieces: parsed.pieces,
            turn: parsed.turn,
            castling: parsed.castling,
            en_passant: parsed.en_passant,
            halfmove_clock: parsed.halfmove_clock,
            fullmove_number: parsed.fullmove_number,
            move_stack: Vec::new(),
        })
    }

    /// Serialises the current position as the six FEN fields.
    pub fn fen(&self) -> String {
        fen::board_to_fen(self)
    }

    /// Replaces the current position with the one described by `fen`,
    /// discarding the move stack. The board itself is untouched if the FEN
    /// does not parse.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), ParseFenError> {
        *self = Self::from_fen(fen)?;
        Ok(())
    }

    /// Returns the piece that's on a specific square.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces[square.index()]
    }

    /// Returns the [`Color`] of the current player.
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Returns the castling rights in the current position.
    pub fn castling(&self) -> Castling {
        self.castling
    }

    /// Returns the square behind a just-double-pushed pawn, if the previous
    /// move was a double pawn push.
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Plies since the last capture or pawn move. The game can be ended by
    /// the fifty-move rule when this reaches 100.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// The "full" move count, starting at 1 and incrementing after each black
    /// move.
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Returns an iterator over all occupied squares and their pieces, a1
    /// through h8.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.pieces[sq.index()].map(|piece| (sq, piece)))
    }

    /// Finds the king of the given color, if one is on the board.
    ///
    /// Artificial positions without a king are tolerated, hence the
    /// [`Option`].
    pub fn king(&self, color: Color) -> Option<Square> {
        let king = Piece::king(color);
        self.pieces().find(|&(_, piece)| piece == king).map(|(sq, _)| sq)
    }

    /// Returns a structurally identical board with an empty move stack.
    pub fn copy(&self) -> Self {
        Self {
            pieces: self.pieces,
            turn: self.turn,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            move_stack: Vec::new(),
        }
    }

    /// Applies a move to the board and records it on the move stack.
    ///
    /// Legality is not checked; resolve moves through [`Board::legal_moves`],
    /// [`Board::parse_san`] or [`Board::push_uci`] first. The null move is
    /// applied by flipping the turn and clearing the en-passant square. Drops
    /// are never applied.
    pub fn push(&mut self, the_move: Move) -> Result<(), MoveError> {
        if the_move.is_drop() {
            return Err(MoveError::IllegalMove(the_move.uci()));
        }

        let mut snapshot = UnmakeData {
            the_move,
            captured: None,
            pieces: self.pieces,
            turn: self.turn,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };

        // The degenerate a1-a1 shape is reserved for the null move; move
        // generation never produces it for a real piece. Nothing moves, the
        // turn just passes.
        if the_move.is_null() {
            self.move_stack.push(snapshot);
            self.en_passant = None;
            self.halfmove_clock += 1;
            if self.turn.is_black() {
                self.fullmove_number += 1;
            }
            self.turn = self.turn.flip();
            return Ok(());
        }

        let piece = self.pieces[the_move.from.index()]
            .ok_or(MoveError::NoPieceToMove(the_move.from))?;
        let mover = piece.color();
        let mut captured = self.pieces[the_move.to.index()];

        if piece.is(PieceType::King) && the_move.from.file().abs_diff(the_move.to.file()) == 2 {
            // Castling: the king has already been vetted to land on the c- or
            // g-file; bring the corresponding rook across.
            self.pieces[the_move.from.index()] = None;
            self.pieces[the_move.to.index()] = Some(piece);

            let rank = the_move.from.rank();
            let (rook_from, rook_to) = if the_move.to.file() == 6 {
                (Square::at(rank, 7), Square::at(rank, 5))
            } else {
                (Square::at(rank, 0), Square::at(rank, 3))
            };
            let rook = self.pieces[rook_from.index()].take();
            self.pieces[rook_to.index()] = rook;
        } else if piece.is(PieceType::Pawn) && Some(the_move.to) == self.en_passant {
            // En passant: the captured pawn sits one rank behind the target
            // square.
            self.pieces[the_move.from.index()] = None;
            self.pieces[the_move.to.index()] = Some(piece);
            if let Some(captured_sq) = the_move.to.try_offset(-mover.pawn_direction(), 0) {
                captured = self.pieces[captured_sq.index()].take();
            }
        } else {
            self.pieces[the_move.from.index()] = None;
            let placed = match the_move.promotion {
                Some(promoted) => promoted.with_color(mover),
                None => piece,
            };
            self.pieces[the_move.to.index()] = Some(placed);
        }

        // The en-passant square is set behind a double pawn push and cleared
        // otherwise; "behind" is the rank midway between start and end.
        self.en_passant = if piece.is(PieceType::Pawn)
            && the_move.from.file() == the_move.to.file()
            && the_move.from.rank().abs_diff(the_move.to.rank()) == 2
        {
            Some(Square::at(
                (the_move.from.rank() + the_move.to.rank()) / 2,
                the_move.from.file(),
            ))
        } else {
            None
        };

        self.castling
            .remove(Self::castling_rights_removed(piece, the_move));

        if captured.is_some() || piece.is(PieceType::Pawn) {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if self.turn.is_black() {
            self.fullmove_number += 1;
        }
        self.turn = self.turn.flip();

        snapshot.captured = captured;
        self.move_stack.push(snapshot);

        Ok(())
    }

    /// Undoes the most recently pushed move, restoring every state field.
    ///
    /// Returns the move that was undone, or [`None`] if the stack is empty.
    pub fn pop(&mut self) -> Option<Move> {
        let unmake = self.move_stack.pop()?;
        self.pieces = unmake.pieces;
        self.turn = unmake.turn;
        self.castling = unmake.castling;
        self.en_passant = unmake.en_passant;
        self.halfmove_clock = unmake.halfmove_clock;
        self.fullmove_number = unmake.fullmove_number;
        Some(unmake.the_move)
    }

    /// Parses `san` in the current position and applies the resulting move.
    pub fn push_san(&mut self, san: &str) -> Result<Move, MoveError> {
        let the_move = self.parse_san(san)?;
        self.push(the_move)?;
        Ok(the_move)
    }

    /// Parses a UCI move string, checks it against the legal moves in the
    /// current position, and applies it.
    pub fn push_uci(&mut self, uci: &str) -> Result<Move, PushUciError> {
        let parsed: Move = uci.parse()?;

        if parsed.is_null() {
            self.push(parsed)?;
            return Ok(parsed);
        }

        let the_move = self
            .legal_moves()
            .find(|m| {
                m.from == parsed.from && m.to == parsed.to && m.promotion == parsed.promotion
            })
            .ok_or_else(|| MoveError::IllegalMove(uci.to_owned()))?;
        self.push(the_move)?;
        Ok(the_move)
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        match self.king(self.turn) {
            Some(king_sq) => self.is_attacked(king_sq, self.turn.flip()),
            None => false,
        }
    }

    /// Returns true if the side to move is checkmated.
    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.legal_moves().next().is_none()
    }

    /// Returns true if the side to move is stalemated.
    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal_moves().next().is_none()
    }

    /// Returns true if the game is over: no legal moves remain (checkmate or
    /// stalemate), or the fifty-move counter has run out.
    pub fn is_game_over(&self) -> bool {
        if self.legal_moves().next().is_none() {
            true
        } else {
            self.halfmove_clock >= 100
        }
    }

    /// Returns true if neither side has enough material to ever deliver
    /// mate: no pawns, rooks or queens on the board, and at most one minor
    /// piece in total.
    pub fn has_insufficient_material(&self) -> bool {
        let mut minor_pieces = 0;
        for (_, piece) in self.pieces() {
            match piece.piece_type() {
                PieceType::Pawn | PieceType::Rook | PieceType::Queen => return false,
                PieceType::Knight | PieceType::Bishop => minor_pieces += 1,
                PieceType::King => {}
            }
        }
        minor_pieces <= 1
    }

    fn castling_rights_removed(piece: Piece, the_move: Move) -> Castling {
        let mut removed = Castling::empty();

        if piece.is(PieceType::King) {
            removed |= Castling::for_color(piece.color());
        }

        // A rook leaving its home square, or any capture landing on one,
        // kills the corresponding right.
        for sq in [the_move.from, the_move.to] {
            removed |= match sq {
                Square::WHITE_KINGSIDE_ROOK => Castling::WHITE_KINGSIDE,
                Square::WHITE_QUEENSIDE_ROOK => Castling::WHITE_QUEENSIDE,
                Square::BLACK_KINGSIDE_ROOK => Castling::BLACK_KINGSIDE,
                Square::BLACK_QUEENSIDE_ROOK => Castling::BLACK_QUEENSIDE,
                _ => Castling::empty(),
            };
        }

        removed
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                if file > 0 {
                    f.write_char(' ')?;
                }
                match self.pieces[Square::at(rank, file).index()] {
                    Some(piece) => f.write_char(piece.as_fen_char())?,
                    None => f.write_char('.')?,
                }
            }
            if rank > 0 {
                f.write_char('\n')?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen).unwrap()
    }

    #[test]
    fn board_starting_position() {
        let board = Board::new();

        assert_eq!(board.turn(), Color::White);
        assert_eq!(board.castling(), Castling::all());
        assert_eq!(board.en_passant(), None);
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 1);
        assert_eq!(board.piece_at(Square::E1), Some(Piece::WHITE_KING));
        assert_eq!(board.piece_at(Square::D8), Some(Piece::BLACK_QUEEN));
        assert_eq!(board.piece_at(Square::E4), None);
        assert_eq!(board.fen(), STARTING_POSITION_FEN);
    }

    #[test]
    fn board_pieces_iterates_occupied_squares() {
        let board = board("8/8/8/3k4/8/8/4P3/4K3 w - - 0 1");

        let pieces: Vec<_> = board.pieces().collect();
        assert_eq!(
            pieces,
            vec![
                (Square::E1, Piece::WHITE_KING),
                (Square::E2, Piece::WHITE_PAWN),
                (Square::D5, Piece::BLACK_KING),
            ]
        );
    }

    #[test]
    fn board_king_lookup() {
        let board = board("8/8/8/3k4/8/8/4P3/4K3 w - - 0 1");
        assert_eq!(board.king(Color::White), Some(Square::E1));
        assert_eq!(board.king(Color::Black), Some(Square::D5));

        let kingless = board_missing_king();
        assert_eq!(kingless.king(Color::Black), None);
    }

    fn board_missing_king() -> Board {
        board("8/8/8/8/8/8/4P3/4K3 w - - 0 1")
    }

    #[test]
    fn push_requires_a_piece_at_the_origin() {
        let mut board = Board::new();
        assert_eq!(
            board.push(Move::new(Square::E3, Square::E4)),
            Err(MoveError::NoPieceToMove(Square::E3))
        );
    }

    #[test]
    fn push_rejects_drops() {
        let mut board = Board::new();
        assert_eq!(
            board.push(Move::new_drop(PieceType::Knight, Square::F3)),
            Err(MoveError::IllegalMove("N@f3".to_owned()))
        );
    }

    #[test]
    fn push_and_pop_restore_every_field() {
        let mut board = board("r3k2r/p1pp1ppp/8/3pP3/8/8/PPPP1PPP/R3K2R w KQkq d6 0 5");
        let before = board.clone();

        for uci in ["e5d6", "e8g8", "e1c1"] {
            board.push_uci(uci).unwrap();
        }
        for _ in 0..3 {
            assert!(board.pop().is_some());
        }

        assert_eq!(board, before);
        assert_eq!(board.pop(), None);
    }

    #[test]
    fn push_updates_turn_and_fullmoves() {
        let mut board = Board::new();

        board.push_uci("e2e4").unwrap();
        assert_eq!(board.turn(), Color::Black);
        assert_eq!(board.fullmove_number(), 1);

        board.push_uci("e7e5").unwrap();
        assert_eq!(board.turn(), Color::White);
        assert_eq!(board.fullmove_number(), 2);

        board.push_uci("g1f3").unwrap();
        assert_eq!(board.turn(), Color::Black);
        assert_eq!(board.fullmove_number(), 2);
    }

    #[test]
    fn push_updates_castling_rights_on_king_moves() {
        let mut board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");

        board.push_uci("e1g1").unwrap();
        assert_eq!(board.castling(), Castling::BLACK);
        // The castle brought the rook across.
        assert_eq!(board.piece_at(Square::F1), Some(Piece::WHITE_ROOK));
        assert_eq!(board.piece_at(Square::G1), Some(Piece::WHITE_KING));
        assert_eq!(board.piece_at(Square::H1), None);

        board.push_uci("e8e7").unwrap();
        assert_eq!(board.castling(), Castling::empty());
    }

    #[test]
    fn push_updates_castling_rights_on_rook_moves_and_captures() {
        let mut board = board("r3k2r/8/8/8/8/6n1/8/R3K2R b KQkq - 0 1");

        board.push_uci("g3h1").unwrap();
        assert_eq!(board.castling(), Castling::WHITE_QUEENSIDE | Castling::BLACK);

        board.push_uci("a1a8").unwrap();
        assert_eq!(board.castling(), Castling::BLACK_KINGSIDE);
    }

    #[test]
    fn queenside_castle_moves_the_a_rook() {
        let mut board = board("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1");

        board.push_uci("e8c8").unwrap();
        assert_eq!(board.piece_at(Square::C8), Some(Piece::BLACK_KING));
        assert_eq!(board.piece_at(Square::D8), Some(Piece::BLACK_ROOK));
        assert_eq!(board.piece_at(Square::A8), None);
    }

    #[test]
    fn push_updates_en_passant_square() {
        let mut board = board("4k3/4p3/8/8/p1p2P2/8/1P4P1/4K3 w - - 0 1");

        board.push_uci("f4f5").unwrap();
        assert_eq!(board.en_passant(), None);

        board.push_uci("e7e5").unwrap();
        assert_eq!(board.en_passant(), Some(Square::E6));

        board.push_uci("b2b4").unwrap();
        assert_eq!(board.en_passant(), Some(Square::B3));

        board.push_uci("c4b3").unwrap();
        assert_eq!(board.en_passant(), None);
        // The en-passant capture removed the b4 pawn.
        assert_eq!(board.piece_at(Square::B4), None);
        assert_eq!(board.piece_at(Square::B3), Some(Piece::BLACK_PAWN));
    }

    #[test]
    fn push_updates_halfmove_clock() {
        let mut board = board("4k3/p7/2P4R/8/1r6/8/8/5K2 w - - 0 1");

        board.push_uci("h6f6").unwrap();
        assert_eq!(board.halfmove_clock(), 1);

        board.push_uci("b4b5").unwrap();
        assert_eq!(board.halfmove_clock(), 2);

        board.push_uci("c6c7").unwrap();
        assert_eq!(board.halfmove_clock(), 0);

        board.push_uci("b5b4").unwrap();
        assert_eq!(board.halfmove_clock(), 1);

        board.push_uci("c7c8q").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.piece_at(Square::C8), Some(Piece::WHITE_QUEEN));
    }

    #[test]
    fn push_null_move_flips_turn_and_clears_en_passant() {
        let mut board = board("4k3/8/8/8/4Pp2/8/8/4K3 b - e3 0 1");
        let before = board.clone();

        board.push(Move::NULL).unwrap();
        assert_eq!(board.turn(), Color::White);
        assert_eq!(board.en_passant(), None);
        assert_eq!(board.halfmove_clock(), 1);
        assert_eq!(board.fullmove_number(), 2);

        assert_eq!(board.pop(), Some(Move::NULL));
        assert_eq!(board, before);
    }

    #[test]
    fn push_null_move_ignores_the_piece_on_a1() {
        // The rook sitting on a1 must not turn the null move into a fake
        // self-capture that resets the clock or strips castling rights.
        let mut board = Board::new();

        board.push(Move::NULL).unwrap();
        assert_eq!(board.turn(), Color::Black);
        assert_eq!(board.castling(), Castling::all());
        assert_eq!(board.halfmove_clock(), 1);
        assert_eq!(board.piece_at(Square::A1), Some(Piece::WHITE_ROOK));

        assert_eq!(board.pop(), Some(Move::NULL));
        assert_eq!(board, Board::new());
    }

    #[test]
    fn copy_has_an_empty_move_stack() {
        let mut board = Board::new();
        board.push_uci("e2e4").unwrap();

        let mut copy = board.copy();
        assert_eq!(copy.fen(), board.fen());
        assert_eq!(copy.pop(), None);
    }

    #[test]
    fn fools_mate_is_checkmate() {
        let mut board = Board::new();
        for san in ["f3", "e5", "g4", "Qh4"] {
            board.push_san(san).unwrap();
        }

        assert!(board.is_check());
        assert!(board.is_checkmate());
        assert!(!board.is_stalemate());
        assert!(board.is_game_over());
    }

    #[test]
    fn stalemate_is_detected() {
        let board = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");

        assert!(!board.is_check());
        assert!(board.is_stalemate());
        assert!(!board.is_checkmate());
        assert!(board.is_game_over());
    }

    #[test]
    fn fifty_move_rule_ends_the_game() {
        let b = board("4k3/8/8/8/8/8/4P3/4K3 w - - 100 80");
        assert!(b.is_game_over());

        let in_play = board("4k3/8/8/8/8/8/4P3/4K3 w - - 99 80");
        assert!(!in_play.is_game_over());
    }

    #[test]
    fn insufficient_material() {
        assert!(board("4k3/8/8/8/8/8/8/4K3 w - - 0 1").has_insufficient_material());
        assert!(board("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").has_insufficient_material());
        assert!(board("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1").has_insufficient_material());

        // Two minor pieces, either side of the board, can still mate.
        assert!(!board("2n1k3/8/8/8/8/8/8/1N2K3 w - - 0 1").has_insufficient_material());
        assert!(!board("4k3/8/8/8/8/8/8/1N2KB2 w - - 0 1").has_insufficient_material());

        assert!(!board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").has_insufficient_material());
        assert!(!board("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").has_insufficient_material());
        assert!(!board("3qk3/8/8/8/8/8/8/4K3 w - - 0 1").has_insufficient_material());
    }

    #[test]
    fn board_display_draws_the_grid() {
        let board = board("8/8/8/3k4/8/8/4P3/4K3 w - - 0 1");
        let expected = "\
. . . . . . . .
. . . . . . . .
. . . . . . . .
. . . k . . . .
. . . . . . . .
. . . . . . . .
. . . . P . . .
. . . . K . . .";

        assert_eq!(board.to_string(), expected);
    }
}
