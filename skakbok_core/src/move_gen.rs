//! Move generation over the square table.
//!
//! Pseudo-legal moves are generated by walking piece-movement patterns from
//! each occupied square; legal moves are the pseudo-legal moves that do not
//! leave the mover's king attacked. Castling is the one exception where the
//! transit rules are enforced up front, since a king passing through an
//! attacked square would otherwise survive the end-of-move check.

use arrayvec::ArrayVec;

use crate::board::{Board, Castling, Color, Move, Piece, PieceType, Square};

/// Maximum number of moves that could occur in a legal position, used for
/// stack-allocating a vector to hold moves.
///
/// The actual number appears to be 218 in this position:
///
/// R6R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNN1KB1 w - - 0 1
///
/// But 256 is a nice number and a good buffer in case there could be more.
pub const MAX_MOVES: usize = 256;

pub type MoveVec = ArrayVec<Move, MAX_MOVES>;

/// Promotion targets, in the order a pawn reaching the last rank is expanded
/// into promotion moves.
pub const PROMOTION_TARGETS: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
    (1, -2),
    (2, -1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const DIAGONAL_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

const ORTHOGONAL_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl Board {
    /// Generates the moves the side to move may play by piece-movement rules
    /// alone, including moves that would leave their own king in check.
    ///
    /// The iterator is finite and restartable by calling the method again.
    pub fn pseudo_legal_moves(&self) -> impl Iterator<Item = Move> {
        let mut moves = MoveVec::new();
        self.generate_pseudo_legal(&mut moves);
        moves.into_iter()
    }

    /// Generates the legal moves for the side to move.
    pub fn legal_moves(&self) -> impl Iterator<Item = Move> + '_ {
        let mut moves = MoveVec::new();
        self.generate_pseudo_legal(&mut moves);
        moves
            .into_iter()
            .filter(move |&m| !self.leaves_king_in_check(m))
    }

    /// Returns true if `square` is attacked by any piece of `by`.
    ///
    /// Works outward from `square` in each piece-movement pattern: knight
    /// hops, king steps, the two pawn-capture diagonals, and sliding rays
    /// stopping at the first occupied square.
    pub fn is_attacked(&self, square: Square, by: Color) -> bool {
        let knight = Piece::new(by, PieceType::Knight);
        for (d_rank, d_file) in KNIGHT_OFFSETS {
            if let Some(sq) = square.try_offset(d_rank, d_file) {
                if self.piece_at(sq) == Some(knight) {
                    return true;
                }
            }
        }

        let king = Piece::king(by);
        for (d_rank, d_file) in KING_OFFSETS {
            if let Some(sq) = square.try_offset(d_rank, d_file) {
                if self.piece_at(sq) == Some(king) {
                    return true;
                }
            }
        }

        // A pawn of `by` attacks `square` from one rank back toward its own
        // side, on either adjacent file.
        let pawn = Piece::pawn(by);
        for d_file in [-1, 1] {
            if let Some(sq) = square.try_offset(-by.pawn_direction(), d_file) {
                if self.piece_at(sq) == Some(pawn) {
                    return true;
                }
            }
        }

        self.ray_attack(square, by, &DIAGONAL_DIRECTIONS, PieceType::Bishop)
            || self.ray_attack(square, by, &ORTHOGONAL_DIRECTIONS, PieceType::Rook)
    }

    fn ray_attack(
        &self,
        square: Square,
        by: Color,
        directions: &[(i8, i8)],
        slider: PieceType,
    ) -> bool {
        for &(d_rank, d_file) in directions {
            let mut current = square;
            while let Some(sq) = current.try_offset(d_rank, d_file) {
                current = sq;
                match self.piece_at(sq) {
                    None => continue,
                    Some(piece) => {
                        if piece.color() == by
                            && (piece.is(slider) || piece.is(PieceType::Queen))
                        {
                            return true;
                        }
                        break;
                    }
                }
            }
        }
        false
    }

    fn leaves_king_in_check(&self, the_move: Move) -> bool {
        let mover = self.turn();
        let mut board = self.copy();
        // Generated moves always have a piece at the origin.
        if board.push(the_move).is_err() {
            return true;
        }
        match board.king(mover) {
            Some(king_sq) => board.is_attacked(king_sq, mover.flip()),
            None => false,
        }
    }

    fn generate_pseudo_legal(&self, out: &mut MoveVec) {
        for (from, piece) in self.pieces() {
            if piece.color() != self.turn() {
                continue;
            }

            match piece.piece_type() {
                PieceType::Pawn => self.generate_pawn_moves(from, out),
                PieceType::Knight => self.generate_leaper_moves(from, &KNIGHT_OFFSETS, out),
                PieceType::Bishop => self.generate_slider_moves(from, &DIAGONAL_DIRECTIONS, out),
                PieceType::Rook => self.generate_slider_moves(from, &ORTHOGONAL_DIRECTIONS, out),
                PieceType::Queen => {
                    self.generate_slider_moves(from, &DIAGONAL_DIRECTIONS, out);
                    self.generate_slider_moves(from, &ORTHOGONAL_DIRECTIONS, out);
                }
                PieceType::King => {
                    self.generate_leaper_moves(from, &KING_OFFSETS, out);
                    self.generate_castling_moves(from, out);
                }
            }
        }
    }

    fn generate_pawn_moves(&self, from: Square, out: &mut MoveVec) {
        let color = self.turn();
        let direction = color.pawn_direction();

        if let Some(one) = from.try_offset(direction, 0) {
            if self.piece_at(one).is_none() {
                self.push_pawn_move(from, one, color, out);

                if from.rank() == color.pawn_rank() {
                    if let Some(two) = one.try_offset(direction, 0) {
                        if self.piece_at(two).is_none() {
                            out.push(Move::new(from, two));
                        }
                    }
                }
            }
        }

        for d_file in [-1, 1] {
            if let Some(to) = from.try_offset(direction, d_file) {
                let is_capture = self
                    .piece_at(to)
                    .is_some_and(|target| target.color() != color);
                if is_capture || Some(to) == self.en_passant() {
                    self.push_pawn_move(from, to, color, out);
                }
            }
        }
    }

    /// Emits a pawn move, expanding arrival on the last rank into the four
    /// promotions.
    fn push_pawn_move(&self, from: Square, to: Square, color: Color, out: &mut MoveVec) {
        if to.rank() == color.promotion_rank() {
            for target in PROMOTION_TARGETS {
                out.push(Move::promoting(from, to, target));
            }
        } else {
            out.push(Move::new(from, to));
        }
    }

    fn generate_leaper_moves(&self, from: Square, offsets: &[(i8, i8)], out: &mut MoveVec) {
        for &(d_rank, d_file) in offsets {
            if let Some(to) = from.try_offset(d_rank, d_file) {
                match self.piece_at(to) {
                    Some(target) if target.color() == self.turn() => {}
                    _ => out.push(Move::new(from, to)),
                }
            }
        }
    }

    fn generate_slider_moves(&self, from: Square, directions: &[(i8, i8)], out: &mut MoveVec) {
        for &(d_rank, d_file) in directions {
            let mut current = from;
            while let Some(to) = current.try_offset(d_rank, d_file) {
                current = to;
                match self.piece_at(to) {
                    None => out.push(Move::new(from, to)),
                    Some(target) => {
                        if target.color() != self.turn() {
                            out.push(Move::new(from, to));
                        }
                        break;
                    }
                }
            }
        }
    }

    fn generate_castling_moves(&self, from: Square, out: &mut MoveVec) {
        let color = self.turn();
        let rank = color.back_rank();

        // Castling is only modeled from the standard home squares.
        if from != Square::at(rank, 4) {
            return;
        }

        let enemy = color.flip();
        let rook = Piece::rook(color);

        if self.castling().contains(Castling::kingside(color)) {
            let f = Square::at(rank, 5);
            let g = Square::at(rank, 6);
            if self.piece_at(f).is_none()
                && self.piece_at(g).is_none()
                && self.piece_at(Square::at(rank, 7)) == Some(rook)
                && !self.is_attacked(from, enemy)
                && !self.is_attacked(f, enemy)
            {
                out.push(Move::new(from, g));
            }
        }

        if self.castling().contains(Castling::queenside(color)) {
            let d = Square::at(rank, 3);
            let c = Square::at(rank, 2);
            let b = Square::at(rank, 1);
            if self.piece_at(d).is_none()
                && self.piece_at(c).is_none()
                && self.piece_at(b).is_none()
                && self.piece_at(Square::at(rank, 0)) == Some(rook)
                && !self.is_attacked(from, enemy)
                && !self.is_attacked(d, enemy)
            {
                out.push(Move::new(from, c));
            }
        }
    }
}
