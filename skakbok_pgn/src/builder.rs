//! Builds branching game trees out of the flat parse structures.
//!
//! The central reinterpretation: in the flat structure a variation attached
//! to a move means "instead of this move, after the preceding one". The
//! variation's first move therefore becomes a *sibling* of that move under
//! the shared parent, never a child of it.

use log::debug;

use skakbok_core::board::{Board, Move, PieceType, Square};

use crate::annotations::{parse_clock_seconds, Arrow, Shape};
use crate::game::{Game, ParseError};
use crate::headers::Headers;
use crate::nag;
use crate::node::GameNode;
use crate::parser;
use crate::raw::{RawComment, RawElement, RawGame, RawMove, RawNotation};

/// Reads the first game from a PGN string. Returns [`None`] when the input
/// holds no recognisable game.
pub fn read_game(pgn: &str) -> Option<Game> {
    let (_, raw) = parser::parse_game(pgn);
    raw.map(|raw| build_game(&raw))
}

/// Reads every game from a PGN stream, in source order. An unreadable input
/// yields an empty vector.
pub fn read_games(pgn: &str) -> Vec<Game> {
    parser::parse_games(pgn).iter().map(build_game).collect()
}

/// Builds a [`Game`] from one flat parse result.
pub fn build_game(raw: &RawGame) -> Game {
    let mut headers = Headers::new();
    for (name, value) in &raw.tags {
        // `messages` is a synthetic upstream field, not a real tag.
        if name == "messages" {
            continue;
        }
        headers.insert(name.clone(), value.clone());
    }

    let mut errors = Vec::new();
    let root = match headers.starting_fen() {
        Some(fen) => match Board::from_fen(fen) {
            Ok(_) => GameNode::new_root(Some(fen.to_owned())),
            Err(e) => {
                debug!("unusable FEN header {fen:?}: {e}");
                errors.push(ParseError {
                    message: e.to_string(),
                    san: String::new(),
                    fen: fen.to_owned(),
                    move_number: None,
                });
                GameNode::new_root(None)
            }
        },
        None => GameNode::new_root(None),
    };

    if let Some(comment) = &raw.game_comment {
        apply_comment(&root, comment);
    }

    let mut board = root.board().unwrap_or_default();
    build_line(&mut errors, root.clone(), &mut board, &raw.moves);

    Game::with_root(root, headers, errors)
}

/// Walks one move sequence with two cursors: the node to append mainline
/// moves under, and the live board. Variation sequences restart from the
/// position snapshot taken before the move they are an alternative to, and
/// are appended under the *unchanged* parent, landing after that move as
/// its siblings.
fn build_line(
    errors: &mut Vec<ParseError>,
    mut parent: GameNode,
    board: &mut Board,
    elements: &[RawElement],
) {
    for element in elements {
        let raw_move = match element {
            RawElement::Move(raw_move) => raw_move,
            RawElement::Result(_) => continue,
        };

        let fen_before = board.fen();

        let the_move = match board.parse_san(&raw_move.notation.text) {
            Ok(the_move) => the_move,
            Err(primary) => match resolve_from_fields(board, &raw_move.notation) {
                Some(the_move) => the_move,
                None => {
                    debug!(
                        "skipping unresolvable move {:?} at {fen_before}",
                        raw_move.notation.text
                    );
                    errors.push(ParseError {
                        message: primary.to_string(),
                        san: raw_move.notation.text.clone(),
                        fen: fen_before,
                        move_number: raw_move.move_number,
                    });
                    // Deeper variations past an unreadable move are skipped;
                    // the remaining moves at this level are still tried.
                    continue;
                }
            },
        };

        let node = parent.add_variation(the_move);
        annotate(&node, raw_move);

        let advanced = match board.push(the_move) {
            Ok(()) => true,
            Err(e) => {
                // A drop (or other unappliable shape) stays recorded as a
                // leaf; the line does not advance through it.
                debug!("cannot apply {:?} at {fen_before}: {e}", raw_move.notation.text);
                errors.push(ParseError {
                    message: e.to_string(),
                    san: raw_move.notation.text.clone(),
                    fen: fen_before.clone(),
                    move_number: raw_move.move_number,
                });
                false
            }
        };

        for variation in &raw_move.variations {
            if let Ok(mut variation_board) = Board::from_fen(&fen_before) {
                build_line(errors, parent.clone(), &mut variation_board, variation);
            }
        }

        if advanced {
            parent = node;
        }
    }
}

fn annotate(node: &GameNode, raw_move: &RawMove) {
    if let Some(text) = &raw_move.comment_before {
        node.set_starting_comment(Some(text.clone()));
    }
    if let Some(comment) = &raw_move.comment_after {
        apply_comment(node, comment);
    }
    for token in &raw_move.nags {
        if let Some(value) = nag::parse(token) {
            node.add_nag(value);
        }
    }
}

fn apply_comment(node: &GameNode, comment: &RawComment) {
    if let Some(text) = &comment.text {
        node.set_comment(Some(text.clone()));
    }
    if let Some(clock) = &comment.clock {
        node.set_clock(parse_clock_seconds(clock));
    }
    if let Some(eval) = comment.eval {
        node.set_eval(Some(eval));
    }
    if !comment.arrows.is_empty() {
        node.set_arrows(
            comment
                .arrows
                .iter()
                .filter_map(|code| Arrow::from_code(code))
                .collect(),
        );
    }
    if !comment.fields.is_empty() {
        node.set_shapes(
            comment
                .fields
                .iter()
                .filter_map(|code| Shape::from_code(code))
                .collect(),
        );
    }
}

/// Fallback resolution from the decomposed notation fields: filter the legal
/// moves by destination, piece letter, disambiguation and promotion, and
/// accept a sole survivor.
fn resolve_from_fields(board: &Board, notation: &RawNotation) -> Option<Move> {
    if notation.is_drop {
        return None;
    }

    let (col, row) = (notation.col?, notation.row?);
    let to = Square::new(row as u8 - b'1', col as u8 - b'a')?;

    let piece_type = match notation.fig {
        Some(fig) => PieceType::try_from_char(fig)?,
        None => PieceType::Pawn,
    };
    let promotion = match notation.promotion {
        Some(promo) => Some(PieceType::try_from_char(promo)?),
        None => None,
    };

    let mut candidates = board.legal_moves().filter(|m| {
        m.to == to
            && m.promotion == promotion
            && board
                .piece_at(m.from)
                .is_some_and(|p| p.piece_type() == piece_type)
            && notation.disc.as_deref().map_or(true, |disc| {
                disc.chars().all(|c| match c {
                    'a'..='h' => m.from.file() == c as u8 - b'a',
                    '1'..='8' => m.from.rank() == c as u8 - b'1',
                    _ => false,
                })
            })
    });

    let the_move = candidates.next()?;
    match candidates.next() {
        Some(_) => None,
        None => Some(the_move),
    }
}
