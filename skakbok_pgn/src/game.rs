//! A complete game: the tree root plus headers and collected errors.

use std::fmt::{Display, Write as _};

use skakbok_core::board::{Board, Move, ParseFenError};
use thiserror::Error;

use crate::annotations::format_clock;
use crate::headers::Headers;
use crate::node::GameNode;

/// A per-move failure recorded while building a game tree. Building never
/// aborts on these; they accumulate on [`Game::errors`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (move {san:?} at {fen})")]
pub struct ParseError {
    pub message: String,
    /// The move text that failed to resolve.
    pub san: String,
    /// The position at the time of failure.
    pub fen: String,
    /// The move number written before the token, when known.
    pub move_number: Option<u32>,
}

/// Options for PGN export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Wrap move text at this column by whitespace; [`None`] keeps one line.
    pub columns: Option<usize>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { columns: Some(80) }
    }
}

/// A game: the root of the tree, the tag pairs, and any per-move errors
/// collected while building.
///
/// The root's starting position is derived from the `FEN` tag when present,
/// otherwise the standard initial position.
#[derive(Debug)]
pub struct Game {
    root: GameNode,
    pub headers: Headers,
    pub errors: Vec<ParseError>,
}

impl Game {
    /// A game from the standard starting position, with no headers.
    pub fn new() -> Self {
        Self {
            root: GameNode::new_root(None),
            headers: Headers::new(),
            errors: Vec::new(),
        }
    }

    /// A game starting from `fen`, recorded in the `FEN` and `SetUp` tags.
    pub fn from_starting_fen(fen: &str) -> Result<Self, ParseFenError> {
        Board::from_fen(fen)?;

        let mut headers = Headers::new();
        headers.insert("FEN", fen);
        headers.insert("SetUp", "1");

        Ok(Self {
            root: GameNode::new_root(Some(fen.to_owned())),
            headers,
            errors: Vec::new(),
        })
    }

    pub(crate) fn with_root(root: GameNode, headers: Headers, errors: Vec<ParseError>) -> Self {
        Self {
            root,
            headers,
            errors,
        }
    }

    /// A handle to the root node.
    pub fn root(&self) -> GameNode {
        self.root.clone()
    }

    /// The final node of the mainline.
    pub fn end(&self) -> GameNode {
        self.root.end()
    }

    /// Iterates the mainline nodes from the first move on.
    pub fn mainline(&self) -> impl Iterator<Item = GameNode> {
        self.root.mainline()
    }

    /// The mainline moves from the first move on.
    pub fn mainline_moves(&self) -> impl Iterator<Item = Move> {
        self.root.mainline_moves()
    }

    /// Renders the game as PGN: escaped `[Tag "value"]` lines, a blank line,
    /// then the move text with variations, NAGs and comments, closed by the
    /// result.
    pub fn to_pgn(&self, options: &ExportOptions) -> String {
        let mut out = String::new();

        for (name, value) in self.headers.iter() {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            let _ = writeln!(out, "[{name} \"{escaped}\"]");
        }
        if !self.headers.is_empty() {
            out.push('\n');
        }

        let mut tokens: Vec<String> = Vec::new();
        if let Some(comment) = render_annotations(&self.root) {
            tokens.push(comment);
        }

        let mut board = self.root.board().unwrap_or_default();
        write_movetext(&self.root, &mut board, &mut tokens, true);

        tokens.push(self.headers.result().unwrap_or("*").to_owned());

        wrap_tokens(&mut out, &tokens, options.columns);
        out
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_pgn(&ExportOptions::default()))
    }
}

/// Emits the subtree below `parent`: the mainline move, its sibling
/// variations in parentheses, then the mainline continuation.
fn write_movetext(parent: &GameNode, board: &mut Board, tokens: &mut Vec<String>, force_number: bool) {
    let children = parent.variations();
    let Some(main) = children.first() else {
        return;
    };

    emit_move(board, main, tokens, force_number);

    for variation in &children[1..] {
        tokens.push("(".to_owned());
        if let Some(comment) = variation.starting_comment() {
            tokens.push(format!("{{{comment}}}"));
        }
        emit_move(board, variation, tokens, true);

        if let Some(mv) = variation.played_move() {
            let mut variation_board = board.copy();
            if variation_board.push(mv).is_ok() {
                let interrupted = variation.comment().is_some();
                write_movetext(variation, &mut variation_board, tokens, interrupted);
            }
        }
        tokens.push(")".to_owned());
    }

    let interrupted = children.len() > 1 || main.comment().is_some();
    if let Some(mv) = main.played_move() {
        if board.push(mv).is_ok() {
            write_movetext(main, board, tokens, interrupted);
        }
    }
}

/// Emits one move: its number prefix when due, the SAN, `$n` NAGs, and the
/// trailing comment.
fn emit_move(board: &Board, node: &GameNode, tokens: &mut Vec<String>, force_number: bool) {
    let Some(mv) = node.played_move() else {
        return;
    };

    if board.turn().is_white() {
        tokens.push(format!("{}.", board.fullmove_number()));
    } else if force_number {
        tokens.push(format!("{}...", board.fullmove_number()));
    }

    let san = board.san(mv).unwrap_or_else(|_| mv.uci());
    tokens.push(san);

    for nag in node.nags() {
        tokens.push(format!("${nag}"));
    }
    if let Some(comment) = render_annotations(node) {
        tokens.push(comment);
    }
}

/// Renders a node's comment text and annotation payloads back into a single
/// `{...}` token, or [`None`] when the node carries neither.
fn render_annotations(node: &GameNode) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(text) = node.comment() {
        parts.push(text);
    }
    if let Some(clock) = node.clock() {
        parts.push(format!("[%clk {}]", format_clock(clock)));
    }
    if let Some(eval) = node.eval() {
        parts.push(format!("[%eval {eval}]"));
    }
    let arrows = node.arrows();
    if !arrows.is_empty() {
        let codes: Vec<String> = arrows.iter().map(|a| a.to_string()).collect();
        parts.push(format!("[%cal {}]", codes.join(",")));
    }
    let shapes = node.shapes();
    if !shapes.is_empty() {
        let codes: Vec<String> = shapes.iter().map(|s| s.to_string()).collect();
        parts.push(format!("[%csl {}]", codes.join(",")));
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("{{{}}}", parts.join(" ")))
    }
}

/// Joins tokens with spaces, wrapping by whitespace at the column limit.
fn wrap_tokens(out: &mut String, tokens: &[String], columns: Option<usize>) {
    let mut line_len = 0;
    for token in tokens {
        if line_len == 0 {
            out.push_str(token);
            line_len = token.len();
        } else if columns.is_some_and(|limit| line_len + 1 + token.len() > limit) {
            out.push('\n');
            out.push_str(token);
            line_len = token.len();
        } else {
            out.push(' ');
            out.push_str(token);
            line_len += 1 + token.len();
        }
    }
}
