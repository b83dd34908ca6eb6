//! The flat parse tree produced by the lexical PGN parser.
//!
//! This is a purely syntactic view of a game: tags, a linear move list, and
//! per-move nested variation lists keyed to the move they follow. The tree
//! builder reinterprets it into a branching [`crate::Game`]; in particular, a
//! variation attached to a move here means "instead of that move", not
//! "after it".

/// One parsed game, before any move is resolved against a board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGame {
    /// Tag pairs in source order.
    pub tags: Vec<(String, String)>,
    /// A comment appearing before the first move.
    pub game_comment: Option<RawComment>,
    /// The movetext elements of the main line.
    pub moves: Vec<RawElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawElement {
    Move(RawMove),
    /// A result token (`1-0`, `0-1`, `1/2-1/2`, `*`); ignored by the tree
    /// builder.
    Result(String),
}

/// One move token with its attached annotations and variations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMove {
    pub notation: RawNotation,
    /// The move number written before the token, if any.
    pub move_number: Option<u32>,
    /// A comment written before the move itself.
    pub comment_before: Option<String>,
    /// The comment following the move, with its embedded payloads extracted.
    pub comment_after: Option<RawComment>,
    /// NAG tokens in `$n` form (suffix decorations are normalised to these).
    pub nags: Vec<String>,
    /// Variation sequences attached to this move. Each is an alternative to
    /// this move, branching from the position before it.
    pub variations: Vec<Vec<RawElement>>,
}

/// A SAN token decomposed into its syntactic parts.
///
/// `col` and `row` name the destination square; `disc` holds the
/// disambiguation text (a file letter and/or rank digit). The decomposed
/// fields drive the fallback resolution when full SAN parsing fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNotation {
    /// The token as written, minus suffix decorations.
    pub text: String,
    /// The piece letter (`K`, `Q`, `R`, `B`, `N`), absent for pawn moves.
    pub fig: Option<char>,
    /// Destination file letter.
    pub col: Option<char>,
    /// Destination rank digit.
    pub row: Option<char>,
    /// Disambiguation characters, when present.
    pub disc: Option<String>,
    /// Promotion piece letter, when present.
    pub promotion: Option<char>,
    /// True for `P@e4`-style drops.
    pub is_drop: bool,
}

/// A comment with the `[%...]` micro-grammar payloads extracted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawComment {
    /// The remaining free text, if any.
    pub text: Option<String>,
    /// A `[%clk]` reading, kept in its source form.
    pub clock: Option<String>,
    /// A `[%eval]` number.
    pub eval: Option<f64>,
    /// `[%cal]` arrow codes.
    pub arrows: Vec<String>,
    /// `[%csl]` square highlight codes.
    pub fields: Vec<String>,
}

impl RawComment {
    /// Extracts the micro-grammar payloads from a comment body and keeps the
    /// rest as free text.
    pub fn from_text(body: &str) -> Self {
        let mut comment = RawComment::default();
        let mut plain = String::new();
        let mut rest = body;

        while let Some(start) = rest.find("[%") {
            plain.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find(']') else {
                plain.push_str(&rest[start..]);
                rest = "";
                break;
            };

            let payload = &after[..end];
            let mut parts = payload.splitn(2, ' ');
            match (parts.next(), parts.next()) {
                (Some("clk"), Some(value)) => comment.clock = Some(value.trim().to_owned()),
                (Some("eval"), Some(value)) => comment.eval = value.trim().parse().ok(),
                (Some("cal"), Some(value)) => comment
                    .arrows
                    .extend(split_codes(value)),
                (Some("csl"), Some(value)) => comment
                    .fields
                    .extend(split_codes(value)),
                // Unknown payloads are dropped from the text.
                _ => {}
            }
            rest = &after[end + 1..];
        }
        plain.push_str(rest);

        let trimmed = plain.trim();
        if !trimmed.is_empty() {
            comment.text = Some(trimmed.to_owned());
        }
        comment
    }

    /// Merges another comment into this one: texts concatenate, payloads
    /// accumulate.
    pub fn merge(&mut self, other: RawComment) {
        match (&mut self.text, other.text) {
            (Some(text), Some(more)) => {
                text.push(' ');
                text.push_str(&more);
            }
            (text @ None, more) => *text = more,
            _ => {}
        }
        if self.clock.is_none() {
            self.clock = other.clock;
        }
        if self.eval.is_none() {
            self.eval = other.eval;
        }
        self.arrows.extend(other.arrows);
        self.fields.extend(other.fields);
    }
}

fn split_codes(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_owned)
}
