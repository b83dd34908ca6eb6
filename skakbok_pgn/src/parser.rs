//! Lexical PGN parsing.
//!
//! Turns PGN text into the flat [`crate::raw`] structures: tag pairs, a
//! linear move list, and nested variation lists attached to the move they
//! follow. No board is consulted here; SAN tokens are only decomposed
//! syntactically. The tree builder does the semantic work.

use nom::{
    character::complete::{char, digit1, multispace0},
    bytes::complete::{take_while, take_while1},
    sequence::delimited,
    IResult,
};

use crate::nag;
use crate::raw::{RawComment, RawElement, RawGame, RawMove, RawNotation};

/// Parses every game in a PGN stream. Returns an empty vector for input with
/// no recognisable game content.
pub fn parse_games(input: &str) -> Vec<RawGame> {
    let mut games = Vec::new();
    let mut rest = input;
    while let (next, Some(game)) = parse_game(rest) {
        games.push(game);
        rest = next;
    }
    games
}

/// Parses the first game of a PGN stream, returning the remaining input.
/// Yields [`None`] once no game content remains.
pub fn parse_game(input: &str) -> (&str, Option<RawGame>) {
    let mut game = RawGame::default();
    let mut rest = skip_ws(input);

    while let Ok((next, (name, value))) = tag_pair(rest) {
        game.tags.push((name, value));
        rest = skip_ws(next);
    }

    // Comments before the first move belong to the game itself.
    while let Ok((next, body)) = brace_comment(rest) {
        let comment = RawComment::from_text(body);
        match &mut game.game_comment {
            Some(existing) => existing.merge(comment),
            none => *none = Some(comment),
        }
        rest = skip_ws(next);
    }

    let (next, moves) = parse_sequence(rest, false);
    rest = next;
    game.moves = moves;

    if game.tags.is_empty() && game.moves.is_empty() && game.game_comment.is_none() {
        (rest, None)
    } else {
        (rest, Some(game))
    }
}

/// Parses movetext elements until the sequence ends: at a closing `)` inside
/// a variation, at a result token or the next game's tag section at the top
/// level, or at the end of input.
fn parse_sequence(input: &str, in_variation: bool) -> (&str, Vec<RawElement>) {
    let mut elements: Vec<RawElement> = Vec::new();
    let mut pending_number: Option<u32> = None;
    let mut pending_comment: Option<String> = None;
    let mut rest = input;

    loop {
        rest = skip_ws(rest);
        if rest.is_empty() {
            break;
        }

        if in_variation {
            if let Some(next) = rest.strip_prefix(')') {
                rest = next;
                break;
            }
        } else if rest.starts_with('[') {
            // The next game's tag section.
            break;
        }

        if let Some(next) = rest.strip_prefix('(') {
            let (next, variation) = parse_sequence(next, true);
            rest = next;
            if let Some(last) = last_move_mut(&mut elements) {
                last.variations.push(variation);
            }
            continue;
        }

        if let Ok((next, body)) = brace_comment(rest) {
            rest = next;
            let had_move = last_move_mut(&mut elements).is_some();
            if pending_number.is_some() || !had_move {
                // A comment before the (next) move.
                let comment = RawComment::from_text(body);
                match (&mut pending_comment, comment.text) {
                    (Some(existing), Some(more)) => {
                        existing.push(' ');
                        existing.push_str(&more);
                    }
                    (pending @ None, text) => *pending = text,
                    _ => {}
                }
            } else if let Some(last) = last_move_mut(&mut elements) {
                let comment = RawComment::from_text(body);
                match &mut last.comment_after {
                    Some(existing) => existing.merge(comment),
                    none => *none = Some(comment),
                }
            }
            continue;
        }

        if let Ok((next, digits)) = nag_token(rest) {
            rest = next;
            if let Some(last) = last_move_mut(&mut elements) {
                last.nags.push(format!("${digits}"));
            }
            continue;
        }

        let Ok((next, token)) = movetext_token(rest) else {
            // A character no movetext token starts with; stop here.
            break;
        };
        rest = next;

        match classify_token(token) {
            Token::Result(result) => {
                elements.push(RawElement::Result(result));
                if !in_variation {
                    break;
                }
            }
            Token::MoveNumber(number) => pending_number = Some(number),
            Token::San {
                number,
                notation,
                suffix_nag,
            } => {
                let mut raw_move = RawMove {
                    notation,
                    move_number: number.or(pending_number.take()),
                    comment_before: pending_comment.take(),
                    ..RawMove::default()
                };
                if let Some(value) = suffix_nag {
                    raw_move.nags.push(format!("${value}"));
                }
                elements.push(RawElement::Move(raw_move));
            }
            Token::Unrecognised => {
                // Skip stray tokens (stranded annotations, `e.p.` markers and
                // the like).
            }
        }
    }

    (rest, elements)
}

enum Token {
    Result(String),
    MoveNumber(u32),
    San {
        number: Option<u32>,
        notation: RawNotation,
        suffix_nag: Option<u32>,
    },
    Unrecognised,
}

fn classify_token(token: &str) -> Token {
    match token {
        "1-0" | "0-1" | "1/2-1/2" | "1/2" | "*" => return Token::Result(token.to_owned()),
        _ => {}
    }

    // Castles before the digit branch: `0-0` and `0-0-0` would otherwise be
    // eaten as move numbers.
    let (body, suffix_nag) = split_suffix_decorations(token);
    if matches!(
        body.trim_end_matches(['+', '#']),
        "O-O" | "O-O-O" | "0-0" | "0-0-0"
    ) {
        if let Some(notation) = decompose_san(body) {
            return Token::San {
                number: None,
                notation,
                suffix_nag,
            };
        }
    }

    if let Some(first) = token.chars().next() {
        if first.is_ascii_digit() {
            // `12`, `12.`, `12...`, or a glued `12.e4`.
            let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
            let after_digits = &token[digits.len()..];
            let san_part = after_digits.trim_start_matches('.');
            let number = digits.parse().ok();

            if san_part.is_empty() {
                if let Some(number) = number {
                    return Token::MoveNumber(number);
                }
                return Token::Unrecognised;
            }

            let (body, suffix_nag) = split_suffix_decorations(san_part);
            if let Some(notation) = decompose_san(body) {
                return Token::San {
                    number,
                    notation,
                    suffix_nag,
                };
            }
            return Token::Unrecognised;
        }
    }

    let (body, suffix_nag) = split_suffix_decorations(token);
    match decompose_san(body) {
        Some(notation) => Token::San {
            number: None,
            notation,
            suffix_nag,
        },
        None => Token::Unrecognised,
    }
}

/// Splits trailing `!`/`?` decorations off a SAN token, mapping them to
/// their NAG value.
fn split_suffix_decorations(token: &str) -> (&str, Option<u32>) {
    let body = token.trim_end_matches(['!', '?']);
    let suffix = &token[body.len()..];
    (body, nag::from_suffix(suffix))
}

/// Decomposes a SAN token into its syntactic parts. Returns [`None`] for
/// anything that does not look like a move.
fn decompose_san(token: &str) -> Option<RawNotation> {
    if token.is_empty() {
        return None;
    }

    let stripped = token.trim_end_matches(['+', '#']);

    match stripped {
        "O-O" | "0-0" | "O-O-O" | "0-0-0" | "--" | "Z0" => {
            return Some(RawNotation {
                text: stripped.to_owned(),
                ..RawNotation::default()
            });
        }
        _ => {}
    }

    // Drops: `N@f3`.
    if let Some((piece, square)) = stripped.split_once('@') {
        let mut chars = square.chars();
        let (col, row) = (chars.next()?, chars.next()?);
        if chars.next().is_some() || !is_file(col) || !is_rank(row) {
            return None;
        }
        let fig = match piece {
            "" => None,
            _ => {
                let c = piece.chars().next()?;
                if piece.len() != 1 || !matches!(c, 'K' | 'Q' | 'R' | 'B' | 'N' | 'P') {
                    return None;
                }
                Some(c)
            }
        };
        return Some(RawNotation {
            text: stripped.to_owned(),
            fig,
            col: Some(col),
            row: Some(row),
            is_drop: true,
            ..RawNotation::default()
        });
    }

    let chars: Vec<char> = stripped.chars().collect();
    let mut start = 0;
    let mut end = chars.len();

    let fig = match chars.first() {
        Some(&c @ ('K' | 'Q' | 'R' | 'B' | 'N')) => {
            start = 1;
            Some(c)
        }
        _ => None,
    };

    let mut promotion = None;
    if end > start && matches!(chars[end - 1], 'Q' | 'R' | 'B' | 'N' | 'q' | 'r' | 'b' | 'n') {
        promotion = Some(chars[end - 1].to_ascii_uppercase());
        end -= 1;
        if end > start && chars[end - 1] == '=' {
            end -= 1;
        }
    }

    if end < start + 2 {
        return None;
    }
    let (col, row) = (chars[end - 2], chars[end - 1]);
    if !is_file(col) || !is_rank(row) {
        return None;
    }
    end -= 2;

    if end > start && chars[end - 1] == 'x' {
        end -= 1;
    }

    let disc: String = chars[start..end].iter().collect();
    if !disc.chars().all(|c| is_file(c) || is_rank(c)) || disc.len() > 2 {
        return None;
    }

    Some(RawNotation {
        text: stripped.to_owned(),
        fig,
        col: Some(col),
        row: Some(row),
        disc: (!disc.is_empty()).then_some(disc),
        promotion,
        is_drop: false,
    })
}

fn is_file(c: char) -> bool {
    ('a'..='h').contains(&c)
}

fn is_rank(c: char) -> bool {
    ('1'..='8').contains(&c)
}

fn last_move_mut(elements: &mut [RawElement]) -> Option<&mut RawMove> {
    elements.iter_mut().rev().find_map(|element| match element {
        RawElement::Move(raw_move) => Some(raw_move),
        RawElement::Result(_) => None,
    })
}

/// Skips whitespace and `;`-to-end-of-line comments.
fn skip_ws(mut input: &str) -> &str {
    loop {
        let trimmed = input.trim_start();
        if let Some(rest) = trimmed.strip_prefix(';') {
            input = match rest.find('\n') {
                Some(index) => &rest[index + 1..],
                None => "",
            };
        } else {
            return trimmed;
        }
    }
}

fn tag_pair(input: &str) -> IResult<&str, (String, String)> {
    let (input, _) = char('[')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, name) = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, value) = quoted_string(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, (name.to_owned(), value)))
}

/// Parses a quoted tag value, unescaping `\"` and `\\`.
fn quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let mut value = String::new();
    let mut iter = input.char_indices();

    while let Some((index, c)) = iter.next() {
        match c {
            '"' => return Ok((&input[index + 1..], value)),
            '\\' => match iter.next() {
                Some((_, escaped @ ('"' | '\\'))) => value.push(escaped),
                Some((_, other)) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            },
            _ => value.push(c),
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn brace_comment(input: &str) -> IResult<&str, &str> {
    delimited(char('{'), take_while(|c| c != '}'), char('}'))(input)
}

fn nag_token(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('$')(input)?;
    digit1(input)
}

/// A movetext token: everything up to whitespace or a structural character.
fn movetext_token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '=' | '+' | '#' | '@' | '-' | '!' | '?' | '/' | '.' | '*')
    })(input)
}
