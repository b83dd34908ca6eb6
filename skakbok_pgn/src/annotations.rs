//! Graphical and clock annotations carried inside PGN comments.
//!
//! The comment micro-grammar embeds structured payloads in otherwise free
//! text: `[%clk h:mm:ss]`, `[%eval n]`, `[%cal Gd2d4,...]` (arrows) and
//! `[%csl Rd4,...]` (colored squares). Colors are `R`, `G`, `B` and `Y`.

use std::fmt::Display;

use skakbok_core::board::Square;

/// An arrow drawn on the board, e.g. `Gd2d4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrow {
    pub color: char,
    pub tail: Square,
    pub head: Square,
}

impl Arrow {
    /// Parses a five-character `<color><from><to>` code.
    pub fn from_code(code: &str) -> Option<Self> {
        let color = code.chars().next().filter(|c| is_annotation_color(*c))?;
        if code.len() != 5 {
            return None;
        }
        let tail = code[1..3].parse().ok()?;
        let head = code[3..5].parse().ok()?;
        Some(Self { color, tail, head })
    }
}

impl Display for Arrow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.color, self.tail, self.head)
    }
}

/// A colored square highlight, e.g. `Rd4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub color: char,
    pub square: Square,
}

impl Shape {
    /// Parses a three-character `<color><square>` code.
    pub fn from_code(code: &str) -> Option<Self> {
        let color = code.chars().next().filter(|c| is_annotation_color(*c))?;
        if code.len() != 3 {
            return None;
        }
        let square = code[1..3].parse().ok()?;
        Some(Self { color, square })
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.color, self.square)
    }
}

fn is_annotation_color(c: char) -> bool {
    matches!(c, 'R' | 'G' | 'B' | 'Y')
}

/// Parses a clock reading in `h:mm:ss`, `mm:ss` or bare-seconds form into
/// seconds. The final component may carry a fraction.
pub fn parse_clock_seconds(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut total = 0.0;
    for part in parts {
        let value: f64 = part.trim().parse().ok()?;
        if value < 0.0 {
            return None;
        }
        total = total * 60.0 + value;
    }
    Some(total)
}

/// Formats a seconds value back into the `h:mm:ss` clock form.
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn arrow_codes_round_trip() {
        let arrow = Arrow::from_code("Gd2d4").unwrap();
        assert_eq!(arrow.color, 'G');
        assert_eq!(arrow.tail, Square::D2);
        assert_eq!(arrow.head, Square::D4);
        assert_eq!(arrow.to_string(), "Gd2d4");

        assert_eq!(Arrow::from_code("Xd2d4"), None);
        assert_eq!(Arrow::from_code("Gd2"), None);
        assert_eq!(Arrow::from_code("Gd2d9"), None);
    }

    #[test]
    fn shape_codes_round_trip() {
        let shape = Shape::from_code("Rd4").unwrap();
        assert_eq!(shape.color, 'R');
        assert_eq!(shape.square, Square::D4);
        assert_eq!(shape.to_string(), "Rd4");

        assert_eq!(Shape::from_code("rd4"), None);
        assert_eq!(Shape::from_code("Rd4d5"), None);
    }

    #[test]
    fn clock_forms_parse_to_seconds() {
        assert_eq!(parse_clock_seconds("0:03:05"), Some(185.0));
        assert_eq!(parse_clock_seconds("1:00:00"), Some(3600.0));
        assert_eq!(parse_clock_seconds("03:05"), Some(185.0));
        assert_eq!(parse_clock_seconds("45"), Some(45.0));
        assert_eq!(parse_clock_seconds("0:03:05.5"), Some(185.5));

        assert_eq!(parse_clock_seconds(""), None);
        assert_eq!(parse_clock_seconds("x"), None);
        assert_eq!(parse_clock_seconds("1:2:3:4"), None);
    }

    #[test]
    fn clock_formats_back() {
        assert_eq!(format_clock(185.0), "0:03:05");
        assert_eq!(format_clock(3600.0), "1:00:00");
        assert_eq!(format_clock(45.0), "0:00:45");
    }
}
