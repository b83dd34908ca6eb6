//! PGN games as navigable, mutable trees over full chess state.
//!
//! Reading happens in two stages. The lexical [`parser`] turns PGN text into
//! the flat [`raw`] structures: tags, a linear move list, and variation
//! lists keyed to the move they follow. The [`builder`] then replays that
//! structure against a live [`skakbok_core`] board, resolving each SAN token
//! and assembling a [`Game`] tree whose variations branch from the position
//! *before* the move they are an alternative to.
//!
//! ```
//! use skakbok_pgn::read_game;
//!
//! let game = read_game("1. e4 e5 (1... c5 2. Nf3) 2. Nf3 *").unwrap();
//! let sans: Vec<String> = game
//!     .mainline()
//!     .map(|node| node.san().unwrap().unwrap())
//!     .collect();
//! assert_eq!(sans, ["e4", "e5", "Nf3"]);
//!
//! // The c5 variation sits beside e5, under the e4 node.
//! let e4 = game.root().next().unwrap();
//! assert_eq!(e4.variations().len(), 2);
//! ```
//!
//! Unreadable moves never abort a read: they are recorded on
//! [`Game::errors`] and the remaining moves are still tried.

pub mod annotations;
pub mod builder;
pub mod game;
pub mod headers;
pub mod nag;
pub mod node;
pub mod parser;
pub mod raw;

pub use annotations::{Arrow, Shape};
pub use builder::{build_game, read_game, read_games};
pub use game::{ExportOptions, Game, ParseError};
pub use headers::Headers;
pub use node::GameNode;
