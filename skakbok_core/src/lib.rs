//! Board representation, move generation, and chess notation I/O.
//!
//! The [`board::Board`] type is a square-table position that supports
//! push/pop move application, legal move generation, SAN and UCI notation,
//! and FEN serialisation. It favours correctness and clarity over raw
//! generation speed.

pub mod board;
pub mod move_gen;
pub mod perft;
