//! Protocol module

pub mod rewind;
