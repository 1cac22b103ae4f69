//! Command line tracker for how a working day is split between projects.
//! Time is recorded as a share of an 8 hour day, recurring meetings take their share before
//! anything is tracked, and loosely typed project names are resolved through aliases and fuzzy
//! matching.
//!

pub mod cli;
pub mod engine;
pub mod storage;
pub mod utils;
