//! Type aliases for shared single-threaded state.

mod aliases;

pub use aliases::*;
