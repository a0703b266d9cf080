//! Computer opponent for Gungi: arrangement heuristics, full candidate
//! enumeration, and level-scaled minimax over `gungi-core`'s rules.

pub mod eval;
pub mod player;
pub mod search;

pub use eval::{material, mobility, CHECKMATE};
pub use player::Player;
pub use search::{candidates, Searcher};
