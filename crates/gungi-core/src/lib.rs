//! Rules engine for Gungi, the 9x9 stacking board game: piece and tower
//! modeling, move generation, full legality checking, check and checkmate
//! detection, and text snapshots of game state. Search and AI players live
//! in the `gungi-engine` crate.

pub mod action;
pub mod board;
pub mod game;
pub mod hand;
pub mod movegen;
pub mod mre;
pub mod piece;
pub mod position;
pub mod rules;
pub mod session;
pub mod set;
pub mod snapshot;
pub mod square;

pub use action::{Action, ActionError, Field};
pub use board::{Board, BoardError, Exchange, Tower, MAX_HEIGHT};
pub use game::{Game, GameError, INITIAL_ARRANGEMENT, STALEMATE_THRESHOLD};
pub use hand::Hand;
pub use movegen::{blocked, effective_moves, mre_blocked, selectable};
pub use mre::{MreMap, Range, CATAPULT_FOOTPRINT};
pub use piece::{Color, Face, Piece, Side, TargetList};
pub use position::Position;
pub use session::{Highlight, Loc, Session};
pub use set::{PieceId, Set, PIECES_PER_COLOR, PIECE_COUNT};
pub use snapshot::{load, save, SnapshotError};
pub use square::{Cell, HandCell, BOARD_COLS, BOARD_ROWS, HAND_COLS, HAND_ROWS};
