//! Board position snapshots for the fourfold-repetition stalemate rule.
//! Two positions match when every cell shows the same faces in the same
//! order with the same ownership; hands and orientation history are
//! deliberately ignored, mirroring how the physical game is adjudicated.

use arrayvec::ArrayVec;

use crate::action::Field;
use crate::board::{Board, MAX_HEIGHT};
use crate::square::{Cell, BOARD_COLS, BOARD_ROWS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    towers: [[ArrayVec<u8, MAX_HEIGHT>; BOARD_ROWS]; BOARD_COLS],
    count: u32,
}

impl Position {
    /// Encode the current board: one code per piece, bottom to top.
    pub fn capture(field: &Field) -> Self {
        let mut towers: [[ArrayVec<u8, MAX_HEIGHT>; BOARD_ROWS]; BOARD_COLS] =
            Default::default();
        for cell in Board::cells() {
            let tower = &mut towers[cell.x as usize][cell.y as usize];
            for id in field.board.tower(cell.x, cell.y).iter() {
                let piece = field.set.get(id);
                let code = (piece.side_up().code() << 1) | piece.color.index() as u8;
                tower.push(code);
            }
        }
        Self { towers, count: 1 }
    }

    /// Rebuild a recorded position from persisted (cell, code) entries,
    /// bottom to top within each cell.
    pub fn from_codes(codes: &[(Cell, u8)], count: u32) -> Self {
        let mut towers: [[ArrayVec<u8, MAX_HEIGHT>; BOARD_ROWS]; BOARD_COLS] =
            Default::default();
        for &(cell, code) in codes {
            let tower = &mut towers[cell.x as usize][cell.y as usize];
            if tower.len() < MAX_HEIGHT {
                tower.push(code);
            }
        }
        Self { towers, count }
    }

    /// Cell codes bottom to top, exposed for persistence.
    pub fn codes_at(&self, x: u8, y: u8) -> &[u8] {
        &self.towers[x as usize][y as usize]
    }

    pub fn matches(&self, other: &Position) -> bool {
        self.towers == other.towers
    }

    pub fn increment(&mut self) {
        self.count += 1;
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
