//! Cell addressing for the board and both hands.

pub const BOARD_COLS: usize = 9;
pub const BOARD_ROWS: usize = 9;

pub const HAND_COLS: usize = 4;
pub const HAND_ROWS: usize = 6;

/// A board cell. `x` is the file (0..9), `y` the row (0..9). White plays
/// from rows 0-2 toward high rows, black from rows 6-8 toward low rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: u8,
    pub y: u8,
}

impl Cell {
    pub fn new(x: u8, y: u8) -> Option<Self> {
        if (x as usize) < BOARD_COLS && (y as usize) < BOARD_ROWS {
            Some(Self { x, y })
        } else {
            None
        }
    }

    pub const fn new_unchecked(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/// A cell in a player's 4x6 hand grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandCell {
    pub x: u8,
    pub y: u8,
}

impl HandCell {
    pub fn new(x: u8, y: u8) -> Option<Self> {
        if (x as usize) < HAND_COLS && (y as usize) < HAND_ROWS {
            Some(Self { x, y })
        } else {
            None
        }
    }

    pub const fn new_unchecked(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}
