//! The 9x9 tower grid. Every mutation goes through the primitives here so
//! the mobile range expansion map stays synchronized with the pieces that
//! project it.

use arrayvec::ArrayVec;
use thiserror::Error;

use crate::mre::MreMap;
use crate::piece::{Color, Face, Piece};
use crate::set::{PieceId, Set};
use crate::square::{Cell, BOARD_COLS, BOARD_ROWS};

/// Towers never grow beyond three tiers.
pub const MAX_HEIGHT: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("tower at ({x}, {y}) is full")]
    TowerFull { x: u8, y: u8 },
    #[error("tower at ({x}, {y}) has no tier {z}")]
    NoSuchTier { x: u8, y: u8, z: usize },
}

/// A stack of up to three pieces on one cell. Tier 0 is the bottom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tower {
    tiers: ArrayVec<PieceId, MAX_HEIGHT>,
}

impl Tower {
    pub fn height(&self) -> usize {
        self.tiers.len()
    }

    pub fn top(&self) -> Option<PieceId> {
        self.tiers.last().copied()
    }

    pub fn get(&self, z: usize) -> Option<PieceId> {
        self.tiers.get(z).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.tiers.iter().copied()
    }
}

/// A tier-exchange record; the same square may not exchange again until the
/// record expires two turns later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exchange {
    pub cell: Cell,
    pub turn: u32,
}

/// Board state proper: the tower grid, the derived range-expansion map, and
/// the live tier-exchange records. Hands and turn bookkeeping live
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    towers: [[Tower; BOARD_ROWS]; BOARD_COLS],
    pub mre: MreMap,
    exchanges: ArrayVec<Exchange, 4>,
}

impl Board {
    pub fn new() -> Self {
        Self {
            towers: Default::default(),
            mre: MreMap::new(),
            exchanges: ArrayVec::new(),
        }
    }

    pub fn tower(&self, x: u8, y: u8) -> &Tower {
        &self.towers[x as usize][y as usize]
    }

    pub fn height(&self, x: u8, y: u8) -> usize {
        self.tower(x, y).height()
    }

    pub fn top_id(&self, x: u8, y: u8) -> Option<PieceId> {
        self.tower(x, y).top()
    }

    pub fn top_piece(&self, set: &Set, x: u8, y: u8) -> Option<Piece> {
        self.top_id(x, y).map(|id| set.get(id))
    }

    pub fn id_at(&self, x: u8, y: u8, z: usize) -> Option<PieceId> {
        self.tower(x, y).get(z)
    }

    pub fn piece_at(&self, set: &Set, x: u8, y: u8, z: usize) -> Option<Piece> {
        self.id_at(x, y, z).map(|id| set.get(id))
    }

    pub fn cells() -> impl Iterator<Item = Cell> {
        (0..BOARD_COLS as u8)
            .flat_map(|x| (0..BOARD_ROWS as u8).map(move |y| Cell::new_unchecked(x, y)))
    }

    // Mutation primitives. Each one updates the range map in lockstep.

    /// Push a piece on top of the tower at (x, y).
    pub fn put_top(&mut self, set: &Set, id: PieceId, x: u8, y: u8) -> Result<(), BoardError> {
        self.towers[x as usize][y as usize]
            .tiers
            .try_push(id)
            .map_err(|_| BoardError::TowerFull { x, y })?;
        self.mre.set_range(set.get(id), x, y);
        Ok(())
    }

    /// Pop the top piece off the tower at (x, y).
    pub fn remove_top(&mut self, set: &Set, x: u8, y: u8) -> Option<PieceId> {
        let id = self.towers[x as usize][y as usize].tiers.pop()?;
        self.mre.remove_range(set.get(id));
        Some(id)
    }

    /// Remove the piece at tier z, shifting any pieces above it down.
    pub fn remove_at(&mut self, set: &Set, x: u8, y: u8, z: usize) -> Result<PieceId, BoardError> {
        let tower = &mut self.towers[x as usize][y as usize];
        if z >= tower.height() {
            return Err(BoardError::NoSuchTier { x, y, z });
        }
        let id = tower.tiers.remove(z);
        self.mre.remove_range(set.get(id));
        Ok(id)
    }

    /// Insert a piece at tier z, shifting the pieces at and above z up.
    pub fn insert_at(
        &mut self,
        set: &Set,
        id: PieceId,
        x: u8,
        y: u8,
        z: usize,
    ) -> Result<(), BoardError> {
        let tower = &mut self.towers[x as usize][y as usize];
        if tower.tiers.is_full() {
            return Err(BoardError::TowerFull { x, y });
        }
        tower.tiers.insert(z, id);
        self.mre.set_range(set.get(id), x, y);
        Ok(())
    }

    /// Replace the piece at tier z in place.
    pub fn replace_at(
        &mut self,
        set: &Set,
        id: PieceId,
        x: u8,
        y: u8,
        z: usize,
    ) -> Result<PieceId, BoardError> {
        let tower = &mut self.towers[x as usize][y as usize];
        let slot = tower
            .tiers
            .get_mut(z)
            .ok_or(BoardError::NoSuchTier { x, y, z })?;
        let old = std::mem::replace(slot, id);
        self.mre.remove_range(set.get(old));
        self.mre.set_range(set.get(id), x, y);
        Ok(old)
    }

    /// Flip the piece at tier z, reprojecting its range if either face
    /// imparts one.
    pub fn flip_at(&mut self, set: &mut Set, x: u8, y: u8, z: usize) -> Result<(), BoardError> {
        let id = self
            .id_at(x, y, z)
            .ok_or(BoardError::NoSuchTier { x, y, z })?;
        self.mre.remove_range(set.get(id));
        set.get_mut(id).flip();
        self.mre.set_range(set.get(id), x, y);
        Ok(())
    }

    // Queries.

    /// Whether the tower at (x, y) holds a shallow duplicate of `piece`
    /// (same color and active face).
    pub fn tower_contains(&self, set: &Set, piece: Piece, x: u8, y: u8) -> bool {
        self.tower(x, y)
            .iter()
            .any(|id| set.get(id).shallow_eq(&piece))
    }

    /// Whether any tower in file x holds a shallow duplicate of `piece`.
    pub fn file_contains(&self, set: &Set, piece: Piece, x: u8) -> bool {
        (0..BOARD_ROWS as u8).any(|y| self.tower_contains(set, piece, x, y))
    }

    /// Whether the tower at (x, y) holds a piece showing `face`.
    pub fn tower_contains_face(&self, set: &Set, face: Face, x: u8, y: u8) -> bool {
        self.tower(x, y).iter().any(|id| set.get(id).side_up() == face)
    }

    /// Whether file x holds a front-up pawn inside `color`'s territory.
    pub fn file_contains_pawn(&self, set: &Set, color: Color, x: u8) -> bool {
        (color.territory_lo()..=color.territory_hi()).any(|y| {
            self.tower(x, y)
                .iter()
                .any(|id| set.get(id).side_up() == Face::Pawn)
        })
    }

    /// Occupiable spaces left in file x within `color`'s territory. Full
    /// towers and commander-topped towers accept nothing.
    pub fn openings(&self, set: &Set, color: Color, x: u8) -> usize {
        let mut count = 0;
        for y in color.territory_lo()..=color.territory_hi() {
            let height = self.height(x, y);
            if height == MAX_HEIGHT {
                continue;
            }
            if let Some(top) = self.top_piece(set, x, y) {
                if top.side_up() == Face::Commander {
                    continue;
                }
            }
            count += MAX_HEIGHT - height;
        }
        count
    }

    /// Fully stacked towers in file x within `color`'s territory.
    pub fn full_towers(&self, color: Color, x: u8) -> usize {
        (color.territory_lo()..=color.territory_hi())
            .filter(|&y| self.height(x, y) == MAX_HEIGHT)
            .count()
    }

    /// Whether every cell of `color`'s territory is occupied.
    pub fn territory_full(&self, color: Color) -> bool {
        (0..BOARD_COLS as u8).all(|x| {
            (color.territory_lo()..=color.territory_hi()).all(|y| self.height(x, y) > 0)
        })
    }

    /// The cell whose top piece is `color`'s commander, if it is on board.
    pub fn commander_cell(&self, set: &Set, color: Color) -> Option<Cell> {
        Self::cells().find(|&cell| {
            self.top_piece(set, cell.x, cell.y).is_some_and(|piece| {
                piece.side_up() == Face::Commander && piece.alignment() == color
            })
        })
    }

    // Exchange records.

    pub fn record_exchange(&mut self, cell: Cell, turn: u32) {
        let _ = self.exchanges.try_push(Exchange { cell, turn });
    }

    pub fn exchanged(&self, cell: Cell) -> bool {
        self.exchanges.iter().any(|record| record.cell == cell)
    }

    /// Drop records two or more turns old; called as each turn ends.
    pub fn clear_exchanges(&mut self, turn: u32) {
        self.exchanges
            .retain(|record| record.turn + 2 > turn);
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
