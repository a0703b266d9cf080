//! Mobile Range Expansion bookkeeping. Catapults and fortresses project
//! area-of-effect zones; a piece standing in a friendly zone gains one extra
//! tier of effective reach. The board updates this map on every placement,
//! removal, and flip so it never goes stale.

use arrayvec::ArrayVec;

use crate::piece::{Color, Face, Piece};
use crate::square::{BOARD_COLS, BOARD_ROWS};

/// One projection tag: which face projected it and for which color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub face: Face,
    pub color: Color,
}

// A cell can be covered by at most both catapults and both fortresses.
type Tags = ArrayVec<Range, 4>;

/// Relative catapult footprint: a 13-cell rounded plus.
pub const CATAPULT_FOOTPRINT: [(i32, i32); 13] = [
    (0, -2),
    (-1, -1),
    (0, -1),
    (1, -1),
    (-2, 0),
    (-1, 0),
    (0, 0),
    (1, 0),
    (2, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (0, 2),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MreMap {
    aoe: [[Tags; BOARD_ROWS]; BOARD_COLS],
}

impl MreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `piece`'s projection centered at (x, y). No-op unless the active
    /// face imparts MRE.
    pub fn set_range(&mut self, piece: Piece, x: u8, y: u8) {
        if !piece.imparts_mre() {
            return;
        }

        let face = piece.side_up();
        let color = piece.color;

        match face {
            Face::Catapult => {
                // Catapult coverage is clipped to the owner's territory rows.
                let lo = color.territory_lo() as i32;
                let hi = color.territory_hi() as i32;
                for (dx, dy) in CATAPULT_FOOTPRINT {
                    let (cx, cy) = (x as i32 + dx, y as i32 + dy);
                    if (0..=8).contains(&cx) && cy >= lo && cy <= hi {
                        let _ = self.aoe[cx as usize][cy as usize]
                            .try_push(Range { face, color });
                    }
                }
            }
            Face::Fortress => {
                // Fortress covers its own file from its row forward.
                match color {
                    Color::Black => {
                        for cy in (0..=y).rev() {
                            let _ = self.aoe[x as usize][cy as usize]
                                .try_push(Range { face, color });
                        }
                    }
                    Color::White => {
                        for cy in y..=8 {
                            let _ = self.aoe[x as usize][cy as usize]
                                .try_push(Range { face, color });
                        }
                    }
                }
            }
            _ => unreachable!("imparts_mre is limited to catapult and fortress"),
        }
    }

    /// Remove one instance of `piece`'s (face, color) tag from every cell.
    pub fn remove_range(&mut self, piece: Piece) {
        if !piece.imparts_mre() {
            return;
        }

        let face = piece.side_up();
        let color = piece.color;

        for column in &mut self.aoe {
            for tags in column {
                if let Some(at) = tags
                    .iter()
                    .position(|tag| tag.face == face && tag.color == color)
                {
                    tags.remove(at);
                }
            }
        }
    }

    /// Whether any projection of `alignment`'s color covers (x, y).
    pub fn in_range(&self, alignment: Color, x: u8, y: u8) -> bool {
        self.aoe[x as usize][y as usize]
            .iter()
            .any(|tag| tag.color == alignment)
    }

    /// Whether this exact piece's projection covers (x, y).
    pub fn contains(&self, piece: Piece, x: u8, y: u8) -> bool {
        if !piece.imparts_mre() {
            return false;
        }
        let face = piece.side_up();
        let color = piece.color;
        self.aoe[x as usize][y as usize]
            .iter()
            .any(|tag| tag.face == face && tag.color == color)
    }

    pub fn tags(&self, x: u8, y: u8) -> &[Range] {
        &self.aoe[x as usize][y as usize]
    }
}
