use crate::piece::{Color, Face, Piece, Side};

/// Stable index of a piece in the fixed 46-piece pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u8);

pub const PIECES_PER_COLOR: usize = 23;
pub const PIECE_COUNT: usize = PIECES_PER_COLOR * 2;

/// The complete pool of game pieces, built once and mutated only through
/// orientation flips. Board and hands store `PieceId` indices into it, so
/// cloning a whole game state is a flat array copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Set {
    pieces: [Piece; PIECE_COUNT],
}

impl Set {
    pub fn new() -> Self {
        let filler = Piece::new(Face::Commander, Face::Commander, Color::Black);
        let mut pieces = [filler; PIECE_COUNT];
        build_color(&mut pieces, Color::Black);
        build_color(&mut pieces, Color::White);
        Self { pieces }
    }

    pub const fn base(color: Color) -> u8 {
        match color {
            Color::Black => 0,
            Color::White => PIECES_PER_COLOR as u8,
        }
    }

    pub fn get(&self, id: PieceId) -> Piece {
        self.pieces[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.0 as usize]
    }

    pub fn ids(&self) -> impl Iterator<Item = PieceId> {
        (0..PIECE_COUNT as u8).map(PieceId)
    }

    /// Turn every piece front side up again.
    pub fn reset(&mut self) {
        for piece in &mut self.pieces {
            piece.side = Side::Front;
        }
    }
}

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

fn build_color(pieces: &mut [Piece; PIECE_COUNT], color: Color) {
    let base = Set::base(color) as usize;
    let mut at = |offset: usize, front: Face, back: Face| {
        pieces[base + offset] = Piece::new(front, back, color);
    };

    // The commander has no functional back face; nothing may ever stack on
    // top of it, so it can never be flipped in play.
    at(0, Face::Commander, Face::Commander);

    at(1, Face::Captain, Face::Pistol);
    at(2, Face::Captain, Face::Pistol);

    at(3, Face::Samurai, Face::Pike);
    at(4, Face::Samurai, Face::Pike);

    at(5, Face::Spy, Face::Clandestinite);
    at(6, Face::Spy, Face::Clandestinite);
    at(7, Face::Spy, Face::Clandestinite);

    at(8, Face::Catapult, Face::Lance);
    at(9, Face::Fortress, Face::Lance);

    at(10, Face::HiddenDragon, Face::DragonKing);
    at(11, Face::Prodigy, Face::Phoenix);

    at(12, Face::Bow, Face::Arrow);
    at(13, Face::Bow, Face::Arrow);

    for offset in 14..21 {
        at(offset, Face::Pawn, Face::Bronze);
    }
    at(21, Face::Pawn, Face::Silver);
    at(22, Face::Pawn, Face::Gold);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_holds_23_pieces_per_color() {
        let set = Set::new();
        let black = set
            .ids()
            .filter(|&id| set.get(id).color == Color::Black)
            .count();
        let white = set
            .ids()
            .filter(|&id| set.get(id).color == Color::White)
            .count();
        assert_eq!(black, PIECES_PER_COLOR);
        assert_eq!(white, PIECES_PER_COLOR);
    }

    #[test]
    fn face_census_matches_the_physical_set() {
        let set = Set::new();
        let count = |front: Face, back: Face| {
            set.ids()
                .filter(|&id| {
                    let p = set.get(id);
                    p.color == Color::Black && p.front == front && p.back == back
                })
                .count()
        };
        assert_eq!(count(Face::Commander, Face::Commander), 1);
        assert_eq!(count(Face::Captain, Face::Pistol), 2);
        assert_eq!(count(Face::Samurai, Face::Pike), 2);
        assert_eq!(count(Face::Spy, Face::Clandestinite), 3);
        assert_eq!(count(Face::Catapult, Face::Lance), 1);
        assert_eq!(count(Face::Fortress, Face::Lance), 1);
        assert_eq!(count(Face::HiddenDragon, Face::DragonKing), 1);
        assert_eq!(count(Face::Prodigy, Face::Phoenix), 1);
        assert_eq!(count(Face::Bow, Face::Arrow), 2);
        assert_eq!(count(Face::Pawn, Face::Bronze), 7);
        assert_eq!(count(Face::Pawn, Face::Silver), 1);
        assert_eq!(count(Face::Pawn, Face::Gold), 1);
    }

    #[test]
    fn reset_restores_front_sides() {
        let mut set = Set::new();
        let id = PieceId(Set::base(Color::White) + 8);
        set.get_mut(id).flip();
        assert_eq!(set.get(id).side_up(), Face::Lance);
        set.reset();
        assert_eq!(set.get(id).side_up(), Face::Catapult);
    }
}
