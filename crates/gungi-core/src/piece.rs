use arrayvec::ArrayVec;

use crate::square::Cell;

/// The 19 piece faces. The first ten appear on fronts, the rest on backs;
/// a physical piece pairs one front with one back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Commander,
    Captain,
    Samurai,
    Spy,
    Catapult,
    Fortress,
    HiddenDragon,
    Prodigy,
    Bow,
    Pawn,
    Pistol,
    Pike,
    Clandestinite,
    Lance,
    DragonKing,
    Phoenix,
    Arrow,
    Bronze,
    Silver,
    Gold,
}

impl Face {
    pub fn name(self) -> &'static str {
        match self {
            Face::Commander => "Commander",
            Face::Captain => "Captain",
            Face::Samurai => "Samurai",
            Face::Spy => "Spy",
            Face::Catapult => "Catapult",
            Face::Fortress => "Fortress",
            Face::HiddenDragon => "Hidden Dragon",
            Face::Prodigy => "Prodigy",
            Face::Bow => "Bow",
            Face::Pawn => "Pawn",
            Face::Pistol => "Pistol",
            Face::Pike => "Pike",
            Face::Clandestinite => "Clandestinite",
            Face::Lance => "Lance",
            Face::DragonKing => "Dragon King",
            Face::Phoenix => "Phoenix",
            Face::Arrow => "Arrow",
            Face::Bronze => "Bronze",
            Face::Silver => "Silver",
            Face::Gold => "Gold",
        }
    }

    /// Stable code used by the repetition tracker and snapshots.
    pub fn code(self) -> u8 {
        match self {
            Face::Commander => 1,
            Face::Captain => 2,
            Face::Samurai => 3,
            Face::Spy => 4,
            Face::Catapult => 5,
            Face::Fortress => 6,
            Face::HiddenDragon => 7,
            Face::Prodigy => 8,
            Face::Bow => 9,
            Face::Pawn => 10,
            Face::Pistol => 11,
            Face::Pike => 12,
            Face::Clandestinite => 13,
            Face::Lance => 14,
            Face::DragonKing => 15,
            Face::Phoenix => 16,
            Face::Arrow => 17,
            Face::Bronze => 18,
            Face::Silver => 19,
            Face::Gold => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn flip(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }

    /// Side to move on a given turn; black moves on odd turns.
    pub fn active(turn: u32) -> Self {
        if turn % 2 == 1 {
            Color::Black
        } else {
            Color::White
        }
    }

    pub fn passive(turn: u32) -> Self {
        Self::active(turn).flip()
    }

    /// First row of this color's 3-row territory.
    pub fn territory_lo(self) -> u8 {
        match self {
            Color::Black => 6,
            Color::White => 0,
        }
    }

    /// Last row of this color's 3-row territory.
    pub fn territory_hi(self) -> u8 {
        match self {
            Color::Black => 8,
            Color::White => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
}

/// Destination cells produced by one piece's movement pattern.
pub type TargetList = ArrayVec<Cell, 32>;

/// One physical game piece. Front, back, and color are fixed at build time;
/// only the active side mutates (flips) over the course of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub front: Face,
    pub back: Face,
    pub color: Color,
    pub side: Side,
}

impl Piece {
    pub fn new(front: Face, back: Face, color: Color) -> Self {
        Self {
            front,
            back,
            color,
            side: Side::Front,
        }
    }

    pub fn side_up(&self) -> Face {
        match self.side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }

    pub fn side_down(&self) -> Face {
        match self.side {
            Side::Front => self.back,
            Side::Back => self.front,
        }
    }

    /// Effective color for rule purposes: flips when the back face is
    /// active (a betrayed piece fights for its captor).
    pub fn alignment(&self) -> Color {
        match self.side {
            Side::Front => self.color,
            Side::Back => self.color.flip(),
        }
    }

    pub fn flip(&mut self) {
        self.side = match self.side {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        };
    }

    /// Same color and same active face; identity for selection purposes.
    pub fn shallow_eq(&self, other: &Piece) -> bool {
        self.color == other.color && self.side_up() == other.side_up()
    }

    /// Whether this piece belongs to the side moving on `turn`.
    pub fn accessible(&self, turn: u32) -> bool {
        self.alignment() == Color::active(turn)
    }

    pub fn jumps(&self) -> bool {
        matches!(
            self.side_up(),
            Face::Spy | Face::Bow | Face::Clandestinite
        )
    }

    /// Earth-link: may have friendly pieces stacked on top of it.
    pub fn links(&self) -> bool {
        matches!(
            self.side_up(),
            Face::Spy | Face::Catapult | Face::Fortress | Face::Clandestinite
        )
    }

    /// Subject to forced recovery when immobilized in the last two rows.
    pub fn recovers(&self) -> bool {
        matches!(self.side_up(), Face::Spy | Face::Pawn | Face::Lance)
    }

    pub fn imparts_mre(&self) -> bool {
        matches!(self.side_up(), Face::Catapult | Face::Fortress)
    }

    pub fn receives_mre(&self) -> bool {
        !matches!(
            self.side_up(),
            Face::Commander
                | Face::HiddenDragon
                | Face::Prodigy
                | Face::DragonKing
                | Face::Phoenix
        )
    }

    /// False for pieces whose in-game drops carry file restrictions.
    pub fn drops_freely(&self) -> bool {
        !matches!(
            self.side_up(),
            Face::Spy | Face::Pawn | Face::Lance | Face::Bronze
        )
    }

    /// Material value of the active face. Pawn and lance values depend on
    /// the hidden face as well.
    pub fn weight(&self) -> i32 {
        match self.side_up() {
            Face::Commander => 0,
            Face::Captain => 700,
            Face::Samurai => 550,
            Face::Spy => 450,
            Face::Catapult => 900,
            Face::Fortress => 850,
            Face::HiddenDragon => 1000,
            Face::Prodigy => 950,
            Face::Bow => 750,
            Face::Pawn => match self.back {
                Face::Silver => 150,
                Face::Gold => 200,
                _ => 100,
            },
            Face::Pistol => 300,
            Face::Pike => 350,
            Face::Clandestinite => 800,
            Face::Lance => match self.front {
                Face::Fortress => 600,
                _ => 650,
            },
            Face::DragonKing => 1100,
            Face::Phoenix => 1050,
            Face::Arrow => 400,
            Face::Bronze => 50,
            Face::Silver => 250,
            Face::Gold => 500,
        }
    }

    /// Geometric destination set for the active face at board cell (x, y)
    /// and tier `z` (0 = bottom). Blocking, stacking, and tier boosts are
    /// the board's concern, not the piece's.
    pub fn moves_at(&self, x: u8, y: u8, z: u8) -> TargetList {
        let mut moves = TargetList::new();
        let (x, y) = (x as i32, y as i32);
        let fwd: i32 = if self.alignment() == Color::White { -1 } else { 1 };

        match self.side_up() {
            Face::Commander => {
                diagonal(&mut moves, x, y);
                orthogonal(&mut moves, x, y);
            }
            Face::Captain => {
                diagonal(&mut moves, x, y);
                if z == 0 || z == 1 {
                    push(&mut moves, x, y - fwd);
                }
                if z == 1 {
                    push(&mut moves, x, y + fwd);
                }
                if z == 2 {
                    push(&mut moves, x - 2, y - 2 * fwd);
                    push(&mut moves, x + 2, y - 2 * fwd);
                    push(&mut moves, x - 2, y);
                    push(&mut moves, x + 2, y);
                }
            }
            Face::Samurai => {
                push(&mut moves, x - 1, y - fwd);
                push(&mut moves, x + 1, y - fwd);
                push(&mut moves, x - 1, y);
                push(&mut moves, x + 1, y);
                if z == 0 {
                    push(&mut moves, x, y - fwd);
                } else {
                    push(&mut moves, x, y - 2);
                    push(&mut moves, x, y + 2);
                }
            }
            Face::Spy => {
                push(&mut moves, x - 1, y - 2 * fwd);
                push(&mut moves, x + 1, y - 2 * fwd);
                if z == 1 || z == 2 {
                    push(&mut moves, x - 1, y - fwd);
                    push(&mut moves, x + 1, y - fwd);
                }
            }
            Face::Catapult | Face::Fortress => {}
            Face::HiddenDragon => {
                if z == 0 {
                    extended_orthogonal(&mut moves, x, y);
                } else {
                    diagonal(&mut moves, x, y);
                }
            }
            Face::Prodigy => {
                if z == 0 {
                    extended_diagonal(&mut moves, x, y);
                } else {
                    orthogonal(&mut moves, x, y);
                }
            }
            Face::Bow => {
                if z == 0 || z == 2 {
                    push(&mut moves, x - 2, y);
                    push(&mut moves, x + 2, y);
                }
                if z == 1 || z == 2 {
                    push(&mut moves, x - 2, y - 2 * fwd);
                    push(&mut moves, x + 2, y - 2 * fwd);
                }
                if z == 0 {
                    push(&mut moves, x, y - 2 * fwd);
                }
                if z == 1 {
                    push(&mut moves, x, y - 1);
                    push(&mut moves, x, y + 1);
                }
                if z == 2 {
                    push(&mut moves, x, y + 2 * fwd);
                }
            }
            Face::Pawn => {
                if z == 0 || z == 1 {
                    push(&mut moves, x, y - fwd);
                }
                if z == 1 || z == 2 {
                    push(&mut moves, x - 2, y);
                    push(&mut moves, x + 2, y);
                }
                if z == 2 {
                    push(&mut moves, x - 1, y - fwd);
                    push(&mut moves, x + 1, y - fwd);
                }
            }
            Face::Pistol => {
                if z == 0 {
                    diagonal(&mut moves, x, y);
                } else {
                    orthogonal(&mut moves, x, y);
                }
            }
            Face::Pike => {
                if z == 0 {
                    orthogonal(&mut moves, x, y);
                    push(&mut moves, x, y - 2 * fwd);
                } else {
                    diagonal(&mut moves, x, y);
                }
            }
            Face::Clandestinite => {
                push(&mut moves, x - 1, y - 2 * fwd);
                push(&mut moves, x + 1, y - 2 * fwd);
                push(&mut moves, x, y + fwd);
                if z == 1 || z == 2 {
                    push(&mut moves, x - 1, y - fwd);
                    push(&mut moves, x + 1, y - fwd);
                }
                if z == 2 {
                    push(&mut moves, x - 2, y + 2 * fwd);
                    push(&mut moves, x - 1, y + 2 * fwd);
                    push(&mut moves, x + 1, y + 2 * fwd);
                    push(&mut moves, x + 2, y + 2 * fwd);
                }
            }
            Face::Lance => {
                if z == 0 {
                    match self.alignment() {
                        Color::Black => {
                            for i in (0..y).rev() {
                                push(&mut moves, x, i);
                            }
                        }
                        Color::White => {
                            for i in (y + 1)..=8 {
                                push(&mut moves, x, i);
                            }
                        }
                    }
                } else {
                    diagonal(&mut moves, x, y);
                }
            }
            Face::DragonKing => {
                diagonal(&mut moves, x, y);
                if z == 0 {
                    extended_orthogonal(&mut moves, x, y);
                }
            }
            Face::Phoenix => {
                orthogonal(&mut moves, x, y);
                if z == 0 {
                    extended_diagonal(&mut moves, x, y);
                }
            }
            Face::Arrow => {
                push(&mut moves, x, y - 1);
                push(&mut moves, x, y + 1);
                if z == 0 || z == 2 {
                    push(&mut moves, x - 1, y + fwd);
                    push(&mut moves, x + 1, y + fwd);
                }
                if z == 1 || z == 2 {
                    push(&mut moves, x - 2, y + 2 * fwd);
                    push(&mut moves, x + 2, y + 2 * fwd);
                }
            }
            Face::Bronze => {
                push(&mut moves, x - 1, y);
                push(&mut moves, x + 1, y);
            }
            Face::Silver => {
                if z == 0 {
                    orthogonal(&mut moves, x, y);
                } else {
                    diagonal(&mut moves, x, y);
                }
            }
            Face::Gold => {
                return self.gold_moves(x as u8, y as u8);
            }
        }

        moves
    }

    /// Fallback pattern used when the piece directly beneath has a
    /// different alignment: the piece moves as a Gold.
    pub fn gold_moves(&self, x: u8, y: u8) -> TargetList {
        let mut moves = TargetList::new();
        let (x, y) = (x as i32, y as i32);
        let fwd: i32 = if self.alignment() == Color::White { -1 } else { 1 };

        orthogonal(&mut moves, x, y);
        push(&mut moves, x - 1, y - fwd);
        push(&mut moves, x + 1, y - fwd);

        moves
    }
}

fn push(moves: &mut TargetList, x: i32, y: i32) {
    if (0..=8).contains(&x) && (0..=8).contains(&y) {
        let _ = moves.try_push(Cell::new_unchecked(x as u8, y as u8));
    }
}

fn diagonal(moves: &mut TargetList, x: i32, y: i32) {
    push(moves, x - 1, y - 1);
    push(moves, x + 1, y - 1);
    push(moves, x - 1, y + 1);
    push(moves, x + 1, y + 1);
}

fn orthogonal(moves: &mut TargetList, x: i32, y: i32) {
    push(moves, x, y - 1);
    push(moves, x - 1, y);
    push(moves, x + 1, y);
    push(moves, x, y + 1);
}

fn extended_diagonal(moves: &mut TargetList, x: i32, y: i32) {
    let mut step = |mut i: i32, mut j: i32, dx: i32, dy: i32| {
        while (0..=8).contains(&i) && (0..=8).contains(&j) {
            push(moves, i, j);
            i += dx;
            j += dy;
        }
    };
    step(x - 1, y - 1, -1, -1);
    step(x + 1, y - 1, 1, -1);
    step(x - 1, y + 1, -1, 1);
    step(x + 1, y + 1, 1, 1);
}

fn extended_orthogonal(moves: &mut TargetList, x: i32, y: i32) {
    for i in (0..y).rev() {
        push(moves, x, i);
    }
    for i in (0..x).rev() {
        push(moves, i, y);
    }
    for i in (x + 1)..=8 {
        push(moves, i, y);
    }
    for i in (y + 1)..=8 {
        push(moves, x, i);
    }
}
