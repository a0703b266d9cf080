use arrayvec::ArrayVec;

use crate::piece::{Color, Piece};
use crate::set::{PieceId, Set};
use crate::square::{HandCell, HAND_COLS, HAND_ROWS};

type Stack = ArrayVec<PieceId, 7>;

/// A player's off-board holding area: a 4x6 grid of piece stacks. Identical
/// pieces share a stack; only the top of each stack is visible or playable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    pub color: Color,
    stacks: [[Stack; HAND_COLS]; HAND_ROWS],
}

impl Hand {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            stacks: Default::default(),
        }
    }

    /// Fill the grid with this color's full 23-piece allotment in the
    /// standard arrangement (three rows of grouped stacks).
    pub fn init(&mut self) {
        for row in &mut self.stacks {
            for stack in row {
                stack.clear();
            }
        }

        let base = Set::base(self.color);
        let mut place = |x: usize, y: usize, offsets: &[u8]| {
            for &offset in offsets {
                self.stacks[y][x].push(PieceId(base + offset));
            }
        };

        place(0, 0, &[0]);
        place(1, 0, &[1, 2]);
        place(2, 0, &[3, 4]);
        place(3, 0, &[5, 6, 7]);

        place(0, 1, &[8]);
        place(1, 1, &[9]);
        place(2, 1, &[10]);
        place(3, 1, &[11]);

        place(0, 2, &[12, 13]);
        place(1, 2, &[14, 15, 16, 17, 18, 19, 20]);
        place(2, 2, &[21]);
        place(3, 2, &[22]);
    }

    pub fn stack(&self, cell: HandCell) -> &[PieceId] {
        &self.stacks[cell.y as usize][cell.x as usize]
    }

    /// Top piece of the stack at `cell`, if any.
    pub fn top(&self, cell: HandCell) -> Option<PieceId> {
        self.stacks[cell.y as usize][cell.x as usize].last().copied()
    }

    /// The visible (top-of-stack) pieces, in grid order.
    pub fn top_pieces(&self) -> ArrayVec<PieceId, { HAND_COLS * HAND_ROWS }> {
        let mut pieces = ArrayVec::new();
        for y in 0..HAND_ROWS {
            for x in 0..HAND_COLS {
                if let Some(&id) = self.stacks[y][x].last() {
                    pieces.push(id);
                }
            }
        }
        pieces
    }

    /// First visible piece that projects a mobile range expansion; drives
    /// the forced-rearrangement sub-phase after such a piece is captured.
    pub fn mre_piece(&self, set: &Set) -> Option<PieceId> {
        self.top_pieces()
            .into_iter()
            .find(|&id| set.get(id).imparts_mre())
    }

    /// The cell holding a piece equal to `piece`, or failing that the first
    /// empty cell. `None` only if the hand is completely full.
    pub fn slot_for(&self, set: &Set, piece: Piece) -> Option<HandCell> {
        for y in 0..HAND_ROWS {
            for x in 0..HAND_COLS {
                if let Some(&id) = self.stacks[y][x].last() {
                    if set.get(id) == piece {
                        return HandCell::new(x as u8, y as u8);
                    }
                }
            }
        }
        for y in 0..HAND_ROWS {
            for x in 0..HAND_COLS {
                if self.stacks[y][x].is_empty() {
                    return HandCell::new(x as u8, y as u8);
                }
            }
        }
        None
    }

    /// Add a piece to the hand, grouping it with equal pieces.
    pub fn insert(&mut self, set: &Set, id: PieceId) {
        if let Some(cell) = self.slot_for(set, set.get(id)) {
            self.stacks[cell.y as usize][cell.x as usize].push(id);
        }
    }

    /// Remove one piece equal to `piece`, returning its id.
    pub fn remove(&mut self, set: &Set, piece: Piece) -> Option<PieceId> {
        for y in 0..HAND_ROWS {
            for x in 0..HAND_COLS {
                if let Some(&id) = self.stacks[y][x].last() {
                    if set.get(id) == piece {
                        return self.stacks[y][x].pop();
                    }
                }
            }
        }
        None
    }

    pub fn pop(&mut self, cell: HandCell) -> Option<PieceId> {
        self.stacks[cell.y as usize][cell.x as usize].pop()
    }

    /// Swap two stacks wholesale; pre-game arrangement only.
    pub fn swap(&mut self, a: HandCell, b: HandCell) {
        if a == b {
            return;
        }
        let stack_a = std::mem::take(&mut self.stacks[a.y as usize][a.x as usize]);
        let stack_b = std::mem::replace(&mut self.stacks[b.y as usize][b.x as usize], stack_a);
        self.stacks[a.y as usize][a.x as usize] = stack_b;
    }

    pub fn clear(&mut self) {
        for row in &mut self.stacks {
            for stack in row {
                stack.clear();
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stacks
            .iter()
            .all(|row| row.iter().all(|stack| stack.is_empty()))
    }

    pub fn len(&self) -> usize {
        self.stacks
            .iter()
            .map(|row| row.iter().map(|stack| stack.len()).sum::<usize>())
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.stacks
            .iter()
            .flat_map(|row| row.iter().flat_map(|stack| stack.iter().copied()))
    }

    /// True when every remaining visible piece is drop-restricted
    /// (spy/pawn/lance/bronze); feeds checkmate detection.
    pub fn constrained(&self, set: &Set) -> bool {
        self.top_pieces()
            .into_iter()
            .all(|id| !set.get(id).drops_freely())
    }
}
