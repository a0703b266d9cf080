//! State mutation. A `Field` bundles the piece pool, the board, and both
//! hands; every action, committed or speculative, runs through the same
//! mutators on it. Legality checks clone the field, apply the action, and
//! inspect the result, so search and play can never disagree about what an
//! action does.

use thiserror::Error;

use crate::board::{Board, BoardError};
use crate::hand::Hand;
use crate::piece::{Color, Face, Piece};
use crate::rules;
use crate::set::{PieceId, Set};
use crate::square::Cell;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("piece is not in hand")]
    NotInHand,
    #[error("no piece at ({x}, {y})")]
    EmptyTower { x: u8, y: u8 },
    #[error("no tier {z} at ({x}, {y})")]
    NoSuchTier { x: u8, y: u8, z: usize },
    #[error(transparent)]
    Board(#[from] BoardError),
}

/// One player action in the movement phase, or a placement during the
/// initial arrangement. Strikes that capture a catapult or fortress may
/// carry the forced-rearrangement drop target along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Place { piece: Piece, to: Cell },
    Move { from: Cell, to: Cell },
    Strike { from: Cell, to: Cell, rearrange: Option<Cell> },
    StrikeDown { at: Cell, tier: usize, rearrange: Option<Cell> },
    StrikeUp { at: Cell, tier: usize, rearrange: Option<Cell> },
    Exchange { at: Cell },
    Substitute { at: Cell },
}

/// Complete mutable game material: the 46-piece pool, the board, and both
/// hands. Cloning one is a flat copy, which is what makes speculative
/// application cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub set: Set,
    pub board: Board,
    pub hands: [Hand; 2],
}

impl Field {
    /// A fresh field with both hands holding their full allotment and an
    /// empty board.
    pub fn new() -> Self {
        let set = Set::new();
        let mut black = Hand::new(Color::Black);
        let mut white = Hand::new(Color::White);
        black.init();
        white.init();
        Self {
            set,
            board: Board::new(),
            hands: [black, white],
        }
    }

    pub fn hand(&self, color: Color) -> &Hand {
        &self.hands[color.index()]
    }

    pub fn hand_mut(&mut self, color: Color) -> &mut Hand {
        &mut self.hands[color.index()]
    }

    pub fn active_hand(&self, turn: u32) -> &Hand {
        self.hand(Color::active(turn))
    }

    pub fn passive_hand(&self, turn: u32) -> &Hand {
        self.hand(Color::passive(turn))
    }

    /// Apply an action wholesale. Callers are expected to have validated it
    /// with the rules module first.
    pub fn apply(&mut self, action: Action, turn: u32) -> Result<(), ActionError> {
        match action {
            Action::Place { piece, to } => self.place(piece, to),
            Action::Move { from, to } => self.move_piece(from, to, turn),
            Action::Strike { from, to, rearrange } => {
                self.strike(from, to, turn)?;
                self.finish_rearrangement(rearrange, turn)
            }
            Action::StrikeDown { at, tier, rearrange } => {
                self.strike_down(at, tier, turn)?;
                self.finish_rearrangement(rearrange, turn)
            }
            Action::StrikeUp { at, tier, rearrange } => {
                self.strike_up(at, tier, turn)?;
                self.finish_rearrangement(rearrange, turn)
            }
            Action::Exchange { at } => self.exchange(at, turn),
            Action::Substitute { at } => self.substitute(at),
        }
    }

    /// Take a piece out of its owner's hand and put it on top of a tower.
    /// Serves both arrangement placements and in-game drops.
    pub fn place(&mut self, piece: Piece, to: Cell) -> Result<(), ActionError> {
        let color = piece.alignment();
        let id = self.hands[color.index()]
            .remove(&self.set, piece)
            .ok_or(ActionError::NotInHand)?;
        self.board.put_top(&self.set, id, to.x, to.y)?;
        Ok(())
    }

    /// Relocate the top piece at `from` to the top of `to`, then resolve
    /// forced recovery on both towers.
    pub fn move_piece(&mut self, from: Cell, to: Cell, turn: u32) -> Result<(), ActionError> {
        let id = self
            .board
            .remove_top(&self.set, from.x, from.y)
            .ok_or(ActionError::EmptyTower { x: from.x, y: from.y })?;
        self.board.put_top(&self.set, id, to.x, to.y)?;

        self.recover_cascade(from);
        self.recover_cascade(to);
        Ok(())
    }

    /// Capture the top of `to` with the top of `from`.
    ///
    /// The captured piece flips into the striker's hand and changes sides.
    /// If the striker itself ends up in forced recovery, or the capture
    /// yielded a range-projecting piece that cannot be rearranged (or the
    /// striker was a bronze), the capture reverts to the owner's hand
    /// unflipped. A bronze striker then triggers betrayal through the
    /// tower, and a destroyed fortress releases stranded pieces in its
    /// file.
    pub fn strike(&mut self, from: Cell, to: Cell, turn: u32) -> Result<(), ActionError> {
        let striker_piece = self
            .board
            .top_piece(&self.set, from.x, from.y)
            .ok_or(ActionError::EmptyTower { x: from.x, y: from.y })?;
        let bronze = striker_piece.side_up() == Face::Bronze;
        let fortress = self
            .board
            .tower_contains_face(&self.set, Face::Fortress, to.x, to.y);

        let target = self
            .board
            .remove_top(&self.set, to.x, to.y)
            .ok_or(ActionError::EmptyTower { x: to.x, y: to.y })?;
        self.capture(target, turn);

        let striker = self
            .board
            .remove_top(&self.set, from.x, from.y)
            .ok_or(ActionError::EmptyTower { x: from.x, y: from.y })?;
        self.board.put_top(&self.set, striker, to.x, to.y)?;

        self.recover_cascade(from);

        if rules::recoverable_at(self, to) {
            self.switch_hands(target, turn);
            self.recover_cascade(to);
        } else if self.set.get(target).imparts_mre()
            && (bronze || !rules::rearrangeable(self, self.set.get(target), turn))
        {
            self.switch_hands(target, turn);
        }

        if bronze {
            self.betrayal(to)?;
        }

        if fortress
            && !self
                .board
                .tower_contains_face(&self.set, Face::Fortress, to.x, to.y)
        {
            self.recover_file(Color::passive(turn), to.x);
        }
        Ok(())
    }

    /// Immobile strike down: the piece at `tier` captures the piece
    /// directly beneath it.
    pub fn strike_down(&mut self, at: Cell, tier: usize, turn: u32) -> Result<(), ActionError> {
        if tier == 0 {
            return Err(ActionError::NoSuchTier { x: at.x, y: at.y, z: tier });
        }
        let attacker = self
            .board
            .piece_at(&self.set, at.x, at.y, tier)
            .ok_or(ActionError::NoSuchTier { x: at.x, y: at.y, z: tier })?;
        let bronze = attacker.side_up() == Face::Bronze;
        let fortress = self
            .board
            .tower_contains_face(&self.set, Face::Fortress, at.x, at.y);

        let target = self.board.remove_at(&self.set, at.x, at.y, tier - 1)?;
        self.capture(target, turn);

        if tier == self.board.height(at.x, at.y) && rules::recoverable_at(self, at) {
            self.switch_hands(target, turn);
            self.recover_cascade(at);
        } else if self.set.get(target).imparts_mre()
            && (bronze || !rules::rearrangeable(self, self.set.get(target), turn))
        {
            self.switch_hands(target, turn);
        }

        self.recover_cascade(at);

        if tier == self.board.height(at.x, at.y) && bronze {
            self.betrayal(at)?;
        }

        if fortress
            && !self
                .board
                .tower_contains_face(&self.set, Face::Fortress, at.x, at.y)
        {
            self.recover_file(Color::passive(turn), at.x);
        }
        Ok(())
    }

    /// Immobile strike up: the piece at `tier` captures the piece directly
    /// above it.
    pub fn strike_up(&mut self, at: Cell, tier: usize, turn: u32) -> Result<(), ActionError> {
        let attacker = self
            .board
            .piece_at(&self.set, at.x, at.y, tier)
            .ok_or(ActionError::NoSuchTier { x: at.x, y: at.y, z: tier })?;
        let bronze = attacker.side_up() == Face::Bronze;
        let fortress = self
            .board
            .tower_contains_face(&self.set, Face::Fortress, at.x, at.y);

        let target = self.board.remove_at(&self.set, at.x, at.y, tier + 1)?;
        self.capture(target, turn);

        if tier + 1 == self.board.height(at.x, at.y) && rules::recoverable_at(self, at) {
            self.switch_hands(target, turn);
            self.recover_cascade(at);
        } else if self.set.get(target).imparts_mre()
            && (bronze || !rules::rearrangeable(self, self.set.get(target), turn))
        {
            self.switch_hands(target, turn);
        }

        self.recover_cascade(at);

        if tier + 1 == self.board.height(at.x, at.y) && bronze {
            self.betrayal(at)?;
        }

        if fortress
            && !self
                .board
                .tower_contains_face(&self.set, Face::Fortress, at.x, at.y)
        {
            self.recover_file(Color::passive(turn), at.x);
        }
        Ok(())
    }

    /// Swap the bottom and top pieces of a full tower and log the square
    /// for the exchange cooldown.
    pub fn exchange(&mut self, at: Cell, turn: u32) -> Result<(), ActionError> {
        let bottom = self
            .board
            .id_at(at.x, at.y, 0)
            .ok_or(ActionError::NoSuchTier { x: at.x, y: at.y, z: 0 })?;
        let top = self
            .board
            .id_at(at.x, at.y, 2)
            .ok_or(ActionError::NoSuchTier { x: at.x, y: at.y, z: 2 })?;

        self.board.replace_at(&self.set, top, at.x, at.y, 0)?;
        self.board.replace_at(&self.set, bottom, at.x, at.y, 2)?;

        self.recover_cascade(at);
        self.board.record_exchange(at, turn);
        Ok(())
    }

    /// Swap a lone samurai with its commander, wherever the commander
    /// stands.
    pub fn substitute(&mut self, at: Cell) -> Result<(), ActionError> {
        let samurai = self
            .board
            .id_at(at.x, at.y, 0)
            .ok_or(ActionError::NoSuchTier { x: at.x, y: at.y, z: 0 })?;
        let alignment = self.set.get(samurai).alignment();

        if let Some(comm) = self.board.commander_cell(&self.set, alignment) {
            let z = self.board.height(comm.x, comm.y) - 1;
            let commander = self
                .board
                .id_at(comm.x, comm.y, z)
                .ok_or(ActionError::NoSuchTier { x: comm.x, y: comm.y, z })?;
            self.board.replace_at(&self.set, commander, at.x, at.y, 0)?;
            self.board.replace_at(&self.set, samurai, comm.x, comm.y, z)?;
        }
        Ok(())
    }

    /// Flip enemy pieces buried under the top of the tower at `at` to the
    /// striker's side. Pawns never betray; a lance betrays only on the
    /// first tier inside the striker's own territory, and no flip may
    /// create a duplicate within the tower.
    pub fn betrayal(&mut self, at: Cell) -> Result<(), ActionError> {
        let top = self.board.height(at.x, at.y).saturating_sub(1);
        let Some(alignment) = self
            .board
            .piece_at(&self.set, at.x, at.y, top)
            .map(|piece| piece.alignment())
        else {
            return Ok(());
        };

        for z in 0..top {
            let Some(piece) = self.board.piece_at(&self.set, at.x, at.y, z) else {
                continue;
            };
            if piece.alignment() == alignment {
                continue;
            }
            if piece.front == Face::Pawn {
                continue;
            }
            if piece.side_up() == Face::Lance {
                let inside = match alignment {
                    Color::White => at.y <= Color::White.territory_hi(),
                    Color::Black => at.y >= Color::Black.territory_lo(),
                };
                if z > 0 || !inside {
                    continue;
                }
            }
            let mut flipped = piece;
            flipped.flip();
            if self.board.tower_contains(&self.set, flipped, at.x, at.y) {
                continue;
            }
            self.board.flip_at(&mut self.set, at.x, at.y, z)?;
        }
        Ok(())
    }

    /// Pop recoverable pieces off the top of the tower at `at` into their
    /// owners' hands until the top piece can stand on its own.
    pub fn recover_cascade(&mut self, at: Cell) {
        while rules::recoverable_at(self, at) {
            let Some(id) = self.board.top_id(at.x, at.y) else {
                break;
            };
            let color = self.set.get(id).alignment();
            if self.board.remove_top(&self.set, at.x, at.y).is_none() {
                break;
            }
            self.hands[color.index()].insert(&self.set, id);
        }
    }

    /// After a range projection leaves file `x`, return stranded
    /// single-tier pieces in `color`'s recovery rows to `color`'s hand.
    fn recover_file(&mut self, color: Color, x: u8) {
        let start = match color {
            Color::White => 7,
            Color::Black => 0,
        };
        for y in start..start + 2 {
            if rules::recoverable_after_mre_loss(self, color, x, y) {
                if let Some(id) = self.board.remove_top(&self.set, x, y) {
                    self.hands[color.index()].insert(&self.set, id);
                }
            }
        }
    }

    /// Flip the freshly captured piece into the active hand.
    fn capture(&mut self, id: PieceId, turn: u32) {
        self.set.get_mut(id).flip();
        let active = Color::active(turn);
        self.hands[active.index()].insert(&self.set, id);
    }

    /// Undo a capture: move a piece equal to the captured one from the
    /// active hand back to the passive hand, unflipped.
    fn switch_hands(&mut self, id: PieceId, turn: u32) {
        let active = Color::active(turn);
        let piece = self.set.get(id);
        if let Some(taken) = self.hands[active.index()].remove(&self.set, piece) {
            self.set.get_mut(taken).flip();
            self.hands[Color::passive(turn).index()].insert(&self.set, taken);
        }
    }

    /// Drop the pending range-projecting capture on its rearrangement
    /// target, if one was chosen.
    fn finish_rearrangement(
        &mut self,
        rearrange: Option<Cell>,
        turn: u32,
    ) -> Result<(), ActionError> {
        let Some(to) = rearrange else {
            return Ok(());
        };
        let active = Color::active(turn);
        let Some(id) = self.hands[active.index()].mre_piece(&self.set) else {
            return Ok(());
        };
        let piece = self.set.get(id);
        self.place(piece, to)
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}
