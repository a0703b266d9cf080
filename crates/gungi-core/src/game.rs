//! Top-level game driver: turn alternation through the arrangement and
//! movement phases, action validation, the forced-rearrangement sub-phase,
//! check and checkmate flags, and fourfold-repetition stalemate.

use thiserror::Error;

use crate::action::{Action, ActionError, Field};
use crate::movegen::{effective_moves, selectable};
use crate::piece::{Color, Piece};
use crate::position::Position;
use crate::rules;
use crate::square::{Cell, HandCell};

/// Turns 1 through 46 are the initial arrangement: black and white
/// alternate placing their 23 pieces into their own territories.
pub const INITIAL_ARRANGEMENT: u32 = 46;

/// A position seen this many times ends the game in stalemate.
pub const STALEMATE_THRESHOLD: u32 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("game is over")]
    GameOver,
    #[error("a rearrangement drop is pending")]
    RearrangementPending,
    #[error("no rearrangement is pending")]
    NoRearrangement,
    #[error("only placements are allowed during the arrangement")]
    ArrangementPhase,
    #[error("illegal action")]
    Illegal,
    #[error(transparent)]
    Action(#[from] ActionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    field: Field,
    turn: u32,
    checks: [bool; 2],
    checkmates: [bool; 2],
    stalemate: bool,
    positions: Vec<Position>,
    pending_rearrangement: bool,
}

impl Game {
    pub fn new() -> Self {
        Self {
            field: Field::new(),
            turn: 1,
            checks: [false; 2],
            checkmates: [false; 2],
            stalemate: false,
            positions: Vec::new(),
            pending_rearrangement: false,
        }
    }

    /// Rebuild a game around existing material, recomputing the derived
    /// flags. Used by snapshot restoration and tests.
    pub fn from_parts(field: Field, turn: u32) -> Self {
        let mut game = Self {
            field,
            turn,
            checks: [false; 2],
            checkmates: [false; 2],
            stalemate: false,
            positions: Vec::new(),
            pending_rearrangement: false,
        };
        if turn > INITIAL_ARRANGEMENT {
            game.checks = [
                rules::check(&game.field, Color::Black),
                rules::check(&game.field, Color::White),
            ];
        }
        game
    }

    /// Rebuild a saved game, including its repetition history and whether
    /// a rearrangement drop was still owed when the snapshot was taken.
    pub fn from_saved(
        field: Field,
        turn: u32,
        pending_rearrangement: bool,
        positions: Vec<Position>,
    ) -> Self {
        let mut game = Self::from_parts(field, turn);
        game.pending_rearrangement = pending_rearrangement;
        game.stalemate = positions
            .iter()
            .any(|position| position.count() >= STALEMATE_THRESHOLD);
        game.positions = positions;
        game
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Every distinct post-arrangement position seen so far, with counts.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn active_color(&self) -> Color {
        Color::active(self.turn)
    }

    /// Whether the initial arrangement is still in progress.
    pub fn arranging(&self) -> bool {
        self.turn <= INITIAL_ARRANGEMENT
    }

    pub fn pending_rearrangement(&self) -> bool {
        self.pending_rearrangement
    }

    pub fn in_check(&self, color: Color) -> bool {
        self.checks[color.index()]
    }

    pub fn checkmated(&self, color: Color) -> bool {
        self.checkmates[color.index()]
    }

    pub fn stalemate(&self) -> bool {
        self.stalemate
    }

    pub fn game_over(&self) -> bool {
        self.stalemate || self.checkmates[0] || self.checkmates[1]
    }

    pub fn winner(&self) -> Option<Color> {
        if self.checkmates[Color::Black.index()] {
            Some(Color::White)
        } else if self.checkmates[Color::White.index()] {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Validate and commit one action for the side to move, then hand the
    /// turn over. Strikes that yield a catapult or fortress without an
    /// embedded rearrangement target leave the game waiting in the
    /// rearrangement sub-phase instead of advancing.
    pub fn perform(&mut self, action: Action) -> Result<(), GameError> {
        if self.game_over() {
            return Err(GameError::GameOver);
        }
        if self.pending_rearrangement {
            return Err(GameError::RearrangementPending);
        }

        if self.arranging() {
            return self.perform_placement(action);
        }

        let turn = self.turn;
        let (legal, rearrange, strike_like) = match action {
            Action::Place { piece, to } => (
                piece.accessible(turn) && rules::droppable(&self.field, piece, to, turn),
                None,
                false,
            ),
            Action::Move { from, to } => (
                selectable(&self.field.set, &self.field.board, from.x, from.y, turn)
                    && effective_moves(&self.field.set, &self.field.board, from.x, from.y)
                        .contains(&to)
                    && rules::moveable_path(&self.field, from, to)
                    && rules::moveable(&self.field, from, to, turn),
                None,
                false,
            ),
            Action::Strike { from, to, rearrange } => (
                selectable(&self.field.set, &self.field.board, from.x, from.y, turn)
                    && effective_moves(&self.field.set, &self.field.board, from.x, from.y)
                        .contains(&to)
                    && rules::moveable_path(&self.field, from, to)
                    && rules::strikeable(&self.field, from, to, turn),
                rearrange,
                true,
            ),
            Action::StrikeDown { at, tier, rearrange } => (
                rules::downwards(&self.field, at, tier, turn),
                rearrange,
                true,
            ),
            Action::StrikeUp { at, tier, rearrange } => (
                rules::upwards(&self.field, at, tier, turn),
                rearrange,
                true,
            ),
            Action::Exchange { at } => (rules::exchangeable(&self.field, at, turn), None, false),
            Action::Substitute { at } => (rules::substitutable(&self.field, at, turn), None, false),
        };
        if !legal {
            return Err(GameError::Illegal);
        }

        let mut next = self.field.clone();
        next.apply(strip_rearrangement(action), turn)?;

        if let Some(to) = rearrange {
            if let Some(id) = next.active_hand(turn).mre_piece(&next.set) {
                let piece = next.set.get(id);
                if !in_territory(Color::active(turn), to) || !rules::droppable(&next, piece, to, turn)
                {
                    return Err(GameError::Illegal);
                }
                next.place(piece, to)?;
            }
        }

        self.field = next;
        self.end_turn(strike_like);
        Ok(())
    }

    /// Complete a pending rearrangement by dropping the captured catapult
    /// or fortress inside the active territory.
    pub fn rearrange(&mut self, to: Cell) -> Result<(), GameError> {
        if !self.pending_rearrangement {
            return Err(GameError::NoRearrangement);
        }
        let turn = self.turn;

        if let Some(id) = self.field.active_hand(turn).mre_piece(&self.field.set) {
            let piece = self.field.set.get(id);
            if !in_territory(Color::active(turn), to)
                || !rules::droppable(&self.field, piece, to, turn)
            {
                return Err(GameError::Illegal);
            }
            self.field.place(piece, to)?;
        }

        self.pending_rearrangement = false;
        self.end_turn(false);
        Ok(())
    }

    /// Swap two stacks in the active player's hand grid. Reorganizing the
    /// hand costs nothing: the turn does not pass.
    pub fn swap_hand_stacks(&mut self, a: HandCell, b: HandCell) -> Result<(), GameError> {
        if self.game_over() {
            return Err(GameError::GameOver);
        }
        if self.pending_rearrangement {
            return Err(GameError::RearrangementPending);
        }
        let color = self.active_color();
        self.field.hands[color.index()].swap(a, b);
        Ok(())
    }

    fn perform_placement(&mut self, action: Action) -> Result<(), GameError> {
        let Action::Place { piece, to } = action else {
            return Err(GameError::ArrangementPhase);
        };
        let turn = self.turn;
        if !piece.accessible(turn)
            || !in_territory(Color::active(turn), to)
            || !rules::placeable(&self.field, piece, to)
        {
            return Err(GameError::Illegal);
        }

        let mut next = self.field.clone();
        next.place(piece, to)?;
        self.field = next;
        self.end_turn(false);
        Ok(())
    }

    fn end_turn(&mut self, strike_like: bool) {
        if self.turn >= INITIAL_ARRANGEMENT {
            self.checks = [
                rules::check(&self.field, Color::Black),
                rules::check(&self.field, Color::White),
            ];
        }

        // A strike that left a catapult or fortress in the striker's hand
        // holds the turn open until the piece is dropped back.
        if strike_like
            && self
                .field
                .active_hand(self.turn)
                .mre_piece(&self.field.set)
                .is_some()
        {
            self.pending_rearrangement = true;
            return;
        }

        self.field.board.clear_exchanges(self.turn);
        self.turn += 1;

        if self.turn > INITIAL_ARRANGEMENT {
            let active = Color::active(self.turn);
            let passive = active.flip();

            // A player whose own move left them in check has lost outright;
            // otherwise ask whether the new side to move has any reply.
            self.checkmates[passive.index()] = self.checks[passive.index()];
            if !self.checkmates[passive.index()] {
                self.checkmates[active.index()] = rules::checkmate(&self.field, self.turn);
            }

            self.update_positions();
        }
    }

    fn update_positions(&mut self) {
        let position = Position::capture(&self.field);
        for existing in &mut self.positions {
            if existing.matches(&position) {
                existing.increment();
                self.stalemate = existing.count() >= STALEMATE_THRESHOLD;
                return;
            }
        }
        self.positions.push(position);
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

fn in_territory(color: Color, cell: Cell) -> bool {
    (color.territory_lo()..=color.territory_hi()).contains(&cell.y)
}

fn strip_rearrangement(action: Action) -> Action {
    match action {
        Action::Strike { from, to, .. } => Action::Strike { from, to, rearrange: None },
        Action::StrikeDown { at, tier, .. } => Action::StrikeDown { at, tier, rearrange: None },
        Action::StrikeUp { at, tier, .. } => Action::StrikeUp { at, tier, rearrange: None },
        other => other,
    }
}
