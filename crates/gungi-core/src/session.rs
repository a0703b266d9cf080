//! Interactive command surface. Wraps a [`Game`] with the selection state a
//! pointing device drives: pick a piece, then pick a highlighted target.
//! Every click on an illegal target is a no-op, so a driving layer can
//! forward raw input without pre-validating it.

use crate::action::Action;
use crate::board::{Board, MAX_HEIGHT};
use crate::game::Game;
use crate::movegen::{effective_moves, selectable};
use crate::piece::{Color, Piece};
use crate::rules;
use crate::square::{Cell, HandCell};

/// Legality class a cell presents to the interactive layer. Green marks a
/// selectable piece or the current selection, blue a legal quiet target
/// (placement, drop, move, exchange, substitution, or hand swap), red a
/// strike target, purple an MRE zone cell, gray an inert cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Highlight {
    #[default]
    Clear,
    Red,
    Green,
    Blue,
    Purple,
    Gray,
}

/// A clickable cell: a slot in one of the hand grids or a board square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loc {
    Hand(Color, HandCell),
    Board(Cell),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Hand(HandCell),
    Board(Cell),
}

#[derive(Debug, Clone)]
pub struct Session {
    game: Game,
    selection: Option<Selection>,
}

impl Session {
    pub fn new() -> Self {
        Self::around(Game::new())
    }

    pub fn around(game: Game) -> Self {
        Self { game, selection: None }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn into_game(self) -> Game {
        self.game
    }

    pub fn selection(&self) -> Option<Loc> {
        self.selection.map(|sel| match sel {
            Selection::Hand(cell) => Loc::Hand(self.game.active_color(), cell),
            Selection::Board(cell) => Loc::Board(cell),
        })
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    /// Classify `loc` for display given the current selection.
    pub fn highlight(&self, loc: Loc) -> Highlight {
        if self.game.game_over() {
            return Highlight::Gray;
        }
        match loc {
            Loc::Hand(color, cell) => self.hand_highlight(color, cell),
            Loc::Board(cell) => self.board_highlight(cell),
        }
    }

    /// Primary click: select, deselect, swap hand stacks, place, move, or
    /// strike, depending on the selection and the target's legality class.
    /// Returns whether the game state changed.
    pub fn primary(&mut self, loc: Loc) -> bool {
        if self.game.game_over() {
            return false;
        }
        match loc {
            Loc::Hand(color, cell) => self.primary_hand(color, cell),
            Loc::Board(cell) => self.primary_board(cell),
        }
    }

    /// Secondary click: with a board selection, mount the target tower
    /// instead of striking its top; with none, exchange a full tower or
    /// substitute a lone samurai for the checked commander.
    pub fn secondary(&mut self, loc: Loc) -> bool {
        if self.game.game_over() || self.game.arranging() || self.game.pending_rearrangement() {
            return false;
        }
        let Loc::Board(cell) = loc else {
            return false;
        };
        match self.selection {
            Some(Selection::Board(from)) if from != cell => {
                self.commit(Action::Move { from, to: cell })
            }
            Some(_) => false,
            None => match self.game.field().board.height(cell.x, cell.y) {
                MAX_HEIGHT => self.commit(Action::Exchange { at: cell }),
                1 => self.commit(Action::Substitute { at: cell }),
                _ => false,
            },
        }
    }

    /// Strike the first crushable piece beneath the tower top at `at`.
    pub fn strike_beneath(&mut self, at: Cell) -> bool {
        if self.blocked_for_tower_strikes() {
            return false;
        }
        let turn = self.game.turn();
        let height = self.game.field().board.height(at.x, at.y);
        for tier in 1..height {
            if rules::downwards(self.game.field(), at, tier, turn) {
                return self.commit(Action::StrikeDown { at, tier, rearrange: None });
            }
        }
        false
    }

    /// Strike the first reachable piece above a buried piece at `at`.
    pub fn strike_above(&mut self, at: Cell) -> bool {
        if self.blocked_for_tower_strikes() {
            return false;
        }
        let turn = self.game.turn();
        let height = self.game.field().board.height(at.x, at.y);
        for tier in 0..height.saturating_sub(1) {
            if rules::upwards(self.game.field(), at, tier, turn) {
                return self.commit(Action::StrikeUp { at, tier, rearrange: None });
            }
        }
        false
    }

    /// Cells covered by the projector inside the tower at `at`, for zone
    /// display (rendered purple).
    pub fn mre_zone(&self, at: Cell) -> Vec<Cell> {
        let field = self.game.field();
        let projector = field
            .board
            .tower(at.x, at.y)
            .iter()
            .map(|id| field.set.get(id))
            .find(|piece| piece.imparts_mre());
        let Some(piece) = projector else {
            return Vec::new();
        };
        Board::cells()
            .filter(|c| field.board.mre.contains(piece, c.x, c.y))
            .collect()
    }

    fn hand_highlight(&self, color: Color, cell: HandCell) -> Highlight {
        if color != self.game.active_color() || self.game.pending_rearrangement() {
            return Highlight::Gray;
        }
        match self.selection {
            Some(Selection::Hand(sel)) if sel == cell => Highlight::Green,
            Some(Selection::Hand(_)) => Highlight::Blue,
            Some(Selection::Board(_)) => Highlight::Gray,
            None => {
                if self.game.field().hand(color).top(cell).is_some() {
                    Highlight::Green
                } else {
                    Highlight::Gray
                }
            }
        }
    }

    fn board_highlight(&self, cell: Cell) -> Highlight {
        let game = &self.game;
        let field = game.field();
        let turn = game.turn();

        if game.pending_rearrangement() {
            return match pending_piece(game) {
                Some(piece)
                    if in_territory(game.active_color(), cell)
                        && rules::droppable(field, piece, cell, turn) =>
                {
                    Highlight::Blue
                }
                _ => Highlight::Gray,
            };
        }

        match self.selection {
            None => {
                if game.arranging() {
                    return Highlight::Gray;
                }
                if rules::tower_strikeable(field, cell, turn) {
                    Highlight::Red
                } else if rules::exchangeable(field, cell, turn)
                    || rules::substitutable(field, cell, turn)
                {
                    Highlight::Blue
                } else if selectable(&field.set, &field.board, cell.x, cell.y, turn) {
                    Highlight::Green
                } else {
                    Highlight::Gray
                }
            }
            Some(Selection::Board(from)) => {
                if from == cell {
                    return Highlight::Green;
                }
                let reachable = effective_moves(&field.set, &field.board, from.x, from.y)
                    .contains(&cell)
                    && rules::moveable_path(field, from, cell);
                if !reachable {
                    Highlight::Gray
                } else if rules::strikeable(field, from, cell, turn) {
                    Highlight::Red
                } else if rules::moveable(field, from, cell, turn) {
                    Highlight::Blue
                } else {
                    Highlight::Gray
                }
            }
            Some(Selection::Hand(_)) => {
                let Some(piece) = self.selected_hand_piece() else {
                    return Highlight::Gray;
                };
                let legal = if game.arranging() {
                    in_territory(game.active_color(), cell) && rules::placeable(field, piece, cell)
                } else {
                    piece.accessible(turn) && rules::droppable(field, piece, cell, turn)
                };
                if legal {
                    Highlight::Blue
                } else {
                    Highlight::Gray
                }
            }
        }
    }

    fn primary_hand(&mut self, color: Color, cell: HandCell) -> bool {
        if color != self.game.active_color() || self.game.pending_rearrangement() {
            return false;
        }
        match self.selection {
            Some(Selection::Hand(sel)) if sel == cell => {
                self.selection = None;
                false
            }
            Some(Selection::Hand(sel)) => {
                let swapped = self.game.swap_hand_stacks(sel, cell).is_ok();
                if swapped {
                    self.selection = None;
                }
                swapped
            }
            Some(Selection::Board(_)) => false,
            None => {
                if self.game.field().hand(color).top(cell).is_some() {
                    self.selection = Some(Selection::Hand(cell));
                }
                false
            }
        }
    }

    fn primary_board(&mut self, cell: Cell) -> bool {
        if self.game.pending_rearrangement() {
            return self.game.rearrange(cell).is_ok();
        }
        let turn = self.game.turn();
        match self.selection {
            None => {
                let field = self.game.field();
                if !self.game.arranging()
                    && selectable(&field.set, &field.board, cell.x, cell.y, turn)
                {
                    self.selection = Some(Selection::Board(cell));
                }
                false
            }
            Some(Selection::Board(from)) if from == cell => {
                self.selection = None;
                false
            }
            Some(Selection::Board(from)) => {
                let action = if rules::strikeable(self.game.field(), from, cell, turn) {
                    Action::Strike { from, to: cell, rearrange: None }
                } else {
                    Action::Move { from, to: cell }
                };
                self.commit(action)
            }
            Some(Selection::Hand(_)) => {
                let Some(piece) = self.selected_hand_piece() else {
                    return false;
                };
                self.commit(Action::Place { piece, to: cell })
            }
        }
    }

    fn selected_hand_piece(&self) -> Option<Piece> {
        let Some(Selection::Hand(cell)) = self.selection else {
            return None;
        };
        let field = self.game.field();
        field
            .hand(self.game.active_color())
            .top(cell)
            .map(|id| field.set.get(id))
    }

    fn blocked_for_tower_strikes(&self) -> bool {
        self.game.game_over()
            || self.game.arranging()
            || self.game.pending_rearrangement()
            || self.selection.is_some()
    }

    fn commit(&mut self, action: Action) -> bool {
        if self.game.perform(action).is_ok() {
            self.selection = None;
            true
        } else {
            false
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn pending_piece(game: &Game) -> Option<Piece> {
    let field = game.field();
    field
        .active_hand(game.turn())
        .mre_piece(&field.set)
        .map(|id| field.set.get(id))
}

fn in_territory(color: Color, cell: Cell) -> bool {
    (color.territory_lo()..=color.territory_hi()).contains(&cell.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Field;
    use crate::game::INITIAL_ARRANGEMENT;
    use crate::piece::Face;
    use crate::set::{PieceId, Set};

    fn id(color: Color, offset: u8) -> PieceId {
        PieceId(Set::base(color) + offset)
    }

    fn cell(x: u8, y: u8) -> Cell {
        Cell::new_unchecked(x, y)
    }

    fn hand_cell(x: u8, y: u8) -> HandCell {
        HandCell::new_unchecked(x, y)
    }

    fn movement_session(build: impl FnOnce(&mut Field)) -> Session {
        let mut field = Field::new();
        field.hand_mut(Color::Black).clear();
        field.hand_mut(Color::White).clear();
        field.board.put_top(&field.set, id(Color::Black, 0), 8, 8).unwrap();
        field.board.put_top(&field.set, id(Color::White, 0), 0, 0).unwrap();
        build(&mut field);
        Session::around(Game::from_parts(field, INITIAL_ARRANGEMENT + 1))
    }

    #[test]
    fn hand_selection_places_a_piece() {
        let mut session = Session::new();
        let commander = Loc::Hand(Color::Black, hand_cell(0, 0));

        assert_eq!(session.highlight(commander), Highlight::Green);
        assert!(!session.primary(commander));
        assert_eq!(session.selection(), Some(commander));

        let target = Loc::Board(cell(4, 8));
        assert_eq!(session.highlight(target), Highlight::Blue);
        assert_eq!(session.highlight(Loc::Board(cell(4, 4))), Highlight::Gray);

        assert!(session.primary(target));
        assert_eq!(session.game().turn(), 2);
        assert_eq!(session.selection(), None);
        assert_eq!(session.game().field().board.height(4, 8), 1);
    }

    #[test]
    fn clicking_the_selection_again_deselects() {
        let mut session = Session::new();
        let commander = Loc::Hand(Color::Black, hand_cell(0, 0));
        session.primary(commander);
        assert!(!session.primary(commander));
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn hand_stacks_swap_without_spending_the_turn() {
        let mut session = Session::new();
        let pawns = hand_cell(1, 2);
        let empty = hand_cell(0, 3);

        session.primary(Loc::Hand(Color::Black, pawns));
        assert_eq!(
            session.highlight(Loc::Hand(Color::Black, empty)),
            Highlight::Blue
        );
        assert!(session.primary(Loc::Hand(Color::Black, empty)));

        let hand = session.game().field().hand(Color::Black);
        assert!(hand.stack(pawns).is_empty());
        assert_eq!(hand.stack(empty).len(), 7);
        assert_eq!(session.game().turn(), 1);
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn the_idle_hand_is_inert() {
        let mut session = Session::new();
        let white = Loc::Hand(Color::White, hand_cell(0, 0));
        assert_eq!(session.highlight(white), Highlight::Gray);
        assert!(!session.primary(white));
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn board_selection_strikes_a_red_target() {
        let mut session = movement_session(|field| {
            field.board.put_top(&field.set, id(Color::Black, 1), 4, 6).unwrap();
            field.board.put_top(&field.set, id(Color::White, 14), 4, 5).unwrap();
        });

        let captain = Loc::Board(cell(4, 6));
        assert_eq!(session.highlight(captain), Highlight::Green);
        session.primary(captain);
        assert_eq!(session.selection(), Some(captain));

        let pawn = Loc::Board(cell(4, 5));
        assert_eq!(session.highlight(pawn), Highlight::Red);
        assert!(session.primary(pawn));

        let game = session.game();
        assert_eq!(game.turn(), INITIAL_ARRANGEMENT + 2);
        assert_eq!(
            game.field().board.top_piece(&game.field().set, 4, 5).unwrap().side_up(),
            Face::Captain
        );
        assert_eq!(game.field().hand(Color::Black).len(), 1);
    }

    #[test]
    fn secondary_click_mounts_instead_of_striking() {
        let mut session = movement_session(|field| {
            field.board.put_top(&field.set, id(Color::Black, 1), 4, 6).unwrap();
            field.board.put_top(&field.set, id(Color::White, 14), 4, 5).unwrap();
        });

        session.primary(Loc::Board(cell(4, 6)));
        assert!(session.secondary(Loc::Board(cell(4, 5))));

        let game = session.game();
        assert_eq!(game.field().board.height(4, 5), 2);
        assert!(game.field().hand(Color::Black).is_empty());
    }

    #[test]
    fn illegal_clicks_keep_the_selection() {
        let mut session = movement_session(|field| {
            field.board.put_top(&field.set, id(Color::Black, 1), 4, 6).unwrap();
        });

        let captain = Loc::Board(cell(4, 6));
        session.primary(captain);
        assert!(!session.primary(Loc::Board(cell(4, 1))));
        assert_eq!(session.selection(), Some(captain));
        assert_eq!(session.game().turn(), INITIAL_ARRANGEMENT + 1);
    }

    #[test]
    fn tower_strikes_crush_downwards() {
        let mut session = movement_session(|field| {
            field.board.put_top(&field.set, id(Color::White, 14), 4, 4).unwrap();
            field.board.put_top(&field.set, id(Color::Black, 1), 4, 4).unwrap();
        });

        assert_eq!(session.highlight(Loc::Board(cell(4, 4))), Highlight::Red);
        assert!(session.strike_beneath(cell(4, 4)));

        let game = session.game();
        assert_eq!(game.field().board.height(4, 4), 1);
        assert_eq!(game.field().hand(Color::Black).len(), 1);
        assert_eq!(game.turn(), INITIAL_ARRANGEMENT + 2);
    }

    #[test]
    fn a_strike_on_a_projector_waits_for_the_drop() {
        let mut session = movement_session(|field| {
            field.set.get_mut(id(Color::Black, 8)).flip();
            field.board.put_top(&field.set, id(Color::Black, 8), 4, 5).unwrap();
            field.board.put_top(&field.set, id(Color::Black, 1), 4, 6).unwrap();
        });

        session.primary(Loc::Board(cell(4, 6)));
        assert!(session.primary(Loc::Board(cell(4, 5))));
        assert!(session.game().pending_rearrangement());

        // Only territory drop targets light up until the catapult lands.
        assert_eq!(session.highlight(Loc::Board(cell(2, 7))), Highlight::Blue);
        assert_eq!(session.highlight(Loc::Board(cell(4, 4))), Highlight::Gray);
        assert!(!session.primary(Loc::Board(cell(4, 4))));

        assert!(session.primary(Loc::Board(cell(2, 7))));
        assert!(!session.game().pending_rearrangement());
        assert_eq!(session.game().turn(), INITIAL_ARRANGEMENT + 2);
    }

    #[test]
    fn projector_zones_read_back_for_display() {
        let session = movement_session(|field| {
            field.board.put_top(&field.set, id(Color::Black, 8), 4, 7).unwrap();
        });
        assert_eq!(session.mre_zone(cell(4, 7)).len(), 11);
        assert!(session.mre_zone(cell(0, 4)).is_empty());
    }
}
