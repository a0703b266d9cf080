//! A computer opponent. Level 0 is a human seat; level 1 plays uniformly
//! random legal actions; levels 2 through 9 filter candidates through
//! minimax and break ties with the caller's RNG, so a fixed seed replays
//! the same game.

use std::time::Instant;

use log::debug;
use rand::Rng;

use gungi_core::action::{Action, Field};
use gungi_core::game::Game;
use gungi_core::piece::{Color, Face, Piece};
use gungi_core::rules;
use gungi_core::square::{Cell, HandCell, BOARD_COLS};

use crate::search::{candidates, Searcher};

#[derive(Debug, Clone, Copy)]
pub struct Player {
    color: Color,
    level: u8,
}

impl Player {
    /// Levels run 0 (human) through 9.
    pub fn new(color: Color, level: u8) -> Self {
        Self {
            color,
            level: level.min(9),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// A human seat: the driving layer takes input instead of calling
    /// `decide`.
    pub fn controllable(&self) -> bool {
        self.level == 0
    }

    /// Choose an action for the current turn, or `None` when no legal
    /// action exists (the caller reads that as mate).
    pub fn decide<R: Rng>(&self, rng: &mut R, game: &Game) -> Option<Action> {
        let choices = if game.arranging() {
            self.placements(game)
        } else {
            self.movements(game)
        };
        if choices.is_empty() {
            return None;
        }
        Some(choices[rng.gen_range(0..choices.len())])
    }

    /// Decide and commit. Returns false when no action was available or
    /// the game refused it. A strike that opens the rearrangement
    /// sub-phase is completed with a random legal drop.
    pub fn act<R: Rng>(&self, rng: &mut R, game: &mut Game) -> bool {
        let Some(action) = self.decide(rng, game) else {
            return false;
        };
        if game.perform(action).is_err() {
            return false;
        }
        if !game.pending_rearrangement() {
            return true;
        }
        let targets = rearrange_targets(game);
        if targets.is_empty() {
            return false;
        }
        game.rearrange(targets[rng.gen_range(0..targets.len())]).is_ok()
    }

    fn placements(&self, game: &Game) -> Vec<Action> {
        let field = game.field();
        let mut actions = match self.level {
            0 | 1 => self.uniform_placements(field),
            2..=5 => self.guided_placements(field),
            _ => self.strict_placements(field),
        };
        // The guided orderings can momentarily offer nothing (a prerequisite
        // piece is still in hand); any legal placement keeps the clock moving.
        if actions.is_empty() {
            actions = self.uniform_placements(field);
        }
        actions
    }

    fn uniform_placements(&self, field: &Field) -> Vec<Action> {
        let mut actions = Vec::new();
        for id in field.hand(self.color).top_pieces() {
            let piece = field.set.get(id);
            for y in self.color.territory_lo()..=self.color.territory_hi() {
                for x in 0..BOARD_COLS as u8 {
                    let to = Cell::new_unchecked(x, y);
                    if rules::placeable(field, piece, to) {
                        actions.push(Action::Place { piece, to });
                    }
                }
            }
        }
        actions
    }

    /// Levels 2-5: positional preferences per face. Commander and fortress
    /// on the back rank, fighters over pawns, catapult centered on the
    /// middle rank, bows over range projectors.
    fn guided_placements(&self, field: &Field) -> Vec<Action> {
        let (rank1, rank2, rank3) = self.ranks();
        let mut actions = Vec::new();

        for id in field.hand(self.color).top_pieces() {
            let piece = field.set.get(id);
            let cells = match piece.side_up() {
                Face::Commander | Face::Fortress => self.row_cells(field, piece, 0, rank1, false),
                Face::Captain | Face::Samurai | Face::Spy => {
                    let over_pawns = self.pawn_cells(field, piece);
                    if over_pawns.is_empty() {
                        self.row_cells(field, piece, 0, rank3, true)
                    } else {
                        over_pawns
                    }
                }
                Face::Catapult => self.row_cells(field, piece, 2, rank2, false),
                Face::HiddenDragon | Face::Prodigy => {
                    let front = self.row_cells(field, piece, 0, rank3, false);
                    if front.is_empty() {
                        self.row_cells(field, piece, 0, rank2, false)
                    } else {
                        front
                    }
                }
                Face::Bow => {
                    let over_mre = self.mre_cells(field, piece);
                    if over_mre.is_empty() {
                        self.row_cells(field, piece, 0, rank2, true)
                    } else {
                        over_mre
                    }
                }
                Face::Pawn => {
                    let front = self.row_cells(field, piece, 0, rank3, true);
                    if front.is_empty() {
                        self.row_cells(field, piece, 0, rank2, true)
                    } else {
                        front
                    }
                }
                _ => Vec::new(),
            };
            for to in cells {
                actions.push(Action::Place { piece, to });
            }
        }
        actions
    }

    /// Levels 6-9: the guided ordering plus sequencing constraints (gold
    /// before commander, silver before catapult) and the catapult/fortress
    /// mutual-adjacency avoidance. Hand grid coordinates reference the
    /// initial layout, which still holds during the arrangement.
    fn strict_placements(&self, field: &Field) -> Vec<Action> {
        let (rank1, rank2, rank3) = self.ranks();
        let hand = field.hand(self.color);
        let placed = |x: u8, y: u8| hand.stack(HandCell::new_unchecked(x, y)).is_empty();
        let mut actions = Vec::new();

        for id in hand.top_pieces() {
            let piece = field.set.get(id);
            let cells = match piece.side_up() {
                Face::Commander => {
                    if placed(3, 2) {
                        self.row_cells(field, piece, 0, rank1, false)
                    } else {
                        Vec::new()
                    }
                }
                Face::Captain | Face::Samurai | Face::Spy => {
                    self.pawn_cells_in_row(field, piece, rank3)
                }
                Face::Catapult => {
                    let mut cells = if placed(2, 2) {
                        self.row_cells(field, piece, 2, rank2, false)
                    } else {
                        Vec::new()
                    };
                    if placed(1, 1) {
                        self.prune_near_fortress(field, &mut cells, rank1);
                    }
                    cells
                }
                Face::Fortress => {
                    let mut cells = if placed(3, 2) {
                        self.row_cells(field, piece, 0, rank1, false)
                    } else {
                        Vec::new()
                    };
                    if placed(0, 1) {
                        self.prune_near_catapult(field, &mut cells, rank2);
                    }
                    cells
                }
                Face::HiddenDragon | Face::Prodigy => {
                    if placed(1, 2) {
                        self.row_cells(field, piece, 0, rank3, false)
                    } else {
                        Vec::new()
                    }
                }
                Face::Bow => self.mre_cells(field, piece),
                Face::Pawn => match piece.back {
                    Face::Bronze => self.row_cells(field, piece, 0, rank3, false),
                    Face::Silver => self.row_cells(field, piece, 0, rank2, false),
                    Face::Gold => self.row_cells(field, piece, 0, rank1, false),
                    _ => Vec::new(),
                },
                _ => Vec::new(),
            };
            for to in cells {
                actions.push(Action::Place { piece, to });
            }
        }
        actions
    }

    fn movements(&self, game: &Game) -> Vec<Action> {
        let field = game.field();
        let turn = game.turn();
        let actions = candidates(field, turn);

        if self.level < 2 || actions.is_empty() {
            return actions;
        }

        let start = Instant::now();
        let searcher = Searcher::new(self.level, turn);

        let total = actions.len();
        let mut best = i64::MIN;
        let mut scored = Vec::with_capacity(total);
        for action in actions {
            let score = searcher.score(action, field);
            best = best.max(score);
            scored.push((action, score));
        }

        let kept: Vec<Action> = scored
            .into_iter()
            .filter(|&(_, score)| score == best)
            .map(|(action, _)| action)
            .collect();

        debug!(
            "turn {turn}: level {} kept {} of {total} candidates at score {best} in {:?}",
            self.level,
            kept.len(),
            start.elapsed()
        );
        kept
    }

    fn ranks(&self) -> (u8, u8, u8) {
        match self.color {
            Color::White => (0, 1, 2),
            Color::Black => (8, 7, 6),
        }
    }

    /// Placeable cells along row `y`, `margin` columns in from each edge.
    /// Occupied cells only qualify when stacking is wanted.
    fn row_cells(&self, field: &Field, piece: Piece, margin: u8, y: u8, stack: bool) -> Vec<Cell> {
        let mut cells = Vec::new();
        for x in margin..BOARD_COLS as u8 - margin {
            if field.board.height(x, y) > 0 && !stack {
                continue;
            }
            let to = Cell::new_unchecked(x, y);
            if rules::placeable(field, piece, to) {
                cells.push(to);
            }
        }
        cells
    }

    /// Territory cells topped by a range projector, for sheltering a bow.
    fn mre_cells(&self, field: &Field, piece: Piece) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in self.color.territory_lo()..=self.color.territory_hi() {
            for x in 0..BOARD_COLS as u8 {
                let Some(top) = field.board.top_piece(&field.set, x, y) else {
                    continue;
                };
                let to = Cell::new_unchecked(x, y);
                if top.imparts_mre() && rules::placeable(field, piece, to) {
                    cells.push(to);
                }
            }
        }
        cells
    }

    fn pawn_cells(&self, field: &Field, piece: Piece) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in self.color.territory_lo()..=self.color.territory_hi() {
            cells.extend(self.pawn_cells_in_row(field, piece, y));
        }
        cells
    }

    fn pawn_cells_in_row(&self, field: &Field, piece: Piece, y: u8) -> Vec<Cell> {
        let mut cells = Vec::new();
        for x in 0..BOARD_COLS as u8 {
            let Some(top) = field.board.top_piece(&field.set, x, y) else {
                continue;
            };
            let to = Cell::new_unchecked(x, y);
            if top.side_up() == Face::Pawn && rules::placeable(field, piece, to) {
                cells.push(to);
            }
        }
        cells
    }

    /// Keep the catapult out of the placed fortress's file neighborhood so
    /// one strike cannot threaten both projections.
    fn prune_near_fortress(&self, field: &Field, cells: &mut Vec<Cell>, fortress_row: u8) {
        let mut fortress_x = 0i32;
        for x in 0..BOARD_COLS as u8 {
            for id in field.board.tower(x, fortress_row).iter() {
                if field.set.get(id).side_up() == Face::Fortress {
                    fortress_x = x as i32;
                }
            }
        }
        if !(2..=6).contains(&fortress_x) {
            return;
        }
        cells.retain(|cell| (cell.x as i32 - fortress_x).abs() > 1);
    }

    fn prune_near_catapult(&self, field: &Field, cells: &mut Vec<Cell>, catapult_row: u8) {
        let mut catapult_x = 0i32;
        for x in 2..BOARD_COLS as u8 - 2 {
            for id in field.board.tower(x, catapult_row).iter() {
                if field.set.get(id).side_up() == Face::Catapult {
                    catapult_x = x as i32;
                }
            }
        }
        cells.retain(|cell| (cell.x as i32 - catapult_x).abs() > 2);
    }
}

/// Legal territory drops for the piece awaiting rearrangement.
fn rearrange_targets(game: &Game) -> Vec<Cell> {
    let field = game.field();
    let turn = game.turn();
    let Some(id) = field.active_hand(turn).mre_piece(&field.set) else {
        return Vec::new();
    };
    let piece = field.set.get(id);

    let color = Color::active(turn);
    let mut targets = Vec::new();
    for y in color.territory_lo()..=color.territory_hi() {
        for x in 0..BOARD_COLS as u8 {
            let to = Cell::new_unchecked(x, y);
            if rules::droppable(field, piece, to, turn) {
                targets.push(to);
            }
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng(seed: u64) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }

    fn run_arrangement(level: u8, seed: u64) -> Game {
        let mut game = Game::new();
        let players = [
            Player::new(Color::Black, level),
            Player::new(Color::White, level),
        ];
        let mut rng = rng(seed);
        while game.arranging() {
            let player = players[game.active_color().index()];
            assert!(player.act(&mut rng, &mut game), "no placement available");
        }
        game
    }

    fn board_census(game: &Game) -> usize {
        let field = game.field();
        gungi_core::board::Board::cells()
            .map(|cell| field.board.height(cell.x, cell.y))
            .sum()
    }

    #[test]
    fn level_one_completes_the_arrangement() {
        let game = run_arrangement(1, 7);
        assert_eq!(game.turn(), 47);
        assert_eq!(board_census(&game), 46);
        assert!(game.field().hand(Color::Black).is_empty());
        assert!(game.field().hand(Color::White).is_empty());
    }

    #[test]
    fn guided_arrangement_keeps_back_rank_structure() {
        let game = run_arrangement(4, 11);
        assert_eq!(game.turn(), 47);
        assert_eq!(board_census(&game), 46);

        // Commanders end up on their own back ranks under the guided
        // heuristics.
        let field = game.field();
        let black = field
            .board
            .commander_cell(&field.set, Color::Black)
            .unwrap();
        let white = field
            .board
            .commander_cell(&field.set, Color::White)
            .unwrap();
        assert_eq!(black.y, 8);
        assert_eq!(white.y, 0);
    }

    #[test]
    fn strict_arrangement_completes_too() {
        let game = run_arrangement(7, 23);
        assert_eq!(game.turn(), 47);
        assert_eq!(board_census(&game), 46);
    }

    #[test]
    fn fixed_seed_replays_the_same_game() {
        let a = run_arrangement(4, 99);
        let b = run_arrangement(4, 99);
        assert_eq!(a.field(), b.field());
    }

    #[test]
    fn human_seats_are_flagged() {
        assert!(Player::new(Color::Black, 0).controllable());
        assert!(!Player::new(Color::Black, 3).controllable());
    }
}
