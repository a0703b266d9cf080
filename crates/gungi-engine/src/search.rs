//! Candidate enumeration and minimax with alpha-beta pruning. Depth and the
//! evaluation terms are gated by engine level: level 2 looks one ply, each
//! four levels buy another ply, and the in-between levels add mobility
//! terms and a checkmate probe.

use gungi_core::action::{Action, Field};
use gungi_core::board::Board;
use gungi_core::movegen::{effective_moves, selectable};
use gungi_core::piece::Color;
use gungi_core::rules;
use gungi_core::square::{Cell, BOARD_COLS};

use crate::eval::{self, CHECKMATE};

/// Every legal action for the side moving on `turn`: drops, moves, strikes
/// (expanded per rearrangement target when one is forced), vertical
/// strikes, tier exchanges, and commander substitutions.
pub fn candidates(field: &Field, turn: u32) -> Vec<Action> {
    let mut actions = Vec::new();

    for cell in Board::cells() {
        for id in field.active_hand(turn).top_pieces() {
            let piece = field.set.get(id);
            if rules::droppable(field, piece, cell, turn) {
                actions.push(Action::Place { piece, to: cell });
            }
        }

        if selectable(&field.set, &field.board, cell.x, cell.y, turn) {
            for target in effective_moves(&field.set, &field.board, cell.x, cell.y) {
                if !rules::moveable_path(field, cell, target) {
                    continue;
                }
                if rules::moveable(field, cell, target, turn) {
                    actions.push(Action::Move { from: cell, to: target });
                }
                if rules::strikeable(field, cell, target, turn) {
                    let strike = Action::Strike { from: cell, to: target, rearrange: None };
                    if rules::rearrangeable_lat(field, cell, target, turn) {
                        expand_rearrangements(field, strike, turn, &mut actions);
                    } else {
                        actions.push(strike);
                    }
                }
            }
        }

        if rules::exchangeable(field, cell, turn) {
            actions.push(Action::Exchange { at: cell });
        }
        if rules::substitutable(field, cell, turn) {
            actions.push(Action::Substitute { at: cell });
        }

        let height = field.board.height(cell.x, cell.y);
        if height < 2 {
            continue;
        }
        for tier in 0..height {
            if tier > 0 && rules::downwards(field, cell, tier, turn) {
                let strike = Action::StrikeDown { at: cell, tier, rearrange: None };
                if rules::rearrangeable_vert(field, cell, tier, tier - 1, turn) {
                    expand_rearrangements(field, strike, turn, &mut actions);
                } else {
                    actions.push(strike);
                }
            }
            if tier + 1 < height && rules::upwards(field, cell, tier, turn) {
                let strike = Action::StrikeUp { at: cell, tier, rearrange: None };
                if rules::rearrangeable_vert(field, cell, tier, tier + 1, turn) {
                    expand_rearrangements(field, strike, turn, &mut actions);
                } else {
                    actions.push(strike);
                }
            }
        }
    }

    actions
}

/// A strike that forces a rearrangement becomes one candidate per legal
/// drop target for the recovered catapult or fortress.
fn expand_rearrangements(field: &Field, strike: Action, turn: u32, actions: &mut Vec<Action>) {
    let mut sim = field.clone();
    if sim.apply(strike, turn).is_err() {
        return;
    }
    let Some(id) = sim.active_hand(turn).mre_piece(&sim.set) else {
        return;
    };
    let piece = sim.set.get(id);

    let color = Color::active(turn);
    for y in color.territory_lo()..=color.territory_hi() {
        for x in 0..BOARD_COLS as u8 {
            let to = Cell::new_unchecked(x, y);
            if rules::droppable(&sim, piece, to, turn) {
                actions.push(with_rearrangement(strike, to));
            }
        }
    }
}

fn with_rearrangement(action: Action, to: Cell) -> Action {
    match action {
        Action::Strike { from, to: dest, .. } => Action::Strike {
            from,
            to: dest,
            rearrange: Some(to),
        },
        Action::StrikeDown { at, tier, .. } => Action::StrikeDown {
            at,
            tier,
            rearrange: Some(to),
        },
        Action::StrikeUp { at, tier, .. } => Action::StrikeUp {
            at,
            tier,
            rearrange: Some(to),
        },
        other => other,
    }
}

/// One search rooted at a fixed turn. Depth counts plies past the root;
/// scores are always from the root mover's perspective.
pub struct Searcher {
    level: u8,
    root_turn: u32,
}

impl Searcher {
    pub fn new(level: u8, root_turn: u32) -> Self {
        Self { level, root_turn }
    }

    /// Score one root candidate: apply it and search the reply tree.
    pub fn score(&self, action: Action, field: &Field) -> i64 {
        let mut next = field.clone();
        if next.apply(action, self.root_turn).is_err() {
            return i64::MIN;
        }
        self.minimax(i64::MIN, i64::MAX, self.root_turn, &next)
    }

    fn minimax(&self, mut alpha: i64, mut beta: i64, turn: u32, field: &Field) -> i64 {
        let depth = (turn - self.root_turn) as i64;
        let divisor = 1i64 << depth;

        let level_mod = self.level as i64 - 2;
        let depth_mod = depth * 4;

        if level_mod > depth_mod + 2 && rules::checkmate(field, turn + 1) {
            return CHECKMATE / divisor;
        }

        let bottom = level_mod / 4;
        if depth == bottom {
            let mut score = eval::material(field, turn);
            if level_mod > depth_mod {
                score -= eval::mobility(field, turn + 1, self.root_turn);
            }
            if level_mod > depth_mod + 1 {
                score += eval::mobility(field, turn + 2, self.root_turn);
            }
            return score;
        }

        let replies = candidates(field, turn + 1);

        let minimizing = (depth + 1) % 2 == 1;
        let (mut best, sign) = if minimizing {
            (i64::MAX, -1)
        } else {
            (i64::MIN, 1)
        };

        for action in replies {
            let mut next = field.clone();
            if next.apply(action, turn + 1).is_err() {
                continue;
            }
            let score = sign * self.minimax(alpha, beta, turn + 1, &next);

            if minimizing {
                best = best.min(score);
                beta = beta.min(best);
            } else {
                best = best.max(score);
                alpha = alpha.max(best);
            }
            if beta <= alpha {
                break;
            }
        }

        best
    }
}
