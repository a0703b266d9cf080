//! Position evaluation from the perspective of the side moving on `turn`.
//! Material counts every tier of every tower at full weight and hand pieces
//! at half; mobility counts reachable squares and the best capture on
//! offer, scaled down by how deep in the lookahead the position sits.

use gungi_core::action::Field;
use gungi_core::board::Board;
use gungi_core::movegen::{effective_moves, selectable};
use gungi_core::piece::Color;
use gungi_core::rules;

/// Score for a position where the opponent has no reply.
pub const CHECKMATE: i64 = 1_000_000_000;

pub fn material(field: &Field, turn: u32) -> i64 {
    let active = Color::active(turn);
    let mut score = 0i64;

    for cell in Board::cells() {
        for id in field.board.tower(cell.x, cell.y).iter() {
            let piece = field.set.get(id);
            let weight = piece.weight() as i64;
            if piece.alignment() == active {
                score += weight;
            } else {
                score -= weight;
            }
        }
    }

    for id in field.active_hand(turn).iter() {
        score += field.set.get(id).weight() as i64 / 2;
    }
    for id in field.passive_hand(turn).iter() {
        score -= field.set.get(id).weight() as i64 / 2;
    }

    score
}

/// Reachable-square count plus the weight of the juiciest strike target,
/// halved once per ply past `root_turn`.
pub fn mobility(field: &Field, turn: u32, root_turn: u32) -> i64 {
    let divisor = 1i64 << (turn - root_turn);
    let mut score = 0i64;
    let mut best = 0i64;

    for cell in Board::cells() {
        if selectable(&field.set, &field.board, cell.x, cell.y, turn) {
            for target in effective_moves(&field.set, &field.board, cell.x, cell.y) {
                if !rules::moveable_path(field, cell, target) {
                    continue;
                }
                if rules::strikeable(field, cell, target, turn) {
                    if let Some(prey) = field.board.top_piece(&field.set, target.x, target.y) {
                        best = best.max(prey.weight() as i64);
                    }
                }
                score += 1;
            }
        }

        let height = field.board.height(cell.x, cell.y);
        for tier in 0..height {
            if tier > 0 && rules::downwards(field, cell, tier, turn) {
                if let Some(prey) = field.board.piece_at(&field.set, cell.x, cell.y, tier - 1) {
                    best = best.max(prey.weight() as i64);
                }
            }
            if tier + 1 < height && rules::upwards(field, cell, tier, turn) {
                if let Some(prey) = field.board.piece_at(&field.set, cell.x, cell.y, tier + 1) {
                    best = best.max(prey.weight() as i64);
                }
            }
        }
    }

    score += field.active_hand(turn).top_pieces().len() as i64;

    (score + best) / divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use gungi_core::set::{PieceId, Set};
    use gungi_core::square::Cell;

    fn id(color: Color, offset: u8) -> PieceId {
        PieceId(Set::base(color) + offset)
    }

    #[test]
    fn starting_material_is_balanced() {
        let field = Field::new();
        assert_eq!(material(&field, 47), 0);
        assert_eq!(material(&field, 48), 0);
    }

    #[test]
    fn a_capture_swings_material_both_ways() {
        let mut field = Field::new();
        field
            .board
            .put_top(&field.set, id(Color::White, 10), 4, 4)
            .unwrap();
        field
            .board
            .put_top(&field.set, id(Color::Black, 1), 4, 5)
            .unwrap();
        let before = material(&field, 47);

        field
            .strike(Cell::new_unchecked(4, 5), Cell::new_unchecked(4, 4), 47)
            .unwrap();
        let after = material(&field, 47);

        // The hidden dragon left the board and its flip side landed in
        // black's hand at half weight.
        assert!(after > before);
        assert_eq!(material(&field, 48), -after);
    }

    #[test]
    fn betrayed_pieces_count_for_their_new_side() {
        let mut field = Field::new();
        field.hand_mut(Color::Black).clear();
        field.hand_mut(Color::White).clear();
        field.set.get_mut(id(Color::White, 22)).flip();
        field
            .board
            .put_top(&field.set, id(Color::White, 22), 4, 4)
            .unwrap();

        // A betrayed white gold scores for black.
        assert_eq!(material(&field, 47), 500);
        assert_eq!(material(&field, 48), -500);
    }

    #[test]
    fn mobility_counts_reachable_squares_and_hand_tops() {
        let mut field = Field::new();
        field.hand_mut(Color::Black).clear();
        field.hand_mut(Color::White).clear();
        field
            .board
            .put_top(&field.set, id(Color::Black, 14), 4, 5)
            .unwrap();

        // One pawn step, nothing in hand, no captures.
        assert_eq!(mobility(&field, 47, 47), 1);
        assert_eq!(mobility(&field, 48, 47), 0);
    }

    #[test]
    fn mobility_halves_per_ply_of_lookahead() {
        let mut field = Field::new();
        field.hand_mut(Color::Black).clear();
        field.hand_mut(Color::White).clear();
        field
            .board
            .put_top(&field.set, id(Color::Black, 0), 4, 4)
            .unwrap();

        let now = mobility(&field, 47, 47);
        assert_eq!(now, 8);
        assert_eq!(mobility(&field, 49, 47), now / 4);
    }
}
