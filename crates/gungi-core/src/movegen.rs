//! Effective move generation: the raw face patterns from `piece`, adjusted
//! for tower tier, range-expansion boosts, mixed-alignment towers, and
//! path blocking.

use crate::board::{Board, MAX_HEIGHT};
use crate::piece::{Color, TargetList};
use crate::set::Set;
use crate::square::Cell;

/// Whether the top piece at (x, y) belongs to the side moving on `turn`.
pub fn selectable(set: &Set, board: &Board, x: u8, y: u8, turn: u32) -> bool {
    match board.top_piece(set, x, y) {
        Some(piece) => piece.accessible(turn),
        None => false,
    }
}

/// Moves of the top piece at (x, y) before any legality filtering.
///
/// A piece riding a tower moves with the pattern of its tier. Standing in a
/// friendly range expansion boosts it one tier higher, as long as the tower
/// itself is not at full height. A piece sitting directly on an enemy piece
/// loses its own movement entirely and crawls with the gold pattern.
pub fn effective_moves(set: &Set, board: &Board, x: u8, y: u8) -> TargetList {
    let height = board.height(x, y);
    let Some(piece) = board.top_piece(set, x, y) else {
        return TargetList::new();
    };

    let grounded = height == 1
        || board
            .piece_at(set, x, y, height - 2)
            .is_some_and(|below| below.alignment() == piece.alignment());

    if !grounded {
        return piece.gold_moves(x, y);
    }

    let boosted = height < MAX_HEIGHT
        && piece.receives_mre()
        && board.mre.in_range(piece.alignment(), x, y);

    let tier = if boosted { height } else { height - 1 };
    piece.moves_at(x, y, tier as u8)
}

/// Whether the path from `from` to `to` is obstructed for the piece on top
/// of `from`.
///
/// Jumping pieces ignore towers but cannot cross an enemy piece standing in
/// its own range expansion; everything else is stopped by any occupied
/// intermediate cell. The knight-like spy/clandestinite moves check only
/// their orthogonal waypoint, and only for range-expansion blocking.
pub fn blocked(set: &Set, board: &Board, from: Cell, to: Cell) -> bool {
    let Some(piece) = board.top_piece(set, from.x, from.y) else {
        return false;
    };
    let alignment = piece.alignment();

    let dx = to.x as i32 - from.x as i32;
    let dy = to.y as i32 - from.y as i32;

    if dx.abs() == 1 && dy.abs() == 2 {
        let waypoint_y = from.y as i32 + dy.signum();
        return mre_blocked(set, board, alignment, from.x, waypoint_y as u8);
    }

    let (sx, sy) = (dx.signum(), dy.signum());
    let (mut cx, mut cy) = (from.x as i32 + sx, from.y as i32 + sy);
    while (cx, cy) != (to.x as i32, to.y as i32) {
        let obstructed = if piece.jumps() {
            mre_blocked(set, board, alignment, cx as u8, cy as u8)
        } else {
            board.height(cx as u8, cy as u8) > 0
        };
        if obstructed {
            return true;
        }
        cx += sx;
        cy += sy;
    }

    false
}

/// Whether (x, y) is topped by an enemy piece standing inside its own
/// side's range expansion. Such pieces cannot be jumped over.
pub fn mre_blocked(set: &Set, board: &Board, alignment: Color, x: u8, y: u8) -> bool {
    let Some(piece) = board.top_piece(set, x, y) else {
        return false;
    };
    let occupant = piece.alignment();
    occupant != alignment && board.mre.in_range(occupant, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Face;
    use crate::set::PieceId;

    fn setup() -> (Set, Board) {
        (Set::new(), Board::new())
    }

    fn id(color: Color, offset: u8) -> PieceId {
        PieceId(Set::base(color) + offset)
    }

    fn contains(list: &TargetList, x: u8, y: u8) -> bool {
        list.iter().any(|cell| cell.x == x && cell.y == y)
    }

    #[test]
    fn ground_level_pawn_steps_forward() {
        let (set, mut board) = setup();
        board.put_top(&set, id(Color::White, 14), 4, 2).unwrap();

        let moves = effective_moves(&set, &board, 4, 2);
        assert_eq!(moves.len(), 1);
        assert!(contains(&moves, 4, 3));
    }

    #[test]
    fn tier_two_pattern_on_a_friendly_tower() {
        let (set, mut board) = setup();
        board.put_top(&set, id(Color::Black, 14), 4, 4).unwrap();
        board.put_top(&set, id(Color::Black, 15), 4, 4).unwrap();

        // A black pawn on tier 2 gains the diagonal forward steps.
        let moves = effective_moves(&set, &board, 4, 4);
        assert!(contains(&moves, 4, 3));
        assert!(contains(&moves, 3, 3));
        assert!(contains(&moves, 5, 3));
    }

    #[test]
    fn enemy_piece_below_forces_gold_pattern() {
        let (set, mut board) = setup();
        board.put_top(&set, id(Color::White, 14), 4, 4).unwrap();
        board.put_top(&set, id(Color::Black, 10), 4, 4).unwrap();

        // A hidden dragon pinning an enemy pawn moves like gold, not like
        // its tier pattern.
        let moves = effective_moves(&set, &board, 4, 4);
        assert_eq!(moves.len(), 6);
        assert!(contains(&moves, 4, 3));
        assert!(contains(&moves, 3, 3));
        assert!(contains(&moves, 5, 3));
        assert!(contains(&moves, 3, 4));
        assert!(contains(&moves, 5, 4));
        assert!(contains(&moves, 4, 5));
    }

    #[test]
    fn range_expansion_boosts_one_tier() {
        let (set, mut board) = setup();
        board.put_top(&set, id(Color::White, 8), 4, 1).unwrap();
        board.put_top(&set, id(Color::White, 14), 4, 2).unwrap();

        // Inside the catapult's zone a ground pawn moves with the tier-2
        // pattern.
        let moves = effective_moves(&set, &board, 4, 2);
        assert!(contains(&moves, 3, 3));
        assert!(contains(&moves, 5, 3));
    }

    #[test]
    fn full_towers_get_no_boost() {
        let (set, mut board) = setup();
        board.put_top(&set, id(Color::White, 8), 4, 1).unwrap();
        board.put_top(&set, id(Color::White, 14), 4, 2).unwrap();
        board.put_top(&set, id(Color::White, 15), 4, 2).unwrap();
        board.put_top(&set, id(Color::White, 3), 4, 2).unwrap();

        // Tier 3 is the ceiling; the samurai keeps its tier-3 pattern.
        let moves = effective_moves(&set, &board, 4, 2);
        let plain = set
            .get(id(Color::White, 3))
            .moves_at(4, 2, 2);
        assert_eq!(moves, plain);
    }

    #[test]
    fn sliders_stop_at_occupied_cells() {
        let (set, mut board) = setup();
        board.put_top(&set, id(Color::White, 10), 4, 0).unwrap();
        board.put_top(&set, id(Color::Black, 14), 4, 5).unwrap();

        let from = Cell::new_unchecked(4, 0);
        assert!(!blocked(&set, &board, from, Cell::new_unchecked(4, 4)));
        assert!(!blocked(&set, &board, from, Cell::new_unchecked(4, 5)));
        assert!(blocked(&set, &board, from, Cell::new_unchecked(4, 6)));
    }

    #[test]
    fn jumpers_ignore_towers_but_not_expanded_enemies() {
        let (mut set, mut board) = setup();
        // Black clandestinite jumping over a white tower.
        let spy = id(Color::Black, 5);
        set.get_mut(spy).flip();
        board.put_top(&set, spy, 4, 8).unwrap();
        board.put_top(&set, id(Color::White, 14), 4, 6).unwrap();
        board.put_top(&set, id(Color::White, 15), 4, 6).unwrap();

        let from = Cell::new_unchecked(4, 8);
        assert!(!blocked(&set, &board, from, Cell::new_unchecked(4, 5)));

        // A white fortress extends its zone up file 4 over the tower.
        board.put_top(&set, id(Color::White, 9), 4, 3).unwrap();
        assert!(mre_blocked(&set, &board, Color::Black, 4, 6));
        assert!(blocked(&set, &board, from, Cell::new_unchecked(4, 5)));
    }

    #[test]
    fn knight_moves_check_only_the_orthogonal_waypoint() {
        let (set, mut board) = setup();
        board.put_top(&set, id(Color::Black, 5), 4, 8).unwrap();
        board.put_top(&set, id(Color::White, 14), 4, 7).unwrap();

        // An ordinary tower on the waypoint does not block the spy.
        let from = Cell::new_unchecked(4, 8);
        assert!(!blocked(&set, &board, from, Cell::new_unchecked(3, 6)));
        assert!(!blocked(&set, &board, from, Cell::new_unchecked(5, 6)));
    }

    #[test]
    fn selectable_follows_turn_parity() {
        let (set, mut board) = setup();
        board.put_top(&set, id(Color::Black, 14), 0, 0).unwrap();
        assert!(selectable(&set, &board, 0, 0, 47));
        assert!(!selectable(&set, &board, 0, 0, 48));
        assert!(!selectable(&set, &board, 1, 0, 47));
    }
}
