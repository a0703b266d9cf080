//! Legality predicates. Anything that needs to know "what would happen"
//! clones the field, applies the action with the shared mutators, and
//! inspects the outcome; there is no second rules engine for speculation.

use crate::action::Field;
use crate::board::{Board, MAX_HEIGHT};
use crate::movegen::{self, blocked, effective_moves, selectable};
use crate::piece::{Color, Face, Piece};
use crate::square::Cell;

/// Whether `color`'s commander is threatened: either an enemy piece other
/// than a fortress sits directly beneath it, or any enemy piece has an
/// unobstructed effective move onto its square.
pub fn check(field: &Field, color: Color) -> bool {
    let Some(comm) = field.board.commander_cell(&field.set, color) else {
        return false;
    };

    let z = field.board.height(comm.x, comm.y) - 1;
    if z > 0 {
        if let Some(below) = field.board.piece_at(&field.set, comm.x, comm.y, z - 1) {
            if below.alignment() != color && below.side_up() != Face::Fortress {
                return true;
            }
        }
    }

    for cell in Board::cells() {
        let Some(top) = field.board.top_piece(&field.set, cell.x, cell.y) else {
            continue;
        };
        if top.alignment() == color {
            continue;
        }
        for target in effective_moves(&field.set, &field.board, cell.x, cell.y) {
            if !moveable_path(field, cell, target) {
                continue;
            }
            if target == comm {
                return true;
            }
        }
    }

    false
}

/// Whether the side moving on `turn` has no legal action at all. Runs two
/// passes: one ignoring pawn and bronze actions, one with only them, since
/// those pieces themselves may not deliver the final blow.
pub fn checkmate(field: &Field, turn: u32) -> bool {
    checkmate_pass(field, turn, false) && checkmate_pass(field, turn, true)
}

fn checkmate_pass(field: &Field, turn: u32, deferred: bool) -> bool {
    let active = Color::active(turn);

    for cell in Board::cells() {
        for id in field.hand(active).top_pieces() {
            let piece = field.set.get(id);
            let restricted = matches!(piece.side_up(), Face::Pawn | Face::Bronze);
            if restricted != deferred {
                continue;
            }
            if droppable(field, piece, cell, turn) {
                return false;
            }
        }

        if selectable(&field.set, &field.board, cell.x, cell.y, turn) {
            let top = field
                .board
                .top_piece(&field.set, cell.x, cell.y)
                .map(|piece| piece.side_up() == Face::Bronze)
                .unwrap_or(false);
            if top == deferred {
                for target in effective_moves(&field.set, &field.board, cell.x, cell.y) {
                    if !moveable_path(field, cell, target) {
                        continue;
                    }
                    if moveable(field, cell, target, turn) {
                        return false;
                    }
                    if strikeable(field, cell, target, turn) {
                        return false;
                    }
                }
            }
        }

        if !deferred && exchangeable(field, cell, turn) {
            return false;
        }
        if !deferred && substitutable(field, cell, turn) {
            return false;
        }

        let height = field.board.height(cell.x, cell.y);
        if height < 2 {
            continue;
        }
        for z in 0..height {
            let bronze = field
                .board
                .piece_at(&field.set, cell.x, cell.y, z)
                .map(|piece| piece.side_up() == Face::Bronze)
                .unwrap_or(false);
            if bronze != deferred {
                continue;
            }
            if z > 0 && downwards(field, cell, z, turn) {
                return false;
            }
            if z < height - 1 && upwards(field, cell, z, turn) {
                return false;
            }
        }
    }

    true
}

/// Geometric move filter: no duplicate in the destination tower, no second
/// bronze in the destination file, no obstruction on the way.
pub fn moveable_path(field: &Field, from: Cell, to: Cell) -> bool {
    let Some(piece) = field.board.top_piece(&field.set, from.x, from.y) else {
        return false;
    };

    if field.board.tower_contains(&field.set, piece, to.x, to.y) {
        return false;
    }
    if to.x != from.x
        && piece.side_up() == Face::Bronze
        && field.board.file_contains(&field.set, piece, to.x)
    {
        return false;
    }
    !blocked(&field.set, &field.board, from, to)
}

/// Full non-capturing move legality between two cells already passing the
/// geometric filter.
pub fn moveable(field: &Field, from: Cell, to: Cell, turn: u32) -> bool {
    let height = field.board.height(to.x, to.y);
    if height == MAX_HEIGHT {
        return false;
    }
    let Some(piece) = field.board.top_piece(&field.set, from.x, from.y) else {
        return false;
    };
    if height > 0 {
        if let Some(top) = field.board.top_piece(&field.set, to.x, to.y) {
            if top.side_up() == Face::Commander {
                return false;
            }
        }
        // A checked commander cannot flee into a tower.
        if piece.side_up() == Face::Commander && check(field, Color::active(turn)) {
            return false;
        }
    }

    let bronze = piece.side_up() == Face::Bronze;
    let mut sim = field.clone();
    if sim.move_piece(from, to, turn).is_err() {
        return false;
    }
    if bronze && checkmate(&sim, turn + 1) {
        return false;
    }
    !check(&sim, Color::active(turn))
}

/// Lateral strike legality between two cells already passing the geometric
/// filter.
pub fn strikeable(field: &Field, from: Cell, to: Cell, turn: u32) -> bool {
    let height = field.board.height(to.x, to.y);
    if height == 0 {
        return false;
    }
    let Some(piece) = field.board.top_piece(&field.set, from.x, from.y) else {
        return false;
    };
    let Some(target) = field.board.top_piece(&field.set, to.x, to.y) else {
        return false;
    };
    if target.alignment() == piece.alignment() {
        return false;
    }
    if height > 1 && piece.side_up() == Face::Commander && check(field, Color::active(turn)) {
        return false;
    }

    let bronze = piece.side_up() == Face::Bronze;
    let mut sim = field.clone();
    if sim.strike(from, to, turn).is_err() {
        return false;
    }
    // Remaining in check is tolerated only while a captured catapult or
    // fortress still awaits rearrangement.
    if check(&sim, Color::active(turn)) && sim.active_hand(turn).mre_piece(&sim.set).is_none() {
        return false;
    }
    if bronze && checkmate(&sim, turn + 1) {
        return false;
    }
    true
}

/// Whether any tier of the tower at `at` can launch an immobile strike.
pub fn tower_strikeable(field: &Field, at: Cell, turn: u32) -> bool {
    let height = field.board.height(at.x, at.y);
    if height < 2 {
        return false;
    }
    for z in 0..height {
        if z > 0 && downwards(field, at, z, turn) {
            return true;
        }
        if z < height - 1 && upwards(field, at, z, turn) {
            return true;
        }
    }
    false
}

/// Immobile strike down from tier z onto tier z - 1.
pub fn downwards(field: &Field, at: Cell, z: usize, turn: u32) -> bool {
    if z == 0 {
        return false;
    }
    let Some(attacker) = field.board.piece_at(&field.set, at.x, at.y, z) else {
        return false;
    };
    let Some(target) = field.board.piece_at(&field.set, at.x, at.y, z - 1) else {
        return false;
    };
    if !attacker.accessible(turn) {
        return false;
    }
    if attacker.alignment() == target.alignment() {
        return false;
    }

    let bronze = attacker.side_up() == Face::Bronze;
    let mut sim = field.clone();
    if sim.strike_down(at, z, turn).is_err() {
        return false;
    }
    if check(&sim, Color::active(turn)) && sim.active_hand(turn).mre_piece(&sim.set).is_none() {
        return false;
    }
    if bronze && checkmate(&sim, turn + 1) {
        return false;
    }
    true
}

/// Immobile strike up from tier z onto tier z + 1.
pub fn upwards(field: &Field, at: Cell, z: usize, turn: u32) -> bool {
    let Some(attacker) = field.board.piece_at(&field.set, at.x, at.y, z) else {
        return false;
    };
    let Some(target) = field.board.piece_at(&field.set, at.x, at.y, z + 1) else {
        return false;
    };
    // A fortress cannot make an immobile strike.
    if z == 0 && attacker.side_up() == Face::Fortress {
        return false;
    }
    if !attacker.accessible(turn) {
        return false;
    }
    if attacker.alignment() == target.alignment() {
        return false;
    }

    let bronze = attacker.side_up() == Face::Bronze;
    let mut sim = field.clone();
    if sim.strike_up(at, z, turn).is_err() {
        return false;
    }
    if check(&sim, Color::active(turn)) && sim.active_hand(turn).mre_piece(&sim.set).is_none() {
        return false;
    }
    if bronze && checkmate(&sim, turn + 1) {
        return false;
    }
    true
}

/// Tier exchange legality: a full tower with a controlled captain at top or
/// bottom, no catapult or fortress on the ground, no commander on top, not
/// while in check, and not again while the square's cooldown record lives.
pub fn exchangeable(field: &Field, at: Cell, turn: u32) -> bool {
    if field.board.height(at.x, at.y) != MAX_HEIGHT {
        return false;
    }
    let Some(bottom) = field.board.piece_at(&field.set, at.x, at.y, 0) else {
        return false;
    };
    let Some(top) = field.board.piece_at(&field.set, at.x, at.y, 2) else {
        return false;
    };
    if !bottom.accessible(turn) || !top.accessible(turn) {
        return false;
    }
    if bottom.side_up() != Face::Captain && top.side_up() != Face::Captain {
        return false;
    }
    if bottom.imparts_mre() || top.side_up() == Face::Commander {
        return false;
    }
    if check(field, Color::active(turn)) {
        return false;
    }
    if field.board.exchanged(at) {
        return false;
    }

    let mut sim = field.clone();
    if sim.exchange(at, turn).is_err() {
        return false;
    }
    !check(&sim, Color::active(turn))
}

/// Commander substitution legality: a lone controlled samurai orthogonally
/// adjacent to its checked commander, whose swap relieves the check.
pub fn substitutable(field: &Field, at: Cell, turn: u32) -> bool {
    if field.board.height(at.x, at.y) != 1 {
        return false;
    }
    let Some(piece) = field.board.piece_at(&field.set, at.x, at.y, 0) else {
        return false;
    };
    if !piece.accessible(turn) {
        return false;
    }
    if piece.side_up() != Face::Samurai {
        return false;
    }
    if !check(field, Color::active(turn)) {
        return false;
    }

    let Some(comm) = field.board.commander_cell(&field.set, Color::active(turn)) else {
        return false;
    };
    let dx = (comm.x as i32 - at.x as i32).abs();
    let dy = (comm.y as i32 - at.y as i32).abs();
    if dx + dy != 1 {
        return false;
    }

    let mut sim = field.clone();
    if sim.substitute(at).is_err() {
        return false;
    }
    !check(&sim, Color::active(turn))
}

/// Arrangement placement legality. Each player must finish the arrangement
/// with exactly one pawn per file, so files cannot fill up pawnless, and
/// the commander may not wall himself in behind two full towers.
pub fn placeable(field: &Field, piece: Piece, to: Cell) -> bool {
    if !stackable(field, piece, to) {
        return false;
    }

    let alignment = piece.alignment();
    if field.board.file_contains_pawn(&field.set, alignment, to.x) {
        if piece.side_up() == Face::Pawn {
            return false;
        }
    } else if piece.side_up() != Face::Pawn {
        if field.board.openings(&field.set, alignment, to.x) == 1 {
            return false;
        }
        if piece.side_up() == Face::Commander && field.board.full_towers(alignment, to.x) == 2 {
            return false;
        }
    }

    true
}

/// Raw stacking legality: height, duplicates, commanders, and the
/// ground-only catapult and fortress.
pub fn stackable(field: &Field, piece: Piece, to: Cell) -> bool {
    let height = field.board.height(to.x, to.y);
    if height == MAX_HEIGHT {
        return false;
    }
    if field.board.tower_contains(&field.set, piece, to.x, to.y) {
        return false;
    }
    if height > 0 {
        if let Some(top) = field.board.top_piece(&field.set, to.x, to.y) {
            if top.side_up() == Face::Commander {
                return false;
            }
        }
        if piece.imparts_mre() {
            return false;
        }
    }
    true
}

/// In-game drop legality.
pub fn droppable(field: &Field, piece: Piece, to: Cell, turn: u32) -> bool {
    if !stackable(field, piece, to) {
        return false;
    }

    if field.board.height(to.x, to.y) > 0 {
        let Some(top) = field.board.top_piece(&field.set, to.x, to.y) else {
            return false;
        };
        if top.alignment() != piece.alignment() {
            return false;
        }
        if !top.links() {
            return false;
        }
        // Front pieces stack on clandestinites, back pieces on spies,
        // never the other way around.
        let forbidden = match piece.side {
            crate::piece::Side::Back => Face::Clandestinite,
            crate::piece::Side::Front => Face::Spy,
        };
        if top.side_up() == forbidden {
            return false;
        }
    }

    if recoverable_with(field, piece, to, false) {
        return false;
    }
    if drop_leaves_in_check(field, piece, to) {
        return false;
    }

    if matches!(piece.side_up(), Face::Pawn | Face::Bronze) {
        if field.board.file_contains(&field.set, piece, to.x) {
            return false;
        }
        if drop_checkmates(field, piece, to, turn) {
            return false;
        }
    }

    true
}

/// Whether dropping `piece` at `to` leaves its own commander in check.
fn drop_leaves_in_check(field: &Field, piece: Piece, to: Cell) -> bool {
    let mut sim = field.clone();
    if sim.place(piece, to).is_err() {
        return true;
    }
    check(&sim, piece.alignment())
}

/// Whether dropping `piece` at `to` checkmates the opponent; forbidden for
/// pawns and bronze.
fn drop_checkmates(field: &Field, piece: Piece, to: Cell, turn: u32) -> bool {
    let mut sim = field.clone();
    if sim.place(piece, to).is_err() {
        return true;
    }
    checkmate(&sim, turn + 1)
}

/// Whether the top piece at `at` is in forced recovery: a recovering face
/// in the last two rows for its alignment with no effective moves left.
pub fn recoverable_at(field: &Field, at: Cell) -> bool {
    let Some(piece) = field.board.top_piece(&field.set, at.x, at.y) else {
        return false;
    };
    if !piece.recovers() {
        return false;
    }
    let last_rows = match piece.alignment() {
        Color::White => at.y >= 7,
        Color::Black => at.y <= 1,
    };
    if !last_rows {
        return false;
    }
    effective_moves(&field.set, &field.board, at.x, at.y).is_empty()
}

/// Whether `piece`, hypothetically standing on top of `at` (optionally in
/// place of the current top), would be in forced recovery.
pub fn recoverable_with(field: &Field, piece: Piece, at: Cell, replace: bool) -> bool {
    if !piece.recovers() {
        return false;
    }
    let last_rows = match piece.alignment() {
        Color::White => at.y >= 7,
        Color::Black => at.y <= 1,
    };
    if !last_rows {
        return false;
    }

    // Evaluate the hypothetical top's effective moves without mutating the
    // board. Recovering faces never project ranges themselves, and the
    // replaced top (an enemy piece when striking) cannot contribute to the
    // mover's own range, so the live range map is accurate enough.
    let height = if replace {
        field.board.height(at.x, at.y)
    } else {
        field.board.height(at.x, at.y) + 1
    };
    let below = if height >= 2 {
        field.board.piece_at(&field.set, at.x, at.y, height - 2)
    } else {
        None
    };
    let grounded = height == 1 || below.is_some_and(|b| b.alignment() == piece.alignment());
    let moves = if !grounded {
        piece.gold_moves(at.x, at.y)
    } else {
        let boosted = height < MAX_HEIGHT
            && piece.receives_mre()
            && field.board.mre.in_range(piece.alignment(), at.x, at.y);
        let tier = if boosted { height } else { height - 1 };
        piece.moves_at(at.x, at.y, tier as u8)
    };
    moves.is_empty()
}

/// Whether removing tier z would leave the resulting top in forced
/// recovery.
pub fn recoverable_without_tier(field: &Field, at: Cell, z: usize) -> bool {
    let mut sim = field.clone();
    if sim.board.remove_at(&sim.set, at.x, at.y, z).is_err() {
        return false;
    }
    recoverable_at(&sim, at)
}

/// Whether a lone piece of `color` at (x, y) loses its last moves when a
/// range projection disappears; only single-tier towers are affected.
pub fn recoverable_after_mre_loss(field: &Field, color: Color, x: u8, y: u8) -> bool {
    if field.board.height(x, y) != 1 {
        return false;
    }
    let Some(piece) = field.board.piece_at(&field.set, x, y, 0) else {
        return false;
    };
    if piece.alignment() != color {
        return false;
    }
    if !piece.recovers() {
        return false;
    }
    effective_moves(&field.set, &field.board, x, y).is_empty()
}

/// Whether `piece` has at least one droppable square inside the active
/// player's territory; gates the forced-rearrangement flow.
pub fn rearrangeable(field: &Field, piece: Piece, turn: u32) -> bool {
    let active = Color::active(turn);
    for y in active.territory_lo()..=active.territory_hi() {
        for x in 0..crate::square::BOARD_COLS as u8 {
            if droppable(field, piece, Cell::new_unchecked(x, y), turn) {
                return true;
            }
        }
    }
    false
}

/// Whether a lateral strike would capture a lance and hand back a
/// rearrangeable catapult or fortress.
pub fn rearrangeable_lat(field: &Field, from: Cell, to: Cell, turn: u32) -> bool {
    let Some(target) = field.board.top_piece(&field.set, to.x, to.y) else {
        return false;
    };
    let Some(striker) = field.board.top_piece(&field.set, from.x, from.y) else {
        return false;
    };
    if target.side_up() != Face::Lance {
        return false;
    }
    if striker.side_up() == Face::Bronze {
        return false;
    }
    if recoverable_with(field, striker, to, true) {
        return false;
    }

    let mut sim = field.clone();
    if sim.strike(from, to, turn).is_err() {
        return false;
    }
    sim.active_hand(turn).mre_piece(&sim.set).is_some()
}

/// Vertical-strike variant of `rearrangeable_lat`.
pub fn rearrangeable_vert(field: &Field, at: Cell, z1: usize, z2: usize, turn: u32) -> bool {
    let Some(target) = field.board.piece_at(&field.set, at.x, at.y, z2) else {
        return false;
    };
    let Some(attacker) = field.board.piece_at(&field.set, at.x, at.y, z1) else {
        return false;
    };
    if target.side_up() != Face::Lance {
        return false;
    }
    if attacker.side_up() == Face::Bronze {
        return false;
    }

    let height = field.board.height(at.x, at.y);
    if z1 > z2 && z1 == height - 1 && recoverable_without_tier(field, at, z2) {
        return false;
    }
    if z1 < z2 && z1 == height - 2 && recoverable_without_tier(field, at, z2) {
        return false;
    }

    let mut sim = field.clone();
    let applied = if z1 > z2 {
        sim.strike_down(at, z1, turn)
    } else {
        sim.strike_up(at, z1, turn)
    };
    if applied.is_err() {
        return false;
    }
    sim.active_hand(turn).mre_piece(&sim.set).is_some()
}
