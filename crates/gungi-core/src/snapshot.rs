//! Compact text snapshots of a game, in the spirit of shogi SFEN strings:
//!
//! ```text
//! <board> <black hand> <white hand> <turn> <exchanges> <pending> <positions>
//! ```
//!
//! The board lists ranks from row 8 down to row 0, separated by `/`. Within
//! a rank, digits count empty cells, a lone code is a single piece, and a
//! parenthesized run is a tower from bottom tier to top. Each piece code is
//! one letter naming the front face of its set slot (lowercase black,
//! uppercase white) with a `+` prefix when the back face is up. Hands are
//! concatenated codes or `-`; exchanges are `xy@turn` records or `-`.
//!
//! The pending field is `r` when a strike left a rearrangement drop owed,
//! else `-`. The positions field carries the repetition history: one
//! `<ranks>*<count>` entry per distinct position, comma-separated, `-` when
//! empty. Position ranks use the board's run-length scheme but encode each
//! tier as a single letter from a fixed (face, color) alphabet, so restored
//! entries compare equal to positions captured after the load.

use std::fmt::Write;

use thiserror::Error;

use crate::action::Field;
use crate::board::{Board, MAX_HEIGHT};
use crate::game::Game;
use crate::hand::Hand;
use crate::piece::{Color, Side};
use crate::position::Position;
use crate::set::{PieceId, Set, PIECE_COUNT};
use crate::square::{Cell, BOARD_COLS, BOARD_ROWS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot is missing its {0} field")]
    MissingField(&'static str),
    #[error("invalid snapshot: {0}")]
    Validation(String),
}

/// Set-slot codes: one letter per front face, mapped to the offsets that
/// carry it within a color's 23-piece allotment.
const KINDS: [(char, &[u8]); 12] = [
    ('k', &[0]),
    ('c', &[1, 2]),
    ('s', &[3, 4]),
    ('y', &[5, 6, 7]),
    ('t', &[8]),
    ('f', &[9]),
    ('h', &[10]),
    ('r', &[11]),
    ('b', &[12, 13]),
    ('p', &[14, 15, 16, 17, 18, 19, 20]),
    ('v', &[21]),
    ('g', &[22]),
];

/// Letters for repetition-position tier codes, indexed by
/// `(face_code << 1) | color`.
const POSITION_CODES: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOP";

pub fn save(game: &Game) -> String {
    let field = game.field();
    let mut out = String::new();

    for y in (0..BOARD_ROWS as u8).rev() {
        if y < (BOARD_ROWS - 1) as u8 {
            out.push('/');
        }
        let mut empties = 0;
        for x in 0..BOARD_COLS as u8 {
            let tower = field.board.tower(x, y);
            if tower.height() == 0 {
                empties += 1;
                continue;
            }
            flush_empties(&mut out, &mut empties);
            if tower.height() > 1 {
                out.push('(');
            }
            for id in tower.iter() {
                push_code(&mut out, &field.set, id);
            }
            if tower.height() > 1 {
                out.push(')');
            }
        }
        flush_empties(&mut out, &mut empties);
    }

    out.push(' ');
    push_hand(&mut out, field, Color::Black);
    out.push(' ');
    push_hand(&mut out, field, Color::White);

    let _ = write!(out, " {}", game.turn());

    out.push(' ');
    if field.board.exchanges().is_empty() {
        out.push('-');
    } else {
        for (i, record) in field.board.exchanges().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let _ = write!(out, "{}{}@{}", record.cell.x, record.cell.y, record.turn);
        }
    }

    out.push(' ');
    out.push(if game.pending_rearrangement() { 'r' } else { '-' });

    out.push(' ');
    if game.positions().is_empty() {
        out.push('-');
    } else {
        for (i, position) in game.positions().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_position(&mut out, position);
        }
    }

    out
}

pub fn load(input: &str) -> Result<Game, SnapshotError> {
    let mut fields = input.split_whitespace();
    let board_field = fields.next().ok_or(SnapshotError::MissingField("board"))?;
    let black_field = fields
        .next()
        .ok_or(SnapshotError::MissingField("black hand"))?;
    let white_field = fields
        .next()
        .ok_or(SnapshotError::MissingField("white hand"))?;
    let turn_field = fields.next().ok_or(SnapshotError::MissingField("turn"))?;
    let exchange_field = fields
        .next()
        .ok_or(SnapshotError::MissingField("exchanges"))?;
    let pending_field = fields
        .next()
        .ok_or(SnapshotError::MissingField("rearrangement"))?;
    let position_field = fields
        .next()
        .ok_or(SnapshotError::MissingField("positions"))?;
    if fields.next().is_some() {
        return Err(SnapshotError::Validation("trailing fields".into()));
    }

    let mut set = Set::new();
    let mut used = [false; PIECE_COUNT];
    let mut board = Board::new();

    let ranks: Vec<&str> = board_field.split('/').collect();
    if ranks.len() != BOARD_ROWS {
        return Err(SnapshotError::Validation(format!(
            "expected {} ranks, found {}",
            BOARD_ROWS,
            ranks.len()
        )));
    }

    for (i, rank) in ranks.iter().enumerate() {
        let y = (BOARD_ROWS - 1 - i) as u8;
        let mut x = 0u8;
        let mut chars = rank.chars().peekable();

        while let Some(ch) = chars.next() {
            if let Some(run) = ch.to_digit(10) {
                if run == 0 {
                    return Err(SnapshotError::Validation("zero-length empty run".into()));
                }
                x += run as u8;
            } else if ch == '(' {
                let mut height = 0;
                loop {
                    match chars.next() {
                        Some(')') => break,
                        Some(tier) => {
                            let id = claim(&mut set, &mut used, tier, &mut chars)?;
                            place(&set, &mut board, id, x, y)?;
                            height += 1;
                        }
                        None => {
                            return Err(SnapshotError::Validation("unclosed tower".into()))
                        }
                    }
                }
                if height < 2 {
                    return Err(SnapshotError::Validation(
                        "towers need at least two tiers".into(),
                    ));
                }
                x += 1;
            } else {
                let id = claim(&mut set, &mut used, ch, &mut chars)?;
                place(&set, &mut board, id, x, y)?;
                x += 1;
            }
            if x > BOARD_COLS as u8 {
                return Err(SnapshotError::Validation(format!("rank {y} overflows")));
            }
        }
        if x != BOARD_COLS as u8 {
            return Err(SnapshotError::Validation(format!(
                "rank {y} covers {x} cells"
            )));
        }
    }

    let black_ids = claim_hand(&mut set, &mut used, black_field)?;
    let white_ids = claim_hand(&mut set, &mut used, white_field)?;

    if let Some(missing) = used.iter().position(|&claimed| !claimed) {
        return Err(SnapshotError::Validation(format!(
            "piece {missing} is neither on the board nor in a hand"
        )));
    }

    let mut hands = [Hand::new(Color::Black), Hand::new(Color::White)];
    for id in black_ids {
        hands[Color::Black.index()].insert(&set, id);
    }
    for id in white_ids {
        hands[Color::White.index()].insert(&set, id);
    }

    let turn: u32 = turn_field
        .parse()
        .map_err(|_| SnapshotError::Validation(format!("bad turn {turn_field:?}")))?;
    if turn == 0 {
        return Err(SnapshotError::Validation("turns start at 1".into()));
    }

    if exchange_field != "-" {
        for record in exchange_field.split(',') {
            let (cell, at) = parse_exchange(record)?;
            board.record_exchange(cell, at);
        }
    }

    let pending = match pending_field {
        "-" => false,
        "r" => true,
        other => {
            return Err(SnapshotError::Validation(format!(
                "bad rearrangement marker {other:?}"
            )))
        }
    };

    let mut positions = Vec::new();
    if position_field != "-" {
        for entry in position_field.split(',') {
            positions.push(parse_position(entry)?);
        }
    }

    let field = Field { set, board, hands };
    if pending && field.active_hand(turn).mre_piece(&field.set).is_none() {
        return Err(SnapshotError::Validation(
            "rearrangement pending without a catapult or fortress in hand".into(),
        ));
    }

    Ok(Game::from_saved(field, turn, pending, positions))
}

fn flush_empties(out: &mut String, empties: &mut u32) {
    if *empties > 0 {
        let _ = write!(out, "{empties}");
        *empties = 0;
    }
}

fn push_code(out: &mut String, set: &Set, id: PieceId) {
    let piece = set.get(id);
    let offset = id.0 - Set::base(piece.color);
    let letter = KINDS
        .iter()
        .find(|(_, offsets)| offsets.contains(&offset))
        .map(|(letter, _)| *letter)
        .unwrap_or('?');

    if piece.side == Side::Back {
        out.push('+');
    }
    out.push(match piece.color {
        Color::Black => letter,
        Color::White => letter.to_ascii_uppercase(),
    });
}

fn push_hand(out: &mut String, field: &Field, color: Color) {
    let mut ids: Vec<PieceId> = field.hand(color).iter().collect();
    if ids.is_empty() {
        out.push('-');
        return;
    }
    ids.sort_unstable_by_key(|id| id.0);
    for id in ids {
        push_code(out, &field.set, id);
    }
}

/// Resolve one piece code to an unused set slot, flipping it if the code
/// carried a `+` prefix.
fn claim(
    set: &mut Set,
    used: &mut [bool; PIECE_COUNT],
    first: char,
    rest: &mut std::iter::Peekable<std::str::Chars>,
) -> Result<PieceId, SnapshotError> {
    let (flipped, letter) = if first == '+' {
        match rest.next() {
            Some(letter) => (true, letter),
            None => return Err(SnapshotError::Validation("dangling + marker".into())),
        }
    } else {
        (false, first)
    };

    let color = if letter.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let offsets = KINDS
        .iter()
        .find(|(kind, _)| *kind == letter.to_ascii_lowercase())
        .map(|(_, offsets)| *offsets)
        .ok_or_else(|| SnapshotError::Validation(format!("unknown piece code {letter:?}")))?;

    for &offset in offsets {
        let id = PieceId(Set::base(color) + offset);
        if !used[id.0 as usize] {
            used[id.0 as usize] = true;
            if flipped {
                set.get_mut(id).flip();
            }
            return Ok(id);
        }
    }
    Err(SnapshotError::Validation(format!(
        "too many {letter:?} pieces"
    )))
}

fn claim_hand(
    set: &mut Set,
    used: &mut [bool; PIECE_COUNT],
    field: &str,
) -> Result<Vec<PieceId>, SnapshotError> {
    let mut ids = Vec::new();
    if field == "-" {
        return Ok(ids);
    }
    let mut chars = field.chars().peekable();
    while let Some(ch) = chars.next() {
        ids.push(claim(set, used, ch, &mut chars)?);
    }
    Ok(ids)
}

fn place(set: &Set, board: &mut Board, id: PieceId, x: u8, y: u8) -> Result<(), SnapshotError> {
    if x >= BOARD_COLS as u8 {
        return Err(SnapshotError::Validation("rank overflows the board".into()));
    }
    board
        .put_top(set, id, x, y)
        .map_err(|err| SnapshotError::Validation(err.to_string()))
}

fn push_position(out: &mut String, position: &Position) {
    for y in (0..BOARD_ROWS as u8).rev() {
        if y < (BOARD_ROWS - 1) as u8 {
            out.push('/');
        }
        let mut empties = 0;
        for x in 0..BOARD_COLS as u8 {
            let codes = position.codes_at(x, y);
            if codes.is_empty() {
                empties += 1;
                continue;
            }
            flush_empties(out, &mut empties);
            if codes.len() > 1 {
                out.push('(');
            }
            for &code in codes {
                out.push(POSITION_CODES[code as usize] as char);
            }
            if codes.len() > 1 {
                out.push(')');
            }
        }
        flush_empties(out, &mut empties);
    }
    let _ = write!(out, "*{}", position.count());
}

fn parse_position(entry: &str) -> Result<Position, SnapshotError> {
    let bad = || SnapshotError::Validation(format!("bad position entry {entry:?}"));
    let (ranks_part, count_part) = entry.split_once('*').ok_or_else(bad)?;
    let count: u32 = count_part.parse().map_err(|_| bad())?;
    if count == 0 {
        return Err(bad());
    }

    let ranks: Vec<&str> = ranks_part.split('/').collect();
    if ranks.len() != BOARD_ROWS {
        return Err(bad());
    }

    let mut codes = Vec::new();
    for (i, rank) in ranks.iter().enumerate() {
        let y = (BOARD_ROWS - 1 - i) as u8;
        let mut x = 0u8;
        let mut chars = rank.chars();

        while let Some(ch) = chars.next() {
            if let Some(run) = ch.to_digit(10) {
                if run == 0 {
                    return Err(bad());
                }
                x += run as u8;
            } else if ch == '(' {
                let mut height = 0;
                loop {
                    match chars.next() {
                        Some(')') => break,
                        Some(tier) => {
                            if height == MAX_HEIGHT {
                                return Err(bad());
                            }
                            let cell = Cell::new(x, y).ok_or_else(bad)?;
                            codes.push((cell, position_code(tier).ok_or_else(bad)?));
                            height += 1;
                        }
                        None => return Err(bad()),
                    }
                }
                if height < 2 {
                    return Err(bad());
                }
                x += 1;
            } else {
                let cell = Cell::new(x, y).ok_or_else(bad)?;
                codes.push((cell, position_code(ch).ok_or_else(bad)?));
                x += 1;
            }
            if x > BOARD_COLS as u8 {
                return Err(bad());
            }
        }
        if x != BOARD_COLS as u8 {
            return Err(bad());
        }
    }

    Ok(Position::from_codes(&codes, count))
}

fn position_code(ch: char) -> Option<u8> {
    POSITION_CODES
        .iter()
        .position(|&letter| letter as char == ch)
        .map(|index| index as u8)
}

fn parse_exchange(record: &str) -> Result<(Cell, u32), SnapshotError> {
    let bad = || SnapshotError::Validation(format!("bad exchange record {record:?}"));
    let (cell_part, turn_part) = record.split_once('@').ok_or_else(bad)?;

    let mut digits = cell_part.chars();
    let x = digits.next().and_then(|c| c.to_digit(10)).ok_or_else(bad)?;
    let y = digits.next().and_then(|c| c.to_digit(10)).ok_or_else(bad)?;
    if digits.next().is_some() {
        return Err(bad());
    }
    let cell = Cell::new(x as u8, y as u8).ok_or_else(bad)?;
    let turn: u32 = turn_part.parse().map_err(|_| bad())?;
    Ok((cell, turn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::piece::Face;

    /// Field a piece from its owner's hand, keeping the census intact.
    fn deploy(field: &mut Field, color: Color, offset: u8, x: u8, y: u8) {
        let id = PieceId(Set::base(color) + offset);
        let piece = field.set.get(id);
        field.hands[color.index()].remove(&field.set, piece);
        field.board.put_top(&field.set, id, x, y).unwrap();
    }

    #[test]
    fn fresh_game_round_trips() {
        let game = Game::new();
        let text = save(&game);
        let board = text.split(' ').next().unwrap();
        assert_eq!(board, "9/9/9/9/9/9/9/9/9");

        let restored = load(&text).unwrap();
        assert_eq!(restored.turn(), 1);
        assert_eq!(restored.field(), game.field());
        assert_eq!(save(&restored), text);
    }

    #[test]
    fn midgame_state_round_trips() {
        let mut field = Field::new();
        let black = Set::base(Color::Black);
        let white = Set::base(Color::White);

        let commander = PieceId(black);
        let pawn = PieceId(black + 14);
        let betrayed = PieceId(white + 21);
        field.hands[Color::Black.index()].remove(&field.set, field.set.get(commander));
        field.hands[Color::Black.index()].remove(&field.set, field.set.get(pawn));
        field.hands[Color::White.index()].remove(&field.set, field.set.get(betrayed));

        field.set.get_mut(betrayed).flip();
        field.board.put_top(&field.set, pawn, 4, 8).unwrap();
        field.board.put_top(&field.set, commander, 4, 8).unwrap();
        field.board.put_top(&field.set, betrayed, 2, 3).unwrap();
        field
            .board
            .record_exchange(Cell::new_unchecked(4, 8), 50);

        let game = Game::from_parts(field, 51);
        let text = save(&game);
        let restored = load(&text).unwrap();

        assert_eq!(restored.turn(), 51);
        assert_eq!(restored.field().board, game.field().board);
        assert_eq!(restored.field().set, game.field().set);
        assert!(restored.field().board.exchanged(Cell::new_unchecked(4, 8)));
        assert_eq!(save(&restored), text);

        // The betrayed silver kept its flip and its original ownership.
        let piece = restored.field().board.top_piece(&restored.field().set, 2, 3).unwrap();
        assert_eq!(piece.color, Color::White);
        assert_eq!(piece.side_up(), Face::Silver);
        assert_eq!(piece.alignment(), Color::Black);
    }

    #[test]
    fn towers_keep_their_tier_order() {
        let mut field = Field::new();
        let black = Set::base(Color::Black);
        for offset in [14, 1, 3] {
            let piece = field.set.get(PieceId(black + offset));
            field.hands[Color::Black.index()].remove(&field.set, piece);
            field
                .board
                .put_top(&field.set, PieceId(black + offset), 0, 6)
                .unwrap();
        }

        let game = Game::from_parts(field, 47);
        let restored = load(&save(&game)).unwrap();
        let faces: Vec<Face> = restored
            .field()
            .board
            .tower(0, 6)
            .iter()
            .map(|id| restored.field().set.get(id).side_up())
            .collect();
        assert_eq!(faces, vec![Face::Pawn, Face::Captain, Face::Samurai]);
    }

    #[test]
    fn check_flags_are_recomputed_on_load() {
        let mut field = Field::new();
        deploy(&mut field, Color::White, 0, 4, 0);
        deploy(&mut field, Color::Black, 0, 8, 8);
        deploy(&mut field, Color::Black, 10, 4, 6);

        let text = save(&Game::from_parts(field, 48));
        let restored = load(&text).unwrap();
        assert!(restored.in_check(Color::White));
        assert!(!restored.in_check(Color::Black));
    }

    #[test]
    fn pending_rearrangement_survives_a_round_trip() {
        let mut field = Field::new();
        field.set.get_mut(PieceId(Set::base(Color::Black) + 8)).flip();
        deploy(&mut field, Color::Black, 0, 8, 8);
        deploy(&mut field, Color::White, 0, 0, 0);
        // The betrayed catapult fights for white until the captain takes it.
        deploy(&mut field, Color::Black, 8, 4, 5);
        deploy(&mut field, Color::Black, 1, 4, 6);

        let mut game = Game::from_parts(field, 47);
        game.perform(Action::Strike {
            from: Cell::new_unchecked(4, 6),
            to: Cell::new_unchecked(4, 5),
            rearrange: None,
        })
        .unwrap();
        assert!(game.pending_rearrangement());

        let mut restored = load(&save(&game)).unwrap();
        assert!(restored.pending_rearrangement());
        assert_eq!(restored.turn(), game.turn());

        restored.rearrange(Cell::new_unchecked(2, 7)).unwrap();
        assert!(!restored.pending_rearrangement());
        assert_eq!(restored.turn(), 48);
        assert_eq!(
            restored.field().board.top_piece(&restored.field().set, 2, 7).unwrap().side_up(),
            Face::Catapult
        );
    }

    #[test]
    fn repetition_history_round_trips() {
        let mut field = Field::new();
        deploy(&mut field, Color::Black, 0, 8, 8);
        deploy(&mut field, Color::White, 0, 0, 0);

        let mut game = Game::from_parts(field, 47);
        for (from, to) in [((8, 8), (8, 7)), ((0, 0), (0, 1)), ((8, 7), (8, 8)), ((0, 1), (0, 0))] {
            game.perform(Action::Move {
                from: Cell::new_unchecked(from.0, from.1),
                to: Cell::new_unchecked(to.0, to.1),
            })
            .unwrap();
        }
        assert!(!game.positions().is_empty());

        let text = save(&game);
        let restored = load(&text).unwrap();
        assert_eq!(restored.positions(), game.positions());
        assert_eq!(save(&restored), text);
    }

    #[test]
    fn a_pending_marker_needs_a_projector_in_hand() {
        let mut field = Field::new();
        deploy(&mut field, Color::Black, 8, 0, 6);
        deploy(&mut field, Color::Black, 9, 1, 6);

        let text = save(&Game::from_parts(field, 47));
        let mut parts: Vec<String> = text.split(' ').map(str::to_owned).collect();
        parts[5] = "r".to_owned();
        assert!(matches!(
            load(&parts.join(" ")),
            Err(SnapshotError::Validation(message)) if message.contains("rearrangement")
        ));
    }

    #[test]
    fn malformed_snapshots_are_rejected() {
        assert_eq!(
            load("9/9/9/9/9/9/9/9 - - 1 - - -"),
            Err(SnapshotError::Validation(
                "expected 9 ranks, found 8".into()
            ))
        );
        assert!(matches!(
            load("8/9/9/9/9/9/9/9/9 - - 1 - - -"),
            Err(SnapshotError::Validation(_))
        ));
        assert!(matches!(
            load("9/9/9/9/9/9/9/9/9 - - x - - -"),
            Err(SnapshotError::Validation(_))
        ));
        assert_eq!(load("9/9/9/9/9/9/9/9/9 - -"), Err(SnapshotError::MissingField("turn")));
        assert_eq!(
            load("9/9/9/9/9/9/9/9/9 - - 1 -"),
            Err(SnapshotError::MissingField("rearrangement"))
        );
        assert!(matches!(
            load("9/9/9/9/9/9/9/9/9 - - 1 - q -"),
            Err(SnapshotError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_pieces_are_rejected() {
        // Black fields two commanders.
        let text = "4k4/9/9/4k4/9/9/9/9/9 - - 47 - - -";
        assert!(matches!(
            load(text),
            Err(SnapshotError::Validation(message)) if message.contains("too many")
        ));
    }

    #[test]
    fn incomplete_censuses_are_rejected() {
        // One black pawn alone cannot account for all 46 pieces.
        let text = "9/9/9/9/9/9/9/9/4p4 - - 47 - - -";
        assert!(matches!(
            load(text),
            Err(SnapshotError::Validation(message)) if message.contains("neither")
        ));
    }
}
