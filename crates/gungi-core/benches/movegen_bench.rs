use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gungi_core::{effective_moves, load, rules, save, selectable, Board, Color, Field, Game, PieceId, Set};

fn id(color: Color, offset: u8) -> PieceId {
    PieceId(Set::base(color) + offset)
}

/// A midgame layout with towers, projectors, and both commanders in play.
fn midgame_field() -> Field {
    let mut field = Field::new();
    field.hand_mut(Color::Black).clear();
    field.hand_mut(Color::White).clear();

    let placements: &[(Color, u8, u8, u8)] = &[
        (Color::Black, 0, 4, 8),
        (Color::Black, 8, 3, 7),
        (Color::Black, 1, 4, 6),
        (Color::Black, 3, 2, 6),
        (Color::Black, 10, 6, 7),
        (Color::Black, 12, 5, 6),
        (Color::Black, 14, 2, 5),
        (Color::Black, 15, 4, 5),
        (Color::Black, 16, 6, 5),
        (Color::White, 0, 4, 0),
        (Color::White, 9, 5, 1),
        (Color::White, 1, 4, 2),
        (Color::White, 3, 6, 2),
        (Color::White, 11, 2, 1),
        (Color::White, 12, 3, 2),
        (Color::White, 14, 2, 3),
        (Color::White, 15, 4, 3),
        (Color::White, 16, 6, 3),
    ];
    for &(color, offset, x, y) in placements {
        field.board.put_top(&field.set, id(color, offset), x, y).unwrap();
    }
    // A contested tower in the middle.
    field.board.put_top(&field.set, id(Color::White, 17), 4, 4).unwrap();
    field.board.put_top(&field.set, id(Color::Black, 17), 4, 4).unwrap();
    field
}

fn movegen_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");
    group.sample_size(100);

    let field = midgame_field();

    group.bench_function("effective_moves_full_board", |b| {
        b.iter(|| {
            let field = black_box(&field);
            let mut targets = 0usize;
            for cell in Board::cells() {
                targets += effective_moves(&field.set, &field.board, cell.x, cell.y).len();
            }
            targets
        })
    });

    group.bench_function("legal_replies_midgame", |b| {
        b.iter(|| {
            let field = black_box(&field);
            let mut replies = 0usize;
            for cell in Board::cells() {
                if !selectable(&field.set, &field.board, cell.x, cell.y, 47) {
                    continue;
                }
                for target in effective_moves(&field.set, &field.board, cell.x, cell.y) {
                    if !rules::moveable_path(field, cell, target) {
                        continue;
                    }
                    if rules::strikeable(field, cell, target, 47)
                        || rules::moveable(field, cell, target, 47)
                    {
                        replies += 1;
                    }
                }
            }
            replies
        })
    });

    group.bench_function("checkmate_scan", |b| {
        b.iter(|| rules::checkmate(black_box(&field), 48))
    });

    group.bench_function("snapshot_round_trip", |b| {
        let text = save(&Game::new());
        b.iter(|| {
            let game = load(black_box(&text)).expect("parse");
            save(&game)
        })
    });

    group.finish();
}

criterion_group!(benches, movegen_benchmarks);
criterion_main!(benches);
