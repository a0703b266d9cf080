use gungi_core::{effective_moves, Cell, Color, Field, PieceId, Set};

fn id(color: Color, offset: u8) -> PieceId {
    PieceId(Set::base(color) + offset)
}

fn sorted(mut cells: Vec<(u8, u8)>) -> Vec<(u8, u8)> {
    cells.sort_unstable();
    cells
}

fn targets(field: &Field, x: u8, y: u8) -> Vec<(u8, u8)> {
    sorted(
        effective_moves(&field.set, &field.board, x, y)
            .iter()
            .map(|cell: &Cell| (cell.x, cell.y))
            .collect(),
    )
}

#[test]
fn captain_reach_grows_at_the_tower_top() {
    let mut field = Field::new();
    field
        .board
        .put_top(&field.set, id(Color::Black, 1), 4, 4)
        .unwrap();

    // Ground tier: the four diagonals plus one forward step.
    assert_eq!(
        targets(&field, 4, 4),
        sorted(vec![(3, 3), (3, 5), (4, 3), (5, 3), (5, 5)])
    );

    let mut towered = Field::new();
    towered
        .board
        .put_top(&towered.set, id(Color::Black, 14), 4, 4)
        .unwrap();
    towered
        .board
        .put_top(&towered.set, id(Color::Black, 15), 4, 4)
        .unwrap();
    towered
        .board
        .put_top(&towered.set, id(Color::Black, 1), 4, 4)
        .unwrap();

    // Tier 2 swaps the forward step for the four two-cell leaps.
    assert_eq!(
        targets(&towered, 4, 4),
        sorted(vec![
            (3, 3),
            (3, 5),
            (5, 3),
            (5, 5),
            (2, 2),
            (6, 2),
            (2, 4),
            (6, 4)
        ])
    );
}

#[test]
fn hidden_dragon_slides_only_on_the_ground() {
    let mut field = Field::new();
    field
        .board
        .put_top(&field.set, id(Color::Black, 10), 4, 4)
        .unwrap();
    // Full rank and file from the ground tier.
    assert_eq!(targets(&field, 4, 4).len(), 16);

    let mut towered = Field::new();
    towered
        .board
        .put_top(&towered.set, id(Color::Black, 14), 4, 4)
        .unwrap();
    towered
        .board
        .put_top(&towered.set, id(Color::Black, 10), 4, 4)
        .unwrap();
    // Raised, it keeps only the diagonal steps.
    assert_eq!(
        targets(&towered, 4, 4),
        sorted(vec![(3, 3), (3, 5), (5, 3), (5, 5)])
    );
}

#[test]
fn a_betrayed_lance_runs_toward_its_new_home_rank() {
    let mut field = Field::new();
    // A black catapult flipped to its lance side fights for white.
    field.set.get_mut(id(Color::Black, 8)).flip();
    field
        .board
        .put_top(&field.set, id(Color::Black, 8), 4, 5)
        .unwrap();

    assert_eq!(targets(&field, 4, 5), vec![(4, 6), (4, 7), (4, 8)]);
}

#[test]
fn samurai_trades_its_forward_step_for_vertical_lunges() {
    let mut field = Field::new();
    field
        .board
        .put_top(&field.set, id(Color::Black, 3), 4, 4)
        .unwrap();
    assert_eq!(
        targets(&field, 4, 4),
        sorted(vec![(3, 3), (5, 3), (3, 4), (5, 4), (4, 3)])
    );

    let mut towered = Field::new();
    towered
        .board
        .put_top(&towered.set, id(Color::Black, 14), 4, 4)
        .unwrap();
    towered
        .board
        .put_top(&towered.set, id(Color::Black, 3), 4, 4)
        .unwrap();
    assert_eq!(
        targets(&towered, 4, 4),
        sorted(vec![(3, 3), (5, 3), (3, 4), (5, 4), (4, 2), (4, 6)])
    );
}

#[test]
fn ground_bow_shoots_over_two_cells() {
    let mut field = Field::new();
    field
        .board
        .put_top(&field.set, id(Color::Black, 12), 4, 4)
        .unwrap();
    assert_eq!(targets(&field, 4, 4), sorted(vec![(2, 4), (6, 4), (4, 2)]));
}

#[test]
fn projector_faces_cannot_move_at_all() {
    let mut field = Field::new();
    field
        .board
        .put_top(&field.set, id(Color::Black, 8), 4, 7)
        .unwrap();
    field
        .board
        .put_top(&field.set, id(Color::White, 9), 4, 1)
        .unwrap();

    assert!(targets(&field, 4, 7).is_empty());
    assert!(targets(&field, 4, 1).is_empty());
}
