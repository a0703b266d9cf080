//! Plays two engines against each other from the empty board.
//!
//! Usage: selfplay [black_level] [white_level] [seed] [max_turns]

use log::info;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use gungi_core::{save, Color, Game};
use gungi_engine::Player;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let black_level: u8 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(3);
    let white_level: u8 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(3);
    let seed: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0);
    let max_turns: u32 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(500);

    let black = Player::new(Color::Black, black_level.clamp(1, 9));
    let white = Player::new(Color::White, white_level.clamp(1, 9));
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut game = Game::new();

    info!(
        "black level {} vs white level {}, seed {seed}",
        black.level(),
        white.level()
    );

    while !game.game_over() && game.turn() <= max_turns {
        let player = if game.active_color() == Color::Black {
            &black
        } else {
            &white
        };
        if !player.act(&mut rng, &mut game) {
            break;
        }
        info!("turn {}: {}", game.turn(), save(&game));
    }

    println!("{}", save(&game));
    if game.stalemate() {
        println!("draw by repetition on turn {}", game.turn());
    } else if let Some(winner) = game.winner() {
        println!("{} wins on turn {}", name(winner), game.turn());
    } else {
        println!("halted on turn {} with no action taken", game.turn());
    }
}

fn name(color: Color) -> &'static str {
    match color {
        Color::Black => "black",
        Color::White => "white",
    }
}
