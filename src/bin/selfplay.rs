use std::io::Write;
use std::process::ExitCode;

use chess_tree::game::Game;
use chess_tree::tree::NodeId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

const DEFAULT_PLIES: usize = 120;
const DEFAULT_SEED: u64 = 1;
/// Chance per ply of stepping back and trying another move there.
const BRANCH_CHANCE: f64 = 0.15;

#[derive(Serialize)]
struct Summary {
    seed: u64,
    plies: usize,
    nodes: usize,
    main_line: usize,
    rows: usize,
    final_fen: String,
    mated_or_stalemated: bool,
    build: &'static str,
}

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, default: T) -> Result<T, String> {
    match args.get(index) {
        Some(text) => text.parse().map_err(|_| format!("could not parse argument {index}: {text:?}")),
        None => Ok(default),
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let (plies, seed) = match (
        parse_arg(&args, 1, DEFAULT_PLIES),
        parse_arg(&args, 2, DEFAULT_SEED),
    ) {
        (Ok(p), Ok(s)) => (p, s),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("usage: selfplay [plies] [seed]\n{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new();

    print!("Playing {plies} plies (seed {seed})");
    std::io::stdout().flush().ok();
    for ply in 0..plies {
        if !game.tree().is_at_beginning(&game.cursor()) && rng.gen_bool(BRANCH_CHANCE) {
            game.go_to_previous_move();
        }
        let Some(mv) = game.legal_moves().choose(&mut rng).copied() else {
            break;
        };
        if game.apply_selected_move(&mv).is_none() {
            eprintln!("\nply {ply}: generated move {} was rejected", mv.to_uci());
            return ExitCode::FAILURE;
        }
        if ply % 20 == 19 {
            print!(".");
            std::io::stdout().flush().ok();
        }
    }
    println!();

    // Every node must be reachable and rewinding must land on the start.
    let end = game.cursor().node();
    for index in 0..=game.tree().number_of_moves() {
        if !game.go_to_node(NodeId(index)) {
            eprintln!("could not reach node {index}");
            return ExitCode::FAILURE;
        }
    }
    game.go_to_initial_move();
    if game.board() != game.start_position() {
        eprintln!("rewinding did not restore the start position:\n{}", game.board());
        return ExitCode::FAILURE;
    }
    game.go_to_node(end);

    let summary = Summary {
        seed,
        plies,
        nodes: game.tree().number_of_moves(),
        main_line: game.tree().main_line().len(),
        rows: game.move_list().iter().map(|e| e.row).max().map_or(0, |r| r + 1),
        final_fen: game.board().to_fen(),
        mated_or_stalemated: game.has_no_legal_moves(),
        build: chess_tree::BUILD_TIMESTAMP,
    };
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to encode summary: {e}");
            return ExitCode::FAILURE;
        }
    }
    println!("{}", game.board());
    ExitCode::SUCCESS
}
