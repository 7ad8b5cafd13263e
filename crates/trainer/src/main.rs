//! Train a Leduc hold'em MCCFR blueprint, or play against it.
//!
//! With no arguments: if a `blueprint` file exists in the working directory
//! it is loaded and the interactive play loop starts; otherwise a blueprint
//! is trained, reported, and saved. A blueprint that fails to load is
//! treated as absent and retrained.

use std::collections::VecDeque;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use leduc_solver_core::blueprint::{Blueprint, BLUEPRINT_FILE};
use leduc_solver_core::cfr::{MccfrConfig, MccfrSolver};
use leduc_solver_core::game::{Game, LeducPoker, LeducState};
use leduc_solver_core::info_key::InfoKey;
use leduc_solver_core::subgame::{PlayPolicy, SubgameConfig, SubgameSolver};

/// Progress is reported once per this many iterations.
const REPORT_INTERVAL: u64 = 1_000;

#[derive(Parser)]
#[command(name = "leduc-solver-trainer")]
#[command(about = "Train a Leduc hold'em MCCFR blueprint and play against it")]
struct Cli {
    /// Training iterations when no blueprint exists yet
    #[arg(long, default_value_t = 100_000)]
    iterations: u64,

    /// Blueprint file path
    #[arg(long, default_value = BLUEPRINT_FILE)]
    blueprint: PathBuf,

    /// Seed for the shuffle and action-sampling streams
    #[arg(long)]
    seed: Option<u64>,

    /// Sample the bot's play actions from the average strategy instead of
    /// the current regret-matched strategy
    #[arg(long)]
    play_average: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let game = LeducPoker::headsup();

    if cli.blueprint.exists() {
        match Blueprint::load(&cli.blueprint) {
            Ok(blueprint) => {
                println!(
                    "Loaded blueprint: {} info sets, {} iterations",
                    blueprint.nodes.node_count(),
                    blueprint.iterations
                );
                let mut solver =
                    MccfrSolver::from_blueprint(game, MccfrConfig::default(), blueprint)?;
                if let Some(seed) = cli.seed {
                    solver.set_seed(seed);
                }
                return play(solver, cli.play_average);
            }
            Err(err) => {
                eprintln!("Failed to load {}: {err}; retraining", cli.blueprint.display());
            }
        }
    }

    let solver = train(game, cli.iterations, cli.seed);
    let blueprint = solver.to_blueprint();
    blueprint.save(&cli.blueprint)?;
    println!("Blueprint saved to {}", cli.blueprint.display());
    Ok(())
}

fn train(game: LeducPoker, iterations: u64, seed: Option<u64>) -> MccfrSolver<LeducPoker> {
    println!("Running MCCFR on Leduc hold'em: {iterations} iterations");

    let mut solver = match seed {
        Some(seed) => MccfrSolver::with_seed(game, MccfrConfig::default(), seed),
        None => MccfrSolver::new(game),
    };

    let pb = ProgressBar::with_draw_target(Some(iterations), ProgressDrawTarget::stdout());
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} iters ({per_sec})",
        )
        .expect("valid template")
        .progress_chars("=>-"),
    );

    solver.train_with_callback(iterations, |i| {
        if i % REPORT_INTERVAL == 0 {
            pb.set_position(i);
        }
    });
    pb.finish();

    print_strategy_table(&solver);

    let utility = solver.expected_utility();
    for (player, u) in utility.iter().enumerate() {
        println!("Player {player} expected utility: {u:.4}");
    }

    solver
}

fn print_strategy_table(solver: &MccfrSolver<LeducPoker>) {
    let game = solver.game();
    for player in 0..game.num_players() {
        println!("\nPlayer {player} average strategy");

        let mut rows: Vec<(u64, String)> = solver
            .nodes()
            .player_nodes(player)
            .map(|(key, node)| {
                let cells: Vec<String> = node
                    .actions()
                    .iter()
                    .zip(node.average_strategy())
                    .map(|(&action, p)| format!("{}: {p:.3}", game.action_label(action)))
                    .collect();
                (key, format!("{:<24} {}", InfoKey::from_raw(key), cells.join("  ")))
            })
            .collect();

        rows.sort_by_key(|&(key, _)| key);
        for (_, row) in rows {
            println!("  {row}");
        }
    }
}

fn play(solver: MccfrSolver<LeducPoker>, play_average: bool) -> Result<(), Box<dyn Error>> {
    let policy = if play_average {
        PlayPolicy::AverageStrategy
    } else {
        PlayPolicy::CurrentStrategy
    };
    let config = SubgameConfig::default();
    let search_iterations = config.search_iterations;
    let mut sub = SubgameSolver::new(solver, config, policy);
    sub.new_hand();

    println!("You are player 0. Actions: C (check/call), F (fold), 2R / 4R (raise).");
    print_hand(sub.state());

    let stdin = io::stdin();
    let mut line = String::new();
    let mut pending: VecDeque<String> = VecDeque::new();

    while !sub.is_terminal() {
        if sub.turn() == 0 {
            // One token per decision; extra tokens on a line are queued.
            let Some(token) = pending.pop_front() else {
                print!("Play an action: ");
                io::stdout().flush()?;

                line.clear();
                if stdin.lock().read_line(&mut line)? == 0 {
                    println!("\nInput closed; abandoning the hand.");
                    return Ok(());
                }
                pending.extend(line.split_whitespace().map(str::to_owned));
                continue;
            };

            match LeducPoker::parse_action(&token) {
                Some(action) => {
                    if let Err(err) = sub.observe(action) {
                        println!("{err}; try again");
                    }
                }
                None => {
                    println!("Unrecognized action {token:?}; re-solving");
                    sub.search(search_iterations);
                }
            }
        } else {
            let action = sub.act();
            let label = sub.solver().game().action_label(action);
            println!("Bot plays {label}");
        }
        print_hand(sub.state());
    }

    let payoffs = sub.payoffs();
    println!("Hand over. Your result: {:+.1}, bot: {:+.1}", payoffs[0], payoffs[1]);
    Ok(())
}

fn print_hand(state: &LeducState) {
    let board = state
        .board_card()
        .map_or_else(|| "-".to_string(), |card| card.to_string());
    println!(
        "  your card: {}  board: {}  bets: {:?}  pot: {}",
        state.hole_card(0),
        board,
        state.bets(),
        state.pot()
    );
}
