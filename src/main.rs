use anyhow::Context;
use clap::Parser;
use expectimax_2048::config::EngineConfig;
use expectimax_2048::engine::{GameState, Score, Simulation, Tile};
use expectimax_2048::expectimax::Expectimax;
use log::{info, LevelFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "expectimax-2048", version, about = "Play 2048 games with the expectimax engine")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 1)]
    games: u32,
    /// Seed for tile spawns (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 4)]
    rows: usize,
    #[arg(long, default_value_t = 4)]
    columns: usize,
    /// Engine config (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the board after every move
    #[arg(long)]
    print_boards: bool,
    /// Write score,highest_tile,moves per game
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
    /// Debug logging, including leaf feature values
    #[arg(short, long)]
    verbose: bool,
}

struct GameResult {
    score: Score,
    highest_tile: Tile,
    moves: u32,
}

fn play_game(engine: &mut Expectimax, args: &Args, rng: &mut StdRng) -> GameResult {
    let mut game = GameState::new(args.rows, args.columns, rng);
    if args.print_boards {
        println!("{}", game);
    }
    let mut moves = 0;
    while game.is_alive() {
        let direction = engine.get_action(&game);
        game.make_move(direction, rng);
        moves += 1;
        if args.print_boards {
            println!("{:?}\n{}", direction, game);
        }
    }
    GameResult {
        score: game.score(),
        highest_tile: game.best_tile(),
        moves,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.verbose |= args.verbose;
    anyhow::ensure!(
        args.rows * args.columns >= 2,
        "a board needs at least two cells"
    );

    let seed = args.seed.unwrap_or_else(rand::random);
    info!("seed {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut engine = Expectimax::with_config(config);

    let mut csv = match &args.csv {
        Some(path) => {
            let mut f = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            writeln!(f, "score,highest_tile,moves")?;
            Some(f)
        }
        None => None,
    };

    let mut results = Vec::with_capacity(args.games as usize);
    for run in 0..args.games {
        let result = play_game(&mut engine, &args, &mut rng);
        info!(
            "game {}: score {}, highest tile {}, {} moves",
            run + 1,
            result.score,
            result.highest_tile,
            result.moves
        );
        if let Some(f) = csv.as_mut() {
            writeln!(f, "{},{},{}", result.score, result.highest_tile, result.moves)?;
        }
        results.push(result);
    }

    if results.is_empty() {
        return Ok(());
    }
    let total: Score = results.iter().map(|r| r.score).sum();
    let best = results.iter().map(|r| r.score).max().unwrap_or(0);
    let mut tiles: BTreeMap<Tile, u32> = BTreeMap::new();
    for r in &results {
        *tiles.entry(r.highest_tile).or_default() += 1;
    }
    let stats = engine.last_stats();
    println!(
        "Games: {}, Mean score: {:.1}, Best score: {}, States considered: {}, Max states considered for a move: {}",
        results.len(),
        total as f64 / results.len() as f64,
        best,
        stats.total_nodes,
        stats.peak_nodes
    );
    for (tile, count) in tiles.iter().rev() {
        println!(
            "{:>6}: {:5.1}%",
            tile,
            100. * f64::from(*count) / results.len() as f64
        );
    }
    Ok(())
}
