use colored::Colorize;
use klondike_rs::games::klondike::{play_to_completion, KlondikeGame, Result, Settings};
use std::env;
use std::process;
use std::time::Instant;

const DEFAULT_GAMES: usize = 1000;
const MAX_STEPS: usize = 10_000;

fn main() {
    let mut args = env::args().skip(1);
    let games = match args.next().map(|arg| arg.parse::<usize>()) {
        None => DEFAULT_GAMES,
        Some(Ok(games)) => games,
        Some(Err(e)) => {
            eprintln!("{} {}", "invalid game count:".red(), e);
            process::exit(2);
        }
    };
    let settings = match args.next() {
        None => Settings::default(),
        Some(path) => match Settings::from_json_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{} {}", path.red(), e);
                process::exit(2);
            }
        },
    };
    if let Err(e) = greedy_play(games, &settings) {
        eprintln!("{}", e.to_string().red());
        process::exit(1);
    }
}

/// Plays `games` deals with the hint player and reports how many came out.
fn greedy_play(games: usize, settings: &Settings) -> Result<()> {
    let start = Instant::now();
    let mut wins = 0;
    for index in 0..games {
        let seed = settings.seed.map(|seed| seed.wrapping_add(index as u64));
        let mut game = KlondikeGame::new(Settings {
            seed,
            ..settings.clone()
        })?;
        game.with_no_changes();
        if play_to_completion(&mut game, MAX_STEPS) {
            wins += 1;
        }
    }
    let duration = start.elapsed();

    let rate = if games == 0 {
        0.0
    } else {
        100.0 * wins as f64 / games as f64
    };
    println!(
        "{} {} of {} games ({:.1}%), draw {}, {} columns",
        "won".green().bold(),
        wins.to_string().green(),
        games,
        rate,
        settings.draw_rate,
        settings.n_columns
    );
    println!("Time elapsed for {} games: {:?}", games, duration);
    Ok(())
}
