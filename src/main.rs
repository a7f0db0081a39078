//! Estoura Tudo entry point
//!
//! The browser build is driven from `web::WebApp`. Natively this runs one
//! headless session with a simple autoplayer against a file-backed store,
//! then prints the result and the leaderboards.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Estoura Tudo (native) starting...");

    if let Err(e) = headless::run() {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use estoura_tudo::persistence::FileStore;
    use estoura_tudo::ranking::DEFAULT_LIMIT;
    use estoura_tudo::{App, AppError, LogFeedback, PlayArea, Tuning};

    const DATA_ENV: &str = "ESTOURA_TUDO_DATA";
    const DEFAULT_DATA_DIR: &str = "estoura-tudo-data";
    /// Simulated screen
    const AREA: PlayArea = PlayArea {
        width: 390.0,
        height: 844.0,
    };
    /// Chance per frame that the autoplayer hits something
    const HIT_CHANCE: f64 = 0.04;

    pub fn run() -> Result<(), AppError> {
        let dir = std::env::var(DATA_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        let store = FileStore::open(dir)?;
        let tuning = Tuning::load();
        let frame_ms = tuning.frame_interval_ms;
        let mut app = App::new(store, tuning, LogFeedback)?;

        let args: Vec<String> = std::env::args().skip(1).collect();
        match args.as_slice() {
            [name, neighborhood, rest @ ..] => {
                let whatsapp = rest.first().map(String::as_str).unwrap_or("");
                app.login(name, neighborhood, whatsapp)?;
            }
            _ if app.player().is_some() => {}
            _ => {
                println!("usage: estoura-tudo <name> <neighborhood> [whatsapp]");
                return Ok(());
            }
        }

        let seed = estoura_tudo::now_millis();
        let mut bot = Pcg32::seed_from_u64(seed ^ 0x5eed);
        app.play(seed)?;

        let stats = loop {
            let target = app.session().and_then(|s| {
                let objects = s.objects();
                if objects.is_empty() || !bot.random_bool(HIT_CHANCE) {
                    return None;
                }
                Some(objects[bot.random_range(0..objects.len())].id)
            });
            if let Some(id) = target {
                app.pop(id);
            }
            if let Some(stats) = app.frame(frame_ms, AREA) {
                break stats;
            }
            if app.session().is_none() {
                return Ok(());
            }
        };

        println!("\n=== RESULT ===");
        println!("Score:     {}", stats.score);
        println!("Max combo: x{}", stats.max_combo);
        if let Some(player) = app.player() {
            println!(
                "{} - best {} in {} attempts",
                player.name, player.high_score, player.attempts
            );
        }
        if let Some(rank) = app.neighborhood_rank()? {
            println!("Your neighborhood is #{}", rank);
        }

        let board = app.ranking_board(DEFAULT_LIMIT)?;
        println!("\n=== TOP PLAYERS ===");
        for (i, p) in board.players.iter().enumerate() {
            println!("{:>2}. {:<20} {:>6}  ({})", i + 1, p.name, p.high_score, p.neighborhood);
        }
        println!("\n=== TOP NEIGHBORHOODS ===");
        for (i, n) in board.neighborhoods.iter().enumerate() {
            println!(
                "{:>2}. {:<20} avg {:>6}  ({} players)",
                i + 1,
                n.name,
                n.average_score,
                n.total_players
            );
        }
        Ok(())
    }
}
