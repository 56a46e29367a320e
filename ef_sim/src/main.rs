//! Bracket simulator.
//!
//! Generates a tournament for the given players and, unless told not to,
//! plays it to the end with random scorelines through the tournament
//! manager, then prints standings and awards as JSON.

use std::sync::Arc;

use anyhow::{Context, Error, bail};
use log::info;
use pico_args::Arguments;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ef_bracket::{
    bracket::{BracketFormat, MatchStatus, PlayerId, SubmissionOutcome},
    config::EngineConfig,
    db::{Database, DatabaseConfig, InMemoryMatchRepository, MatchRepository},
    scoring::ScoreReport,
    tournament::{TournamentId, TournamentManager},
};

const HELP: &str = "\
Simulate an eFootball elimination tournament

USAGE:
  ef_sim [OPTIONS]

OPTIONS:
  --format      FORMAT     single or double                    [default: single]
  --players     A,B,C      Comma-separated players in seed order
  --count       N          Generate N players instead          [default: 8]
  --pool        AMOUNT     Prize pool in minor units           [default: 0]
  --seed        N          Random seed for reproducible runs
  --dispute-pct P          Chance (0-100) that a result is disputed [default: 0]

FLAGS:
  --no-play                Only generate and print the bracket
  --postgres               Persist to PostgreSQL instead of memory
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string (with --postgres)
  MATCH_WINDOW_MINS        Minutes to play a match          [default: 30]
  DRAW_EXTENSION_MINS      Minutes added after a draw       [default: 10]
  PRIZE_FIRST_BPS          Winner share in basis points     [default: 4500]
  (See EngineConfig::from_env for all options)
";

struct Args {
    format: BracketFormat,
    players: Vec<PlayerId>,
    pool: i64,
    seed: Option<u64>,
    dispute_pct: u32,
    play: bool,
    postgres: bool,
}

fn parse_args() -> Result<Args, Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let format: String = pargs
        .opt_value_from_str("--format")?
        .unwrap_or_else(|| "single".to_string());
    let format = format.parse::<BracketFormat>().map_err(Error::msg)?;

    let named: Option<String> = pargs.opt_value_from_str("--players")?;
    let count: usize = pargs.opt_value_from_str("--count")?.unwrap_or(8);
    let players = match named {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(PlayerId::from)
            .collect(),
        None => (1..=count).map(|i| PlayerId::new(format!("player-{i}"))).collect(),
    };

    let dispute_pct: u32 = pargs.opt_value_from_str("--dispute-pct")?.unwrap_or(0);
    if dispute_pct > 100 {
        bail!("--dispute-pct must be between 0 and 100");
    }

    let args = Args {
        format,
        players,
        pool: pargs.opt_value_from_str("--pool")?.unwrap_or(0),
        seed: pargs.opt_value_from_str("--seed")?,
        dispute_pct,
        play: !pargs.contains("--no-play"),
        postgres: pargs.contains("--postgres"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let args = parse_args()?;
    env_logger::builder().format_target(false).init();

    let config = EngineConfig::from_env().context("invalid engine configuration")?;

    let repo: Arc<dyn MatchRepository> = if args.postgres {
        let db_config = DatabaseConfig::from_env()?;
        info!("Connecting to database");
        let db = Database::new(&db_config)
            .await
            .context("failed to connect to database")?;
        Arc::new(db.match_repository())
    } else {
        Arc::new(InMemoryMatchRepository::new())
    };

    let manager = TournamentManager::new(repo, config);
    let id = manager
        .start_tournament("Simulated Cup", args.format, &args.players, args.pool)
        .await
        .map_err(|e| anyhow::anyhow!(e.client_message()))?;

    if !args.play {
        let bracket = manager.bracket(id).await?;
        println!("{}", serde_json::to_string_pretty(&bracket)?);
        return Ok(());
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let submissions = play_out(&manager, id, &mut rng, args.dispute_pct).await?;
    info!("Tournament {} played out with {} score submissions", id, submissions);

    let standings = manager.standings(id).await?;
    let awards = manager.awards(id).await?;
    let summary = serde_json::json!({
        "tournament": manager.tournament(id).await?,
        "standings": standings,
        "awards": awards,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Play every ongoing match until a champion is decided.
///
/// Returns the number of score reports submitted.
async fn play_out(
    manager: &TournamentManager,
    id: TournamentId,
    rng: &mut StdRng,
    dispute_pct: u32,
) -> Result<usize, Error> {
    let mut submissions = 0;

    loop {
        let bracket = manager.bracket(id).await?;
        if bracket.is_complete() {
            return Ok(submissions);
        }

        let ongoing: Vec<_> = bracket
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Ongoing)
            .filter_map(|m| Some((m.match_number, m.player1_id.clone()?, m.player2_id.clone()?)))
            .collect();
        if ongoing.is_empty() {
            bail!("tournament {id} stalled without a champion");
        }

        for (match_number, player1, player2) in ongoing {
            let goals1: u32 = rng.random_range(0..=5);
            let goals2: u32 = rng.random_range(0..=5);
            let disputed = rng.random_range(0..100) < dispute_pct;

            manager
                .submit_report(id, match_number, &player1, ScoreReport::new(goals1, goals2))
                .await?;
            // A disputing player claims the win whatever the real score was
            let report2 = if disputed {
                ScoreReport::new(goals1.max(goals2) + 1, goals1.min(goals2))
            } else {
                ScoreReport::new(goals2, goals1)
            };
            let outcome = manager
                .submit_report(id, match_number, &player2, report2)
                .await?;
            submissions += 2;

            match outcome {
                SubmissionOutcome::Disputed => {
                    let winner = if rng.random_bool(0.5) { &player1 } else { &player2 };
                    info!("Admin awards disputed match {} to {}", match_number, winner);
                    manager.resolve_dispute(id, match_number, winner).await?;
                }
                SubmissionOutcome::Replay { deadline } => {
                    info!("Match {} drawn {}-{}, replay by {}", match_number, goals1, goals2, deadline);
                }
                SubmissionOutcome::AwaitingOpponent | SubmissionOutcome::Completed(_) => {}
            }
        }
    }
}
