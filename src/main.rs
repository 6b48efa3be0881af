//! # Cryptcrawl Entry Point
//!
//! Parses the command line, sets up logging and runs one of three modes: a line console
//! on stdin, a one-shot map dump, or the two-player lobby server.

use clap::Parser;
use cryptcrawl::config::TICKS_PER_SECOND;
use cryptcrawl::generation::utils::create_rng;
use cryptcrawl::{
    generate_stage, parse_token, render_map, render_text, Command, CrawlError, CrawlResult,
    GameConfig, GameSession, InputHandler, Marker, PlayerClass,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command line arguments for Cryptcrawl.
#[derive(Parser, Debug)]
#[command(name = "cryptcrawl")]
#[command(about = "A turn-based dungeon crawler with a two-player lobby")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long)]
    seed: Option<u64>,

    /// Character class: warrior, mage or rogue
    #[arg(short, long, default_value = "warrior")]
    class: String,

    /// Character name
    #[arg(short, long, default_value = "Adventurer")]
    name: String,

    /// JSON game configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Map width, overrides the configuration
    #[arg(long)]
    width: Option<u32>,

    /// Map height, overrides the configuration
    #[arg(long)]
    height: Option<u32>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print a generated stage 1 map and exit
    #[arg(long)]
    dump_map: bool,

    /// Run the lobby server on this address, e.g. 127.0.0.1:7878
    #[arg(long)]
    serve: Option<String>,

    /// Play battle animations at the tick rate instead of skipping them
    #[arg(long)]
    animate: bool,
}

#[tokio::main]
async fn main() -> CrawlResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);
    log::info!("Starting Cryptcrawl v{}", cryptcrawl::VERSION);

    let config = load_config(&args)?;

    if args.dump_map {
        return dump_map(&config);
    }
    if let Some(addr) = &args.serve {
        log::info!("Starting lobby server on {}", addr);
        return cryptcrawl::net::serve(addr, config).await;
    }

    let class = PlayerClass::from_name(&args.class)
        .ok_or_else(|| CrawlError::Config(format!("Unknown class '{}'", args.class)))?;
    run_console(config, class, &args.name, args.animate).await
}

/// `--log-level` sets the base filter; `RUST_LOG` wins when present.
fn initialize_logging(log_level: &str) {
    let level = log_level
        .parse::<log::LevelFilter>()
        .unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(args: &Args) -> CrawlResult<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    config.validate()?;
    Ok(config)
}

fn dump_map(config: &GameConfig) -> CrawlResult<()> {
    let mut rng = create_rng(config);
    let dungeon = generate_stage(config, 1, &mut rng)?;
    print!("{}", render_map(&dungeon, &[Marker::new(dungeon.player_spawn, '@')]));
    Ok(())
}

/// Reads one token per stdin line and prints a snapshot after each accepted command.
async fn run_console(config: GameConfig, class: PlayerClass, name: &str, animate: bool) -> CrawlResult<()> {
    let mut session = GameSession::new(config, class, name)?;
    let input = InputHandler::new();
    let tick = Duration::from_millis(1000 / TICKS_PER_SECOND);
    print!("{}", render_text(&session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let token = match parse_token(&line) {
            Ok(token) => token,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        let Some(command) = input.command_for(token, session.input_context()) else {
            continue;
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = session.execute(command) {
            log::warn!("{}", e);
            println!("{}", e);
            continue;
        }

        if animate {
            while session.is_animating() {
                session.tick()?;
                println!();
                print!("{}", render_text(&session));
                tokio::time::sleep(tick).await;
            }
        } else {
            session.drain_animations()?;
        }
        println!();
        print!("{}", render_text(&session));
    }

    log::info!(
        "Leaving after {} turns on stage {}",
        session.turn_number,
        session.stage
    );
    Ok(())
}
