//! Command line front end for the sweeper store.
//!
//! Commands:
//! - `new [--preset <name> | --width <w> --height <h> --mines <n>] [--user <name>]`
//! - `reveal <id> <x> <y> [--user <name>]`
//! - `flag <id> <x> <y> [--user <name>]`
//! - `show <id> [--json]`
//! - `history <user>` / `stats <user>`
//! - `presets`
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sweeper_core::{GameConfig, GameId, GameView};
use sweeper_protocol::{GameSnapshot, MoveRequest, NewGameRequest};
use sweeper_store::{Backend, GameService, Settings, open_store, run_post_create_hooks};

mod render;

const DEFAULT_DATA_DIR: &str = "sweeper-data";

#[derive(Parser, Debug)]
#[command(name = "sweeper", version, about = "Play Minesweeper from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file
    #[arg(short, long, default_value = "sweeper.toml", global = true)]
    config: PathBuf,

    /// Keep games as record files in this directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print games as JSON snapshots instead of text boards
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new game
    New {
        /// Named board size from the settings
        #[arg(short, long, conflicts_with_all = ["width", "height", "mines"])]
        preset: Option<String>,
        #[arg(long, requires = "height")]
        width: Option<i64>,
        #[arg(long, requires = "mines")]
        height: Option<i64>,
        #[arg(long, requires = "width")]
        mines: Option<i64>,
        /// Owner of the new game
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Reveal a cell
    Reveal {
        id: i32,
        x: i64,
        y: i64,
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Place or remove a flag
    Flag {
        id: i32,
        x: i64,
        y: i64,
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Print a game
    Show { id: i32 },
    /// List the games of a user
    History { user: String },
    /// Count won, lost and unfinished games of a user
    Stats { user: String },
    /// List the configured board presets
    Presets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.verbose);

    let settings = load_settings(&cli)?;

    if let Command::Presets = cli.command {
        for (name, preset) in &settings.presets {
            println!(
                "{name}: {}x{}, {} mines",
                preset.width, preset.height, preset.mines
            );
        }
        return Ok(());
    }

    let store = open_store(&settings.store).context("Could not open game store")?;
    let service = GameService::new(store, settings.limits);
    run(&service, &settings, &cli.command, cli.json)
}

fn run(service: &GameService, settings: &Settings, command: &Command, json: bool) -> Result<()> {
    match command {
        Command::New {
            preset,
            width,
            height,
            mines,
            user,
        } => {
            let config = new_game_config(settings, preset.as_deref(), *width, *height, *mines)?;
            let game = service.new_game(config)?;
            if let Some(user) = user {
                run_post_create_hooks(game.id(), &[&service.associate_owner(user.as_str())])?;
            }

            print_game(&GameView::from_game(&game), json)?;
        }
        Command::Reveal { id, x, y, user } => {
            let coords = MoveRequest {
                x: *x,
                y: *y,
                game_id: Some(*id),
            }
            .coords()?;
            let game = service.make_move(GameId(*id), coords, user.as_deref())?;
            print_game(&GameView::from_game(&game), json)?;
        }
        Command::Flag { id, x, y, user } => {
            let coords = MoveRequest {
                x: *x,
                y: *y,
                game_id: Some(*id),
            }
            .coords()?;
            let game = service.toggle_flag(GameId(*id), coords, user.as_deref())?;
            print_game(&GameView::from_game(&game), json)?;
        }
        Command::Show { id } => {
            let game = service.get_game(GameId(*id))?;
            print_game(&GameView::from_game(&game), json)?;
        }
        Command::History { user } => {
            let games = service.owner_games(user)?;
            if json {
                let snapshots: Vec<GameSnapshot> = games.iter().map(GameSnapshot::from).collect();
                println!("{}", serde_json::to_string_pretty(&snapshots)?);
            } else {
                for game in &games {
                    let (width, height) = game.size();
                    println!(
                        "{}\t{width}x{height}\t{:?}\t{}",
                        game.id(),
                        game.status(),
                        game.created_at().to_rfc3339()
                    );
                }
            }
        }
        Command::Stats { user } => {
            let stats = service.owner_stats(user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "won: {}, lost: {}, in progress: {}",
                    stats.won, stats.lost, stats.in_progress
                );
            }
        }
        Command::Presets => {}
    }

    Ok(())
}

fn init_logging(verbose: &clap_verbosity_flag::Verbosity) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(verbose.log_level_filter());
    builder.parse_default_env();
    builder.init();
}

/// Settings come from the config file when it exists. Without one the CLI
/// keeps records on disk, since in-memory games would not outlive the process.
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = if cli.config.exists() {
        Settings::load(&cli.config)
            .with_context(|| format!("Could not load {}", cli.config.display()))?
    } else {
        log::debug!("No settings at {}, using defaults", cli.config.display());
        let mut settings = Settings::default();
        settings.store.backend = Backend::Records;
        settings
    };

    if let Some(dir) = &cli.data_dir {
        settings.store.backend = Backend::Records;
        settings.store.data_dir = Some(dir.clone());
    }
    if settings.store.backend == Backend::Records && settings.store.data_dir.is_none() {
        settings.store.data_dir = Some(PathBuf::from(DEFAULT_DATA_DIR));
    }
    if settings.store.backend == Backend::Memory {
        log::warn!("Using the memory backend; games are lost when the command exits");
    }
    Ok(settings)
}

fn new_game_config(
    settings: &Settings,
    preset: Option<&str>,
    width: Option<i64>,
    height: Option<i64>,
    mines: Option<i64>,
) -> Result<GameConfig> {
    if let (Some(width), Some(height), Some(mines)) = (width, height, mines) {
        let request = NewGameRequest {
            width,
            height,
            mines,
        };
        return Ok(request.config()?);
    }

    let name = preset.unwrap_or("beginner");
    match settings.preset(name) {
        Some(config) => Ok(config),
        None => bail!("Unknown preset {name:?}"),
    }
}

fn print_game(view: &GameView, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&GameSnapshot::from(view))?
        );
    } else {
        print!("{}", render::render(view));
    }
    Ok(())
}
