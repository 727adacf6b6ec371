//! ocp - terminal module player.
//!
//! Plays AY, MPEG audio and OPL (DRO/RAD/IMF) files from a play-list built on
//! the command line or in the interactive file selector. Module info can be
//! inspected without playing via `ocp info`.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;

mod cli;

#[derive(Parser)]
#[command(name = "ocp")]
#[command(about = "Terminal module player with a file selector and per-format players")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play files, directories or M3U play-lists
    Play {
        /// Files, directories or .m3u files to queue
        paths: Vec<String>,
        /// Loop modules instead of advancing when they end
        #[arg(short, long = "loop")]
        loop_modules: bool,
        /// Open the file selector before playing
        #[arg(short, long)]
        select: bool,
        /// Log at debug level
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show detected module info for a file or directory
    Info {
        path: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Create the ocp configuration interactively
    Init,
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new([
            "start_dir",
            "play_once",
            "loop_modules",
            "frame_interval_ms",
            "default_song_secs",
            "max_file_mb",
            "log_file",
            "log_level",
            "shell",
            "scan_recursive",
        ]))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            paths,
            loop_modules,
            select,
            verbose,
        } => {
            cli::play::handle_play(cli::play::PlayOptions {
                paths,
                loop_modules,
                select,
                verbose,
            })?;
        }
        Commands::Info { path, json } => {
            cli::info::handle_info(&path, json)?;
        }
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
