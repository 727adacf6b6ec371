use opencp::config::Config;
use opencp::console::TerminalConsole;
use opencp::cpiface::standard_registry;
use opencp::filesel::FileSelector;
use opencp::playback::{RunOptions, Session, run};
use opencp::preprocess::PreprocessChain;
use opencp::shell::SystemShell;
use owo_colors::OwoColorize;
use std::error::Error;
use std::fs::File;
use std::path::Path;

pub struct PlayOptions {
    pub paths: Vec<String>,
    pub loop_modules: bool,
    pub select: bool,
    pub verbose: bool,
}

fn init_logging(config: &Config, verbose: bool) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, LevelFilter, WriteLogger};

    let level = if verbose {
        LevelFilter::Debug
    } else {
        config.log_level.parse().unwrap_or(LevelFilter::Info)
    };
    let log_file = shellexpand::tilde(&config.log_file).into_owned();
    CombinedLogger::init(vec![WriteLogger::new(
        level,
        simplelog::Config::default(),
        File::create(&log_file)?,
    )])?;

    Ok(())
}

pub fn handle_play(options: PlayOptions) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;
    if options.loop_modules {
        config.loop_modules = true;
    }

    init_logging(&config, options.verbose)?;
    log::info!("ocp {} starting", env!("CARGO_PKG_VERSION"));

    let mut selector = FileSelector::pre_init(&config)?;
    selector.init()?;
    selector.late_init()?;

    for path in &options.paths {
        let expanded = shellexpand::tilde(path);
        match selector.enqueue_path(Path::new(expanded.as_ref())) {
            Ok(0) => println!("{} Nothing playable in {}", "⚠".yellow(), path.cyan()),
            Ok(added) => log::info!("{path}: {added} entries"),
            Err(e) => println!("{} {e}", "✗".red().bold()),
        }
    }
    log::info!("{} entries queued from the command line", selector.playlist().len());

    let console = TerminalConsole::new()?;
    let mut session = Session::new(
        Box::new(selector),
        standard_registry(&config),
        PreprocessChain::standard(&config),
        Box::new(console),
        Box::new(SystemShell::new(&config.shell)),
    );

    let stats = run(
        &mut session,
        RunOptions {
            open_selector_first: options.select,
        },
    );
    drop(session);

    log::info!("Playback finished: {stats:?}");
    println!(
        "{} Played {} module(s)",
        "✓".green().bold(),
        stats.loaded.to_string().cyan()
    );
    if stats.init_failures > 0 {
        println!(
            "  {} {} file(s) could not be opened, see {}",
            "⚠".yellow(),
            stats.init_failures,
            config.log_file.bright_black()
        );
    }

    Ok(())
}
