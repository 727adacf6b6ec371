use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use opencp::config::Config;
use owo_colors::OwoColorize;
use std::error::Error;
use std::path::Path;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Config::exists()? {
        return Err(
            "ocp is already configured. Use 'ocp config set <key> <value>' or 'ocp config edit'.".into(),
        );
    }

    let mut config = Config::new();
    let theme = ColorfulTheme::default();

    let start_dir: String = Input::with_theme(&theme)
        .with_prompt("Directory the file selector opens in")
        .default(config.start_dir.clone())
        .interact_text()?;

    let expanded = shellexpand::tilde(&start_dir);
    if !Path::new(expanded.as_ref()).is_dir() {
        println!(
            "{} {} is not a directory yet; ocp will refuse to start until it exists",
            "⚠".yellow(),
            expanded.cyan()
        );
    }
    config.start_dir = start_dir;

    config.loop_modules = Confirm::with_theme(&theme)
        .with_prompt("Loop modules instead of advancing when they end?")
        .default(config.loop_modules)
        .interact()?;

    config.play_once = Confirm::with_theme(&theme)
        .with_prompt("Remove modules from the play-list once played?")
        .default(config.play_once)
        .interact()?;

    config.save()?;

    println!("{} ocp configured", "✓".green().bold());
    println!(
        "  {} {}",
        "Configuration saved to:".bright_black(),
        Config::config_path()?.display().to_string().cyan()
    );

    Ok(())
}
