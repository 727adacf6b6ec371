use indicatif::{ProgressBar, ProgressStyle};
use opencp::config::Config;
use opencp::constants::SPINNER_CHARS;
use opencp::filesel::scan;
use opencp::mdb::Detector;
use opencp::module_info::ModuleInfo;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};

/// One detected file, as printed by `ocp info --json`.
#[derive(Debug, Serialize)]
struct InfoRow {
    path: String,
    #[serde(rename = "type")]
    mod_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    player: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    composer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    playtime: Option<f64>,
}

fn create_progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(SPINNER_CHARS));
    }
    spinner
}

fn to_row(config: &Config, path: &Path, info: ModuleInfo) -> InfoRow {
    let player = config
        .filetypes
        .iter()
        .find(|ft| ft.mod_type == info.mod_type)
        .map(|ft| ft.player.to_string());
    InfoRow {
        path: path.display().to_string(),
        mod_type: info.mod_type.to_string(),
        player,
        title: info.title,
        composer: info.composer,
        comment: info.comment,
        playtime: info.playtime.map(|d| d.as_secs_f64()),
    }
}

fn format_playtime(secs: f64) -> String {
    let secs = secs as u64;
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn handle_info(path: &str, json: bool) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let detector = Detector::from_config(&config);
    let path = PathBuf::from(shellexpand::tilde(path).into_owned());

    if !path.exists() {
        return Err(format!("Path does not exist: {}", path.display()).into());
    }

    let detected = if path.is_dir() {
        let spinner = create_progress_spinner();
        spinner.set_message(format!("Scanning {}...", path.display()));
        let files = scan::collect_module_files(&path, &detector, config.scan_recursive)
            .map_err(|e| e.to_string())?;
        let detected = scan::detect_all(&files, &detector);
        spinner.finish_and_clear();
        detected
    } else {
        vec![(path.clone(), detector.detect_path(&path)?)]
    };

    let rows: Vec<InfoRow> = detected
        .into_iter()
        .map(|(file, info)| to_row(&config, &file, info))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!(
            "{} No modules found in {}",
            "⚠".yellow(),
            path.display().to_string().cyan()
        );
        return Ok(());
    }

    let mut unplayable = 0;
    for row in &rows {
        let tag = if row.player.is_some() {
            format!("{:<4}", row.mod_type).cyan().to_string()
        } else {
            unplayable += 1;
            format!("{:<4}", row.mod_type).yellow().to_string()
        };
        let playtime = row.playtime.map(format_playtime).unwrap_or_default();
        println!("{tag} {} {}", row.path.bold(), playtime.bright_black());
        if !row.title.is_empty() {
            println!("     {} {}", "Title:".bright_black(), row.title);
        }
        if !row.composer.is_empty() {
            println!("     {} {}", "Composer:".bright_black(), row.composer);
        }
    }

    println!();
    println!(
        "{} {} file(s), {} without a player",
        "✓".green().bold(),
        rows.len().to_string().cyan(),
        unplayable
    );

    Ok(())
}
