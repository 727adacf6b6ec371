use opencp::config::Config;
use std::error::Error;
use std::process::Command;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("Current ocp configuration:");
    println!("  start_dir: {}", config.start_dir);
    println!("  play_once: {}", config.play_once);
    println!("  loop_modules: {}", config.loop_modules);
    println!("  frame_interval_ms: {}", config.frame_interval_ms);
    println!("  default_song_secs: {}", config.default_song_secs);
    println!("  max_file_mb: {}", config.max_file_mb);
    println!("  log_file: {}", config.log_file);
    println!("  log_level: {}", config.log_level);
    println!("  shell: {}", config.shell);
    println!("  scan_recursive: {}", config.scan_recursive);
    println!("  filetypes:");
    for filetype in &config.filetypes {
        println!(
            "    {:<4} {:<5} {}",
            filetype.mod_type,
            filetype.player,
            filetype.extensions.join(", ")
        );
    }

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    if !Config::exists()? {
        return Err("ocp is not configured. Run 'ocp init' first.".into());
    }

    let config_path = Config::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!("Opening {} in {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("Editor '{editor}' not found. Set $EDITOR to a valid editor path.")
            } else {
                format!("Failed to launch editor '{editor}': {e}")
            }
        })?;

    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    match Config::load() {
        Ok(_) => println!("Configuration saved successfully"),
        Err(e) => {
            return Err(format!("Configuration validation failed: {e}").into());
        }
    }

    Ok(())
}
