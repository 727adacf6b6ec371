//! Application configuration management.
//!
//! Settings for the player live in the user's config directory (typically
//! ~/.config/ocp/config.toml). A missing file means defaults; every field has
//! its own default so older files keep loading after new settings appear.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use crate::module_info::ModuleType;
use crate::players::PlayerKind;

/// One row of the extension table: files with these extensions get this type
/// tag, and the tag is served by this player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileType {
    pub extensions: Vec<String>,
    #[serde(rename = "type")]
    pub mod_type: ModuleType,
    pub player: PlayerKind,
}

impl FileType {
    fn new(extensions: &[&str], mod_type: &str, player: PlayerKind) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            mod_type: ModuleType::new(mod_type),
            player,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory the file selector opens in; `~` and `$VARS` are expanded.
    #[serde(default = "default_start_dir")]
    pub start_dir: String,
    /// Remove entries from the playlist once they have been played.
    #[serde(default = "default_true")]
    pub play_once: bool,
    #[serde(default)]
    pub loop_modules: bool,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_song_secs")]
    pub default_song_secs: u64,
    #[serde(default = "default_max_file_mb")]
    pub max_file_mb: u64,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default = "default_true")]
    pub scan_recursive: bool,
    #[serde(default = "default_filetypes")]
    pub filetypes: Vec<FileType>,
}

fn default_start_dir() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

fn default_frame_interval_ms() -> u64 {
    20
}

fn default_song_secs() -> u64 {
    180
}

fn default_max_file_mb() -> u64 {
    16
}

fn default_log_file() -> String {
    std::env::temp_dir()
        .join("ocp.log")
        .to_string_lossy()
        .into_owned()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

fn default_filetypes() -> Vec<FileType> {
    vec![
        FileType::new(&["ay"], "AY", PlayerKind::Ay),
        FileType::new(&["mp1", "mp2", "mp3"], "MPx", PlayerKind::Mpeg),
        FileType::new(&["dro"], "DRO", PlayerKind::Opl),
        FileType::new(&["rad"], "RAD", PlayerKind::Opl),
        FileType::new(&["imf", "wlf"], "IMF", PlayerKind::Opl),
    ]
}

fn parse_bool(value: &str) -> Result<bool, Box<dyn Error>> {
    Ok(value
        .parse::<bool>()
        .map_err(|_| "Value must be 'true' or 'false'")?)
}

fn parse_number(value: &str) -> Result<u64, Box<dyn Error>> {
    Ok(value
        .parse::<u64>()
        .map_err(|_| "Value must be a non-negative integer")?)
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            start_dir: default_start_dir(),
            play_once: true,
            loop_modules: false,
            frame_interval_ms: default_frame_interval_ms(),
            default_song_secs: default_song_secs(),
            max_file_mb: default_max_file_mb(),
            log_file: default_log_file(),
            log_level: default_log_level(),
            shell: default_shell(),
            scan_recursive: true,
            filetypes: default_filetypes(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // XDG_CONFIG_HOME wins so tests can point it at a temp dir
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("ocp")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("ocp")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_mb.saturating_mul(1024 * 1024)
    }

    /// Fails if `start_dir` names an environment variable that is not set.
    pub fn start_dir_path(&self) -> Result<PathBuf, shellexpand::LookupError<std::env::VarError>> {
        Ok(PathBuf::from(shellexpand::full(&self.start_dir)?.into_owned()))
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "start_dir" => self.start_dir = value.to_string(),
            "play_once" => self.play_once = parse_bool(value)?,
            "loop_modules" => self.loop_modules = parse_bool(value)?,
            "frame_interval_ms" => {
                let ms = parse_number(value)?;
                if ms == 0 {
                    return Err("frame_interval_ms must be at least 1".into());
                }
                self.frame_interval_ms = ms;
            }
            "default_song_secs" => self.default_song_secs = parse_number(value)?,
            "max_file_mb" => self.max_file_mb = parse_number(value)?,
            "log_file" => self.log_file = value.to_string(),
            "log_level" => {
                if value.parse::<log::LevelFilter>().is_err() {
                    return Err(format!("Unknown log level: {value}").into());
                }
                self.log_level = value.to_lowercase();
            }
            "shell" => self.shell = value.to_string(),
            "scan_recursive" => self.scan_recursive = parse_bool(value)?,
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests that touch XDG_CONFIG_HOME must not run concurrently
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_filetypes() {
        let filetypes = default_filetypes();
        let mpeg = filetypes
            .iter()
            .find(|ft| ft.mod_type.as_str() == "MPx")
            .unwrap();
        assert_eq!(mpeg.extensions, vec!["mp1", "mp2", "mp3"]);
        assert_eq!(mpeg.player, PlayerKind::Mpeg);
        assert_eq!(filetypes.len(), 5);
    }

    #[test]
    fn test_config_default() {
        let config: Config = Default::default();
        assert!(config.play_once);
        assert!(!config.loop_modules);
        assert_eq!(config.frame_interval_ms, 20);
        assert_eq!(config.max_file_size(), 16 * 1024 * 1024);
        assert!(!config.shell.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str("loop_modules = true\n").unwrap();
        assert!(config.loop_modules);
        assert_eq!(config.default_song_secs, 180);
        assert_eq!(config.filetypes, default_filetypes());
    }

    #[test]
    fn test_start_dir_expands_tilde() {
        let mut config = Config::new();
        config.start_dir = "~/mods".to_string();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.start_dir_path().unwrap(), home.join("mods"));
        }
    }

    #[test]
    fn test_start_dir_expands_variables() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            std::env::set_var("OCP_TEST_MUSIC", "/srv/music");
            std::env::remove_var("OCP_TEST_UNSET");
        }

        let mut config = Config::new();
        config.start_dir = "$OCP_TEST_MUSIC/chip".to_string();
        assert_eq!(config.start_dir_path().unwrap(), PathBuf::from("/srv/music/chip"));

        config.start_dir = "${OCP_TEST_UNSET}/chip".to_string();
        assert!(config.start_dir_path().is_err());

        unsafe {
            std::env::remove_var("OCP_TEST_MUSIC");
        }
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::new();

        config.set_value("loop_modules", "true").unwrap();
        assert!(config.loop_modules);

        config.set_value("max_file_mb", "4").unwrap();
        assert_eq!(config.max_file_size(), 4 * 1024 * 1024);

        config.set_value("log_level", "DEBUG").unwrap();
        assert_eq!(config.log_level, "debug");

        assert!(config.set_value("loop_modules", "maybe").is_err());
        assert!(config.set_value("frame_interval_ms", "0").is_err());
        assert!(config.set_value("log_level", "loud").is_err());
        assert!(config.set_value("unknown_key", "value").is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let mut config = Config::new();
        config.start_dir = "/music/chip".to_string();
        config.save().unwrap();

        let config_path = Config::config_path().unwrap();
        assert!(config_path.exists());
        assert!(config_path.starts_with(temp_dir.path().join("ocp")));

        let loaded = Config::load().unwrap();
        assert_eq!(loaded.start_dir, "/music/chip");
        assert_eq!(loaded.filetypes, default_filetypes());

        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }
}
