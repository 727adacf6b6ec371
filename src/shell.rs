//! External shell collaborator used for the "shell out" request.

use std::error::Error;
use std::io;
use std::process::{Command, Stdio};

pub trait Shell {
    /// Run an interactive shell and block until it exits.
    fn run(&mut self) -> Result<(), Box<dyn Error>>;
}

pub struct SystemShell {
    command: String,
}

impl SystemShell {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }
}

/// Reject shell commands carrying metacharacters; the value comes from the
/// environment or the config file and is executed without a shell.
fn validate_command(command: &str) -> Result<Vec<&str>, Box<dyn Error>> {
    const FORBIDDEN: &[char] = &['|', ';', '&', '`', '$', '\n', '\r', '<', '>'];

    if command.contains(FORBIDDEN) {
        return Err("shell command contains shell metacharacters".into());
    }

    let parts: Vec<&str> = command.split_whitespace().collect();
    if parts.is_empty() {
        return Err("shell command is empty".into());
    }
    Ok(parts)
}

impl Shell for SystemShell {
    fn run(&mut self) -> Result<(), Box<dyn Error>> {
        let parts = validate_command(&self.command)?;

        println!("Type 'exit' to return to the player.");
        let status = Command::new(parts[0])
            .args(&parts[1..])
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    format!("Shell '{}' not found", parts[0])
                } else {
                    format!("Failed to launch shell '{}': {e}", parts[0])
                }
            })?;

        if !status.success() {
            log::info!("Shell '{}' exited with {status}", self.command);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_command_splits_args() {
        assert_eq!(validate_command("bash -l").unwrap(), vec!["bash", "-l"]);
    }

    #[test]
    fn test_validate_command_rejects_metacharacters() {
        assert!(validate_command("sh; rm -rf /").is_err());
        assert!(validate_command("sh | cat").is_err());
        assert!(validate_command("$EVIL").is_err());
        assert!(validate_command("   ").is_err());
    }
}
