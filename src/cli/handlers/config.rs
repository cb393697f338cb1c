use super::base::Completion;
use crate::cli::ConfigCommands;
use crate::cli::output::OutputFormatter;
use crate::config::Config;
use crate::error::{ModReqError, Result};
use serde_json::json;
use std::path::{Path, PathBuf};

fn target_path(explicit: Option<PathBuf>, global: Option<&Path>) -> Result<PathBuf> {
    explicit
        .or_else(|| global.map(Path::to_path_buf))
        .or_else(Config::default_path)
        .ok_or_else(|| ModReqError::custom("Could not determine a configuration directory"))
}

/// Handle the config subcommands
///
/// `global` is the `--config` path, if one was given.
pub fn handle_config_command(
    command: ConfigCommands,
    global: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<Completion> {
    match command {
        ConfigCommands::Init { path } => {
            let path = target_path(path, global)?;
            let written = Config::write_default(&path)?;
            if formatter.is_json() {
                formatter.print_json(&json!({ "path": path, "written": written }))?;
            } else if written {
                formatter.success(&format!("Wrote default configuration to {}", path.display()));
            } else {
                formatter.warning(&format!(
                    "{} already exists, leaving it unchanged",
                    path.display()
                ));
            }
        },
        ConfigCommands::Show => {
            let config = Config::load(global)?;
            if formatter.is_json() {
                formatter.print_json(&config)?;
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
        },
        ConfigCommands::Path => {
            let path = target_path(None, global)?;
            if formatter.is_json() {
                formatter.print_json(&json!({ "path": path, "exists": path.exists() }))?;
            } else {
                formatter.info(&path.display().to_string());
            }
        },
    }
    Ok(Completion::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        let formatter = OutputFormatter::new(true, true);

        let command = ConfigCommands::Init {
            path: Some(path.clone()),
        };
        handle_config_command(command, None, &formatter).unwrap();
        assert!(path.exists());

        std::fs::write(&path, "settings:\n  list_page_size: 4\n").unwrap();
        let command = ConfigCommands::Init {
            path: Some(path.clone()),
        };
        handle_config_command(command, None, &formatter).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("list_page_size: 4"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/a.yml");
        assert_eq!(
            target_path(Some(explicit.clone()), Some(Path::new("/b.yml"))).unwrap(),
            explicit
        );
        assert_eq!(
            target_path(None, Some(Path::new("/b.yml"))).unwrap(),
            PathBuf::from("/b.yml")
        );
    }
}
