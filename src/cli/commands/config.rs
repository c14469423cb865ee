use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{header, success, warning};
use std::path::Path;
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        edit_config,
        editor,
    } = cmd
    {
        if *print_config {
            header("Current configuration");
            println!("{}", serde_yaml::to_string(cfg)?);
        }

        if *edit_config {
            let path = Config::config_file();
            if !path.exists() {
                cfg.save_to(&path)?;
            }
            edit(&path, editor.as_deref())?;
        }
    }
    Ok(())
}

fn default_editor() -> String {
    std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        })
}

/// Open `path` with the requested editor, falling back to the default one.
fn edit(path: &Path, requested: Option<&str>) -> AppResult<()> {
    let fallback = default_editor();
    let first = requested.map(str::to_string).unwrap_or_else(|| fallback.clone());

    if run_editor(&first, path) {
        success(format!("Configuration file edited successfully using '{first}'"));
        return Ok(());
    }
    if first == fallback {
        return Err(AppError::Config(format!("editor '{first}' failed")));
    }

    warning(format!(
        "Editor '{first}' not available, falling back to '{fallback}'"
    ));
    if run_editor(&fallback, path) {
        success(format!(
            "Configuration file edited successfully using fallback '{fallback}'"
        ));
        Ok(())
    } else {
        Err(AppError::Config(format!("editor '{fallback}' failed")))
    }
}

fn run_editor(editor: &str, path: &Path) -> bool {
    Command::new(editor)
        .arg(path)
        .status()
        .is_ok_and(|s| s.success())
}
