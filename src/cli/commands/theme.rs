use crate::cli::parser::Commands;
use crate::config::prefs::Preferences;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

pub fn handle(cmd: &Commands) -> AppResult<()> {
    if let Commands::Theme {
        toggle,
        dark,
        light,
    } = cmd
    {
        let current = Preferences::load();
        let next = if *toggle {
            current.toggled()
        } else if *dark {
            Preferences { dark_mode: true }
        } else if *light {
            Preferences { dark_mode: false }
        } else {
            info(format!("Theme: {}", name(current)));
            return Ok(());
        };

        next.save()?;
        success(format!("Theme set to {}.", name(next)));
    }
    Ok(())
}

fn name(p: Preferences) -> &'static str {
    if p.dark_mode { "dark" } else { "light" }
}
