use crate::cli::ConfigAction;
use crate::config::{self, AppConfig};
use crate::error::{GatewayError, Result};
use crate::ui;

pub fn run(action: Option<ConfigAction>, config: &AppConfig) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => show(config),
        ConfigAction::Path => path(config.client.colored),
        ConfigAction::Validate => validate(config),
    }
}

/// Prints the effective configuration as TOML.
fn show(config: &AppConfig) -> Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

pub(crate) fn render(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| GatewayError::Config(format!("Failed to render configuration: {e}")))
}

fn path(colored: bool) -> Result<()> {
    let path = config::get_config_path().ok_or_else(|| {
        GatewayError::Config("Could not determine config directory".to_string())
    })?;

    println!("{}", path.display());
    if !path.exists() {
        println!("{}", ui::info("file does not exist, defaults are in use", colored));
    }
    Ok(())
}

fn validate(config: &AppConfig) -> Result<()> {
    config.validate()?;
    ui::success("Configuration is valid", config.client.colored);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_round_trips() {
        let config = AppConfig::default();
        let rendered = render(&config).unwrap();
        assert!(rendered.contains("[server]"));
        assert!(rendered.contains("bind = \"127.0.0.1:3000\""));

        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
