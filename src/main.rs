use strudel_gateway::*;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .init();

    // reqwest is built without a bundled crypto provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    // `config` must still work when the file is broken
    let loaded = config::init_config_from(cli.config.as_deref()).and_then(|_| config::get_config());
    let app_config = match (&cli.command, loaded) {
        (_, Ok(config)) => config,
        (Commands::Config { .. }, Err(e)) => {
            ui::warning(&format!("{e}; showing defaults"), true);
            std::sync::Arc::new(config::AppConfig::default())
        }
        (_, Err(e)) => {
            ui::error(&e.to_string(), true);
            std::process::exit(1);
        }
    };
    let colored = app_config.client.colored;

    let rt = Runtime::new()?;

    rt.block_on(async {
        let outcome = match cli.command {
            Commands::Serve { ref bind } => {
                commands::serve::run(app_config.clone(), bind.as_deref()).await
            }
            Commands::Compose {
                ref edit,
                ref model,
                ref api_key,
                ref output,
                ref url,
                ref prompt,
            } => {
                let options = commands::ComposeOptions::from_cli(
                    prompt,
                    edit.as_ref(),
                    model.as_deref(),
                    api_key.as_deref(),
                    output.as_ref(),
                    url.as_deref(),
                    &app_config.client,
                );
                commands::compose::run(&options, &app_config).await.map(|_| ())
            }
            Commands::Config { action } => commands::config::run(action, &app_config),
        };

        if let Err(e) = outcome {
            ui::error(&e.to_string(), colored);
            std::process::exit(1);
        }
        Ok(())
    })
}
