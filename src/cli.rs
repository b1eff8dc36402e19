use std::path::PathBuf;

use clap::{Parser, Subcommand, builder::styling};

const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::Green.on_default().bold())
    .usage(styling::AnsiColor::Green.on_default().bold())
    .literal(styling::AnsiColor::Cyan.on_default().bold())
    .placeholder(styling::AnsiColor::Cyan.on_default());

#[derive(Parser)]
#[command(name = "strudel-gateway")]
#[command(author, version, about, long_about = None)]
#[command(styles = STYLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read configuration from this file instead of the user config directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the composition server
    Serve {
        /// Override server.bind (e.g. 0.0.0.0:3000)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Send one composition request to a running server and stream the result
    Compose {
        /// Edit the code in this file instead of composing a new piece
        #[arg(short, long, value_name = "FILE")]
        edit: Option<PathBuf>,

        /// Model to request (server default when omitted)
        #[arg(long)]
        model: Option<String>,

        /// Vendor API key (falls back to STRUDEL_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Write the extracted code to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Endpoint to post to (overrides client.url)
        #[arg(long)]
        url: Option<String>,

        /// What to compose
        #[arg(trailing_var_arg = true, required = true)]
        prompt: Vec<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file location
    Path,

    /// Validate the effective configuration
    Validate,
}
