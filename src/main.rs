mod app;
mod config;
mod context;
mod fuzzy;
mod machine;
mod scanner;
mod tmux;
mod ui;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "sessionizer", version, about = "Fuzzy-search project directories and jump into tmux sessions")]
struct Cli {
    /// Override config path. If omitted, sessionizer checks ~/.config/sessionizer/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Search these roots instead of the configured ones
    #[arg(value_name = "PATH")]
    roots: Vec<PathBuf>,
}

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let roots = if cli.roots.is_empty() {
        let config = config::load(cli.config.as_deref())?;
        config::search_roots(&config)
    } else {
        cli.roots
    };

    app::run(roots)
}
