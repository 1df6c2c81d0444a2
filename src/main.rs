mod app;
mod config;
mod game;
mod input;
mod snake;
mod term;

use std::io::{self, IsTerminal};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::GameConfig;

fn main() -> Result<()> {
    // Log lines would scribble over the board, so only log when stderr is redirected.
    if !io::stderr().is_terminal() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_ansi(false)
            .init();
    }

    let mut app = App::new(GameConfig::default())?;
    app.run()
}
