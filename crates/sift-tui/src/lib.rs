//! Full-screen TUI for sift.

pub mod effects;
pub mod events;
pub mod input;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod transcript;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
pub use runtime::TuiRuntime;
use sift_core::config::Config;

/// Runs the interactive chat loop.
pub async fn run_chat(config: &Config) -> Result<()> {
    // Chat mode requires a terminal to render the TUI
    if !stderr().is_terminal() {
        anyhow::bail!("Chat mode requires a terminal.");
    }

    // Print pre-TUI info to stderr (will be replaced by alternate screen)
    let mut err = stderr();
    writeln!(err, "Sift Chat")?;
    let config_path = sift_core::config::paths::config_path();
    if config_path.exists() {
        writeln!(err, "Config: {}", config_path.display())?;
    }
    err.flush()?;

    let mut runtime = TuiRuntime::new(config.clone())?;
    runtime.run()?;

    // Print goodbye after TUI exits (terminal restored)
    writeln!(stderr(), "Goodbye!")?;

    Ok(())
}
