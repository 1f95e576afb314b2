use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use crate::settings::{self, Overrides};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the effective configuration and report problems.
    Check,
    /// Print the effective configuration (token redacted).
    Show,
}

pub fn handle_config(
    action: ConfigAction,
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> Result<()> {
    match action {
        ConfigAction::Check => check(config_path, overrides),
        ConfigAction::Show => show(config_path, overrides),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config_path: Option<&Path>, overrides: &Overrides) -> Result<()> {
    match settings::find_config_file(config_path) {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking environment and flags.\n"),
    }

    let config = settings::load(config_path, overrides)?;
    match config.validate() {
        Ok(()) => {
            eprintln!("  {BOLD}{GREEN}ok{RESET} configuration is valid");
            Ok(())
        },
        Err(e) => {
            eprintln!("  {BOLD}{RED}error{RESET} {e}");
            std::process::exit(1);
        },
    }
}

fn show(config_path: Option<&Path>, overrides: &Overrides) -> Result<()> {
    let config = settings::load(config_path, overrides)?;
    println!("{config:#?}");
    Ok(())
}
