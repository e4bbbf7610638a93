//! CLI smoke entry point.
//!
//! Usage: `corkboard_cli [CONFIG_PATH]` (defaults to `corkboard.toml`).
//! Loads configuration, starts logging when `log_dir` is set, opens and
//! migrates the database, then prints health and schema information.

use corkboard_core::db::migrations::latest_version;
use corkboard_core::{core_version, init_logging, load_config, open_db, ping};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("corkboard.toml"));
    let config = load_config(&config_path)?;

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    let schema_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    info!("event=cli_probe module=cli status=ok schema_version={schema_version}");

    println!("corkboard_core ping={}", ping());
    println!("corkboard_core version={}", core_version());
    println!("corkboard_core db={}", config.db_path.display());
    println!(
        "corkboard_core schema_version={schema_version} latest={}",
        latest_version()
    );
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("corkboard_cli: {err}");
            ExitCode::FAILURE
        }
    }
}
