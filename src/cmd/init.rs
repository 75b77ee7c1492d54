//! Database initialization command — `garmen init`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;

use garmen::config::AppConfig;
use garmen::db::Store;

pub fn cmd_init(dir: &Path, db_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(dir)?;
    let db_path = db_path.unwrap_or(config.database.path);
    let db_path = if db_path.is_absolute() {
        db_path
    } else {
        dir.join(db_path)
    };

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    let sudah_ada = db_path.exists();
    Store::new(&db_path).context("Failed to initialize database")?;

    if sudah_ada {
        println!(
            "{} database at {} (migrations re-applied)",
            style("Checked").green(),
            db_path.display()
        );
    } else {
        println!(
            "{} database at {}",
            style("Initialized").green().bold(),
            db_path.display()
        );
    }
    Ok(())
}
