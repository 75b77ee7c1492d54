//! HTTP server command — `garmen serve`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use garmen::config::AppConfig;
use garmen::server::{ServerConfig, start_server};

pub async fn cmd_serve(
    dir: &Path,
    port: Option<u16>,
    db_path: Option<PathBuf>,
    open: bool,
    dev: bool,
) -> Result<()> {
    let config = AppConfig::load(dir)?;
    let port = port.unwrap_or(config.server.port);
    let db_path = db_path.unwrap_or(config.database.path);
    let db_path = if db_path.is_absolute() {
        db_path
    } else {
        dir.join(db_path)
    };
    let dev = dev || config.server.dev;

    // Spawn browser open before starting the server (which blocks).
    // Skip in dev mode (no browser inside containers).
    if open && !dev {
        let url = format!("http://localhost:{}", port);
        tokio::spawn(async move {
            // Small delay to let the server start binding.
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                eprintln!("Failed to open browser: {}", e);
            }
        });
    }

    start_server(ServerConfig {
        port,
        db_path,
        dev_mode: dev,
    })
    .await
}
