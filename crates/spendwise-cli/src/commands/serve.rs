//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use spendwise_server::ServerConfig;

use super::{load_config, open_db};

pub async fn cmd_serve(
    db_path: &Path,
    config_path: Option<&Path>,
    host: &str,
    port: u16,
    no_auth: bool,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Spendwise web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }

    // Parse API keys from environment (comma-separated)
    let api_keys =
        ServerConfig::parse_api_keys(&std::env::var("SPENDWISE_API_KEYS").unwrap_or_default());

    let mut config = ServerConfig {
        require_auth: !no_auth,
        api_keys,
        ..Default::default()
    };
    if let Ok(header) = std::env::var("SPENDWISE_USER_HEADER") {
        if !header.trim().is_empty() {
            config.user_header = header.trim().to_lowercase();
        }
    }

    if no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    } else {
        println!(
            "   🔒 Authentication: upstream proxy header ({})",
            config.user_header
        );
        if !config.api_keys.is_empty() {
            println!(
                "   🔑 API keys: {} configured (SPENDWISE_API_KEYS)",
                config.api_keys.len()
            );
        }
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;
    let analytics = load_config(config_path)?;

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    spendwise_server::serve(db, host, port, static_dir_str, config, analytics)
        .await?;

    Ok(())
}
