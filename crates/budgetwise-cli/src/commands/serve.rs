//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::{load_config, open_db};

pub async fn cmd_serve(
    db_path: &Path,
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    no_auth: bool,
    no_encrypt: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if no_auth {
        config.server.require_auth = false;
    }

    println!("🚀 Starting BudgetWise web server...");
    println!("   Database: {}", db_path.display());
    println!(
        "   Listening: http://{}:{}",
        config.server.host, config.server.port
    );

    if config.server.require_auth {
        println!("   🔒 Authentication: user tokens (POST /api/auth/login)");
        if !config.server.api_keys.is_empty() {
            println!(
                "   🔑 API keys: {} configured (BW_API_KEYS)",
                config.server.api_keys.len()
            );
        }
    } else {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
    }
    match &config.predictor.url {
        Some(url) => println!("   🤖 Category predictor: {}", url),
        None => println!("   💡 Tip: Set BW_PREDICTOR_URL for category suggestions"),
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;
    budgetwise_server::serve(db, config).await?;

    Ok(())
}
