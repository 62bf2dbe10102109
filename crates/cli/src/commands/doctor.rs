//! `moot doctor` — Diagnose system health.

use std::path::PathBuf;

use moot_config::AppConfig;
use moot_storage::Store;

pub async fn run() -> anyhow::Result<()> {
    println!("🩺 Moot Doctor — System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    // Check config
    let config_path = std::env::var("MOOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("moot.toml"));
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid ({})", config_path.display());
                config
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                AppConfig::default()
            }
        }
    } else {
        println!("  ⚠️  No config file — run `moot init` to create one");
        issues += 1;
        AppConfig::default()
    };

    // Check backend endpoint
    if config.backend.endpoint.starts_with("http") {
        println!("  ✅ Backend endpoint: {}", config.backend.endpoint);
    } else {
        println!(
            "  ❌ Backend endpoint is not a URL: {}",
            config.backend.endpoint
        );
        issues += 1;
    }

    // Check database
    match Store::new(&config.storage.database_path).await {
        Ok(_) => println!("  ✅ Database reachable ({})", config.storage.database_path),
        Err(e) => {
            println!("  ❌ Database unreachable: {e}");
            issues += 1;
        }
    }

    // Check content store URLs
    if config.content.api_url.starts_with("http") && config.content.gateway_url.starts_with("http")
    {
        println!("  ✅ Content store: {}", config.content.api_url);
    } else {
        println!("  ⚠️  Content store URLs look malformed — check [content] in moot.toml");
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
