//! `moot init` — Write a starter config and prepare the database.

use anyhow::Context;
use moot_config::AppConfig;
use moot_storage::Store;

pub async fn run() -> anyhow::Result<()> {
    let config_path = std::path::Path::new("moot.toml");

    if config_path.exists() {
        println!("  Config already exists at: {}", config_path.display());
        println!("  Edit it in place, or delete it and re-run init.");
    } else {
        std::fs::write(config_path, AppConfig::default_toml())
            .context("Failed to write moot.toml")?;
        println!("  ✅ Created moot.toml");
    }

    let config = super::context::load_config()?;
    Store::new(&config.storage.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to initialize database at {}",
                config.storage.database_path
            )
        })?;
    println!("  ✅ Database ready at: {}", config.storage.database_path);

    println!();
    println!("  Next steps:");
    println!("    1. Point [backend] endpoint at your completion server");
    println!("    2. Open a conversation: moot new <agenda>");
    println!("    3. Record messages with `moot say`, then `moot respond`");

    Ok(())
}
