//! `maildraft onboard`: Write a starter config file.

use std::path::PathBuf;

use maildraft_config::AppConfig;

pub async fn run(path: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path
        .cloned()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    println!("📨 maildraft — First-Time Setup");
    println!("===============================\n");

    if let Some(dir) = config_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set knowledge_base_id and region in {}", config_path.display());
    println!("   2. Export MAILDRAFT_API_KEY (or AWS_BEARER_TOKEN_BEDROCK)");
    println!("   3. Run: maildraft doctor\n");

    Ok(())
}
