mod cli;
mod db;
mod id;
mod models;
mod scan;
mod views;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let db_path = get_db_path()?;
    let mut store = db::Store::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    cli::run(&args, &mut store)
}

fn get_db_path() -> Result<std::path::PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "spendlog", "Spendlog")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("spendlog.db"))
}
