//! CLI `init` command: create or upgrade the memory database.

use anyhow::Result;

use iris::config::IrisConfig;
use iris::db;

pub fn init(config: &IrisConfig) -> Result<()> {
    let conn = super::open_db(config)?;
    let version = db::migrations::get_schema_version(&conn)?;
    println!("Database ready at {}", config.resolved_db_path().display());
    println!("Schema version: {version}");
    Ok(())
}
