use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};

/// Handle the `init` command
///
/// Creates the config directory and file (skipped in test mode), the SQLite
/// store, and brings its schema up to date.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.db.clone(), cli.test)?;

    info("Initializing totemlog…");

    let pool = DbPool::new(&cfg.database)?;
    success(format!("Database initialized at {}", cfg.database));

    ttlog_quiet(
        &pool.conn,
        "init",
        &cfg.database,
        &format!("Store initialized, default totem {}", cfg.totem_id),
    );

    Ok(())
}
