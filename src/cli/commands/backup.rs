use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::backup::BackupLogic;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::utils::path::expand_tilde;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Backup {
        file,
        compress,
        force,
    } = cmd
    {
        let mut pool = DbPool::new(&cfg.database)?;
        let dest = expand_tilde(file);
        BackupLogic::backup(
            &mut pool,
            &cfg.database,
            &dest.to_string_lossy(),
            *compress,
            *force,
        )?;
    }

    Ok(())
}
