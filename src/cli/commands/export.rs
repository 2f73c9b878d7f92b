use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::utils::path::expand_tilde;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        range,
        force,
    } = cmd
    {
        let mut pool = DbPool::new(&cfg.database)?;
        let path = expand_tilde(file);
        ExportLogic::export(
            &mut pool,
            *format,
            &path.to_string_lossy(),
            range.as_deref(),
            *force,
        )?;
    }
    Ok(())
}
