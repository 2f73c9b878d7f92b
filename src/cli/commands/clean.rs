use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::cleaner::DataCleaner;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Clean {
        purge,
        retention_days,
    } = cmd
    {
        let mut pool = DbPool::new(&cfg.database)?;

        let summary = DataCleaner::new(&mut pool).clean_all();
        info(format!("Duplicates removed      : {}", summary.duplicates_removed));
        info(format!("Invalid values repaired : {}", summary.invalid_records_fixed));
        info(format!("Timestamps normalized   : {}", summary.timestamps_standardized));

        ttlog_quiet(
            &pool.conn,
            "clean",
            "",
            &format!(
                "{} duplicates, {} repaired, {} timestamps",
                summary.duplicates_removed,
                summary.invalid_records_fixed,
                summary.timestamps_standardized
            ),
        );

        if *purge {
            let days = retention_days.unwrap_or(cfg.retention_days);
            match DataCleaner::new(&mut pool).remove_old_data(days) {
                Ok(deleted) => {
                    info(format!("Rows older than {days} days deleted: {deleted}"));
                    ttlog_quiet(
                        &pool.conn,
                        "purge",
                        &format!("{days} days"),
                        &format!("{deleted} rows deleted"),
                    );
                }
                Err(e) => error(format!("Retention failed: {e}")),
            }
        }

        success("Cleaning completed.");
    }

    Ok(())
}
