use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::cleaner::DataCleaner;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::header;
use crate::utils::colors::{CYAN, RESET, color_for_score};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Quality { json } = cmd {
        let mut pool = DbPool::new(&cfg.database)?;
        let report = DataCleaner::new(&mut pool).get_data_quality_report()?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        header("Data quality");
        println!("{}• Total records:{} {}", CYAN, RESET, report.total_records);
        for (kind, count) in &report.records_by_type {
            println!("    {kind:<9} {count}");
        }
        println!("{}• Complete sessions:{} {}", CYAN, RESET, report.complete_sessions);
        println!("{}• Records with problems:{} {}", CYAN, RESET, report.records_with_problems);
        println!(
            "{}• Quality score:{} {}{:.2}{}",
            CYAN,
            RESET,
            color_for_score(report.quality_score),
            report.quality_score,
            RESET
        );
    }

    Ok(())
}
