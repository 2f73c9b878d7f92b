use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::collector::SessionCollector;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::raw_event::RawEvent;
use crate::ui::messages::{success, warning};
use crate::utils::path::expand_tilde;
use std::fs;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Ingest { file } = cmd {
        let raw = fs::read_to_string(expand_tilde(file))?;
        let events: Vec<RawEvent> = serde_json::from_str(&raw)?;

        let mut pool = DbPool::new(&cfg.database)?;
        let stats = SessionCollector::new(&mut pool, &cfg.totem_location).ingest_batch(&events)?;

        if stats.events_stored < stats.events_submitted {
            warning(format!(
                "{} of {} events could not be stored",
                stats.events_submitted - stats.events_stored,
                stats.events_submitted
            ));
        }

        success(format!(
            "Session {} ingested: {} events, {} touches, score {:.2}",
            stats.session_id, stats.events_stored, stats.touch_events, stats.interaction_score
        ));
    }

    Ok(())
}
