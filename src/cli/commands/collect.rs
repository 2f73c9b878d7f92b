use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::collector::SessionCollector;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::sim::SensorSimulator;
use crate::ui::messages::{header, success};
use crate::utils::colors::{RESET, color_for_score};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Collect {
        sessions,
        duration,
        totem,
        seed,
    } = cmd
    {
        let totem_id = totem.clone().unwrap_or_else(|| cfg.totem_id.clone());
        let mut pool = DbPool::new(&cfg.database)?;
        let mut feed = SensorSimulator::new(&totem_id, *seed);
        let mut collector = SessionCollector::new(&mut pool, &cfg.totem_location);

        header(format!("Collecting {sessions} session(s) on {totem_id}"));

        let mut stored = 0;
        for n in 1..=*sessions {
            let stats = collector.collect_and_store(&mut feed, *duration)?;
            stored += stats.events_stored;

            println!(
                "  #{n:<3} {}  {}/{} events  {} touches  score {}{:.2}{}",
                stats.session_id,
                stats.events_stored,
                stats.events_submitted,
                stats.touch_events,
                color_for_score(stats.interaction_score),
                stats.interaction_score,
                RESET
            );
        }

        success(format!("{sessions} session(s) stored, {stored} events"));
    }

    Ok(())
}
