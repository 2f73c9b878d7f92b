use crate::config::Config;
use crate::db::pool::DbPool;
use crate::db::queries::totem_summaries;
use crate::errors::AppResult;
use crate::ui::messages::{header, warning};
use crate::utils::table::Table;

pub fn handle(cfg: &Config) -> AppResult<()> {
    let pool = DbPool::new(&cfg.database)?;
    let summaries = totem_summaries(&pool.conn)?;

    if summaries.is_empty() {
        warning("No totems recorded yet.");
        return Ok(());
    }

    let fmt = |v: Option<f64>| v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "--".into());

    let mut table = Table::new(vec![
        "Totem",
        "Location",
        "Sessions",
        "Touches",
        "Avg score",
        "Avg duration (s)",
    ]);
    for s in &summaries {
        table.add_row(vec![
            s.totem_id.clone(),
            s.location.clone(),
            s.total_sessions.to_string(),
            s.total_touches.to_string(),
            fmt(s.avg_interaction_score),
            fmt(s.avg_session_duration),
        ]);
    }

    header("Totems");
    print!("{}", table.render());
    Ok(())
}
