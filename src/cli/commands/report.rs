use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::analyzer::{
    AnalysisReport, EngagementMetrics, FullReport, StatisticalAnalyzer, TemporalPatterns,
    TouchPatterns,
};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{header, warning};
use crate::utils::colors::{CYAN, GREY, RESET, colorize_optional};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Report { totem, days, json } = cmd {
        let pool = DbPool::new(&cfg.database)?;
        let window = days.unwrap_or(cfg.report_window_days);
        let report = StatisticalAnalyzer::new(&pool, window).generate_full_report(totem.as_deref());

        if *json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        match report {
            FullReport::NoData { .. } => {
                warning(format!("No data in the last {window} days."));
            }
            FullReport::Complete(r) => print_report(&r, window),
        }
    }

    Ok(())
}

fn print_report(r: &AnalysisReport, window: i64) {
    header(format!("Report: last {window} days"));
    println!(
        "{}• Period:{} {} → {} ({} records)",
        CYAN, RESET, r.data_period.start, r.data_period.end, r.data_period.total_records
    );

    let d = &r.descriptive_stats;
    for (name, s) in [("touch", &d.touch), ("presence", &d.presence)] {
        if let Some(s) = s {
            println!(
                "{}• {name}:{} {} events, {} active ({:.2}%)",
                CYAN, RESET, s.total_events, s.active_count, s.activation_rate
            );
        }
    }
    if let Some(l) = &d.ldr {
        println!(
            "{}• ldr:{} mean {:.2}, median {:.2}, std {}, range {}–{}, IQR {:.2}–{:.2}",
            CYAN,
            RESET,
            l.mean,
            l.median,
            colorize_optional(l.std),
            l.min,
            l.max,
            l.q25,
            l.q75
        );
    }
    if let Some(s) = &d.sessions {
        println!(
            "{}• sessions:{} {} (avg {:.2}s, total {:.2}s)",
            CYAN, RESET, s.total_sessions, s.avg_duration, s.total_duration
        );
    }

    match &r.touch_patterns {
        TouchPatterns::NoTouchEvents {} => println!("{}• touches:{} {GREY}none recorded{RESET}", CYAN, RESET),
        TouchPatterns::NoActiveTouches { .. } => println!("{}• touches:{} 0 active", CYAN, RESET),
        TouchPatterns::Summary(t) => {
            let types: Vec<String> = t.touch_types.iter().map(|(k, v)| format!("{k} {v}")).collect();
            println!(
                "{}• touches:{} {} ({}), duration avg {:.2}s / median {:.2}s / {:.2}–{:.2}s",
                CYAN,
                RESET,
                t.total_touches,
                types.join(", "),
                t.avg_duration,
                t.median_duration,
                t.min_duration,
                t.max_duration
            );
        }
    }

    if let TemporalPatterns::Summary(t) = &r.temporal_patterns {
        println!(
            "{}• peak hour:{} {:02}:00 UTC ({} events)",
            CYAN, RESET, t.peak_hour, t.peak_hour_count
        );
    }

    if let EngagementMetrics::Summary(e) = &r.engagement_metrics {
        println!(
            "{}• engagement:{} {:.2}% of sessions, {:.2} touches/session, {} high / {} low",
            CYAN,
            RESET,
            e.engagement_rate,
            e.avg_touches_per_session,
            e.high_engagement_sessions,
            e.low_engagement_sessions
        );
    }
    println!();
}
