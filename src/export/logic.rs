use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queries::load_events_between;
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::EventExport;
use crate::export::range::parse_range;
use crate::ui::messages::warning;
use crate::utils::path::is_absolute;
use std::path::Path;

pub struct ExportLogic;

impl ExportLogic {
    /// Export sensor events, optionally restricted to a `--range`
    /// (`None` or `"all"` exports everything). Returns the rows written.
    pub fn export(
        pool: &mut DbPool,
        format: ExportFormat,
        file: &str,
        range: Option<&str>,
        force: bool,
    ) -> AppResult<usize> {
        if !is_absolute(file) {
            return Err(AppError::Export(format!(
                "output file path must be absolute: {file}"
            )));
        }
        let path = Path::new(file);

        let bounds = match range {
            None => None,
            Some(r) if r.eq_ignore_ascii_case("all") => None,
            Some(r) => Some(parse_range(r)?),
        };

        ensure_writable(path, force)?;

        let rows: Vec<EventExport> = load_events_between(&pool.conn, bounds)?
            .iter()
            .map(EventExport::from)
            .collect();

        if rows.is_empty() {
            warning("No events found for the selected range.");
            return Ok(0);
        }

        match format {
            ExportFormat::Csv => export_csv(&rows, path)?,
            ExportFormat::Json => export_json(&rows, path)?,
        }

        ttlog_quiet(
            &pool.conn,
            "export",
            file,
            &format!("{} events exported as {}", rows.len(), format.as_str()),
        );

        Ok(rows.len())
    }
}
