use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use crate::{
    storage::json_store::Store,
    utils::time::{date_to_record_name, week_start},
};

use super::{
    output::timesheet::{all_rows, export_columns, import_csv, render_csv, week_rows},
    Session,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Every stored day as JSON
    Json,
    /// Current week as a timesheet CSV
    Week,
    /// Every stored day as a timesheet CSV
    All,
}

impl ExportFormat {
    fn default_file(self, today: chrono::NaiveDate) -> PathBuf {
        match self {
            ExportFormat::Json => "timetrack-export.json".into(),
            ExportFormat::Week => {
                format!("timetrack-week-{}.csv", date_to_record_name(week_start(today))).into()
            }
            ExportFormat::All => "timetrack-all.csv".into(),
        }
    }
}

pub async fn import<S: Store>(session: &mut Session<S>, file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {file:?}"))?;

    let summary = import_csv(&text, &mut session.book, session.today)
        .with_context(|| format!("Failed to import {file:?}"))?;
    for warning in &summary.warnings {
        println!("Warning: {warning}");
    }

    session.save_days().await?;
    info!("Imported {} days from {file:?}", summary.imported);
    println!(
        "Successfully imported {} days from {}",
        summary.imported,
        file.display()
    );
    Ok(())
}

/// Renders the requested export without touching the file system.
pub fn render_export<S: Store>(session: &Session<S>, format: ExportFormat) -> Result<String> {
    let rows = match format {
        ExportFormat::Json => return Ok(serde_json::to_string_pretty(&session.book)?),
        ExportFormat::Week => week_rows(&session.book, week_start(session.today)),
        ExportFormat::All => all_rows(&session.book),
    };
    let columns = export_columns(&session.settings.registry, &rows);
    Ok(render_csv(&rows, &columns))
}

pub async fn export<S: Store>(
    session: &Session<S>,
    format: ExportFormat,
    file: Option<PathBuf>,
) -> Result<()> {
    let file = file.unwrap_or_else(|| format.default_file(session.today));
    let contents = render_export(session, format)?;

    tokio::fs::write(&file, contents)
        .await
        .with_context(|| format!("Failed to write {file:?}"))?;
    info!("Exported {format:?} to {file:?}");
    println!("Exported to {}", file.display());
    Ok(())
}
