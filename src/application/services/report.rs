//! Assessment report: document model, file naming and rendering.
//!
//! Page layout belongs to a [`ReportRenderer`]; this module decides what
//! goes on the page and what the file is called.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::catalog::{category_label, category_short_code};
use crate::domain::RecommendationEntry;
use crate::infrastructure::traits::{Clock, FileSystem};

pub const REPORT_TITLE: &str = "CRIBS School Assessment Results";
pub const REPORT_HEADING: &str = "Recommended Interventions:";
pub const ALL_CLEAR_MESSAGE: &str =
    "No issues were identified in this category. Your school is doing well in this area!";
pub const FOOTER_LINES: [&str; 2] = [
    "Generated by School Climate Assessment Tool",
    "Powered by AI-for-Education.org",
];

/// One recommendation as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    pub icon: Option<String>,
    pub text: String,
}

impl From<&RecommendationEntry> for ReportItem {
    fn from(entry: &RecommendationEntry) -> Self {
        Self {
            icon: entry.icon.clone(),
            text: entry.text.clone(),
        }
    }
}

/// Table row: `"<n>. <icon>"` and the recommendation text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub marker: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReportBody {
    Recommendations(Vec<ReportRow>),
    AllClear(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub school_line: Option<String>,
    pub category_line: String,
    pub date_line: String,
    pub heading: String,
    pub body: ReportBody,
    pub footer: [String; 2],
}

/// `Oct 17, 2026`
pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Assemble the report for `items` in `category`.
///
/// An empty or absent school name omits the school line.
pub fn build_report(
    items: &[ReportItem],
    category: &str,
    school_name: Option<&str>,
    date: NaiveDate,
) -> ReportDocument {
    let body = if items.is_empty() {
        ReportBody::AllClear(ALL_CLEAR_MESSAGE.to_string())
    } else {
        ReportBody::Recommendations(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| ReportRow {
                    marker: format!("{}. {}", i + 1, item.icon.as_deref().unwrap_or("")),
                    text: item.text.clone(),
                })
                .collect(),
        )
    };

    ReportDocument {
        title: REPORT_TITLE.to_string(),
        school_line: school_name
            .filter(|name| !name.is_empty())
            .map(|name| format!("School: {}", name)),
        category_line: format!("Assessment Category: {}", category_label(category)),
        date_line: format!("Date: {}", format_report_date(date)),
        heading: REPORT_HEADING.to_string(),
        body,
        footer: FOOTER_LINES.map(str::to_string),
    }
}

/// ISO-8601 instant with `:` and `.` replaced by `-`, cut to 19 characters:
/// `2026-10-17T04-19-00`.
pub fn report_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
        .chars()
        .take(19)
        .collect()
}

/// `CRIBS_<short>_<timestamp>.<extension>`
pub fn report_filename(category: &str, now: DateTime<Utc>, extension: &str) -> String {
    format!(
        "CRIBS_{}_{}.{}",
        category_short_code(category),
        report_timestamp(now),
        extension
    )
}

/// Turns a report document into file contents.
pub trait ReportRenderer: Send + Sync {
    /// File extension without the dot, e.g. `pdf`.
    fn extension(&self) -> &str;

    fn render(&self, document: &ReportDocument) -> ApplicationResult<Vec<u8>>;
}

/// Plain-text rendering, one line per element.
#[derive(Debug, Default)]
pub struct TextReportRenderer;

impl ReportRenderer for TextReportRenderer {
    fn extension(&self) -> &str {
        "txt"
    }

    fn render(&self, document: &ReportDocument) -> ApplicationResult<Vec<u8>> {
        render_text(document)
            .map(String::into_bytes)
            .map_err(|e| ApplicationError::OperationFailed {
                context: "render text report".to_string(),
                source: Box::new(e),
            })
    }
}

fn render_text(document: &ReportDocument) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{}", document.title)?;
    writeln!(out, "{}", "=".repeat(document.title.chars().count()))?;
    if let Some(school) = &document.school_line {
        writeln!(out, "{}", school)?;
    }
    writeln!(out, "{}", document.category_line)?;
    writeln!(out, "{}", document.date_line)?;
    writeln!(out)?;
    writeln!(out, "{}", document.heading)?;
    match &document.body {
        ReportBody::Recommendations(rows) => {
            for row in rows {
                writeln!(out, "  {}  {}", row.marker.trim_end(), row.text)?;
            }
        }
        ReportBody::AllClear(message) => writeln!(out, "  {}", message)?,
    }
    writeln!(out)?;
    for line in &document.footer {
        writeln!(out, "{}", line)?;
    }
    Ok(out)
}

/// Builds, renders and saves reports.
pub struct ReportService {
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    renderer: Arc<dyn ReportRenderer>,
}

impl ReportService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        renderer: Arc<dyn ReportRenderer>,
    ) -> Self {
        Self {
            fs,
            clock,
            renderer,
        }
    }

    /// Report dated today.
    pub fn generate(
        &self,
        items: &[ReportItem],
        category: &str,
        school_name: Option<&str>,
    ) -> ReportDocument {
        build_report(items, category, school_name, self.clock.now().date_naive())
    }

    /// Render the report into `dir` under a generated name; returns the path.
    pub fn save(
        &self,
        items: &[ReportItem],
        category: &str,
        school_name: Option<&str>,
        dir: &Path,
    ) -> ApplicationResult<PathBuf> {
        let document = self.generate(items, category, school_name);
        let bytes = self.renderer.render(&document)?;
        let path = dir.join(report_filename(
            category,
            self.clock.now(),
            self.renderer.extension(),
        ));
        self.fs
            .ensure_parent(&path)
            .with_path_context("create report directory", &path)?;
        self.fs
            .write_bytes(&path, &bytes)
            .with_path_context("write report", &path)?;
        info!("report saved to {}", path.display());
        Ok(path)
    }
}
