//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of resolution results
//! - JSON serialization of snapshot diffs

use crate::orchestrator::{ReportEntry, ResolveReport, ResolveSummary};
use crate::output::{OutputFormatter, Verbosity};
use crate::snapshot::DiffReport;
use crate::update::MigrationCandidate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbose output also lists unchanged dependencies
    verbosity: Verbosity,
}

impl JsonFormatter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of a resolution run
#[derive(Serialize)]
struct JsonOutput<'a> {
    generated_at: DateTime<Utc>,
    summary: JsonSummary,
    dependencies: Vec<JsonResolution<'a>>,
}

#[derive(Serialize)]
struct JsonSummary {
    total: usize,
    updated: usize,
    up_to_date: usize,
    deferred: usize,
    retracted: usize,
    pending_migrations: usize,
}

impl From<ResolveSummary> for JsonSummary {
    fn from(summary: ResolveSummary) -> Self {
        Self {
            total: summary.total,
            updated: summary.updated,
            up_to_date: summary.up_to_date,
            deferred: summary.deferred,
            retracted: summary.retracted,
            pending_migrations: summary.pending_migrations,
        }
    }
}

/// JSON representation of one dependency
#[derive(Serialize)]
struct JsonResolution<'a> {
    group: &'a str,
    organization: &'a str,
    artifact: &'a str,
    cross: bool,
    configuration: &'a str,
    status: &'static str,
    from: String,
    to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retracted: Option<JsonRetraction<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    migration: Option<&'a MigrationCandidate>,
}

#[derive(Serialize)]
struct JsonRetraction<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doc: Option<&'a str>,
}

impl JsonFormatter {
    fn entry_to_json<'a>(&self, entry: &'a ReportEntry) -> Option<JsonResolution<'a>> {
        let resolution = &entry.resolution;
        let original = resolution.original();
        let status = if resolution.is_deferred() {
            "deferred"
        } else if resolution.is_updated() {
            "updated"
        } else {
            "up_to_date"
        };

        let noteworthy = status != "up_to_date"
            || resolution.retraction().is_some()
            || resolution.migration().is_some();
        if !noteworthy && self.verbosity != Verbosity::Verbose {
            return None;
        }

        Some(JsonResolution {
            group: &entry.group,
            organization: &original.coordinates.organization,
            artifact: &original.coordinates.artifact,
            cross: original.coordinates.is_cross,
            configuration: &original.coordinates.configuration,
            status,
            from: original.version.to_string(),
            to: resolution.updated().version.to_string(),
            retracted: resolution.retraction().map(|r| JsonRetraction {
                reason: r.reason.as_deref(),
                doc: r.doc.as_deref(),
            }),
            migration: resolution.migration(),
        })
    }
}

fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    writeln!(writer, "{}", json)
}

impl OutputFormatter for JsonFormatter {
    fn format_resolve(
        &self,
        report: &ResolveReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let output = JsonOutput {
            generated_at: report.generated_at,
            summary: report.summary().into(),
            dependencies: report
                .entries
                .iter()
                .filter_map(|e| self.entry_to_json(e))
                .collect(),
        };
        write_json(&output, writer)
    }

    fn format_diff(&self, report: &DiffReport, writer: &mut dyn Write) -> std::io::Result<()> {
        write_json(report, writer)
    }
}
