//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-group update listing with change type indication (major/minor/patch)
//! - Migration and retraction notices
//! - Snapshot diff display
//! - Summary line

use crate::domain::NumericVersion;
use crate::orchestrator::{ReportEntry, ResolveReport};
use crate::output::{OutputFormatter, Verbosity};
use crate::snapshot::DiffReport;
use crate::update::Resolution;
use colored::{ColoredString, Colorize};
use std::io::Write;

/// Version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionChangeType {
    /// First part changed
    Major,
    /// Second part changed
    Minor,
    /// Anything further right changed
    Patch,
    /// Not comparable (e.g. variable versions)
    Unknown,
}

impl VersionChangeType {
    /// Determine the change type between two versions
    pub fn between(old: Option<&NumericVersion>, new: Option<&NumericVersion>) -> Self {
        let (Some(old), Some(new)) = (old, new) else {
            return VersionChangeType::Unknown;
        };
        let part = |v: &NumericVersion, i: usize| v.parts().get(i).copied().unwrap_or(0);
        if part(old, 0) != part(new, 0) {
            VersionChangeType::Major
        } else if part(old, 1) != part(new, 1) {
            VersionChangeType::Minor
        } else {
            VersionChangeType::Patch
        }
    }

    /// Get the display label with color
    pub fn colored_label(&self) -> String {
        match self {
            VersionChangeType::Major => "major".red().bold().to_string(),
            VersionChangeType::Minor => "minor".yellow().to_string(),
            VersionChangeType::Patch => "patch".green().to_string(),
            VersionChangeType::Unknown => "?".dimmed().to_string(),
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChangeType::Major => "major",
            VersionChangeType::Minor => "minor",
            VersionChangeType::Patch => "patch",
            VersionChangeType::Unknown => "?",
        }
    }
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self::with_color(verbosity, true)
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn arrow(&self) -> String {
        if self.color {
            "→".dimmed().to_string()
        } else {
            "->".to_string()
        }
    }

    fn label(&self, change: VersionChangeType) -> String {
        if self.color {
            change.colored_label()
        } else {
            change.label().to_string()
        }
    }

    /// Lines describing one entry; empty when there is nothing to show
    fn entry_lines(&self, resolution: &Resolution, width: usize) -> Vec<String> {
        let original = resolution.original();
        let name = format!("{:width$}", original.coordinates.to_string(), width = width);
        let mut lines = Vec::new();

        if resolution.is_deferred() {
            if self.verbosity == Verbosity::Verbose {
                lines.push(format!(
                    "  {} {}",
                    self.paint(&name, |s| s.dimmed()),
                    self.paint(&format!("{} (deferred)", original.version), |s| s.dimmed())
                ));
            }
            return lines;
        }

        let updated = resolution.updated();
        if resolution.is_updated() {
            let change = VersionChangeType::between(
                original.version.as_numeric(),
                updated.version.as_numeric(),
            );
            let target = if updated.coordinates != original.coordinates {
                format!("{} {}", updated.coordinates, updated.version)
            } else {
                updated.version.to_string()
            };
            lines.push(format!(
                "  {} {} {} {} [{}]",
                name,
                self.paint(&original.version.to_string(), |s| s.dimmed()),
                self.arrow(),
                self.paint(&target, |s| s.bright_white().bold()),
                self.label(change)
            ));
        } else if self.verbosity == Verbosity::Verbose {
            lines.push(format!(
                "  {} {}",
                self.paint(&name, |s| s.dimmed()),
                self.paint(&format!("{} (up to date)", original.version), |s| s.dimmed())
            ));
        }

        if self.verbosity == Verbosity::Quiet {
            return lines;
        }

        if let Some(migration) = resolution.migration() {
            let status = if migration.applied {
                "migrated"
            } else {
                "migration available"
            };
            lines.push(format!(
                "  {} {} {} {} ({})",
                " ".repeat(width),
                self.arrow(),
                self.paint(&migration.to.to_string(), |s| s.cyan()),
                migration.version,
                status
            ));
        }

        if let Some(retraction) = resolution.retraction() {
            let mut notice = format!("{} is retracted", original.version);
            if let Some(ref reason) = retraction.reason {
                notice.push_str(&format!(": {}", reason));
            }
            if let Some(ref doc) = retraction.doc {
                notice.push_str(&format!(" ({})", doc));
            }
            lines.push(format!(
                "  {} {}",
                " ".repeat(width),
                self.paint(&notice, |s| s.yellow())
            ));
        }

        lines
    }

    fn format_group(
        &self,
        group: &str,
        entries: &[&ReportEntry],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let width = entries
            .iter()
            .map(|e| e.resolution.original().coordinates.to_string().len())
            .max()
            .unwrap_or(0)
            .max(20);
        let lines: Vec<String> = entries
            .iter()
            .flat_map(|e| self.entry_lines(&e.resolution, width))
            .collect();
        if lines.is_empty() {
            return Ok(());
        }

        if self.verbosity != Verbosity::Quiet {
            writeln!(writer, "{}", self.paint(group, |s| s.bold()))?;
        }
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        if self.verbosity != Verbosity::Quiet {
            writeln!(writer)?;
        }
        Ok(())
    }

    fn format_resolve_summary(
        &self,
        report: &ResolveReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let summary = report.summary();
        let mut parts = vec![
            format!(
                "{} updated",
                self.paint(&summary.updated.to_string(), |s| s.green())
            ),
            format!("{} up to date", summary.up_to_date),
        ];
        if summary.deferred > 0 {
            parts.push(format!("{} deferred", summary.deferred));
        }
        if summary.retracted > 0 {
            parts.push(format!(
                "{} retracted",
                self.paint(&summary.retracted.to_string(), |s| s.yellow())
            ));
        }
        if summary.pending_migrations > 0 {
            parts.push(format!(
                "{} migration(s) available (use --apply-migrations)",
                self.paint(&summary.pending_migrations.to_string(), |s| s.cyan())
            ));
        }
        writeln!(writer, "{}", parts.join(", "))
    }
}

impl OutputFormatter for TextFormatter {
    fn format_resolve(
        &self,
        report: &ResolveReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        // Groups in order of first appearance
        let mut groups: Vec<(&str, Vec<&ReportEntry>)> = Vec::new();
        for entry in &report.entries {
            match groups.iter_mut().find(|(g, _)| *g == entry.group) {
                Some((_, entries)) => entries.push(entry),
                None => groups.push((entry.group.as_str(), vec![entry])),
            }
        }

        for (group, entries) in &groups {
            self.format_group(group, entries, writer)?;
        }

        if self.verbosity != Verbosity::Quiet {
            self.format_resolve_summary(report, writer)?;
        }
        Ok(())
    }

    fn format_diff(&self, report: &DiffReport, writer: &mut dyn Write) -> std::io::Result<()> {
        if report.is_empty() {
            if self.verbosity != Verbosity::Quiet {
                writeln!(writer, "No changes")?;
            }
            return Ok(());
        }

        for (group, diff) in &report.groups {
            writeln!(writer, "{}", self.paint(group, |s| s.bold()))?;
            for updated in &diff.updated {
                writeln!(
                    writer,
                    "  {} {}:{} {} {} {}",
                    self.paint("~", |s| s.yellow()),
                    updated.organization,
                    updated.artifact,
                    self.paint(&updated.from, |s| s.dimmed()),
                    self.arrow(),
                    self.paint(&updated.to, |s| s.bright_white().bold())
                )?;
            }
            for added in &diff.added {
                writeln!(
                    writer,
                    "  {} {}:{} {}",
                    self.paint("+", |s| s.green()),
                    added.organization,
                    added.artifact,
                    added.version
                )?;
            }
            for removed in &diff.removed {
                writeln!(
                    writer,
                    "  {} {}:{} {}",
                    self.paint("-", |s| s.red()),
                    removed.organization,
                    removed.artifact,
                    removed.version
                )?;
            }
        }

        if self.verbosity != Verbosity::Quiet {
            let total: usize = report.groups.values().map(|d| d.len()).sum();
            writeln!(writer)?;
            writeln!(
                writer,
                "{} change(s) in {} group(s)",
                total,
                report.groups.len()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, Dependency, RetractedArtifact, Version};
    use crate::snapshot::{ResolvedDep, Snapshot};
    use crate::update::MigrationCandidate;

    fn numeric(s: &str) -> NumericVersion {
        NumericVersion::parse(s).unwrap()
    }

    fn dep(org: &str, artifact: &str, version: &str) -> Dependency {
        Dependency::new(Coordinates::new(org, artifact), Version::parse(version).unwrap())
    }

    fn entry(group: &str, resolution: Resolution) -> ReportEntry {
        ReportEntry {
            group: group.to_string(),
            resolution,
        }
    }

    fn resolved(original: Dependency, updated: Dependency) -> Resolution {
        Resolution::Resolved {
            original,
            updated,
            retracted: None,
            migration: None,
        }
    }

    fn sample_report() -> ResolveReport {
        ResolveReport::new(vec![
            entry(
                "core",
                resolved(
                    dep("org.slf4j", "slf4j-api", "1.7.36"),
                    dep("org.slf4j", "slf4j-api", "2.0.12"),
                ),
            ),
            entry(
                "core",
                resolved(dep("org.jsoup", "jsoup", "1.17.2"), dep("org.jsoup", "jsoup", "1.17.2")),
            ),
            entry(
                "web",
                Resolution::Deferred {
                    dependency: dep("io.circe", "circe-core", "$circe"),
                },
            ),
        ])
    }

    fn render(formatter: &TextFormatter, report: &ResolveReport) -> String {
        let mut out = Vec::new();
        formatter.format_resolve(report, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_version_change_type() {
        let between = |a: &str, b: &str| {
            VersionChangeType::between(Some(&numeric(a)), Some(&numeric(b)))
        };
        assert_eq!(between("1.2.3", "2.0.0"), VersionChangeType::Major);
        assert_eq!(between("1.2.3", "1.3.0"), VersionChangeType::Minor);
        assert_eq!(between("1.2.3", "1.2.4"), VersionChangeType::Patch);
        assert_eq!(between("1.0-RC1", "1.0-RC2"), VersionChangeType::Patch);
        assert_eq!(
            VersionChangeType::between(None, Some(&numeric("1.0"))),
            VersionChangeType::Unknown
        );
    }

    #[test]
    fn test_resolve_normal() {
        let text = render(&TextFormatter::with_color(Verbosity::Normal, false), &sample_report());
        assert!(text.contains("core\n"));
        assert!(text.contains("org.slf4j:slf4j-api"));
        assert!(text.contains("1.7.36 -> 2.0.12 [major]"));
        assert!(!text.contains("jsoup"));
        assert!(!text.contains("web"));
        assert!(text.contains("1 updated, 1 up to date, 1 deferred"));
    }

    #[test]
    fn test_resolve_verbose_lists_everything() {
        let text = render(&TextFormatter::with_color(Verbosity::Verbose, false), &sample_report());
        assert!(text.contains("1.17.2 (up to date)"));
        assert!(text.contains("web\n"));
        assert!(text.contains("$circe (deferred)"));
    }

    #[test]
    fn test_resolve_quiet() {
        let text = render(&TextFormatter::with_color(Verbosity::Quiet, false), &sample_report());
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("2.0.12"));
    }

    #[test]
    fn test_resolve_notices() {
        let original = dep("com.geirsson", "scalafmt", "1.5.1");
        let report = ResolveReport::new(vec![entry(
            "core",
            Resolution::Resolved {
                original: original.clone(),
                updated: original,
                retracted: Some(
                    RetractedArtifact::new("com.geirsson", None).with_reason("bad release"),
                ),
                migration: Some(MigrationCandidate {
                    from: Coordinates::new("com.geirsson", "scalafmt"),
                    to: Coordinates::new("org.scalameta", "scalafmt"),
                    version: numeric("3.7.17"),
                    applied: false,
                }),
            },
        )]);
        let text = render(&TextFormatter::with_color(Verbosity::Normal, false), &report);
        assert!(text.contains("-> org.scalameta:scalafmt 3.7.17 (migration available)"));
        assert!(text.contains("1.5.1 is retracted: bad release"));
        assert!(text.contains("1 migration(s) available"));
        assert!(text.contains("1 retracted"));
    }

    #[test]
    fn test_diff_output() {
        let mut before = Snapshot::new();
        before
            .entry("core".to_string())
            .or_default()
            .extend([ResolvedDep::new("org", "a", "1.0"), ResolvedDep::new("org", "c", "1.0")]);
        let mut after = Snapshot::new();
        after
            .entry("core".to_string())
            .or_default()
            .extend([ResolvedDep::new("org", "a", "1.1"), ResolvedDep::new("org", "b", "2.0")]);

        let mut out = Vec::new();
        TextFormatter::with_color(Verbosity::Normal, false)
            .format_diff(&DiffReport::new(&before, &after), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  ~ org:a 1.0 -> 1.1"));
        assert!(text.contains("  + org:b 2.0"));
        assert!(text.contains("  - org:c 1.0"));
        assert!(text.contains("3 change(s) in 1 group(s)"));
    }

    #[test]
    fn test_diff_output_no_changes() {
        let mut out = Vec::new();
        TextFormatter::with_color(Verbosity::Normal, false)
            .format_diff(&DiffReport::new(&Snapshot::new(), &Snapshot::new()), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No changes\n");
    }
}
