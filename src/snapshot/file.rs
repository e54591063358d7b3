//! Snapshot file format
//!
//! One entry per line: `group<TAB>organization<TAB>artifact<TAB>version`.
//! Blank lines and lines starting with `#` are ignored, so files can be
//! appended to safely. Entries whose fields would not read back unchanged
//! (empty, padded, or holding a tab or line break) are refused on write.

use super::{ResolvedDep, Snapshot};
use crate::error::SnapshotError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

const HEADER: &str = "# group\torganization\tartifact\tversion";

/// Parse snapshot text; malformed lines are skipped with a warning
pub fn parse_snapshot(source: &str, text: &str) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        match fields.as_slice() {
            [group, organization, artifact, version]
                if fields.iter().all(|f| !f.is_empty()) =>
            {
                snapshot
                    .entry(group.to_string())
                    .or_default()
                    .insert(ResolvedDep::new(*organization, *artifact, *version));
            }
            _ => tracing::warn!(
                "{}:{}: skipping malformed snapshot line '{}'",
                source,
                number + 1,
                line
            ),
        }
    }
    snapshot
}

/// Render a snapshot, groups and entries in sorted order
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for (group, entries) in snapshot {
        for entry in entries {
            out.push_str(&line(group, entry));
        }
    }
    out
}

fn line(group: &str, entry: &ResolvedDep) -> String {
    format!(
        "{}\t{}\t{}\t{}\n",
        group, entry.organization, entry.artifact, entry.version
    )
}

/// Read a snapshot file
pub fn read_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let text = fs::read_to_string(path).map_err(|e| SnapshotError::read_error(path, e))?;
    Ok(parse_snapshot(&path.display().to_string(), &text))
}

/// Rejects entries that `parse_snapshot` would drop or alter
fn check_entry(path: &Path, group: &str, entry: &ResolvedDep) -> Result<(), SnapshotError> {
    let fields = [
        ("group", group),
        ("organization", entry.organization.as_str()),
        ("artifact", entry.artifact.as_str()),
        ("version", entry.version.as_str()),
    ];
    for (name, value) in fields {
        if value.is_empty()
            || value.trim() != value
            || value.contains(['\t', '\n', '\r'])
        {
            return Err(SnapshotError::invalid_entry(
                path,
                format!("{} {:?} in group {:?} is not representable", name, value, group),
            ));
        }
    }
    if group.starts_with('#') {
        return Err(SnapshotError::invalid_entry(
            path,
            format!("group {:?} would be read as a comment", group),
        ));
    }
    Ok(())
}

/// Write a snapshot file, replacing any previous content
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    for (group, entries) in snapshot {
        for entry in entries {
            check_entry(path, group, entry)?;
        }
    }
    fs::write(path, render_snapshot(snapshot)).map_err(|e| SnapshotError::write_error(path, e))
}

/// Append entries of one group to a snapshot file, creating it if needed
pub fn append_entries(
    path: &Path,
    group: &str,
    entries: &[ResolvedDep],
) -> Result<(), SnapshotError> {
    for entry in entries {
        check_entry(path, group, entry)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SnapshotError::write_error(path, e))?;
    let text: String = entries.iter().map(|e| line(group, e)).collect();
    file.write_all(text.as_bytes())
        .map_err(|e| SnapshotError::write_error(path, e))
}
