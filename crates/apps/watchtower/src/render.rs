//! Plain-text rendering of published snapshots

use std::fmt::Write;
use tracking::{Snapshot, TrackerRow};

const LABEL_WIDTH: usize = 24;
const STATUS_WIDTH: usize = 9;

/// Render a snapshot as badges, a tracker table and an error summary
pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} | {} | {}",
        snapshot.status_line(),
        snapshot.count_line(),
        if snapshot.connected { "connected" } else { "offline" }
    );

    let rows = snapshot.result.rows();
    if !rows.is_empty() {
        let _ = writeln!(
            out,
            "{:<LABEL_WIDTH$} {:<STATUS_WIDTH$} {:>9} {:>8}  Zones",
            "Tracker", "Status", "Speed", "Updated"
        );
        for row in &rows {
            let _ = writeln!(out, "{}", render_row(row));
        }
    }

    // Missing trackers are already visible as "no data" rows
    let failures: Vec<_> = snapshot
        .result
        .errors
        .iter()
        .filter(|e| e.is_fatal())
        .collect();
    for failure in failures {
        let _ = writeln!(out, "! {}: {}", failure.subject, failure.message);
    }

    out
}

fn render_row(row: &TrackerRow<'_>) -> String {
    let mut label = row.tracker.display_label();
    if label.chars().count() > LABEL_WIDTH {
        label = label.chars().take(LABEL_WIDTH - 1).collect::<String>() + "…";
    }

    let (speed, updated, zones) = match row.state() {
        Some(state) => (
            state
                .state()
                .speed
                .map(|s| format!("{:.0} km/h", s))
                .unwrap_or_else(|| "-".to_string()),
            state
                .minutes_since_update()
                .map(|m| format!("{}m ago", m))
                .unwrap_or_else(|| "-".to_string()),
            state.zone_labels().join(", "),
        ),
        None => ("-".to_string(), "-".to_string(), String::new()),
    };

    format!(
        "{:<LABEL_WIDTH$} {:<STATUS_WIDTH$} {:>9} {:>8}  {}",
        label,
        row.status_text(),
        speed,
        updated,
        zones
    )
    .trim_end()
    .to_string()
}
