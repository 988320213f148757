//! Summary file rendering.

use std::{
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use touchline_client::Summary;
use touchline_proto::payloads::Updates;

/// Errors writing a summary file.
#[derive(Error, Debug)]
#[error("failed to write summary {}: {source}", path.display())]
pub struct SummaryError {
    /// File that was being written
    pub path: PathBuf,
    /// Underlying error
    pub source: io::Error,
}

/// Render `summary` as text.
///
/// ```text
/// <channel> <user>
///
/// General game updates:
///     <key>: <value>
///
/// <team a> updates:
///     <key>: <value>
///
/// <team b> updates:
///     <key>: <value>
///
/// <time> - <event name>:
///
/// <description>
///
///
/// ```
///
/// Update lines are tab-indented; the event block repeats in time order.
pub fn render(summary: &Summary) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "{} {}\n", summary.channel, summary.user);

    write_updates(&mut out, "General game", &summary.general_updates);
    write_updates(&mut out, summary.team_a(), &summary.team_a_updates);
    write_updates(&mut out, summary.team_b(), &summary.team_b_updates);

    for event in &summary.events {
        let _ = writeln!(out, "{} - {}:\n", event.time, event.name);
        let _ = writeln!(out, "{}\n\n", event.description);
    }

    out
}

fn write_updates(out: &mut String, title: &str, updates: &Updates) {
    let _ = writeln!(out, "{title} updates:");
    for (key, value) in updates {
        let _ = writeln!(out, "\t{key}: {value}");
    }
    out.push('\n');
}

/// Render `summary` into `dir/file`, creating `dir` if needed.
///
/// Returns the path written.
pub fn write_summary(dir: &Path, file: &str, summary: &Summary) -> Result<PathBuf, SummaryError> {
    let path = dir.join(file);

    fs::create_dir_all(dir)
        .and_then(|()| fs::write(&path, render(summary)))
        .map_err(|source| SummaryError { path: path.clone(), source })?;

    Ok(path)
}
