//! Game report files.
//!
//! A report file is JSON:
//!
//! ```json
//! {
//!   "team a": "germany",
//!   "team b": "japan",
//!   "events": [
//!     {
//!       "event name": "kickoff",
//!       "time": 0,
//!       "general game updates": { "active": true },
//!       "team a updates": {},
//!       "team b updates": {},
//!       "description": "And we're off!"
//!     }
//!   ]
//! }
//! ```
//!
//! Update values may be any JSON scalar; they are carried as text.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use touchline_proto::payloads::{Event, ReportFile, Updates};

/// Errors loading a report file.
#[derive(Error, Debug)]
pub enum ReportError {
    /// File could not be read
    #[error("could not read {}: {source}", path.display())]
    Io {
        /// File that was opened
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// File is not a valid report
    #[error("invalid report {}: {source}", path.display())]
    Json {
        /// File that was parsed
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawReport {
    #[serde(rename = "team a")]
    team_a: String,
    #[serde(rename = "team b")]
    team_b: String,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "event name")]
    name: String,
    time: i64,
    #[serde(rename = "general game updates", default)]
    general_updates: Map<String, Value>,
    #[serde(rename = "team a updates", default)]
    team_a_updates: Map<String, Value>,
    #[serde(rename = "team b updates", default)]
    team_b_updates: Map<String, Value>,
    #[serde(default)]
    description: String,
}

/// Read and parse the report file at `path`.
pub fn read_report(path: &Path) -> Result<ReportFile, ReportError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ReportError::Io { path: path.to_path_buf(), source })?;

    parse_report(&text).map_err(|source| ReportError::Json { path: path.to_path_buf(), source })
}

/// Parse report JSON. Every event is stamped with the file's team names.
pub fn parse_report(text: &str) -> Result<ReportFile, serde_json::Error> {
    let raw: RawReport = serde_json::from_str(text)?;

    let events = raw
        .events
        .into_iter()
        .map(|event| Event {
            name: event.name,
            team_a: raw.team_a.clone(),
            team_b: raw.team_b.clone(),
            time: event.time,
            general_updates: to_updates(event.general_updates),
            team_a_updates: to_updates(event.team_a_updates),
            team_b_updates: to_updates(event.team_b_updates),
            description: event.description,
        })
        .collect();

    Ok(ReportFile { team_a: raw.team_a, team_b: raw.team_b, events })
}

fn to_updates(map: Map<String, Value>) -> Updates {
    map.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"{
        "team a": "germany",
        "team b": "japan",
        "events": [
            {
                "event name": "kickoff",
                "time": 0,
                "general game updates": { "active": true, "before halftime": "true" },
                "team a updates": { "possession": "51%" },
                "team b updates": { "possession": 49 },
                "description": "And we're off!"
            },
            {
                "event name": "goal!!!!",
                "time": 1980,
                "team a updates": { "goals": "1" },
                "description": "GOOOAAALLL!!!"
            }
        ]
    }"#;

    #[test]
    fn parses_sample() {
        let report = parse_report(SAMPLE).unwrap();

        assert_eq!(report.channel(), "germany_japan");
        assert_eq!(report.events.len(), 2);

        let kickoff = &report.events[0];
        assert_eq!(kickoff.team_a, "germany");
        assert_eq!(kickoff.team_b, "japan");
        assert_eq!(kickoff.general_updates.get("active").map(String::as_str), Some("true"));
        assert_eq!(kickoff.team_b_updates.get("possession").map(String::as_str), Some("49"));

        let goal = &report.events[1];
        assert_eq!(goal.time, 1980);
        assert!(goal.general_updates.is_empty());
    }

    #[test]
    fn missing_team_is_rejected() {
        assert!(parse_report(r#"{ "team a": "x", "events": [] }"#).is_err());
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let report = read_report(file.path()).unwrap();
        assert_eq!(report.team_b, "japan");
    }

    #[test]
    fn missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let err = read_report(&path).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }
}
