//! Game event report body.
//!
//! Line-oriented, fixed order:
//!
//! ```text
//! user:<name>
//! team a:<name>
//! team b:<name>
//! event name:<name>
//! time:<integer>
//! general game updates:
//! <key>:<value>          (zero or more)
//! team a updates:
//! <key>:<value>          (zero or more)
//! team b updates:
//! <key>:<value>          (zero or more)
//! description:
//! <free text, any number of lines>
//! ```

use std::{collections::BTreeMap, fmt::Write};

/// Key/value updates attached to an event, ordered by key.
pub type Updates = BTreeMap<String, String>;

const GENERAL_UPDATES: &str = "general game updates:";
const TEAM_A_UPDATES: &str = "team a updates:";
const TEAM_B_UPDATES: &str = "team b updates:";
const DESCRIPTION: &str = "description:";

/// One reported happening in a game.
///
/// Immutable once ingested; histories only read and merge it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Event name (e.g. "goal!!!!")
    pub name: String,
    /// Home team
    pub team_a: String,
    /// Away team
    pub team_b: String,
    /// Game clock in seconds
    pub time: i64,
    /// Updates that concern the game as a whole
    pub general_updates: Updates,
    /// Updates for team A
    pub team_a_updates: Updates,
    /// Updates for team B
    pub team_b_updates: Updates,
    /// Free text
    pub description: String,
}

/// An [`Event`] plus the user who reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventReport {
    /// Reporting user
    pub user: String,
    /// Reported event
    pub event: Event,
}

/// Events loaded from a local report source for one game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFile {
    /// Home team
    pub team_a: String,
    /// Away team
    pub team_b: String,
    /// Events in file order
    pub events: Vec<Event>,
}

impl ReportFile {
    /// Channel the game's reports are published on: `<team a>_<team b>`.
    pub fn channel(&self) -> String {
        format!("{}_{}", self.team_a, self.team_b)
    }
}

impl EventReport {
    /// Render the body text.
    ///
    /// The description is followed by a newline, which [`decode_body`]
    /// does not carry back into the description.
    ///
    /// [`decode_body`]: EventReport::decode_body
    pub fn encode_body(&self) -> String {
        let event = &self.event;
        let mut body = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(body, "user:{}", self.user);
        let _ = writeln!(body, "team a:{}", event.team_a);
        let _ = writeln!(body, "team b:{}", event.team_b);
        let _ = writeln!(body, "event name:{}", event.name);
        let _ = writeln!(body, "time:{}", event.time);

        for (marker, updates) in [
            (GENERAL_UPDATES, &event.general_updates),
            (TEAM_A_UPDATES, &event.team_a_updates),
            (TEAM_B_UPDATES, &event.team_b_updates),
        ] {
            body.push_str(marker);
            body.push('\n');
            for (key, value) in updates {
                let _ = writeln!(body, "{key}:{value}");
            }
        }

        body.push_str(DESCRIPTION);
        body.push('\n');
        body.push_str(&event.description);
        body.push('\n');

        body
    }

    /// Parse a body, best effort.
    ///
    /// - The first five lines are positional; each yields the text after its
    ///   first `:` (the whole line if there is none), one leading space
    ///   stripped. Missing lines default to empty.
    /// - `time` that is not an integer becomes 0.
    /// - The sixth line is consumed as the general updates marker.
    /// - Update lines run until the exact next marker line; lines without a
    ///   `:` are skipped.
    /// - Everything after `description:` is the description, newline-joined.
    ///   A body that ends before any marker simply leaves the remaining
    ///   sections empty.
    pub fn decode_body(body: &str) -> Self {
        let mut lines = body.lines();

        let user = field_value(lines.next());
        let team_a = field_value(lines.next());
        let team_b = field_value(lines.next());
        let name = field_value(lines.next());
        let time = field_value(lines.next()).trim().parse().unwrap_or(0);

        // General updates marker
        let _ = lines.next();

        let general_updates = read_updates(&mut lines, TEAM_A_UPDATES);
        let team_a_updates = read_updates(&mut lines, TEAM_B_UPDATES);
        let team_b_updates = read_updates(&mut lines, DESCRIPTION);
        let description = lines.collect::<Vec<_>>().join("\n");

        Self {
            user,
            event: Event {
                name,
                team_a,
                team_b,
                time,
                general_updates,
                team_a_updates,
                team_b_updates,
                description,
            },
        }
    }
}

fn field_value(line: Option<&str>) -> String {
    let line = line.unwrap_or_default();
    let value = line.split_once(':').map_or(line, |(_, value)| value);
    value.strip_prefix(' ').unwrap_or(value).to_string()
}

fn read_updates<'a>(lines: &mut impl Iterator<Item = &'a str>, until: &str) -> Updates {
    let mut updates = Updates::new();

    for line in lines.by_ref() {
        if line == until {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            updates.insert(key.to_string(), value.strip_prefix(' ').unwrap_or(value).to_string());
        }
    }

    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updates(pairs: &[(&str, &str)]) -> Updates {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    fn goal_report() -> EventReport {
        EventReport {
            user: "alice".to_string(),
            event: Event {
                name: "goal!!!!".to_string(),
                team_a: "germany".to_string(),
                team_b: "japan".to_string(),
                time: 1980,
                general_updates: updates(&[("active", "true")]),
                team_a_updates: updates(&[("goals", "1"), ("possession", "51%")]),
                team_b_updates: Updates::new(),
                description: "GOOOAAALLL!!!\nWhat a finish".to_string(),
            },
        }
    }

    #[test]
    fn body_layout() {
        assert_eq!(
            goal_report().encode_body(),
            "user:alice\n\
             team a:germany\n\
             team b:japan\n\
             event name:goal!!!!\n\
             time:1980\n\
             general game updates:\n\
             active:true\n\
             team a updates:\n\
             goals:1\n\
             possession:51%\n\
             team b updates:\n\
             description:\n\
             GOOOAAALLL!!!\n\
             What a finish\n"
        );
    }

    #[test]
    fn decode_recovers_report() {
        let report = goal_report();
        assert_eq!(EventReport::decode_body(&report.encode_body()), report);
    }

    #[test]
    fn decode_strips_single_leading_space() {
        let body = "user: bob\nteam a: a\nteam b:b\nevent name: kickoff\ntime: 0\n\
                    general game updates:\nweather: sunny\nteam a updates:\nteam b updates:\ndescription:\n";
        let report = EventReport::decode_body(body);

        assert_eq!(report.user, "bob");
        assert_eq!(report.event.team_a, "a");
        assert_eq!(report.event.name, "kickoff");
        assert_eq!(report.event.general_updates.get("weather").map(String::as_str), Some("sunny"));
    }

    #[test]
    fn missing_description_marker_keeps_collected_updates() {
        let body = "user:carol\nteam a:a\nteam b:b\nevent name:half\ntime:2700\n\
                    general game updates:\nbefore halftime:false\n\
                    team a updates:\nshots:4\n\
                    team b updates:\nshots:2";
        let report = EventReport::decode_body(body);

        assert_eq!(report.event.time, 2700);
        assert_eq!(report.event.general_updates, updates(&[("before halftime", "false")]));
        assert_eq!(report.event.team_a_updates, updates(&[("shots", "4")]));
        assert_eq!(report.event.team_b_updates, updates(&[("shots", "2")]));
        assert_eq!(report.event.description, "");
    }

    #[test]
    fn malformed_time_defaults_to_zero() {
        let report = EventReport::decode_body("user:u\nteam a:a\nteam b:b\nevent name:e\ntime:soon\n");
        assert_eq!(report.event.time, 0);
    }

    #[test]
    fn empty_body_defaults_everything() {
        assert_eq!(EventReport::decode_body(""), EventReport::default());
    }

    #[test]
    fn report_file_channel() {
        let file = ReportFile { team_a: "X".into(), team_b: "Y".into(), events: vec![] };
        assert_eq!(file.channel(), "X_Y");
    }
}
