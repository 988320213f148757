//! Input command parsing.
//!
//! One line, whitespace-separated words. The first word picks the command;
//! missing arguments produce the command's usage line, extra words are
//! ignored.

use std::path::PathBuf;

use thiserror::Error;

/// A parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// `login {host:port} {username} {password}`
    Login {
        /// Broker address
        addr: String,
        /// Username
        username: String,
        /// Password
        passcode: String,
    },
    /// `join {game_name}`
    Join {
        /// Channel to subscribe to
        channel: String,
    },
    /// `exit {game_name}`
    Exit {
        /// Channel to leave
        channel: String,
    },
    /// `report {file}`
    Report {
        /// JSON report file
        file: PathBuf,
    },
    /// `summary {game} {user} {output_file}`
    Summary {
        /// Channel to summarise
        channel: String,
        /// Reporting user to summarise
        user: String,
        /// File name under the summary directory
        file: String,
    },
    /// `logout`
    Logout,
}

/// Input line that is not a usable command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Known command, missing arguments
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// First word is not a command
    #[error("Unknown command: {0}")]
    Unknown(String),
}

impl InputCommand {
    /// Parse one input line. `Ok(None)` for a blank line.
    ///
    /// # Errors
    ///
    /// - `CommandError::Usage` if a known command lacks arguments
    /// - `CommandError::Unknown` if the first word is not a command
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };

        let mut arg = |usage| words.next().map(str::to_string).ok_or(CommandError::Usage(usage));

        let command = match name {
            "login" => {
                const USAGE: &str = "login {host:port} {username} {password}";
                Self::Login { addr: arg(USAGE)?, username: arg(USAGE)?, passcode: arg(USAGE)? }
            },
            "join" => Self::Join { channel: arg("join {game_name}")? },
            "exit" => Self::Exit { channel: arg("exit {game_name}")? },
            "report" => Self::Report { file: PathBuf::from(arg("report {file}")?) },
            "summary" => {
                const USAGE: &str = "summary {game} {user} {output_file}";
                Self::Summary { channel: arg(USAGE)?, user: arg(USAGE)?, file: arg(USAGE)? }
            },
            "logout" => Self::Logout,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}
