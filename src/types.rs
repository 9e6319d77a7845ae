use std::str::FromStr;

use serde::Deserialize;

/// How a unit decides whether its sources changed since the last good build.
///
/// - `Timestamp`: compare file modification times against the marker's
///   modification time (default).
/// - `Hash`: compare a content fingerprint of the sources against the one
///   stored inside the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStrategy {
    #[default]
    #[serde(alias = "mtime")]
    Timestamp,
    Hash,
}

impl FromStr for ChangeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "timestamp" | "mtime" => Ok(ChangeStrategy::Timestamp),
            "hash" => Ok(ChangeStrategy::Hash),
            other => Err(format!(
                "invalid change_strategy: {other} (expected \"timestamp\" or \"hash\")"
            )),
        }
    }
}

/// Whether source roots compare case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCase {
    Sensitive,
    Insensitive,
}

impl PathCase {
    /// The usual convention of the host filesystem: case-insensitive on
    /// Windows and macOS, case-sensitive elsewhere.
    pub fn host() -> Self {
        if cfg!(any(windows, target_os = "macos")) {
            PathCase::Insensitive
        } else {
            PathCase::Sensitive
        }
    }

    pub fn from_insensitive_flag(insensitive: bool) -> Self {
        if insensitive {
            PathCase::Insensitive
        } else {
            PathCase::Sensitive
        }
    }
}

impl Default for PathCase {
    fn default() -> Self {
        PathCase::host()
    }
}
