//! Log record structure

use super::attr::Attr;
use super::level::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source code location of a log call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub file: String,
    pub line: u32,
    pub function: String,
}

/// One structured log event.
///
/// A record is immutable once constructed: decorators that enrich a record
/// build a new one rather than mutating a shared instance, because the same
/// record may be fanned out to several handlers concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl Record {
    /// Sanitize the message to prevent log injection attacks.
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a crafted message cannot forge additional log lines.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            message: Self::sanitize_message(&message.into()),
            attrs: Vec::new(),
            source: None,
        }
    }

    pub fn with_attr(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn with_source(mut self, file: &str, line: u32, function: &str) -> Self {
        self.source = Some(Source {
            file: file.to_string(),
            line,
            function: function.to_string(),
        });
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }
}
