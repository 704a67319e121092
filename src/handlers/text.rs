//! Line-oriented human-readable sink
//!
//! Formats each record as `[timestamp] [LEVEL] message key=value ...` and
//! writes it to an owned writer. Gated by a [`LevelVar`], so the minimum
//! level can be changed at runtime by any holder of the cell.

use crate::core::attr::format_attrs;
use crate::core::{Handler, Level, LevelVar, Record, Result};
use parking_lot::Mutex;
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub struct TextHandler {
    writer: Mutex<Box<dyn Write + Send>>,
    level: LevelVar,
    #[cfg(feature = "console")]
    use_colors: bool,
}

impl TextHandler {
    /// Write to standard output
    pub fn stdout(level: LevelVar) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), level)
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, level: LevelVar) -> Self {
        Self {
            writer: Mutex::new(writer),
            level,
            #[cfg(feature = "console")]
            use_colors: false,
        }
    }

    /// Colorize the level tag (terminal output only)
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn format_line(&self, record: &Record) -> String {
        let timestamp = record.time.format(TIMESTAMP_FORMAT);
        let level_tag = self.level_tag(record.level);

        let mut line = format!("[{}] [{}] {}", timestamp, level_tag, record.message);
        if !record.attrs.is_empty() {
            line.push(' ');
            line.push_str(&format_attrs(&record.attrs));
        }
        if let Some(source) = &record.source {
            line.push_str(&format!(" ({}:{})", source.file, source.line));
        }
        line
    }

    #[cfg(feature = "console")]
    fn level_tag(&self, level: Level) -> String {
        use colored::Colorize;
        if self.use_colors {
            level.to_str().color(level.color_code()).to_string()
        } else {
            level.to_str().to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_tag(&self, level: Level) -> String {
        level.to_str().to_string()
    }
}

impl Handler for TextHandler {
    fn enabled(&self, level: Level) -> bool {
        level >= self.level.get()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let line = self.format_line(record);
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}
