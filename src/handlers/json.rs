//! Newline-delimited JSON sink
//!
//! One JSON object per line, serialized straight from [`Record`]. Attribute
//! order survives serialization, duplicates included. Gated by a
//! [`LevelVar`] like the text sink.

use crate::core::{Handler, Level, LevelVar, Record, Result};
use parking_lot::Mutex;
use std::io::Write;

pub struct JsonHandler {
    writer: Mutex<Box<dyn Write + Send>>,
    level: LevelVar,
}

impl JsonHandler {
    /// Write to standard output
    pub fn stdout(level: LevelVar) -> Self {
        Self::with_writer(Box::new(std::io::stdout()), level)
    }

    pub fn with_writer(writer: Box<dyn Write + Send>, level: LevelVar) -> Self {
        Self {
            writer: Mutex::new(writer),
            level,
        }
    }
}

impl Handler for JsonHandler {
    fn enabled(&self, level: Level) -> bool {
        level >= self.level.get()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }
}
