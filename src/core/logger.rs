//! Caller-facing logger front-end
//!
//! A `Logger` owns a [`LevelVar`] gate and the root of a handler chain.
//! Child loggers derived with `with_attrs`/`with_group` share the same
//! level cell and underlying handlers but carry their own persistent
//! attributes.

use super::attr::Attr;
use super::handler::{HandlerExt, SharedHandler};
use super::level::{Level, LevelVar};
use super::record::Record;

#[derive(Clone)]
pub struct Logger {
    level: LevelVar,
    handler: SharedHandler,
}

impl Logger {
    /// Create a logger over a handler chain, gated at `Info`
    pub fn new(handler: SharedHandler) -> Self {
        Self {
            level: LevelVar::default(),
            handler,
        }
    }

    /// Create a logger sharing an existing level cell
    pub fn with_level(handler: SharedHandler, level: LevelVar) -> Self {
        Self { level, handler }
    }

    /// The shared level cell; `set` on it affects every logger holding it
    pub fn level(&self) -> &LevelVar {
        &self.level
    }

    pub fn set_level(&self, level: Level) {
        self.level.set(level);
    }

    /// Whether a record at `level` would currently be delivered.
    ///
    /// Reads the level cell fresh on every call.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level.get() && self.handler.enabled(level)
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.log_with_attrs(level, message, Vec::new());
    }

    pub fn log_with_attrs(&self, level: Level, message: impl Into<String>, attrs: Vec<Attr>) {
        if !self.enabled(level) {
            return;
        }
        let record = Record::new(level, message).with_attrs(attrs);
        // The handler layer contains its own failures; a leaf error here is
        // absorbed so logging never surfaces an error at the call site.
        let _ = self.handler.handle(&record);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    /// A child logger whose records carry `attrs` persistently
    #[must_use]
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> Logger {
        Logger {
            level: self.level.clone(),
            handler: self.handler.with_attrs(attrs),
        }
    }

    /// A child logger whose record attributes nest under a group
    #[must_use]
    pub fn with_group(&self, name: impl Into<String>) -> Logger {
        Logger {
            level: self.level.clone(),
            handler: self.handler.with_group(name),
        }
    }

    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    pub fn flush(&self) {
        let _ = self.handler.flush();
    }

    /// Close the handler chain; forwards to the root handler's `close`
    pub fn close(&self) {
        let _ = self.handler.close();
    }
}
