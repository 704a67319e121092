//! Log level definitions and the shared level cell

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum Level {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub fn to_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::Debug => Blue,
            Level::Info => Green,
            Level::Warn => Yellow,
            Level::Error => Red,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Shared mutable level cell.
///
/// Every clone refers to the same underlying cell, and `get()` reads the
/// current value fresh on each call. Handlers that gate on a `LevelVar`
/// therefore observe a `set()` immediately; the value is never cached.
///
/// # Example
///
/// ```
/// use resilog::core::{Level, LevelVar};
///
/// let var = LevelVar::new(Level::Info);
/// let shared = var.clone();
/// shared.set(Level::Error);
/// assert_eq!(var.get(), Level::Error);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LevelVar(Arc<RwLock<Level>>);

impl LevelVar {
    pub fn new(level: Level) -> Self {
        Self(Arc::new(RwLock::new(level)))
    }

    /// Read the current level
    pub fn get(&self) -> Level {
        *self.0.read()
    }

    /// Replace the level for every holder of this cell
    pub fn set(&self, level: Level) {
        *self.0.write() = level;
    }
}
