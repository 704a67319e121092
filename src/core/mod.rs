//! Core data model and the handler contract

pub mod attr;
pub mod error;
pub mod handler;
pub mod level;
pub mod logger;
pub mod record;

pub use attr::{Attr, Value};
pub use error::{HandlerError, Result};
pub use handler::{ErrorCallback, Handler, HandlerExt, SharedHandler, DEFAULT_CLOSE_TIMEOUT};
pub use level::{Level, LevelVar};
pub use logger::Logger;
pub use record::{Record, Source};
