//! The handler contract and persistent derivation
//!
//! Every sink and every decorator in this crate implements [`Handler`].
//! Composition is plain object composition: a decorator owns one or more
//! `SharedHandler` instances and forwards to them.
//!
//! Derivation (`with_attrs`/`with_group`) is expressed on shared handles via
//! [`HandlerExt`]: it returns a *new* handler that closes over the additions
//! and delegates to the same underlying handler. The receiver is never
//! mutated, so multiple child loggers can be derived concurrently from one
//! parent and each sees only its own additions.

use super::attr::Attr;
use super::error::{HandlerError, Result};
use super::level::Level;
use super::record::Record;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for draining worker threads during `close()` (5 seconds)
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Callback invoked with a contained delivery failure and the record that
/// triggered it
pub type ErrorCallback = Arc<dyn Fn(&HandlerError, &Record) + Send + Sync>;

/// Capability set shared by every sink and decorator.
///
/// `handle` is only invoked after `enabled` returned true for the record's
/// level; decorators do not re-check their own level. Decorators must never
/// let a failure from a wrapped handler escape their own `handle` — it is
/// routed to a callback, recorded in stats, or absorbed. Leaf handlers (the
/// ones that actually write) may return errors; that is what the containment
/// layer is for.
pub trait Handler: Send + Sync {
    /// Whether a record at `level` would be accepted right now
    fn enabled(&self, level: Level) -> bool;

    /// Deliver one record
    fn handle(&self, record: &Record) -> Result<()>;

    /// Flush any buffered output
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release owned resources. Must be idempotent.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Shared handle to a handler; the unit of composition
pub type SharedHandler = Arc<dyn Handler>;

/// Derivation operations on shared handler handles
pub trait HandlerExt {
    /// A new handler that adds `attrs` to every record before delegating
    fn with_attrs(&self, attrs: Vec<Attr>) -> SharedHandler;

    /// A new handler that nests every record's attributes inside a group
    /// named `name` before delegating
    fn with_group(&self, name: impl Into<String>) -> SharedHandler;
}

impl HandlerExt for SharedHandler {
    fn with_attrs(&self, attrs: Vec<Attr>) -> SharedHandler {
        if attrs.is_empty() {
            return Arc::clone(self);
        }
        Arc::new(ScopedHandler {
            inner: Arc::clone(self),
            attrs,
            group: None,
        })
    }

    fn with_group(&self, name: impl Into<String>) -> SharedHandler {
        let name = name.into();
        if name.is_empty() {
            return Arc::clone(self);
        }
        Arc::new(ScopedHandler {
            inner: Arc::clone(self),
            attrs: Vec::new(),
            group: Some(name),
        })
    }
}

/// Handler derived by `with_attrs`/`with_group`.
///
/// Layering works out so that attrs added after a `with_group` land inside
/// that group: each wrapper rewrites the record before passing it inward,
/// and the group wrapper is always closer to the sink than attrs derived
/// later.
struct ScopedHandler {
    inner: SharedHandler,
    attrs: Vec<Attr>,
    group: Option<String>,
}

impl Handler for ScopedHandler {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let mut attrs = self.attrs.clone();
        match &self.group {
            // An empty attribute set produces no group at all.
            Some(name) if !record.attrs.is_empty() => {
                attrs.push(Attr::group(name.clone(), record.attrs.clone()));
            }
            Some(_) => {}
            None => attrs.extend(record.attrs.iter().cloned()),
        }
        let derived = Record {
            attrs,
            ..record.clone()
        };
        self.inner.handle(&derived)
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}
