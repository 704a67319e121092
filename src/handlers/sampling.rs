//! Probabilistic and conditional admission
//!
//! `SamplingHandler` forwards each record with independent probability
//! `rate`; `FilterHandler` forwards iff an arbitrary predicate over the
//! record holds. Both are stateless per record: no decision carries over to
//! the next call.

use crate::core::{Handler, HandlerError, Level, Record, Result, SharedHandler};
use rand::Rng;

pub struct SamplingHandler {
    inner: SharedHandler,
    rate: f64,
}

impl SamplingHandler {
    /// Create a sampler forwarding each record with probability `rate`.
    ///
    /// Fails fast when `rate` is outside `[0, 1]` (including NaN).
    pub fn new(inner: SharedHandler, rate: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(HandlerError::config(
                "SamplingHandler",
                format!("rate must be within [0, 1], got {}", rate),
            ));
        }
        Ok(Self { inner, rate })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Handler for SamplingHandler {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if rand::thread_rng().gen::<f64>() < self.rate {
            self.inner.handle(record)
        } else {
            Ok(())
        }
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}

/// Forwards records iff a predicate accepts them.
///
/// The predicate sees the whole record, enabling criteria beyond level,
/// e.g. "always let errors through, drop everything mentioning /healthz".
pub struct FilterHandler {
    inner: SharedHandler,
    filter: Box<dyn Fn(&Record) -> bool + Send + Sync>,
}

impl FilterHandler {
    pub fn new(
        inner: SharedHandler,
        filter: impl Fn(&Record) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            filter: Box::new(filter),
        }
    }
}

impl Handler for FilterHandler {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if (self.filter)(record) {
            self.inner.handle(record)
        } else {
            Ok(())
        }
    }

    fn flush(&self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}
