//! Failure containment for an unhealthy primary handler
//!
//! Two observable states: CLOSED (attempt the primary) and OPEN (cooling
//! down, deliver to the fallback or drop). Cooldown expiry does not run a
//! background timer; the first record arriving after the cooldown probes
//! the primary directly. A failed probe re-opens the breaker immediately,
//! a successful one resets the consecutive-failure count.

use crate::core::{ErrorCallback, Handler, HandlerError, Level, Record, Result, SharedHandler};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Read-only stats snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    pub open: bool,
    pub total_errors: u64,
    pub fallback_used: u64,
    pub dropped: u64,
}

#[derive(Debug)]
struct BreakerState {
    open: bool,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    total_errors: u64,
    fallback_used: u64,
    dropped: u64,
}

pub struct CircuitBreakerHandler {
    primary: SharedHandler,
    fallback: Option<SharedHandler>,
    failure_threshold: u32,
    cooldown: Duration,
    on_error: Option<ErrorCallback>,
    state: Mutex<BreakerState>,
}

impl CircuitBreakerHandler {
    /// Create a breaker tripping after `failure_threshold` consecutive
    /// primary failures, cooling down for `cooldown`.
    pub fn new(
        primary: SharedHandler,
        failure_threshold: u32,
        cooldown: Duration,
    ) -> Result<Self> {
        if failure_threshold == 0 {
            return Err(HandlerError::config(
                "CircuitBreakerHandler",
                "failure_threshold must be positive",
            ));
        }
        Ok(Self {
            primary,
            fallback: None,
            failure_threshold,
            cooldown,
            on_error: None,
            state: Mutex::new(BreakerState {
                open: false,
                consecutive_failures: 0,
                opened_at: None,
                total_errors: 0,
                fallback_used: 0,
                dropped: 0,
            }),
        })
    }

    /// Deliver to this handler while the circuit is open
    #[must_use]
    pub fn with_fallback(mut self, fallback: SharedHandler) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Invoke this callback on every contained primary or fallback failure
    #[must_use]
    pub fn with_on_error(mut self, on_error: ErrorCallback) -> Self {
        self.on_error = Some(on_error);
        self
    }

    /// Snapshot of the breaker's counters. Never auto-reset.
    pub fn stats(&self) -> CircuitBreakerStats {
        let state = self.state.lock();
        CircuitBreakerStats {
            open: state.open,
            total_errors: state.total_errors,
            fallback_used: state.fallback_used,
            dropped: state.dropped,
        }
    }

    fn report(&self, error: &HandlerError, record: &Record) {
        if let Some(cb) = &self.on_error {
            cb(error, record);
        }
    }
}

impl Handler for CircuitBreakerHandler {
    /// The breaker does not gate by level itself
    fn enabled(&self, level: Level) -> bool {
        self.primary.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let attempt_primary = {
            let mut state = self.state.lock();
            if !state.open {
                true
            } else {
                match state.opened_at {
                    Some(at) if at.elapsed() < self.cooldown => false,
                    // Cooldown elapsed: close and probe with this record.
                    _ => {
                        state.open = false;
                        state.opened_at = None;
                        true
                    }
                }
            }
        };

        if attempt_primary {
            match super::deliver_contained(&*self.primary, record, "primary handler") {
                Ok(()) => {
                    self.state.lock().consecutive_failures = 0;
                }
                Err(e) => {
                    {
                        let mut state = self.state.lock();
                        state.consecutive_failures += 1;
                        state.total_errors += 1;
                        if state.consecutive_failures >= self.failure_threshold {
                            state.open = true;
                            state.opened_at = Some(Instant::now());
                        }
                    }
                    self.report(&e, record);
                }
            }
        } else if let Some(fallback) = &self.fallback {
            self.state.lock().fallback_used += 1;
            if let Err(e) = super::deliver_contained(&**fallback, record, "fallback handler") {
                self.report(&e, record);
            }
        } else {
            self.state.lock().dropped += 1;
        }

        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let result = self.primary.flush();
        if let Some(fallback) = &self.fallback {
            fallback.flush()?;
        }
        result
    }

    fn close(&self) -> Result<()> {
        let result = self.primary.close();
        if let Some(fallback) = &self.fallback {
            fallback.close()?;
        }
        result
    }
}
