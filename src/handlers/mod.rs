//! Handler implementations: decorators and baseline sinks

pub mod async_handler;
pub mod buffered;
pub mod circuit_breaker;
pub mod json;
pub mod middleware;
pub mod multi;
pub mod ring_buffer;
pub mod sampling;
pub mod text;

pub use async_handler::AsyncHandler;
pub use buffered::BufferedHandler;
pub use circuit_breaker::{CircuitBreakerHandler, CircuitBreakerStats};
pub use json::JsonHandler;
pub use middleware::{
    DedupMiddleware, EnrichMiddleware, ErrorBoundaryMiddleware, MetricsMiddleware, MetricsStats,
    Middleware, MiddlewareHandler, Next, RateLimitMiddleware,
};
pub use multi::MultiHandler;
pub use ring_buffer::{RingBufferHandler, DEFAULT_RING_CAPACITY};
pub use sampling::{FilterHandler, SamplingHandler};
pub use text::TextHandler;

use crate::core::error::{panic_message, HandlerError, Result};
use crate::core::{Handler, Record};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Call a wrapped handler with panic isolation, flattening a panic into a
/// `HandlerError` so callers only ever see a `Result`.
pub(crate) fn deliver_contained(
    handler: &dyn Handler,
    record: &Record,
    label: &str,
) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(|| handler.handle(record))) {
        Ok(result) => result,
        Err(payload) => Err(HandlerError::panicked(label, panic_message(payload.as_ref()))),
    }
}

/// Join a worker thread, giving up after `timeout`.
///
/// Returns true if the thread finished. A stuck wrapped handler can block a
/// worker mid-delivery; teardown reports the loss instead of hanging.
pub(crate) fn join_with_timeout(handle: JoinHandle<()>, timeout: Duration) -> bool {
    let start = Instant::now();
    loop {
        if handle.is_finished() {
            if let Err(payload) = handle.join() {
                eprintln!(
                    "[resilog] worker thread panicked during close: {}",
                    panic_message(payload.as_ref())
                );
            }
            return true;
        }
        if start.elapsed() >= timeout {
            eprintln!("[resilog] worker thread did not finish within {:?}; some records may be lost", timeout);
            return false;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
