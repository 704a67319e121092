//! # Resilog
//!
//! Composable, failure-contained structured log handlers.
//!
//! A logger call produces one [`core::Record`] and passes it down through a
//! chain of decorator handlers. Each decorator wraps an inner handler to add
//! one cross-cutting behavior (buffering, async dispatch, circuit breaking,
//! bounded history, sampling, fan-out, middleware) while preserving the same
//! [`core::Handler`] contract, so handlers compose transparently.
//!
//! ## Guarantees
//!
//! - **No throw**: a failure or panic in a wrapped handler never propagates
//!   past the decorator boundary into application code.
//! - **FIFO**: buffered and async dispatch deliver records in submission
//!   order.
//! - **Pure derivation**: `with_attrs`/`with_group` return new handlers and
//!   never mutate the receiver.
//! - **Deterministic teardown**: resource-owning decorators release their
//!   timers and queues only through an idempotent `close()`.

pub mod core;
pub mod handlers;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        Attr, ErrorCallback, Handler, HandlerError, HandlerExt, Level, LevelVar, Logger, Record,
        Result, SharedHandler, Source, Value, DEFAULT_CLOSE_TIMEOUT,
    };
    pub use crate::handlers::{
        AsyncHandler, BufferedHandler, CircuitBreakerHandler, CircuitBreakerStats,
        DedupMiddleware, EnrichMiddleware, ErrorBoundaryMiddleware, FilterHandler, JsonHandler,
        MetricsMiddleware, MetricsStats, Middleware, MiddlewareHandler, MultiHandler, Next,
        RateLimitMiddleware, RingBufferHandler, SamplingHandler, TextHandler,
        DEFAULT_RING_CAPACITY,
    };
}

pub use crate::core::{
    Attr, ErrorCallback, Handler, HandlerError, HandlerExt, Level, LevelVar, Logger, Record,
    Result, SharedHandler, Source, Value, DEFAULT_CLOSE_TIMEOUT,
};
pub use handlers::{
    AsyncHandler, BufferedHandler, CircuitBreakerHandler, CircuitBreakerStats, DedupMiddleware,
    EnrichMiddleware, ErrorBoundaryMiddleware, FilterHandler, JsonHandler, MetricsMiddleware,
    MetricsStats, Middleware, MiddlewareHandler, MultiHandler, Next, RateLimitMiddleware,
    RingBufferHandler, SamplingHandler, TextHandler, DEFAULT_RING_CAPACITY,
};
