//! Time/size-bounded buffering in front of a slow handler
//!
//! Records accumulate in a pending buffer and are flushed to the wrapped
//! handler either when the buffer reaches `buffer_size` (synchronously,
//! inside the `handle` that filled it) or when the flush interval elapses
//! (on a timer thread). `close()` cancels the timer, runs one final flush
//! and closes the wrapped handler, so no record accepted before the call is
//! lost unless the wrapped handler itself rejects it.

use crate::core::{
    Handler, HandlerError, Level, Record, Result, SharedHandler, DEFAULT_CLOSE_TIMEOUT,
};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub struct BufferedHandler {
    inner: SharedHandler,
    buffer_size: usize,
    pending: Arc<Mutex<Vec<Record>>>,
    shutdown: Mutex<Option<Sender<()>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl BufferedHandler {
    /// Create a buffer flushing at `buffer_size` records or every
    /// `flush_interval`, whichever comes first.
    pub fn new(
        inner: SharedHandler,
        buffer_size: usize,
        flush_interval: Duration,
    ) -> Result<Self> {
        if buffer_size == 0 {
            return Err(HandlerError::config(
                "BufferedHandler",
                "buffer_size must be positive",
            ));
        }
        if flush_interval.is_zero() {
            return Err(HandlerError::config(
                "BufferedHandler",
                "flush_interval must be positive",
            ));
        }

        let pending = Arc::new(Mutex::new(Vec::with_capacity(buffer_size)));
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let timer_pending = Arc::clone(&pending);
        let timer_inner = Arc::clone(&inner);
        let timer = thread::spawn(move || loop {
            match shutdown_rx.recv_timeout(flush_interval) {
                // Interval elapsed: flush whatever is pending, possibly nothing.
                Err(RecvTimeoutError::Timeout) => {
                    flush_pending(&timer_pending, &timer_inner);
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        Ok(Self {
            inner,
            buffer_size,
            pending,
            shutdown: Mutex::new(Some(shutdown_tx)),
            timer: Mutex::new(Some(timer)),
        })
    }

    /// Number of records currently pending
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    fn closed(&self) -> bool {
        self.shutdown.lock().is_none()
    }
}

/// Take ownership of the pending sequence and forward each record in order.
/// One record's failure does not stop delivery of the rest.
fn flush_pending(pending: &Mutex<Vec<Record>>, inner: &SharedHandler) {
    let drained = std::mem::take(&mut *pending.lock());
    for record in &drained {
        if let Err(e) = super::deliver_contained(&**inner, record, "buffered inner handler") {
            eprintln!("[resilog] buffered delivery failed: {}", e);
        }
    }
}

impl Handler for BufferedHandler {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if self.closed() {
            // After close the buffer no longer exists; deliver directly.
            return super::deliver_contained(&*self.inner, record, "buffered inner handler")
                .or(Ok(()));
        }

        let full = {
            let mut pending = self.pending.lock();
            pending.push(record.clone());
            pending.len() >= self.buffer_size
        };
        if full {
            flush_pending(&self.pending, &self.inner);
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        flush_pending(&self.pending, &self.inner);
        self.inner.flush()
    }

    /// Cancel the timer, flush once more, close the wrapped handler.
    /// Safe to call multiple times.
    fn close(&self) -> Result<()> {
        let shutdown = self.shutdown.lock().take();
        let Some(shutdown) = shutdown else {
            return Ok(());
        };
        // Dropping the sender wakes the timer thread via disconnect.
        drop(shutdown);

        if let Some(timer) = self.timer.lock().take() {
            super::join_with_timeout(timer, DEFAULT_CLOSE_TIMEOUT);
        }

        flush_pending(&self.pending, &self.inner);
        self.inner.close()
    }
}

impl Drop for BufferedHandler {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
