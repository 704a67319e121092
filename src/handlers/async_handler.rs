//! Non-blocking dispatch with strict FIFO delivery
//!
//! `handle` enqueues the record and returns immediately. A single worker
//! thread drains the queue one record at a time, finishing each delivery
//! before starting the next, so cross-record order is preserved even though
//! delivery is asynchronous relative to the call site. A delivery failure
//! is routed to the optional error callback and never aborts the drain.
//!
//! `flush()` enqueues a marker behind every record accepted so far and
//! waits for the worker to reach it, so records enqueued before the call
//! have been delivered (and the wrapped handler flushed) when it returns.
//!
//! There is no per-record timeout: a stuck wrapped handler blocks the
//! queue behind it. `close()` waits for the queue to drain, bounded by
//! [`DEFAULT_CLOSE_TIMEOUT`].

use crate::core::{
    ErrorCallback, Handler, Level, Record, Result, SharedHandler, DEFAULT_CLOSE_TIMEOUT,
};
use crossbeam_channel::{bounded, unbounded, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

enum Task {
    Deliver(Record),
    // Carries an ack channel; sending on it signals the queue ahead of the
    // marker has been fully delivered.
    Flush(Sender<()>),
}

pub struct AsyncHandler {
    inner: SharedHandler,
    sender: Mutex<Option<Sender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncHandler {
    pub fn new(inner: SharedHandler) -> Self {
        Self::build(inner, None)
    }

    /// Route per-record delivery failures to `on_error`
    pub fn with_error_handler(inner: SharedHandler, on_error: ErrorCallback) -> Self {
        Self::build(inner, Some(on_error))
    }

    fn build(inner: SharedHandler, on_error: Option<ErrorCallback>) -> Self {
        let (sender, receiver) = unbounded::<Task>();
        let worker_inner = Arc::clone(&inner);

        let worker = thread::spawn(move || {
            // Strictly sequential: the next task is not taken until this
            // one finished.
            for task in receiver.iter() {
                match task {
                    Task::Deliver(record) => {
                        if let Err(e) = super::deliver_contained(
                            &*worker_inner,
                            &record,
                            "async inner handler",
                        ) {
                            match &on_error {
                                Some(cb) => cb(&e, &record),
                                None => eprintln!("[resilog] async delivery failed: {}", e),
                            }
                        }
                    }
                    Task::Flush(ack) => {
                        if let Err(e) = worker_inner.flush() {
                            eprintln!("[resilog] async flush failed: {}", e);
                        }
                        let _ = ack.send(());
                    }
                }
            }
        });

        Self {
            inner,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

}

impl Handler for AsyncHandler {
    fn enabled(&self, level: Level) -> bool {
        self.inner.enabled(level)
    }

    /// Enqueue and return immediately; never blocks the caller
    fn handle(&self, record: &Record) -> Result<()> {
        let sender = self.sender.lock();
        match &*sender {
            Some(tx) => {
                // Disconnect can only race with close; absorb it.
                let _ = tx.send(Task::Deliver(record.clone()));
            }
            None => {
                drop(sender);
                // After close the queue is gone; deliver directly.
                let _ =
                    super::deliver_contained(&*self.inner, record, "async inner handler");
            }
        }
        Ok(())
    }

    /// Wait until records enqueued before this call have been delivered,
    /// then flush the wrapped handler.
    fn flush(&self) -> Result<()> {
        let sender = self.sender.lock().clone();
        if let Some(tx) = sender {
            let (ack_tx, ack_rx) = bounded::<()>(1);
            if tx.send(Task::Flush(ack_tx)).is_ok() {
                // Bounded wait: a stuck inner handler must not hang flush
                // forever.
                let _ = ack_rx.recv_timeout(DEFAULT_CLOSE_TIMEOUT);
                return Ok(());
            }
        }
        self.inner.flush()
    }

    /// Wait until the queue is fully drained, then close the wrapped
    /// handler. Safe to call multiple times.
    fn close(&self) -> Result<()> {
        let sender = self.sender.lock().take();
        if sender.is_none() && self.worker.lock().is_none() {
            return Ok(());
        }
        // Dropping the sender lets the worker drain the remaining queue and
        // exit its receive loop.
        drop(sender);

        if let Some(worker) = self.worker.lock().take() {
            super::join_with_timeout(worker, DEFAULT_CLOSE_TIMEOUT);
        }

        self.inner.close()
    }
}

impl Drop for AsyncHandler {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
