//! Bounded in-memory history of recent records
//!
//! A lossy, best-effort recent-history store, not a log sink: `handle`
//! always accepts and silently overwrites the oldest record once at
//! capacity. Useful for keeping the last N records around to replay into a
//! real sink after an incident.

use crate::core::{Handler, HandlerError, Level, LevelVar, Record, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Default ring capacity
pub const DEFAULT_RING_CAPACITY: usize = 1000;

pub struct RingBufferHandler {
    limit: usize,
    level: Option<LevelVar>,
    buf: Mutex<VecDeque<Record>>,
}

impl RingBufferHandler {
    /// Create a ring buffer holding at most `limit` records.
    ///
    /// Fails fast on a zero limit.
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(HandlerError::config(
                "RingBufferHandler",
                "limit must be positive",
            ));
        }
        Ok(Self {
            limit,
            level: None,
            buf: Mutex::new(VecDeque::with_capacity(limit)),
        })
    }

    /// Gate acceptance on a level cell instead of accepting unconditionally
    #[must_use]
    pub fn with_level(mut self, level: LevelVar) -> Self {
        self.level = Some(level);
        self
    }

    pub fn capacity(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }

    /// Snapshot of the stored records in chronological order (oldest first)
    pub fn records(&self) -> Vec<Record> {
        self.buf.lock().iter().cloned().collect()
    }

    /// Replay every stored record into `target`, oldest first, skipping
    /// records the target's own `enabled` rejects. A failure delivering one
    /// record does not stop the replay.
    pub fn replay(&self, target: &dyn Handler) {
        let snapshot = self.records();
        for record in &snapshot {
            if target.enabled(record.level) {
                if let Err(e) = super::deliver_contained(target, record, "replay target") {
                    eprintln!("[resilog] replay delivery failed: {}", e);
                }
            }
        }
    }

    /// Empty the buffer without changing its capacity
    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl Default for RingBufferHandler {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RING_CAPACITY,
            level: None,
            buf: Mutex::new(VecDeque::with_capacity(DEFAULT_RING_CAPACITY)),
        }
    }
}

impl Handler for RingBufferHandler {
    fn enabled(&self, level: Level) -> bool {
        match &self.level {
            Some(var) => level >= var.get(),
            None => true,
        }
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let mut buf = self.buf.lock();
        if buf.len() == self.limit {
            buf.pop_front();
        }
        buf.push_back(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(n: usize) -> Record {
        Record::new(Level::Info, format!("msg {}", n))
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = RingBufferHandler::new(0).err().unwrap();
        assert!(matches!(err, HandlerError::InvalidConfig { .. }));
    }

    #[test]
    fn test_keeps_most_recent_limit() {
        let ring = RingBufferHandler::new(5).unwrap();
        for n in 0..12 {
            ring.handle(&record(n)).unwrap();
        }

        let records = ring.records();
        assert_eq!(records.len(), 5);
        let messages: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, ["msg 7", "msg 8", "msg 9", "msg 10", "msg 11"]);
    }

    #[test]
    fn test_default_capacity() {
        let ring = RingBufferHandler::default();
        assert_eq!(ring.capacity(), DEFAULT_RING_CAPACITY);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let ring = RingBufferHandler::new(3).unwrap();
        for n in 0..3 {
            ring.handle(&record(n)).unwrap();
        }
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), 3);

        ring.handle(&record(9)).unwrap();
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_replay_respects_target_level() {
        let ring = RingBufferHandler::new(10).unwrap();
        ring.handle(&Record::new(Level::Debug, "noise")).unwrap();
        ring.handle(&Record::new(Level::Error, "signal")).unwrap();

        let target = Arc::new(
            RingBufferHandler::new(10)
                .unwrap()
                .with_level(LevelVar::new(Level::Warn)),
        );
        ring.replay(target.as_ref());

        let delivered = target.records();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].message, "signal");
    }

    #[test]
    fn test_replay_survives_failing_target() {
        struct FailingHandler;
        impl Handler for FailingHandler {
            fn enabled(&self, _level: Level) -> bool {
                true
            }
            fn handle(&self, _record: &Record) -> Result<()> {
                Err(HandlerError::other("always fails"))
            }
        }

        let ring = RingBufferHandler::new(10).unwrap();
        for n in 0..3 {
            ring.handle(&record(n)).unwrap();
        }
        // Must not panic or abort partway.
        ring.replay(&FailingHandler);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_unconditional_enabled() {
        let ring = RingBufferHandler::new(4).unwrap();
        assert!(ring.enabled(Level::Debug));
        assert!(ring.enabled(Level::Error));

        let gated = RingBufferHandler::new(4)
            .unwrap()
            .with_level(LevelVar::new(Level::Warn));
        assert!(!gated.enabled(Level::Info));
        assert!(gated.enabled(Level::Warn));
    }
}
