//! Ordered fan-out to several handlers
//!
//! Delivers each record to every member whose own `enabled` accepts it, in
//! configured member order. One member's failure or panic never prevents
//! delivery to the others (per-member isolation, same containment as the
//! rest of the layer).

use crate::core::{Attr, Handler, HandlerExt, Level, Record, Result, SharedHandler};

pub struct MultiHandler {
    members: Vec<SharedHandler>,
}

impl MultiHandler {
    pub fn new(members: Vec<SharedHandler>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[SharedHandler] {
        &self.members
    }

    /// A new MultiHandler whose members are each derived with `attrs`, so
    /// the additions propagate to every destination
    #[must_use]
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> MultiHandler {
        MultiHandler {
            members: self
                .members
                .iter()
                .map(|m| m.with_attrs(attrs.clone()))
                .collect(),
        }
    }

    /// A new MultiHandler whose members are each derived with a group
    #[must_use]
    pub fn with_group(&self, name: impl Into<String>) -> MultiHandler {
        let name = name.into();
        MultiHandler {
            members: self
                .members
                .iter()
                .map(|m| m.with_group(name.clone()))
                .collect(),
        }
    }
}

impl Handler for MultiHandler {
    /// True if any member would accept the record
    fn enabled(&self, level: Level) -> bool {
        self.members.iter().any(|m| m.enabled(level))
    }

    fn handle(&self, record: &Record) -> Result<()> {
        for (idx, member) in self.members.iter().enumerate() {
            if !member.enabled(record.level) {
                continue;
            }
            if let Err(e) =
                super::deliver_contained(&**member, record, &format!("member #{}", idx))
            {
                eprintln!("[resilog] fan-out member #{} failed: {}", idx, e);
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        for (idx, member) in self.members.iter().enumerate() {
            if let Err(e) = member.flush() {
                eprintln!("[resilog] fan-out member #{} flush failed: {}", idx, e);
            }
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        for (idx, member) in self.members.iter().enumerate() {
            if let Err(e) = member.close() {
                eprintln!("[resilog] fan-out member #{} close failed: {}", idx, e);
            }
        }
        Ok(())
    }
}
