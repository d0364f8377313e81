//! Link activity counters.
//!
//! Counters are informational: they feed the dashboard's diagnostic line
//! and the shutdown summary and never influence control flow. All updates
//! use `Ordering::Relaxed`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`LinkCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkStats {
    /// Bytes read from the inbound transport
    pub bytes_received: u64,
    /// Non-empty lines framed
    pub lines_received: u64,
    /// Lines that produced at least one field update
    pub lines_applied: u64,
    /// Field updates written to the shared state
    pub updates_applied: u64,
    /// Inbound transport errors other than timeouts
    pub read_faults: u64,
    /// Raw log writes that failed
    pub log_faults: u64,
    /// Over-long fragments thrown away by the framer
    pub fragments_discarded: u64,
    /// Outbound commands written
    pub commands_sent: u64,
    /// Outbound commands lost to a write failure
    pub commands_dropped: u64,
}

/// Shared atomic counters for the reader thread and the dashboard.
#[derive(Debug, Default)]
pub struct LinkCounters {
    bytes_received: AtomicU64,
    lines_received: AtomicU64,
    lines_applied: AtomicU64,
    updates_applied: AtomicU64,
    read_faults: AtomicU64,
    log_faults: AtomicU64,
    fragments_discarded: AtomicU64,
    commands_sent: AtomicU64,
    commands_dropped: AtomicU64,
}

impl LinkCounters {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes_received: AtomicU64::new(0),
            lines_received: AtomicU64::new(0),
            lines_applied: AtomicU64::new(0),
            updates_applied: AtomicU64::new(0),
            read_faults: AtomicU64::new(0),
            log_faults: AtomicU64::new(0),
            fragments_discarded: AtomicU64::new(0),
            commands_sent: AtomicU64::new(0),
            commands_dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn add_bytes(&self, count: usize) {
        self.bytes_received
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    /// Record one framed line and how many updates it produced.
    #[inline]
    pub fn record_line(&self, updates: usize) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
        if updates > 0 {
            self.lines_applied.fetch_add(1, Ordering::Relaxed);
            self.updates_applied
                .fetch_add(u64::try_from(updates).unwrap_or(u64::MAX), Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn inc_read_fault(&self) {
        self.read_faults.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_log_fault(&self) {
        self.log_faults.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_discarded(&self, count: u64) {
        self.fragments_discarded.fetch_add(count, Ordering::Relaxed);
    }

    /// Publish the dispatcher's running totals.
    ///
    /// The dispatcher lives on the dashboard thread and keeps its own
    /// counts; this mirrors them for display.
    #[inline]
    pub fn store_command_totals(&self, sent: u64, dropped: u64) {
        self.commands_sent.store(sent, Ordering::Relaxed);
        self.commands_dropped.store(dropped, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LinkStats {
        LinkStats {
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            lines_received: self.lines_received.load(Ordering::Relaxed),
            lines_applied: self.lines_applied.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            read_faults: self.read_faults.load(Ordering::Relaxed),
            log_faults: self.log_faults.load(Ordering::Relaxed),
            fragments_discarded: self.fragments_discarded.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            commands_dropped: self.commands_dropped.load(Ordering::Relaxed),
        }
    }
}
