//! Seams to the sensor-data channel.
//!
//! The kernel defines what it needs from the channel; `skillstop-middleware`
//! provides the implementation. Both traits are called from the control
//! thread and must return without blocking.

use skillstop_types::{SensorMessage, TerminationReport};

/// Outward path for termination reports.
pub trait ReportSink: Send + Sync {
    /// Hand off `report`. Called at most once per skill, on the terminating
    /// cycle. Must not wait on consumers: a short internal lock is
    /// acceptable, a report that cannot be delivered is dropped by the sink.
    fn publish(&self, report: TerminationReport);
}

/// Inward path for externally delivered sensor readings.
pub trait SensorSource: Send + Sync {
    /// Latest reading, or `None` if nothing has arrived yet or the producer
    /// is mid-write. Must not block.
    fn try_latest(&self) -> Option<SensorMessage>;
}
