//! [`SensorDataManager`] – the sensor-data collaborator a termination
//! handler talks to.
//!
//! One manager carries traffic both ways: readings from external sensor
//! processes come in through a [`SensorSlot`], and termination reports go
//! out on a [`ReportBus`]. Every clone shares the same slot and bus, so the
//! producer side, the handler and any report subscribers each hold their
//! own clone.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use skillstop_kernel::{HandlerContext, PreemptFlag, SensorSource};
//! use skillstop_middleware::SensorDataManager;
//!
//! let manager = SensorDataManager::new();
//! let ctx = HandlerContext::new(PreemptFlag::new())
//!     .with_sensors(Arc::new(manager.clone()))
//!     .with_reports(Arc::new(manager.clone()));
//!
//! manager.push(true, 0.0);
//! assert!(manager.try_latest().unwrap().stop_requested);
//! # drop(ctx);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use skillstop_kernel::{ReportSink, SensorSource};
use skillstop_types::{SensorMessage, TerminationReport};
use tracing::trace;

use crate::bus::{ReportBus, ReportReceiver};
use crate::slot::SensorSlot;

#[derive(Clone, Debug, Default)]
pub struct SensorDataManager {
    readings: SensorSlot<SensorMessage>,
    reports: ReportBus,
    sequence: Arc<AtomicU64>,
}

impl SensorDataManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reading produced elsewhere, keeping its sequence number.
    pub fn publish_sensor(&self, message: SensorMessage) {
        trace!(sequence = message.sequence, "sensor reading published");
        self.sequence.fetch_max(message.sequence, Ordering::Relaxed);
        self.readings.publish(message);
    }

    /// Store a reading stamped with the next sequence number and return it.
    pub fn push(&self, stop_requested: bool, signal: f64) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.readings.publish(SensorMessage {
            sequence,
            stop_requested,
            signal,
        });
        sequence
    }

    /// Drop the stored reading before the next skill.
    pub fn reset_readings(&self) {
        self.readings.clear();
    }

    pub fn subscribe_reports(&self) -> ReportReceiver {
        self.reports.subscribe()
    }
}

impl SensorSource for SensorDataManager {
    fn try_latest(&self) -> Option<SensorMessage> {
        self.readings.try_read()
    }
}

impl ReportSink for SensorDataManager {
    fn publish(&self, report: TerminationReport) {
        self.reports.send(report);
    }
}
