//! Non-blocking fan-out of termination reports.
//!
//! Uses [`tokio::sync::broadcast`] so every subscriber receives every
//! report and a slow subscriber only ever loses its own backlog. Sending
//! never awaits or waits on a subscriber. It does take the channel's
//! internal tail lock for the length of one slot write; the control thread
//! sends at most once per skill, on the cycle where it terminates.

use skillstop_kernel::ReportSink;
use skillstop_types::TerminationReport;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Default channel capacity (number of buffered reports before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 64;

/// Shared report channel. Clones share the same underlying broadcast
/// channel.
#[derive(Clone, Debug)]
pub struct ReportBus {
    sender: broadcast::Sender<TerminationReport>,
}

impl ReportBus {
    /// # Panics
    ///
    /// Panics if `capacity` is zero, as [`broadcast::channel`] does.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send `report` to every current subscriber and return how many there
    /// were. Having none is normal; the report is dropped.
    ///
    /// Holds the broadcast tail lock briefly. Receivers only contend for it
    /// while dequeuing, so the hold is bounded by a slot write.
    pub fn send(&self, report: TerminationReport) -> usize {
        match self.sender.send(report) {
            Ok(n) => n,
            Err(broadcast::error::SendError(report)) => {
                debug!(skill = %report.skill_id, "termination report dropped: no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> ReportReceiver {
        ReportReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReportBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ReportSink for ReportBus {
    fn publish(&self, report: TerminationReport) {
        self.send(report);
    }
}

/// An async receiver of termination reports.
///
/// Obtained via [`ReportBus::subscribe`].
pub struct ReportReceiver {
    receiver: broadcast::Receiver<TerminationReport>,
}

impl ReportReceiver {
    /// Wait for the next report.
    ///
    /// Reports lost to lag are skipped with a warning. Returns `None` once
    /// every sender has been dropped.
    pub async fn recv(&mut self) -> Option<TerminationReport> {
        loop {
            match self.receiver.recv().await {
                Ok(report) => return Some(report),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "report subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next report if one is already buffered. Never waits.
    pub fn try_recv(&mut self) -> Option<TerminationReport> {
        loop {
            match self.receiver.try_recv() {
                Ok(report) => return Some(report),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "report subscriber lagged");
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}
