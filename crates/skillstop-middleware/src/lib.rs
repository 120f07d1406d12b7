//! `skillstop-middleware` – Sensor and Report Channels
//!
//! Moves data between the real-time control thread and everything else
//! without ever making the control thread wait.
//!
//! # Modules
//!
//! - [`slot`] – [`SensorSlot`][slot::SensorSlot]: latest-value mailbox for
//!   inbound sensor readings, read with a non-blocking `try_lock`.
//! - [`bus`] – [`ReportBus`][bus::ReportBus]: fan-out of
//!   [`TerminationReport`][skillstop_types::TerminationReport]s to any number
//!   of async subscribers on a Tokio broadcast channel.
//! - [`manager`] – [`SensorDataManager`][manager::SensorDataManager]: the
//!   single collaborator handed to a termination handler, implementing both
//!   [`SensorSource`][skillstop_kernel::SensorSource] and
//!   [`ReportSink`][skillstop_kernel::ReportSink].

pub mod bus;
pub mod manager;
pub mod slot;

pub use bus::{ReportBus, ReportReceiver};
pub use manager::SensorDataManager;
pub use slot::SensorSlot;
