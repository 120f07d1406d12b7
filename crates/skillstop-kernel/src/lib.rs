//! `skillstop-kernel` – Skill Termination
//!
//! Decides, once per control cycle, whether the running skill must stop.
//! Nothing in here blocks, allocates on the hot path or returns an error
//! once a handler is bound.
//!
//! # Modules
//!
//! - [`geometry`] – [`Workspace`][geometry::Workspace]: six oriented virtual
//!   walls and the signed-distance test against them.
//! - [`joint_limits`] – [`JointLimits`][joint_limits::JointLimits]: per-joint
//!   bounds with presets for the supported arms.
//! - [`envelope`] – [`SafetyEnvelope`][envelope::SafetyEnvelope]: workspace,
//!   operating-point margins and optional pinned limits.
//! - [`state`] – [`TerminationState`][state::TerminationState]: the sticky
//!   `done` / `terminated_by_collision` flags.
//! - [`checks`] – the preemption, time, virtual-wall and joint-limit checks.
//! - [`handler`] – the [`TerminationHandler`][handler::TerminationHandler]
//!   contract and the shared [`HandlerCore`][handler::HandlerCore].
//! - [`policies`] – concrete policies and the closed
//!   [`Handler`][policies::Handler] enum.
//! - [`preempt`], [`trajectory`], [`channels`] – the seams to the supervisor,
//!   the trajectory generator and the sensor-data channel.

pub mod channels;
pub mod checks;
pub mod envelope;
pub mod geometry;
pub mod handler;
pub mod joint_limits;
pub mod policies;
pub mod preempt;
pub mod state;
pub mod trajectory;

pub use channels::{ReportSink, SensorSource};
pub use envelope::{OPERATING_POINTS, PointMargins, SafetyEnvelope};
pub use geometry::{HalfSpace, Wall, WallSpec, Workspace, WorkspaceSpec};
pub use handler::{HandlerContext, HandlerCore, Lifecycle, TerminationHandler};
pub use joint_limits::JointLimits;
pub use policies::{Handler, PolicyKind};
pub use preempt::PreemptFlag;
pub use state::{Phase, TerminationState};
pub use trajectory::Trajectory;
