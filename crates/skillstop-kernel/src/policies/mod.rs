//! Concrete termination policies and the closed [`Handler`] enum that
//! dispatches to them.
//!
//! | Kind          | Checks                                          |
//! |---------------|-------------------------------------------------|
//! | `noop`        | preemption, virtual walls, joint limits         |
//! | `time`        | `noop` + time budget                            |
//! | `final_joint` | `time` + joint-space goal reached               |
//! | `final_pose`  | `time` + end-effector goal pose reached         |
//! | `contact`     | `time` + external wrench threshold              |
//! | `sensor`      | `time` + external sensor stop request or signal |
//!
//! Parameters arrive as a JSON object. Unknown keys are rejected.
//!
//! # Example
//!
//! ```rust
//! use skillstop_hal::{RobotVariant, SimArm};
//! use skillstop_kernel::{Handler, HandlerContext, PolicyKind, PreemptFlag, TerminationHandler};
//!
//! let mut handler = Handler::new(PolicyKind::Time, HandlerContext::new(PreemptFlag::new()));
//! handler.parse_parameters(br#"{"buffer_time": 0.5}"#).unwrap();
//! handler.initialize_handler(&SimArm::new(RobotVariant::Panda)).unwrap();
//! assert!(!handler.has_terminated());
//! ```

mod contact;
mod final_joint;
mod final_pose;
mod noop;
mod sensor;
mod time;

pub use contact::{ContactParams, ContactPolicy};
pub use final_joint::{FinalJointParams, FinalJointPolicy};
pub use final_pose::{FinalPoseParams, FinalPosePolicy};
pub use noop::NoopPolicy;
pub use sensor::{SensorParams, SensorPolicy};
pub use time::{TimeParams, TimePolicy};

use serde::{Deserialize, Serialize};
use skillstop_hal::{KinematicsModel, Robot};
use skillstop_types::{RobotState, SkillError};

use crate::handler::{HandlerContext, HandlerCore, TerminationHandler};
use crate::trajectory::Trajectory;

/// Which policy a skill runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Noop,
    #[default]
    Time,
    FinalJoint,
    FinalPose,
    Contact,
    Sensor,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 6] = [
        PolicyKind::Noop,
        PolicyKind::Time,
        PolicyKind::FinalJoint,
        PolicyKind::FinalPose,
        PolicyKind::Contact,
        PolicyKind::Sensor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Noop => "noop",
            PolicyKind::Time => "time",
            PolicyKind::FinalJoint => "final_joint",
            PolicyKind::FinalPose => "final_pose",
            PolicyKind::Contact => "contact",
            PolicyKind::Sensor => "sensor",
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        PolicyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("unknown termination policy: {s}"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Closed dispatch
// ────────────────────────────────────────────────────────────────────────────

/// Every policy the engine knows about.
pub enum Handler {
    Noop(NoopPolicy),
    Time(TimePolicy),
    FinalJoint(FinalJointPolicy),
    FinalPose(FinalPosePolicy),
    Contact(ContactPolicy),
    Sensor(SensorPolicy),
}

macro_rules! dispatch {
    ($self:expr, $policy:ident => $body:expr) => {
        match $self {
            Handler::Noop($policy) => $body,
            Handler::Time($policy) => $body,
            Handler::FinalJoint($policy) => $body,
            Handler::FinalPose($policy) => $body,
            Handler::Contact($policy) => $body,
            Handler::Sensor($policy) => $body,
        }
    };
}

impl Handler {
    /// A fresh handler of `kind`, in the `Created` phase.
    pub fn new(kind: PolicyKind, ctx: HandlerContext) -> Self {
        match kind {
            PolicyKind::Noop => Handler::Noop(NoopPolicy::new(ctx)),
            PolicyKind::Time => Handler::Time(TimePolicy::new(ctx)),
            PolicyKind::FinalJoint => Handler::FinalJoint(FinalJointPolicy::new(ctx)),
            PolicyKind::FinalPose => Handler::FinalPose(FinalPosePolicy::new(ctx)),
            PolicyKind::Contact => Handler::Contact(ContactPolicy::new(ctx)),
            PolicyKind::Sensor => Handler::Sensor(SensorPolicy::new(ctx)),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Handler::Noop(_) => PolicyKind::Noop,
            Handler::Time(_) => PolicyKind::Time,
            Handler::FinalJoint(_) => PolicyKind::FinalJoint,
            Handler::FinalPose(_) => PolicyKind::FinalPose,
            Handler::Contact(_) => PolicyKind::Contact,
            Handler::Sensor(_) => PolicyKind::Sensor,
        }
    }
}

impl TerminationHandler for Handler {
    fn core(&self) -> &HandlerCore {
        dispatch!(self, p => p.core())
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        dispatch!(self, p => p.core_mut())
    }

    fn parse_parameters(&mut self, params: &[u8]) -> Result<(), SkillError> {
        dispatch!(self, p => p.parse_parameters(params))
    }

    fn initialize_handler(&mut self, robot: &dyn Robot) -> Result<(), SkillError> {
        dispatch!(self, p => p.initialize_handler(robot))
    }

    fn should_terminate(
        &mut self,
        robot_state: &RobotState,
        model: &dyn KinematicsModel,
        trajectory: &dyn Trajectory,
    ) -> bool {
        dispatch!(self, p => p.should_terminate(robot_state, model, trajectory))
    }

    fn parse_sensor_data(&mut self, robot_state: &RobotState) {
        dispatch!(self, p => p.parse_sensor_data(robot_state))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parameter validation
// ────────────────────────────────────────────────────────────────────────────

fn require_buffer_time(value: Option<f64>) -> Result<f64, SkillError> {
    let value = value.ok_or_else(|| SkillError::MissingParameter("buffer_time".to_string()))?;
    if !(value.is_finite() && value >= 0.0) {
        return Err(SkillError::InvalidParameters(format!(
            "buffer_time must be finite and non-negative, got {value}"
        )));
    }
    Ok(value)
}

fn require_positive(name: &str, value: Option<f64>) -> Result<f64, SkillError> {
    let value = value.ok_or_else(|| SkillError::MissingParameter(name.to_string()))?;
    if !(value.is_finite() && value > 0.0) {
        return Err(SkillError::InvalidParameters(format!(
            "{name} must be finite and positive, got {value}"
        )));
    }
    Ok(value)
}
