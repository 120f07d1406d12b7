//! `skillstop-types` – shared vocabulary for the skill termination stack.
//!
//! Everything that crosses a crate boundary lives here: the per-cycle
//! [`RobotState`] snapshot, the [`TerminationCause`] / [`CauseSet`] pair used
//! for reporting, the outgoing [`TerminationReport`], inbound
//! [`SensorMessage`]s, and the global [`SkillError`].
//!
//! All per-cycle types are `Copy` so the control thread never allocates while
//! handing them around.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Number of actuated joints on the supported arms.
pub const NUM_JOINTS: usize = 7;

/// One value per joint, ordered from the base outward.
pub type JointArray = [f64; NUM_JOINTS];

/// Snapshot of the robot published by the driver once per control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotState {
    /// Measured joint positions (rad).
    pub q: JointArray,
    /// Measured joint velocities (rad/s).
    pub dq: JointArray,
    /// Estimated external wrench acting on the stiffness frame, expressed in
    /// the base frame: `[fx, fy, fz, tx, ty, tz]` (N, Nm).
    pub o_f_ext_hat_k: [f64; 6],
}

impl RobotState {
    /// A state at rest at the given joint positions.
    pub fn at_rest(q: JointArray) -> Self {
        Self {
            q,
            ..Self::default()
        }
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self {
            q: [0.0; NUM_JOINTS],
            dq: [0.0; NUM_JOINTS],
            o_f_ext_hat_k: [0.0; 6],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Termination causes
// ────────────────────────────────────────────────────────────────────────────

/// Why a skill was (or would have been) terminated.
///
/// Ordinals are stable: they index bits of [`CauseSet`] and define which
/// cause is reported first when several fire on the same cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TerminationCause {
    /// An out-of-band actor raised the preemption flag.
    Preempt = 0,
    /// Elapsed time exceeded the planned duration plus the buffer.
    Time = 1,
    /// An operating point crossed a virtual wall.
    VirtualWall = 2,
    /// A joint reached or passed one of its bounds.
    JointLimit = 3,
    /// The motion reached its goal.
    Goal = 4,
    /// The external wrench reached a contact threshold.
    Contact = 5,
    /// An external sensor stream requested a stop.
    Sensor = 6,
}

impl TerminationCause {
    /// Every cause, in ordinal order.
    pub const ALL: [TerminationCause; 7] = [
        TerminationCause::Preempt,
        TerminationCause::Time,
        TerminationCause::VirtualWall,
        TerminationCause::JointLimit,
        TerminationCause::Goal,
        TerminationCause::Contact,
        TerminationCause::Sensor,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TerminationCause::Preempt => "preempt",
            TerminationCause::Time => "time",
            TerminationCause::VirtualWall => "virtual_wall",
            TerminationCause::JointLimit => "joint_limit",
            TerminationCause::Goal => "goal",
            TerminationCause::Contact => "contact",
            TerminationCause::Sensor => "sensor",
        };
        f.write_str(name)
    }
}

/// Fixed-size set of [`TerminationCause`]s, backed by a single byte.
///
/// Serialises as a list of cause names; only the reporting side ever pays for
/// that conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<TerminationCause>", from = "Vec<TerminationCause>")]
pub struct CauseSet(u8);

impl CauseSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Add `cause`. Returns `true` if it was not already present.
    pub fn insert(&mut self, cause: TerminationCause) -> bool {
        let fresh = !self.contains(cause);
        self.0 |= cause.bit();
        fresh
    }

    pub fn contains(&self, cause: TerminationCause) -> bool {
        self.0 & cause.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// The lowest-ordinal cause in the set.
    pub fn first(&self) -> Option<TerminationCause> {
        self.iter().next()
    }

    /// Iterate in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = TerminationCause> + '_ {
        TerminationCause::ALL
            .into_iter()
            .filter(move |cause| self.contains(*cause))
    }
}

impl From<CauseSet> for Vec<TerminationCause> {
    fn from(set: CauseSet) -> Self {
        set.iter().collect()
    }
}

impl From<Vec<TerminationCause>> for CauseSet {
    fn from(causes: Vec<TerminationCause>) -> Self {
        causes.into_iter().collect()
    }
}

impl FromIterator<TerminationCause> for CauseSet {
    fn from_iter<I: IntoIterator<Item = TerminationCause>>(iter: I) -> Self {
        let mut set = CauseSet::empty();
        for cause in iter {
            set.insert(cause);
        }
        set
    }
}

impl std::fmt::Display for CauseSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, cause) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{cause}")?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Channel payloads
// ────────────────────────────────────────────────────────────────────────────

/// Outgoing message describing whether and why a skill terminated.
///
/// Consumed by telemetry and logging, never by the control loop itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminationReport {
    /// Identifier of the skill execution that produced the report.
    pub skill_id: Uuid,
    pub terminated: bool,
    pub terminated_by_collision: bool,
    /// Every cause observed up to and including the reporting cycle.
    pub causes: CauseSet,
    /// Lowest-ordinal cause found on the cycle of the transition.
    pub first_cause: Option<TerminationCause>,
    /// Trajectory time (s) at which the report was produced.
    pub elapsed_s: f64,
}

/// A reading delivered by an external sensor process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorMessage {
    /// Monotonic sequence number assigned by the producer.
    pub sequence: u64,
    /// The producer explicitly asks for the running skill to stop.
    pub stop_requested: bool,
    /// Scalar reading that sensor-driven policies compare against a threshold.
    pub signal: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Setup-time failures. The per-cycle path never produces one of these.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillError {
    #[error("Invalid termination parameters: {0}")]
    InvalidParameters(String),

    #[error("Missing termination parameter: {0}")]
    MissingParameter(String),

    #[error("Handler bound before its parameters were parsed")]
    NotParsed,

    #[error("Handler polled before it was bound to a robot")]
    NotInitialized,

    #[error("Robot binding failed: {0}")]
    Binding(String),

    #[error("Invalid workspace geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid joint limits: {0}")]
    InvalidJointLimits(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cause_set_insert_reports_freshness() {
        let mut set = CauseSet::empty();
        assert!(set.insert(TerminationCause::Time));
        assert!(!set.insert(TerminationCause::Time));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn cause_set_first_is_lowest_ordinal() {
        let set: CauseSet = [TerminationCause::JointLimit, TerminationCause::Preempt]
            .into_iter()
            .collect();
        assert_eq!(set.first(), Some(TerminationCause::Preempt));
        assert_eq!(CauseSet::empty().first(), None);
    }

    #[test]
    fn cause_set_iterates_in_ordinal_order() {
        let set: CauseSet = [
            TerminationCause::Sensor,
            TerminationCause::VirtualWall,
            TerminationCause::Time,
        ]
        .into_iter()
        .collect();
        let order: Vec<_> = set.iter().collect();
        assert_eq!(
            order,
            vec![
                TerminationCause::Time,
                TerminationCause::VirtualWall,
                TerminationCause::Sensor
            ]
        );
    }

    #[test]
    fn cause_set_display() {
        let set: CauseSet = [TerminationCause::Time, TerminationCause::JointLimit]
            .into_iter()
            .collect();
        assert_eq!(set.to_string(), "time|joint_limit");
        assert_eq!(CauseSet::empty().to_string(), "none");
    }

    #[test]
    fn report_serialises_causes_by_name() {
        let report = TerminationReport {
            skill_id: Uuid::nil(),
            terminated: true,
            terminated_by_collision: true,
            causes: [TerminationCause::VirtualWall].into_iter().collect(),
            first_cause: Some(TerminationCause::VirtualWall),
            elapsed_s: 1.25,
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["causes"], serde_json::json!(["virtual_wall"]));
        assert_eq!(json["first_cause"], "virtual_wall");

        let back: TerminationReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn skill_error_display() {
        let err = SkillError::MissingParameter("buffer_time".to_string());
        assert!(err.to_string().contains("buffer_time"));
        assert!(SkillError::NotParsed.to_string().contains("parsed"));
    }
}
