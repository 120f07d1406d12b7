//! In-process simulated arm for CI and headless tests.
//!
//! [`SimArm`] stands in for a driver-backed robot. It tracks commanded joint
//! positions exactly (no dynamics), exposes a [`FrankaModel`] and lets tests
//! inject external wrenches or drop the kinematic model to exercise binding
//! failures.
//!
//! # Example
//!
//! ```rust
//! use skillstop_hal::{Robot, RobotVariant, SimArm};
//!
//! let mut arm = SimArm::new(RobotVariant::Panda);
//! arm.command([0.0, -0.78, 0.0, -2.36, 0.0, 1.57, 0.78]);
//! assert!((arm.read_state().q[3] + 2.36).abs() < 1e-12);
//! assert!(arm.model().is_some());
//! ```

use skillstop_types::{JointArray, RobotState};
use tracing::debug;

use crate::franka::FrankaModel;
use crate::kinematics::KinematicsModel;
use crate::robot::{Robot, RobotVariant};

/// Joint positions of the Franka "ready" pose.
pub const READY_POSE: JointArray = [
    0.0,
    -std::f64::consts::FRAC_PI_4,
    0.0,
    -3.0 * std::f64::consts::FRAC_PI_4,
    0.0,
    std::f64::consts::FRAC_PI_2,
    std::f64::consts::FRAC_PI_4,
];

/// A simulated arm that follows commands instantly.
pub struct SimArm {
    id: String,
    variant: RobotVariant,
    model: Option<FrankaModel>,
    state: RobotState,
    connected: bool,
}

impl SimArm {
    /// A connected arm of `variant`, resting in the ready pose.
    pub fn new(variant: RobotVariant) -> Self {
        let model = match variant {
            RobotVariant::Panda => FrankaModel::panda(),
            RobotVariant::Fr3 => FrankaModel::fr3(),
        };
        Self {
            id: format!("sim-{variant}"),
            variant,
            model: Some(model),
            state: RobotState::at_rest(READY_POSE),
            connected: true,
        }
    }

    /// Replace the kinematic model (e.g. a different tool).
    pub fn with_model(mut self, model: FrankaModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Drop the kinematic model so binding fails.
    pub fn without_model(mut self) -> Self {
        self.model = None;
        self
    }

    /// Move to `q`. Velocities are derived from the previous position at a
    /// unit time step.
    pub fn command(&mut self, q: JointArray) {
        for (i, target) in q.iter().enumerate() {
            self.state.dq[i] = target - self.state.q[i];
        }
        self.state.q = q;
    }

    /// Inject an external wrench `[fx, fy, fz, tx, ty, tz]`.
    pub fn apply_wrench(&mut self, wrench: [f64; 6]) {
        self.state.o_f_ext_hat_k = wrench;
    }

    pub fn disconnect(&mut self) {
        debug!(robot = %self.id, "simulated arm disconnected");
        self.connected = false;
    }
}

impl Robot for SimArm {
    fn id(&self) -> &str {
        &self.id
    }

    fn variant(&self) -> RobotVariant {
        self.variant
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn model(&self) -> Option<&dyn KinematicsModel> {
        self.model.as_ref().map(|m| m as &dyn KinematicsModel)
    }

    fn read_state(&self) -> RobotState {
        self.state
    }
}
