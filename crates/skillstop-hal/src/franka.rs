//! Forward kinematics for the Franka Emika Panda and Franka Research 3.
//!
//! Both arms share the same modified (Craig) Denavit–Hartenberg parameters;
//! they differ only in their joint limits, which live in the kernel's joint
//! limit table. Each link transform is
//!
//! ```text
//! T_i = RotX(alpha_i) · TransX(a_i) · RotZ(q_i) · TransZ(d_i)
//! ```
//!
//! The flange sits 0.107 m along the last joint axis. The end-effector frame
//! defaults to the Franka Hand: 0.1034 m past the flange, rotated −π/4 about
//! the flange z-axis.
//!
//! # Example
//!
//! ```rust
//! use skillstop_hal::{Frame, FrankaModel, KinematicsModel};
//! use skillstop_types::RobotState;
//!
//! let model = FrankaModel::panda();
//! let ready = [0.0, -0.785398, 0.0, -2.356194, 0.0, 1.570796, 0.785398];
//! let ee = model.pose(Frame::EndEffector, &RobotState::at_rest(ready));
//! assert!((ee.translation.vector.x - 0.3069).abs() < 1e-3);
//! assert!((ee.translation.vector.z - 0.4869).abs() < 1e-3);
//! ```

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use nalgebra::{Translation3, UnitQuaternion, Vector3};
use skillstop_types::{NUM_JOINTS, RobotState};

use crate::kinematics::{Frame, FramePoses, KinematicsModel, Pose};

/// Distance from joint 7 to the flange along its axis (m).
const FLANGE_OFFSET: f64 = 0.107;

/// Distance from the flange to the Franka Hand TCP (m).
const HAND_OFFSET: f64 = 0.1034;

/// One modified-DH link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DhLink {
    pub a: f64,
    pub d: f64,
    pub alpha: f64,
}

impl DhLink {
    const fn new(a: f64, d: f64, alpha: f64) -> Self {
        Self { a, d, alpha }
    }

    fn transform(&self, q: f64) -> Pose {
        rot_x(self.alpha)
            * Pose::translation(self.a, 0.0, 0.0)
            * rot_z(q)
            * Pose::translation(0.0, 0.0, self.d)
    }
}

fn rot_x(angle: f64) -> Pose {
    Pose::from_parts(
        Translation3::identity(),
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle),
    )
}

fn rot_z(angle: f64) -> Pose {
    Pose::from_parts(
        Translation3::identity(),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
    )
}

const FRANKA_DH: [DhLink; NUM_JOINTS] = [
    DhLink::new(0.0, 0.333, 0.0),
    DhLink::new(0.0, 0.0, -FRAC_PI_2),
    DhLink::new(0.0, 0.316, FRAC_PI_2),
    DhLink::new(0.0825, 0.0, FRAC_PI_2),
    DhLink::new(-0.0825, 0.384, -FRAC_PI_2),
    DhLink::new(0.0, 0.0, FRAC_PI_2),
    DhLink::new(0.088, 0.0, FRAC_PI_2),
];

/// Closed-form chain model for Franka arms.
#[derive(Debug, Clone, PartialEq)]
pub struct FrankaModel {
    links: [DhLink; NUM_JOINTS],
    flange_to_ee: Pose,
}

impl FrankaModel {
    /// Panda with a Franka Hand mounted.
    pub fn panda() -> Self {
        Self {
            links: FRANKA_DH,
            flange_to_ee: Self::hand(),
        }
    }

    /// FR3 with a Franka Hand mounted. Same chain as the Panda.
    pub fn fr3() -> Self {
        Self::panda()
    }

    /// Replace the flange → end-effector transform (tool change).
    pub fn with_end_effector(mut self, flange_to_ee: Pose) -> Self {
        self.flange_to_ee = flange_to_ee;
        self
    }

    /// Tool offset along the flange z-axis, keeping the hand's −π/4 yaw.
    pub fn with_tool_offset(self, offset: f64) -> Self {
        self.with_end_effector(
            Pose::translation(0.0, 0.0, offset) * rot_z(-FRAC_PI_4),
        )
    }

    fn hand() -> Pose {
        Pose::translation(0.0, 0.0, HAND_OFFSET) * rot_z(-FRAC_PI_4)
    }
}

impl Default for FrankaModel {
    fn default() -> Self {
        Self::panda()
    }
}

impl KinematicsModel for FrankaModel {
    fn frame_poses(&self, state: &RobotState) -> FramePoses {
        let mut poses = [Pose::identity(); Frame::COUNT];
        let mut chain = Pose::identity();
        for (i, (link, q)) in self.links.iter().zip(state.q.iter()).enumerate() {
            chain *= link.transform(*q);
            poses[i] = chain;
        }
        let flange = chain * Pose::translation(0.0, 0.0, FLANGE_OFFSET);
        poses[Frame::Flange.index()] = flange;
        poses[Frame::EndEffector.index()] = flange * self.flange_to_ee;
        FramePoses::new(poses)
    }
}
