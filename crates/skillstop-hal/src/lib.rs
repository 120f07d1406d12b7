//! `skillstop-hal` – robot binding for the termination engine.
//!
//! The engine never talks to a driver directly. It sees the arm through two
//! seams:
//!
//! - [`kinematics`] – [`KinematicsModel`]: forward kinematics from a
//!   [`RobotState`][skillstop_types::RobotState] to the pose of every
//!   [`Frame`] along the chain.
//! - [`robot`] – [`Robot`]: a connected arm that exposes its variant, its
//!   kinematic model and its latest state.
//!
//! [`franka`] provides the modified-DH model shared by the Franka Panda and
//! FR3, and [`sim`] provides [`SimArm`], an in-process arm for headless
//! tests and CI.

pub mod franka;
pub mod kinematics;
pub mod robot;
pub mod sim;

pub use franka::{DhLink, FrankaModel};
pub use kinematics::{Frame, FramePoses, KinematicsModel, Pose};
pub use robot::{Robot, RobotVariant};
pub use sim::{READY_POSE, SimArm};
