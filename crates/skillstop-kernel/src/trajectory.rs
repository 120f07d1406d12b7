//! [`Trajectory`] – what the termination engine reads from the generator.
//!
//! The generator owns planning and its clock. Handlers only ask how far
//! along the motion is and, for goal-based policies, where it is headed.

use skillstop_hal::Pose;
use skillstop_types::JointArray;

/// Read-only view of an in-progress trajectory.
pub trait Trajectory {
    /// Time (s) since the skill started, on the generator's clock.
    fn time(&self) -> f64;

    /// Planned duration (s) of the motion.
    fn run_time(&self) -> f64;

    /// Final joint positions, if the generator plans in joint space.
    fn goal_joints(&self) -> Option<JointArray> {
        None
    }

    /// Final end-effector pose, if the generator plans in Cartesian space.
    fn goal_pose(&self) -> Option<Pose> {
        None
    }

    /// `true` once the planned duration has fully elapsed.
    fn is_finished(&self) -> bool {
        self.time() >= self.run_time()
    }
}
