//! [`KinematicsModel`] – forward kinematics seam.
//!
//! A model maps one [`RobotState`] to the base-frame pose of every [`Frame`]
//! on the arm in a single pass. Implementations must not allocate: the
//! virtual-wall check calls [`KinematicsModel::frame_poses`] once per control
//! cycle.

use nalgebra::{Isometry3, Point3};
use skillstop_types::RobotState;

/// Rigid-body pose of a frame relative to the robot base.
pub type Pose = Isometry3<f64>;

/// Named frames along the kinematic chain, base outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    Joint1,
    Joint2,
    Joint3,
    Joint4,
    Joint5,
    Joint6,
    Joint7,
    Flange,
    EndEffector,
}

impl Frame {
    pub const COUNT: usize = 9;

    pub const ALL: [Frame; Self::COUNT] = [
        Frame::Joint1,
        Frame::Joint2,
        Frame::Joint3,
        Frame::Joint4,
        Frame::Joint5,
        Frame::Joint6,
        Frame::Joint7,
        Frame::Flange,
        Frame::EndEffector,
    ];

    /// Position of this frame in [`Frame::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Poses of every [`Frame`], indexed by [`Frame::index`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePoses([Pose; Frame::COUNT]);

impl FramePoses {
    pub fn new(poses: [Pose; Frame::COUNT]) -> Self {
        Self(poses)
    }

    pub fn get(&self, frame: Frame) -> &Pose {
        &self.0[frame.index()]
    }

    /// Origin of `frame` in base coordinates.
    pub fn origin(&self, frame: Frame) -> Point3<f64> {
        Point3::from(self.get(frame).translation.vector)
    }
}

/// Forward kinematics provider.
pub trait KinematicsModel: Send + Sync {
    /// Compute the pose of every frame for the joint positions in `state`.
    ///
    /// Non-finite joint positions must propagate into the returned poses
    /// rather than being clamped, so downstream checks can fail safe.
    fn frame_poses(&self, state: &RobotState) -> FramePoses;

    /// Pose of a single `frame`.
    fn pose(&self, frame: Frame, state: &RobotState) -> Pose {
        *self.frame_poses(state).get(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stacked;

    // Every frame sits 0.1 m above the previous one.
    impl KinematicsModel for Stacked {
        fn frame_poses(&self, _state: &RobotState) -> FramePoses {
            let mut poses = [Pose::identity(); Frame::COUNT];
            for (i, pose) in poses.iter_mut().enumerate() {
                *pose = Pose::translation(0.0, 0.0, 0.1 * (i as f64 + 1.0));
            }
            FramePoses::new(poses)
        }
    }

    #[test]
    fn frame_indices_follow_chain_order() {
        for (i, frame) in Frame::ALL.iter().enumerate() {
            assert_eq!(frame.index(), i);
        }
    }

    #[test]
    fn default_pose_reads_from_frame_poses() {
        let pose = Stacked.pose(Frame::Flange, &RobotState::default());
        assert!((pose.translation.vector.z - 0.8).abs() < 1e-12);
    }

    #[test]
    fn origin_is_translation_part() {
        let poses = Stacked.frame_poses(&RobotState::default());
        let origin = poses.origin(Frame::Joint1);
        assert!((origin.z - 0.1).abs() < 1e-12);
        assert_eq!(origin.x, 0.0);
    }
}
