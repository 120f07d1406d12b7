//! Completes once the end effector has settled on the trajectory's goal
//! pose, within a position and an orientation tolerance.

use serde::{Deserialize, Serialize};
use skillstop_hal::{Frame, KinematicsModel};
use skillstop_types::{RobotState, SkillError, TerminationCause};
use tracing::debug;

use super::{require_buffer_time, require_positive};
use crate::handler::{HandlerContext, HandlerCore, TerminationHandler};
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinalPoseParams {
    pub buffer_time: Option<f64>,
    /// Translational error (m).
    pub position_tolerance: Option<f64>,
    /// Rotation angle (rad) between current and goal orientation.
    pub orientation_tolerance: Option<f64>,
}

pub struct FinalPosePolicy {
    core: HandlerCore,
    position_tolerance: f64,
    orientation_tolerance: f64,
}

impl FinalPosePolicy {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            core: HandlerCore::new(ctx),
            position_tolerance: 0.0,
            orientation_tolerance: 0.0,
        }
    }

    fn check_goal(
        &mut self,
        robot_state: &RobotState,
        model: &dyn KinematicsModel,
        trajectory: &dyn Trajectory,
    ) -> bool {
        if !trajectory.is_finished() {
            return false;
        }
        let Some(goal) = trajectory.goal_pose() else {
            return false;
        };
        let current = model.pose(Frame::EndEffector, robot_state);
        let position_error = (goal.translation.vector - current.translation.vector).norm();
        let orientation_error = (goal.rotation.inverse() * current.rotation).angle();
        let arrived = position_error < self.position_tolerance
            && orientation_error < self.orientation_tolerance;
        if arrived {
            self.core.state_mut().terminate(TerminationCause::Goal);
        }
        arrived
    }
}

impl TerminationHandler for FinalPosePolicy {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        &mut self.core
    }

    fn parse_parameters(&mut self, params: &[u8]) -> Result<(), SkillError> {
        let (position, orientation) = self.core.configure(params, |p: FinalPoseParams| {
            let buffer_time = require_buffer_time(p.buffer_time)?;
            let position = require_positive("position_tolerance", p.position_tolerance)?;
            let orientation = require_positive("orientation_tolerance", p.orientation_tolerance)?;
            Ok((buffer_time, (position, orientation)))
        })?;
        self.position_tolerance = position;
        self.orientation_tolerance = orientation;
        debug!(
            position_tolerance = position,
            orientation_tolerance = orientation,
            "final-pose policy configured"
        );
        Ok(())
    }

    fn should_terminate(
        &mut self,
        robot_state: &RobotState,
        model: &dyn KinematicsModel,
        trajectory: &dyn Trajectory,
    ) -> bool {
        self.core.check_safety(robot_state, model);
        self.core.check_time(trajectory);
        self.check_goal(robot_state, model, trajectory);
        self.core.finish_cycle(trajectory.time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::fixtures::Frozen;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};
    use skillstop_hal::{FrankaModel, Pose, READY_POSE, RobotVariant, SimArm};

    const PARAMS: &[u8] =
        br#"{"buffer_time": 1.0, "position_tolerance": 0.005, "orientation_tolerance": 0.02}"#;

    fn bound() -> FinalPosePolicy {
        let mut policy = FinalPosePolicy::new(HandlerContext::default());
        policy.parse_parameters(PARAMS).unwrap();
        policy
            .initialize_handler(&SimArm::new(RobotVariant::Panda))
            .unwrap();
        policy
    }

    fn ready_hand() -> Pose {
        FrankaModel::panda().pose(Frame::EndEffector, &RobotState::at_rest(READY_POSE))
    }

    fn towards(goal: Pose, time: f64) -> Frozen {
        Frozen {
            goal_pose: Some(goal),
            ..Frozen::at(time, 2.0)
        }
    }

    #[test]
    fn both_tolerances_are_required() {
        let mut policy = FinalPosePolicy::new(HandlerContext::default());
        let result =
            policy.parse_parameters(br#"{"buffer_time": 1.0, "position_tolerance": 0.005}"#);
        assert_eq!(
            result,
            Err(SkillError::MissingParameter("orientation_tolerance".to_string()))
        );
    }

    #[test]
    fn completes_at_goal_pose() {
        let mut policy = bound();
        let state = RobotState::at_rest(READY_POSE);
        let model = FrankaModel::panda();
        assert!(!policy.should_terminate(&state, &model, &towards(ready_hand(), 1.9)));
        assert!(policy.should_terminate(&state, &model, &towards(ready_hand(), 2.0)));
        assert_eq!(
            policy.core().state().causes().first(),
            Some(TerminationCause::Goal)
        );
        assert!(!policy.has_terminated_by_collision());
    }

    #[test]
    fn position_error_blocks_completion() {
        let mut policy = bound();
        let goal = Translation3::new(0.0, 0.0, 0.01) * ready_hand();
        let state = RobotState::at_rest(READY_POSE);
        assert!(!policy.should_terminate(&state, &FrankaModel::panda(), &towards(goal, 2.0)));
    }

    #[test]
    fn orientation_error_blocks_completion() {
        let mut policy = bound();
        let twist = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.05);
        let mut goal = ready_hand();
        goal.rotation = goal.rotation * twist;
        let state = RobotState::at_rest(READY_POSE);
        assert!(!policy.should_terminate(&state, &FrankaModel::panda(), &towards(goal, 2.0)));
    }
}
