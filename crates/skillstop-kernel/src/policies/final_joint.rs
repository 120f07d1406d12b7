//! Completes once the arm has settled on the trajectory's final joint
//! configuration.
//!
//! The goal test only runs after the planned duration has elapsed, so a
//! trajectory that passes through its goal mid-motion does not end early.
//! A trajectory without joint goals never completes here and falls back on
//! the time budget.

use serde::{Deserialize, Serialize};
use skillstop_hal::KinematicsModel;
use skillstop_types::{RobotState, SkillError, TerminationCause};
use tracing::debug;

use super::{require_buffer_time, require_positive};
use crate::handler::{HandlerContext, HandlerCore, TerminationHandler};
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinalJointParams {
    pub buffer_time: Option<f64>,
    /// Maximum per-joint error (rad) that still counts as arrived.
    pub joint_tolerance: Option<f64>,
}

pub struct FinalJointPolicy {
    core: HandlerCore,
    joint_tolerance: f64,
}

impl FinalJointPolicy {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            core: HandlerCore::new(ctx),
            joint_tolerance: 0.0,
        }
    }

    pub fn joint_tolerance(&self) -> f64 {
        self.joint_tolerance
    }

    fn check_goal(&mut self, robot_state: &RobotState, trajectory: &dyn Trajectory) -> bool {
        if !trajectory.is_finished() {
            return false;
        }
        let Some(goal) = trajectory.goal_joints() else {
            return false;
        };
        let tolerance = self.joint_tolerance;
        let arrived = robot_state
            .q
            .iter()
            .zip(goal.iter())
            .all(|(q, g)| (q - g).abs() < tolerance);
        if arrived {
            self.core.state_mut().terminate(TerminationCause::Goal);
        }
        arrived
    }
}

impl TerminationHandler for FinalJointPolicy {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        &mut self.core
    }

    fn parse_parameters(&mut self, params: &[u8]) -> Result<(), SkillError> {
        self.joint_tolerance = self.core.configure(params, |p: FinalJointParams| {
            let buffer_time = require_buffer_time(p.buffer_time)?;
            let tolerance = require_positive("joint_tolerance", p.joint_tolerance)?;
            Ok((buffer_time, tolerance))
        })?;
        debug!(joint_tolerance = self.joint_tolerance, "final-joint policy configured");
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
        self.check_goal(robot_state, trajectory);
        self.core.finish_cycle(trajectory.time())
    }
}
