//! Terminates when the estimated external wrench reaches a threshold, e.g.
//! a guarded approach that stops on touching the workpiece.
//!
//! Thresholds apply per axis to the absolute value of `o_f_ext_hat_k`. A
//! non-finite wrench component counts as contact.

use serde::{Deserialize, Serialize};
use skillstop_hal::KinematicsModel;
use skillstop_types::{RobotState, SkillError, TerminationCause};
use tracing::debug;

use super::{require_buffer_time, require_positive};
use crate::handler::{HandlerContext, HandlerCore, TerminationHandler};
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactParams {
    pub buffer_time: Option<f64>,
    /// `[fx, fy, fz]` thresholds (N).
    pub force_thresholds: Option<[f64; 3]>,
    /// `[tx, ty, tz]` thresholds (Nm). Torques are ignored when absent.
    pub torque_thresholds: Option<[f64; 3]>,
}

pub struct ContactPolicy {
    core: HandlerCore,
    force_thresholds: [f64; 3],
    torque_thresholds: Option<[f64; 3]>,
}

fn validate_axes(name: &str, axes: [f64; 3]) -> Result<[f64; 3], SkillError> {
    for value in axes {
        require_positive(name, Some(value))?;
    }
    Ok(axes)
}

fn reaches(values: &[f64], thresholds: &[f64; 3]) -> bool {
    values
        .iter()
        .zip(thresholds)
        .any(|(value, limit)| !(value.abs() < *limit))
}

impl ContactPolicy {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            core: HandlerCore::new(ctx),
            force_thresholds: [f64::INFINITY; 3],
            torque_thresholds: None,
        }
    }

    fn check_contact(&mut self, robot_state: &RobotState) -> bool {
        let (force, torque) = robot_state.o_f_ext_hat_k.split_at(3);
        let fired = reaches(force, &self.force_thresholds)
            || self
                .torque_thresholds
                .is_some_and(|limits| reaches(torque, &limits));
        if fired {
            self.core.state_mut().terminate(TerminationCause::Contact);
        }
        fired
    }
}

impl TerminationHandler for ContactPolicy {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        &mut self.core
    }

    fn parse_parameters(&mut self, params: &[u8]) -> Result<(), SkillError> {
        let (force, torque) = self.core.configure(params, |p: ContactParams| {
            let buffer_time = require_buffer_time(p.buffer_time)?;
            let force = p
                .force_thresholds
                .ok_or_else(|| SkillError::MissingParameter("force_thresholds".to_string()))?;
            let force = validate_axes("force_thresholds", force)?;
            let torque = p
                .torque_thresholds
                .map(|t| validate_axes("torque_thresholds", t))
                .transpose()?;
            Ok((buffer_time, (force, torque)))
        })?;
        self.force_thresholds = force;
        self.torque_thresholds = torque;
        debug!(
            force = ?self.force_thresholds,
            torque = ?self.torque_thresholds,
            "contact policy configured"
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
        self.check_contact(robot_state);
        self.core.finish_cycle(trajectory.time())
    }
}
