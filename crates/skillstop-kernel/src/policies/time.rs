//! Safety checks plus the time budget: the skill may run for the planned
//! duration plus `buffer_time` seconds.

use serde::{Deserialize, Serialize};
use skillstop_hal::KinematicsModel;
use skillstop_types::{RobotState, SkillError};

use super::require_buffer_time;
use crate::handler::{HandlerContext, HandlerCore, TerminationHandler};
use crate::trajectory::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeParams {
    pub buffer_time: Option<f64>,
}

pub struct TimePolicy {
    core: HandlerCore,
}

impl TimePolicy {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            core: HandlerCore::new(ctx),
        }
    }
}

impl TerminationHandler for TimePolicy {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        &mut self.core
    }

    fn parse_parameters(&mut self, params: &[u8]) -> Result<(), SkillError> {
        self.core.configure(params, |p: TimeParams| {
            Ok((require_buffer_time(p.buffer_time)?, ()))
        })
    }

    fn should_terminate(
        &mut self,
        robot_state: &RobotState,
        model: &dyn KinematicsModel,
        trajectory: &dyn Trajectory,
    ) -> bool {
        self.core.check_safety(robot_state, model);
        self.core.check_time(trajectory);
        self.core.finish_cycle(trajectory.time())
    }
}
