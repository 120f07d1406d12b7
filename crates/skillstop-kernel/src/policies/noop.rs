//! Safety checks only. A `noop` skill runs until something external stops it.

use serde::Deserialize;
use skillstop_hal::KinematicsModel;
use skillstop_types::{RobotState, SkillError};

use crate::handler::{HandlerContext, HandlerCore, TerminationHandler};
use crate::trajectory::Trajectory;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoopParams {}

pub struct NoopPolicy {
    core: HandlerCore,
}

impl NoopPolicy {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            core: HandlerCore::new(ctx),
        }
    }
}

impl TerminationHandler for NoopPolicy {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        &mut self.core
    }

    fn parse_parameters(&mut self, params: &[u8]) -> Result<(), SkillError> {
        self.core.configure(params, |NoopParams {}| Ok((0.0, ())))
    }

    fn should_terminate(
        &mut self,
        robot_state: &RobotState,
        model: &dyn KinematicsModel,
        trajectory: &dyn Trajectory,
    ) -> bool {
        self.core.check_safety(robot_state, model);
        self.core.finish_cycle(trajectory.time())
    }
}
