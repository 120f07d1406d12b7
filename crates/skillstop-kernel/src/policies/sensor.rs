//! Terminates on input from an external sensor process delivered through
//! the sensor-data channel.
//!
//! [`parse_sensor_data`][TerminationHandler::parse_sensor_data] polls the
//! channel once per cycle and keeps the newest reading. Missing or repeated
//! readings are degraded input: the last accepted reading stays in effect
//! and nothing fails.

use serde::{Deserialize, Serialize};
use skillstop_hal::{KinematicsModel, Robot};
use skillstop_types::{RobotState, SensorMessage, SkillError, TerminationCause};
use tracing::{debug, trace};

use super::{require_buffer_time, require_positive};
use crate::handler::{HandlerContext, HandlerCore, Lifecycle, TerminationHandler};
use crate::trajectory::Trajectory;

fn default_stop_on_request() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorParams {
    pub buffer_time: Option<f64>,
    /// Terminate when `|signal|` reaches this value.
    pub signal_threshold: Option<f64>,
    /// Honour `stop_requested` on incoming messages.
    #[serde(default = "default_stop_on_request")]
    pub stop_on_request: bool,
}

pub struct SensorPolicy {
    core: HandlerCore,
    signal_threshold: Option<f64>,
    stop_on_request: bool,
    latest: Option<SensorMessage>,
}

impl SensorPolicy {
    pub fn new(ctx: HandlerContext) -> Self {
        Self {
            core: HandlerCore::new(ctx),
            signal_threshold: None,
            stop_on_request: true,
            latest: None,
        }
    }

    /// Most recent reading accepted from the channel.
    pub fn latest(&self) -> Option<&SensorMessage> {
        self.latest.as_ref()
    }

    fn check_sensor(&mut self) -> bool {
        let Some(msg) = self.latest else {
            return false;
        };
        let requested = self.stop_on_request && msg.stop_requested;
        let over_threshold = self
            .signal_threshold
            .is_some_and(|limit| !(msg.signal.abs() < limit));
        let fired = requested || over_threshold;
        if fired {
            self.core.state_mut().terminate(TerminationCause::Sensor);
        }
        fired
    }
}

impl TerminationHandler for SensorPolicy {
    fn core(&self) -> &HandlerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut HandlerCore {
        &mut self.core
    }

    fn parse_parameters(&mut self, params: &[u8]) -> Result<(), SkillError> {
        let (threshold, stop_on_request) = self.core.configure(params, |p: SensorParams| {
            let buffer_time = require_buffer_time(p.buffer_time)?;
            let threshold = p
                .signal_threshold
                .map(|t| require_positive("signal_threshold", Some(t)))
                .transpose()?;
            if !p.stop_on_request && threshold.is_none() {
                return Err(SkillError::InvalidParameters(
                    "sensor policy needs stop_on_request or a signal_threshold".to_string(),
                ));
            }
            Ok((buffer_time, (threshold, p.stop_on_request)))
        })?;
        self.signal_threshold = threshold;
        self.stop_on_request = stop_on_request;
        debug!(
            signal_threshold = ?self.signal_threshold,
            stop_on_request = self.stop_on_request,
            "sensor policy configured"
        );
        Ok(())
    }

    fn initialize_handler(&mut self, robot: &dyn Robot) -> Result<(), SkillError> {
        if self.core.lifecycle() == Lifecycle::Parsed && self.core.sensors().is_none() {
            return Err(SkillError::Binding(
                "sensor policy requires a sensor-data channel".to_string(),
            ));
        }
        self.core.bind(robot)
    }

    fn parse_sensor_data(&mut self, _robot_state: &RobotState) {
        let Some(msg) = self.core.sensors().and_then(|s| s.try_latest()) else {
            return;
        };
        let fresh = self.latest.is_none_or(|prev| msg.sequence > prev.sequence);
        if fresh {
            trace!(sequence = msg.sequence, "sensor reading accepted");
            self.latest = Some(msg);
        }
    }

    fn should_terminate(
        &mut self,
        robot_state: &RobotState,
        model: &dyn KinematicsModel,
        trajectory: &dyn Trajectory,
    ) -> bool {
        self.core.check_safety(robot_state, model);
        self.core.check_time(trajectory);
        self.check_sensor();
        self.core.finish_cycle(trajectory.time())
    }
}
