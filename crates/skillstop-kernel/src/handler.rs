//! [`TerminationHandler`] – the contract every termination policy follows,
//! and [`HandlerCore`], the state and plumbing they share.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──parse_parameters──▶ Parsed ──initialize_handler──▶ Initialized
//!                                                                   │
//!                                              should_terminate ◀───┘ (every cycle)
//! ```
//!
//! Setup calls return [`SkillError`] and are the only place a handler may
//! fail. `should_terminate` returns a plain `bool` and never fails.
//!
//! # Reporting
//!
//! On the cycle where `done` first becomes `true`, the core publishes one
//! [`TerminationReport`] through its [`ReportSink`] and logs the causes.
//! Later cycles may add causes to the state but never publish again.

use std::sync::Arc;

use skillstop_hal::{KinematicsModel, Robot};
use skillstop_types::{RobotState, SkillError, TerminationCause, TerminationReport};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channels::{ReportSink, SensorSource};
use crate::checks;
use crate::envelope::SafetyEnvelope;
use crate::joint_limits::JointLimits;
use crate::preempt::PreemptFlag;
use crate::state::TerminationState;
use crate::trajectory::Trajectory;

/// Setup progress of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Parsed,
    Initialized,
}

/// Collaborators handed to a handler when it is constructed.
#[derive(Clone, Default)]
pub struct HandlerContext {
    /// Identifier of the skill execution; a fresh v4 id if not supplied.
    pub skill_id: Option<Uuid>,
    pub preempt: PreemptFlag,
    pub envelope: SafetyEnvelope,
    pub reports: Option<Arc<dyn ReportSink>>,
    pub sensors: Option<Arc<dyn SensorSource>>,
}

impl HandlerContext {
    pub fn new(preempt: PreemptFlag) -> Self {
        Self {
            preempt,
            ..Self::default()
        }
    }

    pub fn with_skill_id(mut self, skill_id: Uuid) -> Self {
        self.skill_id = Some(skill_id);
        self
    }

    pub fn with_envelope(mut self, envelope: SafetyEnvelope) -> Self {
        self.envelope = envelope;
        self
    }

    pub fn with_reports(mut self, reports: Arc<dyn ReportSink>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn with_sensors(mut self, sensors: Arc<dyn SensorSource>) -> Self {
        self.sensors = Some(sensors);
        self
    }
}

/// State and collaborators common to every policy.
pub struct HandlerCore {
    skill_id: Uuid,
    lifecycle: Lifecycle,
    state: TerminationState,
    envelope: SafetyEnvelope,
    joint_limits: JointLimits,
    preempt: PreemptFlag,
    reports: Option<Arc<dyn ReportSink>>,
    sensors: Option<Arc<dyn SensorSource>>,
    reported: bool,
}

impl HandlerCore {
    pub fn new(ctx: HandlerContext) -> Self {
        let joint_limits = ctx.envelope.joint_limits().copied().unwrap_or_default();
        Self {
            skill_id: ctx.skill_id.unwrap_or_else(Uuid::new_v4),
            lifecycle: Lifecycle::Created,
            state: TerminationState::default(),
            envelope: ctx.envelope,
            joint_limits,
            preempt: ctx.preempt,
            reports: ctx.reports,
            sensors: ctx.sensors,
            reported: false,
        }
    }

    pub fn skill_id(&self) -> Uuid {
        self.skill_id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn state(&self) -> &TerminationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TerminationState {
        &mut self.state
    }

    pub fn joint_limits(&self) -> &JointLimits {
        &self.joint_limits
    }

    pub fn sensors(&self) -> Option<&Arc<dyn SensorSource>> {
        self.sensors.as_ref()
    }

    /// Decode a JSON parameter buffer into `P` and hand it to `accept`,
    /// which validates it and returns the buffer time together with the
    /// policy's own settings. An empty buffer decodes as `{}`.
    ///
    /// On any failure the handler drops back to [`Lifecycle::Created`]; a
    /// rejected buffer can never be bound, even after an earlier buffer was
    /// accepted.
    ///
    /// # Errors
    ///
    /// - [`SkillError::InvalidParameters`] – the buffer does not decode, or
    ///   the handler is already bound.
    /// - whatever `accept` returns.
    pub fn configure<P, T>(
        &mut self,
        params: &[u8],
        accept: impl FnOnce(P) -> Result<(f64, T), SkillError>,
    ) -> Result<T, SkillError>
    where
        P: serde::de::DeserializeOwned,
    {
        if self.lifecycle == Lifecycle::Initialized {
            return Err(SkillError::InvalidParameters(
                "parameters are fixed once the handler is bound".to_string(),
            ));
        }
        match self.decode_params(params).and_then(accept) {
            Ok((buffer_time, settings)) => {
                self.mark_parsed(buffer_time);
                Ok(settings)
            }
            Err(e) => {
                self.lifecycle = Lifecycle::Created;
                warn!(skill = %self.skill_id, error = %e, "rejected termination parameters");
                Err(e)
            }
        }
    }

    fn decode_params<T: serde::de::DeserializeOwned>(
        &self,
        params: &[u8],
    ) -> Result<T, SkillError> {
        let buffer: &[u8] = if params.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            params
        };
        serde_json::from_slice(buffer).map_err(|e| SkillError::InvalidParameters(e.to_string()))
    }

    fn mark_parsed(&mut self, buffer_time: f64) {
        self.state.set_buffer_time(buffer_time);
        self.lifecycle = Lifecycle::Parsed;
        debug!(skill = %self.skill_id, buffer_time, "termination parameters parsed");
    }

    /// Validate the robot handle and adopt its joint-limit preset unless the
    /// envelope pinned one.
    ///
    /// # Errors
    ///
    /// - [`SkillError::NotParsed`] – parameters have not been parsed yet.
    /// - [`SkillError::Binding`] – the robot is disconnected or has no model.
    pub fn bind(&mut self, robot: &dyn Robot) -> Result<(), SkillError> {
        match self.lifecycle {
            Lifecycle::Created => return Err(SkillError::NotParsed),
            Lifecycle::Initialized => {
                return Err(SkillError::Binding(format!(
                    "handler already bound; refusing to rebind to {}",
                    robot.id()
                )));
            }
            Lifecycle::Parsed => {}
        }
        if !robot.is_connected() {
            return Err(SkillError::Binding(format!(
                "robot {} is not connected",
                robot.id()
            )));
        }
        if robot.model().is_none() {
            return Err(SkillError::Binding(format!(
                "robot {} exposes no kinematic model",
                robot.id()
            )));
        }
        if self.envelope.joint_limits().is_none() {
            self.joint_limits = JointLimits::for_variant(robot.variant());
        }
        self.lifecycle = Lifecycle::Initialized;
        info!(
            skill = %self.skill_id,
            robot = robot.id(),
            variant = %robot.variant(),
            "termination handler bound"
        );
        Ok(())
    }

    pub fn check_preempt(&mut self) -> bool {
        checks::check_terminate_preempt(&mut self.state, &self.preempt)
    }

    pub fn check_time(&mut self, trajectory: &dyn Trajectory) -> bool {
        checks::check_terminate_time(&mut self.state, trajectory)
    }

    pub fn check_virtual_walls(
        &mut self,
        robot_state: &RobotState,
        model: &dyn KinematicsModel,
    ) -> bool {
        checks::check_terminate_virtual_wall_collisions(
            &mut self.state,
            &self.envelope,
            robot_state,
            model,
        )
    }

    pub fn check_joint_limits(&mut self, robot_state: &RobotState) -> bool {
        checks::check_terminate_joint_limits(&mut self.state, &self.joint_limits, robot_state)
    }

    /// Preemption, virtual walls and joint limits.
    pub fn check_safety(&mut self, robot_state: &RobotState, model: &dyn KinematicsModel) {
        self.check_preempt();
        self.check_virtual_walls(robot_state, model);
        self.check_joint_limits(robot_state);
    }

    /// Close out a cycle: publish the report on the first transition and
    /// return the sticky decision.
    pub fn finish_cycle(&mut self, elapsed_s: f64) -> bool {
        if self.state.done() && !self.reported {
            self.reported = true;
            let report = self.report(elapsed_s);
            if report.causes.iter().all(|c| c == TerminationCause::Goal) {
                info!(skill = %self.skill_id, elapsed_s, "skill completed");
            } else {
                warn!(
                    skill = %self.skill_id,
                    causes = %report.causes,
                    collision = report.terminated_by_collision,
                    elapsed_s,
                    "skill terminated"
                );
            }
            if let Some(sink) = &self.reports {
                sink.publish(report);
            }
        }
        self.state.done()
    }

    /// Snapshot of the current decision as a report.
    pub fn report(&self, elapsed_s: f64) -> TerminationReport {
        let causes = self.state.causes();
        TerminationReport {
            skill_id: self.skill_id,
            terminated: self.state.done(),
            terminated_by_collision: self.state.terminated_by_collision(),
            causes,
            first_cause: causes.first(),
            elapsed_s,
        }
    }
}

/// A termination policy.
///
/// Concrete policies compose the shared checks on [`HandlerCore`] with
/// their own completion logic.
pub trait TerminationHandler {
    fn core(&self) -> &HandlerCore;

    fn core_mut(&mut self) -> &mut HandlerCore;

    /// Decode policy parameters from the opaque buffer. Must precede
    /// [`initialize_handler`][Self::initialize_handler].
    fn parse_parameters(&mut self, params: &[u8]) -> Result<(), SkillError>;

    /// Bind to a connected robot. Failure aborts the skill attempt.
    fn initialize_handler(&mut self, robot: &dyn Robot) -> Result<(), SkillError> {
        self.core_mut().bind(robot)
    }

    /// Run this policy's checks and return the sticky `done` flag.
    fn should_terminate(
        &mut self,
        robot_state: &RobotState,
        model: &dyn KinematicsModel,
        trajectory: &dyn Trajectory,
    ) -> bool;

    /// Ingest externally delivered sensor data for this cycle.
    fn parse_sensor_data(&mut self, _robot_state: &RobotState) {}

    fn has_terminated(&self) -> bool {
        self.core().state().done()
    }

    fn has_terminated_by_collision(&self) -> bool {
        self.core().state().terminated_by_collision()
    }
}
