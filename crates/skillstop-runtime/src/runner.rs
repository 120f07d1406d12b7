//! [`SkillRunner`] – fixed-step reference control loop.
//!
//! Each cycle advances the trajectory by one control period, commands the
//! robot, polls sensor data and asks the handler whether to stop. The loop
//! ends on the first cycle the handler reports `done`, or after
//! `max_cycles` as a backstop.
//!
//! # Example
//!
//! ```rust
//! use skillstop_hal::{READY_POSE, RobotVariant, SimArm};
//! use skillstop_kernel::{Handler, HandlerContext, PolicyKind, PreemptFlag, TerminationHandler};
//! use skillstop_runtime::{LinearJointTrajectory, SkillRunner};
//!
//! let mut arm = SimArm::new(RobotVariant::Panda);
//! let mut handler = Handler::new(PolicyKind::Time, HandlerContext::new(PreemptFlag::new()));
//! handler.parse_parameters(br#"{"buffer_time": 0.05}"#).unwrap();
//! handler.initialize_handler(&arm).unwrap();
//!
//! let mut goal = READY_POSE;
//! goal[0] = 0.2;
//! let mut trajectory = LinearJointTrajectory::new(READY_POSE, goal, 0.5).unwrap();
//! let runner = SkillRunner::new(0.01).unwrap();
//! let outcome = runner.run(&mut handler, &mut arm, &mut trajectory).unwrap();
//! assert!(outcome.report.terminated);
//! ```

use skillstop_hal::{Robot, SimArm};
use skillstop_kernel::{Handler, Lifecycle, TerminationHandler, Trajectory};
use skillstop_types::{JointArray, SkillError, TerminationCause, TerminationReport};
use tracing::{debug, info};

use crate::config::GuardConfig;

/// A robot that accepts joint position targets.
pub trait JointCommand: Robot {
    fn command_joints(&mut self, q: JointArray);
}

impl JointCommand for SimArm {
    fn command_joints(&mut self, q: JointArray) {
        self.command(q);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Trajectory
// ─────────────────────────────────────────────────────────────────────────────

/// Straight-line joint-space motion from `start` to `goal` over `run_time`
/// seconds. Holds the goal once finished.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearJointTrajectory {
    start: JointArray,
    goal: JointArray,
    run_time: f64,
    time: f64,
}

impl LinearJointTrajectory {
    /// # Errors
    ///
    /// [`SkillError::InvalidParameters`] if `run_time` is not finite and
    /// positive.
    pub fn new(start: JointArray, goal: JointArray, run_time: f64) -> Result<Self, SkillError> {
        if !(run_time.is_finite() && run_time > 0.0) {
            return Err(SkillError::InvalidParameters(format!(
                "run_time must be finite and positive, got {run_time}"
            )));
        }
        Ok(Self {
            start,
            goal,
            run_time,
            time: 0.0,
        })
    }

    pub fn advance(&mut self, dt: f64) {
        self.time += dt;
    }

    /// Commanded joint positions at the current time.
    pub fn sample(&self) -> JointArray {
        let s = (self.time / self.run_time).clamp(0.0, 1.0);
        let mut q = self.start;
        for (i, qi) in q.iter_mut().enumerate() {
            *qi += s * (self.goal[i] - self.start[i]);
        }
        q
    }
}

impl Trajectory for LinearJointTrajectory {
    fn time(&self) -> f64 {
        self.time
    }

    fn run_time(&self) -> f64 {
        self.run_time
    }

    fn goal_joints(&self) -> Option<JointArray> {
        Some(self.goal)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Runner
// ─────────────────────────────────────────────────────────────────────────────

/// Result of one skill execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillOutcome {
    /// Control cycles executed, including the terminating one.
    pub cycles: u64,
    pub report: TerminationReport,
}

impl SkillOutcome {
    /// `true` when the skill ended by reaching its goal and nothing else.
    pub fn succeeded(&self) -> bool {
        self.report.terminated && self.report.causes.iter().all(|c| c == TerminationCause::Goal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillRunner {
    period: f64,
    max_cycles: u64,
}

const DEFAULT_MAX_CYCLES: u64 = 1_000_000;

impl SkillRunner {
    /// Runner stepping `period` seconds per cycle.
    ///
    /// # Errors
    ///
    /// [`SkillError::InvalidParameters`] if `period` is not finite and
    /// positive.
    pub fn new(period: f64) -> Result<Self, SkillError> {
        if !(period.is_finite() && period > 0.0) {
            return Err(SkillError::InvalidParameters(format!(
                "control period must be finite and positive, got {period}"
            )));
        }
        Ok(Self {
            period,
            max_cycles: DEFAULT_MAX_CYCLES,
        })
    }

    /// Runner at the configured control rate.
    pub fn from_config(config: &GuardConfig) -> Result<Self, SkillError> {
        Self::new(config.control_period()?)
    }

    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Drive `handler` until it terminates or `max_cycles` elapse.
    ///
    /// # Errors
    ///
    /// - [`SkillError::NotInitialized`] – the handler was never bound.
    /// - [`SkillError::Binding`] – the robot lost its kinematic model.
    pub fn run<R: JointCommand>(
        &self,
        handler: &mut Handler,
        robot: &mut R,
        trajectory: &mut LinearJointTrajectory,
    ) -> Result<SkillOutcome, SkillError> {
        if handler.core().lifecycle() != Lifecycle::Initialized {
            return Err(SkillError::NotInitialized);
        }
        debug!(
            policy = %handler.kind(),
            robot = robot.id(),
            period = self.period,
            "skill started"
        );

        let mut cycles = 0;
        while cycles < self.max_cycles {
            cycles += 1;
            trajectory.advance(self.period);
            robot.command_joints(trajectory.sample());

            let state = robot.read_state();
            handler.parse_sensor_data(&state);
            let model = robot.model().ok_or_else(|| {
                SkillError::Binding(format!("robot {} lost its kinematic model", robot.id()))
            })?;
            if handler.should_terminate(&state, model, &*trajectory) {
                break;
            }
        }

        let report = handler.core().report(trajectory.time());
        if !report.terminated {
            info!(cycles, "skill still running after cycle budget");
        }
        Ok(SkillOutcome { cycles, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use skillstop_hal::{READY_POSE, RobotVariant};
    use skillstop_kernel::{HandlerContext, PolicyKind, PreemptFlag};
    use skillstop_middleware::SensorDataManager;

    fn bound(kind: PolicyKind, ctx: HandlerContext, params: &[u8], arm: &SimArm) -> Handler {
        let mut handler = Handler::new(kind, ctx);
        handler.parse_parameters(params).unwrap();
        handler.initialize_handler(arm).unwrap();
        handler
    }

    fn shift(joint: usize, by: f64) -> JointArray {
        let mut q = READY_POSE;
        q[joint] += by;
        q
    }

    #[test]
    fn trajectory_interpolates_and_holds_goal() {
        let goal = shift(0, 1.0);
        let mut t = LinearJointTrajectory::new(READY_POSE, goal, 2.0).unwrap();
        t.advance(1.0);
        assert_eq!(t.sample()[0], 0.5);
        t.advance(5.0);
        assert_eq!(t.sample(), goal);
        assert!(t.is_finished());
    }

    #[test]
    fn trajectory_rejects_zero_run_time() {
        assert!(LinearJointTrajectory::new(READY_POSE, READY_POSE, 0.0).is_err());
    }

    #[test]
    fn runner_rejects_degenerate_periods() {
        for period in [0.0, -0.001, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SkillRunner::new(period),
                Err(SkillError::InvalidParameters(_))
            ));
        }
        assert_eq!(SkillRunner::new(0.001).unwrap().period(), 0.001);
    }

    #[test]
    fn unbound_handler_is_refused() {
        let mut arm = SimArm::new(RobotVariant::Panda);
        let mut handler = Handler::new(PolicyKind::Noop, HandlerContext::default());
        let mut t = LinearJointTrajectory::new(READY_POSE, READY_POSE, 1.0).unwrap();
        let result = SkillRunner::new(0.01).unwrap().run(&mut handler, &mut arm, &mut t);
        assert_eq!(result, Err(SkillError::NotInitialized));
    }

    #[test]
    fn final_joint_skill_succeeds() {
        let mut arm = SimArm::new(RobotVariant::Panda);
        let mut handler = bound(
            PolicyKind::FinalJoint,
            HandlerContext::default(),
            br#"{"buffer_time": 0.5, "joint_tolerance": 0.001}"#,
            &arm,
        );
        let mut t = LinearJointTrajectory::new(READY_POSE, shift(0, 0.3), 1.0).unwrap();
        // Power-of-two step keeps the accumulated clock exact.
        let outcome = SkillRunner::new(0.125)
            .unwrap()
            .run(&mut handler, &mut arm, &mut t)
            .unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.cycles, 8);
        assert_eq!(outcome.report.first_cause, Some(TerminationCause::Goal));
    }

    #[test]
    fn motion_into_the_table_is_stopped() {
        // Pitching the shoulder forward drives the wrist down through the table.
        let mut arm = SimArm::new(RobotVariant::Panda);
        let mut handler = bound(
            PolicyKind::Time,
            HandlerContext::default(),
            br#"{"buffer_time": 0.5}"#,
            &arm,
        );
        let mut t = LinearJointTrajectory::new(READY_POSE, shift(1, 2.0), 1.0).unwrap();
        let outcome = SkillRunner::new(0.01)
            .unwrap()
            .run(&mut handler, &mut arm, &mut t)
            .unwrap();
        assert!(outcome.report.terminated_by_collision);
        assert_eq!(outcome.report.first_cause, Some(TerminationCause::VirtualWall));
        assert!(outcome.cycles < 100);
        assert!(!outcome.report.causes.contains(TerminationCause::JointLimit));
        assert!(!outcome.succeeded());
    }

    #[test]
    fn preempted_before_start_stops_on_first_cycle() {
        let mut arm = SimArm::new(RobotVariant::Fr3);
        let preempt = PreemptFlag::new();
        let mut handler = bound(
            PolicyKind::Noop,
            HandlerContext::new(preempt.clone()),
            b"",
            &arm,
        );
        preempt.request();
        let mut t = LinearJointTrajectory::new(READY_POSE, READY_POSE, 1.0).unwrap();
        let outcome = SkillRunner::new(0.01)
            .unwrap()
            .run(&mut handler, &mut arm, &mut t)
            .unwrap();
        assert_eq!(outcome.cycles, 1);
        assert_eq!(outcome.report.first_cause, Some(TerminationCause::Preempt));
    }

    #[test]
    fn cycle_budget_ends_a_noop_skill() {
        let mut arm = SimArm::new(RobotVariant::Panda);
        let mut handler = bound(PolicyKind::Noop, HandlerContext::default(), b"{}", &arm);
        let mut t = LinearJointTrajectory::new(READY_POSE, READY_POSE, 0.1).unwrap();
        let outcome = SkillRunner::new(0.01)
            .unwrap()
            .with_max_cycles(50)
            .run(&mut handler, &mut arm, &mut t)
            .unwrap();
        assert_eq!(outcome.cycles, 50);
        assert!(!outcome.report.terminated);
    }

    #[test]
    fn sensor_stop_reaches_report_subscribers() {
        let mut arm = SimArm::new(RobotVariant::Panda);
        let manager = SensorDataManager::new();
        let mut reports = manager.subscribe_reports();
        let ctx = HandlerContext::default()
            .with_sensors(Arc::new(manager.clone()))
            .with_reports(Arc::new(manager.clone()));
        let mut handler = bound(PolicyKind::Sensor, ctx, br#"{"buffer_time": 0.5}"#, &arm);

        manager.push(true, 0.0);
        let mut t = LinearJointTrajectory::new(READY_POSE, READY_POSE, 1.0).unwrap();
        let outcome = SkillRunner::new(0.01)
            .unwrap()
            .run(&mut handler, &mut arm, &mut t)
            .unwrap();
        assert_eq!(outcome.cycles, 1);

        let published = reports.try_recv().unwrap();
        assert_eq!(published, outcome.report);
        assert_eq!(published.first_cause, Some(TerminationCause::Sensor));
        assert!(reports.try_recv().is_none());
    }

    #[test]
    fn config_drives_the_whole_stack() {
        let cfg = GuardConfig::from_toml_str(
            r#"
            robot = "fr3"
            control_rate_hz = 100.0

            [policy]
            kind = "time"
            parameters = { buffer_time = 0.1 }
            "#,
        )
        .unwrap();
        let mut arm = SimArm::new(cfg.robot).with_model(cfg.kinematics().unwrap());
        let ctx = cfg
            .handler_context(HandlerContext::new(PreemptFlag::new()))
            .unwrap();
        let mut handler = bound(cfg.policy.kind, ctx, &cfg.policy_parameters().unwrap(), &arm);

        let mut t = LinearJointTrajectory::new(READY_POSE, READY_POSE, 0.5).unwrap();
        let outcome = SkillRunner::from_config(&cfg)
            .unwrap()
            .run(&mut handler, &mut arm, &mut t)
            .unwrap();
        assert_eq!(outcome.report.first_cause, Some(TerminationCause::Time));
        assert!((outcome.report.elapsed_s - 0.61).abs() < 0.011);
    }
}
