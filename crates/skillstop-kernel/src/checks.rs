//! The four shared checks every policy composes.
//!
//! Each check is a free function over an explicit [`TerminationState`]. A
//! check may only move the state towards `Terminated`; it never clears a
//! flag. Checks always evaluate, even when the state is already terminated,
//! so the cause set stays complete. Each returns `true` when it fired on
//! this call.
//!
//! None of them allocate, block or fail. Inputs that cannot be trusted
//! (NaN, infinities) count as violations.

use skillstop_hal::KinematicsModel;
use skillstop_types::{RobotState, TerminationCause};

use crate::envelope::{OPERATING_POINTS, SafetyEnvelope};
use crate::joint_limits::JointLimits;
use crate::preempt::PreemptFlag;
use crate::state::TerminationState;
use crate::trajectory::Trajectory;

/// Terminate when an out-of-band actor has raised the preemption flag.
pub fn check_terminate_preempt(state: &mut TerminationState, preempt: &PreemptFlag) -> bool {
    let fired = preempt.is_requested();
    if fired {
        state.terminate(TerminationCause::Preempt);
    }
    fired
}

/// Terminate once trajectory time exceeds the planned duration plus the
/// state's buffer time. Reaching the budget exactly does not fire.
pub fn check_terminate_time(state: &mut TerminationState, trajectory: &dyn Trajectory) -> bool {
    let budget = trajectory.run_time() + state.buffer_time();
    let fired = !(trajectory.time() <= budget);
    if fired {
        state.terminate(TerminationCause::Time);
    }
    fired
}

/// Terminate when any operating point touches or crosses a virtual wall.
///
/// Forward kinematics runs once; every operating point is tested against
/// every wall.
pub fn check_terminate_virtual_wall_collisions(
    state: &mut TerminationState,
    envelope: &SafetyEnvelope,
    robot_state: &RobotState,
    model: &dyn KinematicsModel,
) -> bool {
    let poses = model.frame_poses(robot_state);
    let workspace = envelope.workspace();
    let mut fired = false;
    for (frame, margin) in OPERATING_POINTS.iter().zip(envelope.point_margins()) {
        let point = poses.origin(*frame);
        fired |= workspace.first_violation_with_margin(&point, *margin).is_some();
    }
    if fired {
        state.terminate(TerminationCause::VirtualWall);
    }
    fired
}

/// Terminate when any joint is at or beyond one of its bounds.
pub fn check_terminate_joint_limits(
    state: &mut TerminationState,
    limits: &JointLimits,
    robot_state: &RobotState,
) -> bool {
    let fired = limits.first_violation(&robot_state.q).is_some();
    if fired {
        state.terminate(TerminationCause::JointLimit);
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use skillstop_hal::{Frame, FramePoses, FrankaModel, Pose, READY_POSE};

    use crate::geometry::Workspace;

    struct Clock {
        time: f64,
        run_time: f64,
    }

    impl Trajectory for Clock {
        fn time(&self) -> f64 {
            self.time
        }

        fn run_time(&self) -> f64 {
            self.run_time
        }
    }

    /// Puts every frame at one fixed point.
    struct PinnedAt(Point3<f64>);

    impl KinematicsModel for PinnedAt {
        fn frame_poses(&self, _state: &RobotState) -> FramePoses {
            let p = self.0;
            FramePoses::new([Pose::translation(p.x, p.y, p.z); Frame::COUNT])
        }
    }

    /// Everything at the bench-top origin except the end effector.
    struct HandAt(Point3<f64>);

    impl KinematicsModel for HandAt {
        fn frame_poses(&self, _state: &RobotState) -> FramePoses {
            let mut poses = [Pose::translation(0.2, 0.0, 0.4); Frame::COUNT];
            poses[Frame::EndEffector.index()] = Pose::translation(self.0.x, self.0.y, self.0.z);
            FramePoses::new(poses)
        }
    }

    fn ready() -> RobotState {
        RobotState::at_rest(READY_POSE)
    }

    // ------------------------------------------------------------------ preempt

    #[test]
    fn preempt_fires_only_when_requested() {
        let flag = PreemptFlag::new();
        let mut state = TerminationState::default();
        assert!(!check_terminate_preempt(&mut state, &flag));
        assert!(!state.done());

        flag.request();
        assert!(check_terminate_preempt(&mut state, &flag));
        assert!(state.done());
        assert!(state.causes().contains(TerminationCause::Preempt));
        assert!(!state.terminated_by_collision());
    }

    #[test]
    fn clearing_preempt_does_not_resume() {
        let flag = PreemptFlag::new();
        let mut state = TerminationState::default();
        flag.request();
        check_terminate_preempt(&mut state, &flag);
        flag.clear();
        assert!(!check_terminate_preempt(&mut state, &flag));
        assert!(state.done());
    }

    // ------------------------------------------------------------------ time

    #[test]
    fn time_within_budget_does_not_fire() {
        let mut state = TerminationState::new(0.5);
        let at_budget = Clock {
            time: 2.5,
            run_time: 2.0,
        };
        assert!(!check_terminate_time(&mut state, &at_budget));
        assert!(!state.done());
    }

    #[test]
    fn time_past_budget_fires() {
        let mut state = TerminationState::new(0.5);
        let late = Clock {
            time: 2.5001,
            run_time: 2.0,
        };
        assert!(check_terminate_time(&mut state, &late));
        assert!(state.causes().contains(TerminationCause::Time));
        assert!(!state.terminated_by_collision());
    }

    #[test]
    fn non_finite_clock_fires() {
        let mut state = TerminationState::new(0.0);
        let broken = Clock {
            time: f64::NAN,
            run_time: 1.0,
        };
        assert!(check_terminate_time(&mut state, &broken));
    }

    // ------------------------------------------------------------------ virtual walls

    #[test]
    fn end_effector_past_front_wall_is_a_collision() {
        let mut state = TerminationState::default();
        let model = HandAt(Point3::new(0.80, 0.0, 0.6));
        let fired = check_terminate_virtual_wall_collisions(
            &mut state,
            &SafetyEnvelope::default(),
            &ready(),
            &model,
        );
        assert!(fired);
        assert!(state.done());
        assert!(state.terminated_by_collision());
    }

    #[test]
    fn end_effector_inside_leaves_state_unchanged() {
        let mut state = TerminationState::default();
        let model = HandAt(Point3::new(0.50, 0.0, 0.6));
        let fired = check_terminate_virtual_wall_collisions(
            &mut state,
            &SafetyEnvelope::default(),
            &ready(),
            &model,
        );
        assert!(!fired);
        assert_eq!(state, TerminationState::default());
    }

    #[test]
    fn point_on_wall_is_a_collision() {
        let mut state = TerminationState::default();
        let model = PinnedAt(Point3::new(0.3, 0.0, 1.25));
        assert!(check_terminate_virtual_wall_collisions(
            &mut state,
            &SafetyEnvelope::default(),
            &ready(),
            &model,
        ));
    }

    #[test]
    fn margin_applies_to_its_own_operating_point() {
        // Hand 3 cm inside the front wall; a 5 cm margin on the hand trips it.
        let model = HandAt(Point3::new(0.72, 0.0, 0.6));
        let mut margins = [0.0; OPERATING_POINTS.len()];
        let strict = SafetyEnvelope::default();
        let mut state = TerminationState::default();
        assert!(!check_terminate_virtual_wall_collisions(
            &mut state, &strict, &ready(), &model
        ));

        margins[OPERATING_POINTS.len() - 1] = 0.05;
        let cautious = SafetyEnvelope::default().with_point_margins(margins).unwrap();
        assert!(check_terminate_virtual_wall_collisions(
            &mut state, &cautious, &ready(), &model
        ));
    }

    #[test]
    fn corrupted_kinematics_fails_safe() {
        let mut state = TerminationState::default();
        let model = PinnedAt(Point3::new(f64::NAN, 0.0, 0.5));
        assert!(check_terminate_virtual_wall_collisions(
            &mut state,
            &SafetyEnvelope::default(),
            &ready(),
            &model,
        ));
    }

    #[test]
    fn franka_ready_pose_is_inside_default_box() {
        let mut state = TerminationState::default();
        assert!(!check_terminate_virtual_wall_collisions(
            &mut state,
            &SafetyEnvelope::default(),
            &ready(),
            &FrankaModel::panda(),
        ));
    }

    #[test]
    fn franka_below_table_is_a_collision() {
        // Lower the table plane to 0.5 m: the ready-pose hand sits at ~0.487 m.
        let mut spec = crate::geometry::WorkspaceSpec::default();
        spec.bottom.point = [0.0, 0.0, 0.5];
        let envelope = SafetyEnvelope::new(spec.build().unwrap());
        let mut state = TerminationState::default();
        assert!(check_terminate_virtual_wall_collisions(
            &mut state,
            &envelope,
            &ready(),
            &FrankaModel::panda(),
        ));
        assert!(state.terminated_by_collision());
    }

    #[test]
    fn tight_box_is_checked_against_every_operating_point() {
        // Box whose top sits between the hand (~0.49 m) and joint 4 (~0.61 m).
        let mut spec = crate::geometry::WorkspaceSpec::default();
        spec.top.point = [0.0, 0.0, 0.55];
        let envelope = SafetyEnvelope::new(spec.build().unwrap());
        let mut state = TerminationState::default();
        assert!(check_terminate_virtual_wall_collisions(
            &mut state,
            &envelope,
            &ready(),
            &FrankaModel::panda(),
        ));
        assert_ne!(envelope.workspace(), &Workspace::franka_default());
    }

    // ------------------------------------------------------------------ joint limits

    #[test]
    fn joint_inside_limits_does_not_fire() {
        let mut state = TerminationState::default();
        let mut q = READY_POSE;
        q[3] = -1.0;
        assert!(!check_terminate_joint_limits(
            &mut state,
            &JointLimits::panda(),
            &RobotState::at_rest(q)
        ));
        assert!(!state.done());
    }

    #[test]
    fn joint_past_limit_fires_without_collision_flag() {
        let mut state = TerminationState::default();
        let mut q = READY_POSE;
        q[3] = -3.10;
        assert!(check_terminate_joint_limits(
            &mut state,
            &JointLimits::panda(),
            &RobotState::at_rest(q)
        ));
        assert!(state.done());
        assert!(!state.terminated_by_collision());
        assert!(state.causes().contains(TerminationCause::JointLimit));
    }

    // ------------------------------------------------------------------ composition

    #[test]
    fn checks_never_reset_done() {
        let flag = PreemptFlag::new();
        let mut state = TerminationState::new(10.0);
        flag.request();
        check_terminate_preempt(&mut state, &flag);
        flag.clear();

        let clock = Clock {
            time: 0.0,
            run_time: 1.0,
        };
        for _ in 0..3 {
            check_terminate_preempt(&mut state, &flag);
            check_terminate_time(&mut state, &clock);
            check_terminate_joint_limits(&mut state, &JointLimits::panda(), &ready());
            check_terminate_virtual_wall_collisions(
                &mut state,
                &SafetyEnvelope::default(),
                &ready(),
                &FrankaModel::panda(),
            );
            assert!(state.done());
        }
        assert_eq!(state.causes().len(), 1);
    }
}
