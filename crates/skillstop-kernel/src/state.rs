//! [`TerminationState`] – the sticky decision shared by every check.
//!
//! The state machine has two states, `Running` and `Terminated`. The only
//! way in is [`TerminationState::terminate`]; there is no way out. Causes
//! accumulate alongside the decision so reports can name every check that
//! fired, but they never influence the two-state shape.

use skillstop_types::{CauseSet, TerminationCause};

/// Coarse phase of a skill as seen by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Terminated,
}

/// Sticky flags plus elapsed-time tolerance for one skill execution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TerminationState {
    done: bool,
    terminated_by_collision: bool,
    buffer_time: f64,
    causes: CauseSet,
}

impl TerminationState {
    pub fn new(buffer_time: f64) -> Self {
        Self {
            buffer_time,
            ..Self::default()
        }
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn terminated_by_collision(&self) -> bool {
        self.terminated_by_collision
    }

    pub fn phase(&self) -> Phase {
        if self.done {
            Phase::Terminated
        } else {
            Phase::Running
        }
    }

    /// Extra time (s) tolerated past the planned duration.
    pub fn buffer_time(&self) -> f64 {
        self.buffer_time
    }

    pub fn set_buffer_time(&mut self, buffer_time: f64) {
        self.buffer_time = buffer_time;
    }

    /// Every cause recorded so far.
    pub fn causes(&self) -> CauseSet {
        self.causes
    }

    /// Latch `done` and record `cause`. Collisions also latch
    /// `terminated_by_collision`.
    pub fn terminate(&mut self, cause: TerminationCause) {
        self.done = true;
        if cause == TerminationCause::VirtualWall {
            self.terminated_by_collision = true;
        }
        self.causes.insert(cause);
    }
}
