//! [`SafetyEnvelope`] – the immutable safety configuration a handler checks
//! against: the workspace box, per-operating-point clearance margins and,
//! optionally, an explicit joint-limit table.

use skillstop_hal::Frame;
use skillstop_types::SkillError;

use crate::geometry::Workspace;
use crate::joint_limits::JointLimits;

/// Frames whose origins are tested against the virtual walls.
///
/// `Joint1` and `Joint2` share a fixed origin at the shoulder and cannot
/// leave the workspace, so they are skipped.
pub const OPERATING_POINTS: [Frame; 7] = [
    Frame::Joint3,
    Frame::Joint4,
    Frame::Joint5,
    Frame::Joint6,
    Frame::Joint7,
    Frame::Flange,
    Frame::EndEffector,
];

/// Extra clearance (m) per entry of [`OPERATING_POINTS`].
pub type PointMargins = [f64; OPERATING_POINTS.len()];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyEnvelope {
    workspace: Workspace,
    point_margins: PointMargins,
    joint_limits: Option<JointLimits>,
}

impl SafetyEnvelope {
    /// Zero margins; joint limits come from the bound robot's variant.
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            point_margins: [0.0; OPERATING_POINTS.len()],
            joint_limits: None,
        }
    }

    /// # Errors
    ///
    /// [`SkillError::InvalidGeometry`] if any margin is non-finite.
    pub fn with_point_margins(mut self, margins: PointMargins) -> Result<Self, SkillError> {
        if let Some(bad) = margins.iter().find(|m| !m.is_finite()) {
            return Err(SkillError::InvalidGeometry(format!(
                "non-finite operating point margin {bad}"
            )));
        }
        self.point_margins = margins;
        Ok(self)
    }

    /// Pin the joint-limit table instead of taking the robot's preset.
    pub fn with_joint_limits(mut self, limits: JointLimits) -> Self {
        self.joint_limits = Some(limits);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn point_margins(&self) -> &PointMargins {
        &self.point_margins
    }

    pub fn joint_limits(&self) -> Option<&JointLimits> {
        self.joint_limits.as_ref()
    }
}

impl Default for SafetyEnvelope {
    fn default() -> Self {
        Self::new(Workspace::franka_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_pinned_limits() {
        let env = SafetyEnvelope::default();
        assert!(env.joint_limits().is_none());
        assert!(env.point_margins().iter().all(|m| *m == 0.0));
    }

    #[test]
    fn non_finite_margin_is_rejected() {
        let mut margins = [0.0; OPERATING_POINTS.len()];
        margins[6] = f64::INFINITY;
        let result = SafetyEnvelope::default().with_point_margins(margins);
        assert!(matches!(result, Err(SkillError::InvalidGeometry(_))));
    }

    #[test]
    fn pinned_limits_are_kept() {
        let env = SafetyEnvelope::default().with_joint_limits(JointLimits::fr3());
        assert_eq!(env.joint_limits(), Some(&JointLimits::fr3()));
    }
}
