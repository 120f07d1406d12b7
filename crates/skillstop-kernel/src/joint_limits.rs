//! Per-joint position bounds for a given hardware variant.
//!
//! Bounds are inclusive on the violation side: a joint sitting exactly on
//! `min` or `max` already counts as out of range, as does any non-finite
//! reading. Margins, if wanted, belong in the bound values themselves.

use serde::{Deserialize, Serialize};
use skillstop_hal::RobotVariant;
use skillstop_types::{JointArray, NUM_JOINTS, SkillError};

/// Franka Emika Panda, from the published control parameters.
const PANDA_MAX: JointArray = [2.88, 1.75, 2.88, -0.06, 2.88, 3.74, 2.88];
const PANDA_MIN: JointArray = [-2.88, -1.75, -2.88, -3.06, -2.88, -0.0025, -2.88];

/// Franka Research 3, from the published control parameters.
const FR3_MAX: JointArray = [2.73, 1.77, 2.88, -0.14, 2.79, 4.5, 3.0];
const FR3_MIN: JointArray = [-2.73, -1.77, -2.88, -3.03, -2.79, 0.53, -3.0];

/// Minimum and maximum angle (rad) for each of the seven joints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointLimits {
    min: JointArray,
    max: JointArray,
}

impl JointLimits {
    /// # Errors
    ///
    /// [`SkillError::InvalidJointLimits`] if any bound is non-finite or a
    /// joint's `min` is not strictly below its `max`.
    pub fn new(min: JointArray, max: JointArray) -> Result<Self, SkillError> {
        let limits = Self { min, max };
        limits.validate()?;
        Ok(limits)
    }

    /// Limits for a built-in hardware variant.
    pub fn for_variant(variant: RobotVariant) -> Self {
        match variant {
            RobotVariant::Panda => Self::panda(),
            RobotVariant::Fr3 => Self::fr3(),
        }
    }

    pub fn panda() -> Self {
        Self {
            min: PANDA_MIN,
            max: PANDA_MAX,
        }
    }

    pub fn fr3() -> Self {
        Self {
            min: FR3_MIN,
            max: FR3_MAX,
        }
    }

    /// Re-check invariants, e.g. after deserialising.
    pub fn validate(&self) -> Result<(), SkillError> {
        for i in 0..NUM_JOINTS {
            let (lo, hi) = (self.min[i], self.max[i]);
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SkillError::InvalidJointLimits(format!(
                    "joint {} has non-finite bounds [{lo}, {hi}]",
                    i + 1
                )));
            }
            if lo >= hi {
                return Err(SkillError::InvalidJointLimits(format!(
                    "joint {} has min {lo} >= max {hi}",
                    i + 1
                )));
            }
        }
        Ok(())
    }

    pub fn min(&self) -> &JointArray {
        &self.min
    }

    pub fn max(&self) -> &JointArray {
        &self.max
    }

    /// `true` when joint `index` (0-based) is at or beyond a bound.
    pub fn is_violated(&self, index: usize, angle: f64) -> bool {
        !(angle > self.min[index] && angle < self.max[index])
    }

    /// Index of the first joint in `q` that is at or beyond a bound.
    pub fn first_violation(&self, q: &JointArray) -> Option<usize> {
        (0..NUM_JOINTS).find(|&i| self.is_violated(i, q[i]))
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::panda()
    }
}
