//! Virtual walls: a convex workspace box built from six half-spaces.
//!
//! Each [`HalfSpace`] stores an **outward** unit normal `n`, the plane offset
//! `n · p0` for a point `p0` on the plane, and a distance threshold. The
//! signed distance of a point `p` is `n · p − n · p0`: negative inside,
//! positive once `p` has crossed the wall.
//!
//! A wall is violated when the signed distance is greater than **or equal
//! to** its threshold, so a point exactly on the threshold counts as outside.
//! A positive threshold lets points travel that far past the plane; a
//! negative one keeps them that far inside. Non-finite points always
//! violate.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::Point3;
//! use skillstop_kernel::geometry::{Wall, Workspace};
//!
//! let ws = Workspace::franka_default();
//! assert!(ws.contains(&Point3::new(0.5, 0.0, 0.6)));
//! assert_eq!(ws.first_violation(&Point3::new(0.8, 0.0, 0.6)), Some(Wall::Front));
//! ```

use nalgebra::{Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use skillstop_types::SkillError;

/// The six faces of the workspace box, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wall {
    Front,
    Left,
    Right,
    Bottom,
    Top,
    Back,
}

impl Wall {
    pub const ALL: [Wall; 6] = [
        Wall::Front,
        Wall::Left,
        Wall::Right,
        Wall::Bottom,
        Wall::Top,
        Wall::Back,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Wall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Wall::Front => "front",
            Wall::Left => "left",
            Wall::Right => "right",
            Wall::Bottom => "bottom",
            Wall::Top => "top",
            Wall::Back => "back",
        };
        f.write_str(name)
    }
}

/// One planar boundary of the allowed region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfSpace {
    normal: Unit<Vector3<f64>>,
    offset: f64,
    threshold: f64,
}

impl HalfSpace {
    /// Build a half-space from an outward `normal` (normalised here) and any
    /// `point` on its plane.
    ///
    /// # Errors
    ///
    /// [`SkillError::InvalidGeometry`] for a zero-length or non-finite normal,
    /// a non-finite point, or a non-finite threshold.
    pub fn new(normal: Vector3<f64>, point: Point3<f64>, threshold: f64) -> Result<Self, SkillError> {
        if !normal.iter().all(|c| c.is_finite()) || !point.coords.iter().all(|c| c.is_finite()) {
            return Err(SkillError::InvalidGeometry(format!(
                "non-finite wall data: normal {normal:?}, point {point:?}"
            )));
        }
        if !threshold.is_finite() {
            return Err(SkillError::InvalidGeometry(format!(
                "non-finite wall threshold {threshold}"
            )));
        }
        let normal = Unit::try_new(normal, 1e-9).ok_or_else(|| {
            SkillError::InvalidGeometry("wall normal has zero length".to_string())
        })?;
        Ok(Self {
            offset: normal.dot(&point.coords),
            normal,
            threshold,
        })
    }

    pub fn normal(&self) -> &Unit<Vector3<f64>> {
        &self.normal
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Signed distance from `p` to the plane along the outward normal.
    pub fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    /// `true` when `p` is at or beyond the threshold, or not finite.
    pub fn is_violated_by(&self, p: &Point3<f64>) -> bool {
        self.is_violated_with_margin(p, 0.0)
    }

    /// Like [`is_violated_by`][Self::is_violated_by], with the threshold
    /// pulled `margin` further inside for this particular point.
    pub fn is_violated_with_margin(&self, p: &Point3<f64>, margin: f64) -> bool {
        !(self.signed_distance(p) < self.threshold - margin)
    }
}

/// Serialisable description of one wall, as found in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WallSpec {
    /// Outward normal; need not be unit length.
    pub normal: [f64; 3],
    /// Any point on the plane.
    pub point: [f64; 3],
    #[serde(default)]
    pub threshold: f64,
}

impl WallSpec {
    pub const fn new(normal: [f64; 3], point: [f64; 3]) -> Self {
        Self {
            normal,
            point,
            threshold: 0.0,
        }
    }

    pub fn build(&self) -> Result<HalfSpace, SkillError> {
        HalfSpace::new(
            Vector3::from(self.normal),
            Point3::from(self.point),
            self.threshold,
        )
    }
}

/// Configuration-side description of the whole box. Missing walls take the
/// Franka lab defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceSpec {
    pub front: WallSpec,
    pub left: WallSpec,
    pub right: WallSpec,
    pub bottom: WallSpec,
    pub top: WallSpec,
    pub back: WallSpec,
}

impl Default for WorkspaceSpec {
    fn default() -> Self {
        Self {
            front: WallSpec::new([1.0, 0.0, 0.0], [0.75, 0.0, 0.0]),
            left: WallSpec::new([0.0, 1.0, 0.0], [0.0, 0.47, 0.0]),
            right: WallSpec::new([0.0, -1.0, 0.0], [0.0, -0.47, 0.0]),
            bottom: WallSpec::new([0.0, 0.0, -1.0], [0.0, 0.0, -0.015]),
            top: WallSpec::new([0.0, 0.0, 1.0], [0.0, 0.0, 1.25]),
            back: WallSpec::new([-1.0, 0.0, 0.0], [-0.46, 0.0, 0.0]),
        }
    }
}

impl WorkspaceSpec {
    /// Validate every wall and assemble the [`Workspace`].
    pub fn build(&self) -> Result<Workspace, SkillError> {
        Ok(Workspace::new([
            self.front.build()?,
            self.left.build()?,
            self.right.build()?,
            self.bottom.build()?,
            self.top.build()?,
            self.back.build()?,
        ]))
    }
}

/// The allowed region: the intersection of six half-spaces. Immutable once
/// built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Workspace {
    walls: [HalfSpace; 6],
}

impl Workspace {
    /// Walls are given in [`Wall::ALL`] order.
    pub fn new(walls: [HalfSpace; 6]) -> Self {
        Self { walls }
    }

    /// The box used in the Franka lab cell: x ∈ (−0.46, 0.75),
    /// y ∈ (−0.47, 0.47), z ∈ (−0.015, 1.25), zero thresholds.
    pub fn franka_default() -> Self {
        let spec = WorkspaceSpec::default();
        let wall = |s: WallSpec| {
            let normal = Unit::new_normalize(Vector3::from(s.normal));
            HalfSpace {
                offset: normal.dot(&Vector3::from(s.point)),
                normal,
                threshold: s.threshold,
            }
        };
        Self::new([
            wall(spec.front),
            wall(spec.left),
            wall(spec.right),
            wall(spec.bottom),
            wall(spec.top),
            wall(spec.back),
        ])
    }

    pub fn wall(&self, wall: Wall) -> &HalfSpace {
        &self.walls[wall.index()]
    }

    /// `true` when `p` violates no wall.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        self.walls.iter().all(|w| !w.is_violated_by(p))
    }

    /// The first wall, in [`Wall::ALL`] order, that `p` violates.
    pub fn first_violation(&self, p: &Point3<f64>) -> Option<Wall> {
        self.first_violation_with_margin(p, 0.0)
    }

    /// The first wall that `p` violates once every threshold is pulled
    /// `margin` inward.
    pub fn first_violation_with_margin(&self, p: &Point3<f64>, margin: f64) -> Option<Wall> {
        Wall::ALL
            .into_iter()
            .find(|wall| self.wall(*wall).is_violated_with_margin(p, margin))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::franka_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn front() -> HalfSpace {
        HalfSpace::new(Vector3::x(), Point3::new(0.75, 0.0, 0.0), 0.0).unwrap()
    }

    #[test]
    fn signed_distance_outside_front_wall() {
        let p = Point3::new(0.80, 0.0, 0.6);
        assert_abs_diff_eq!(front().signed_distance(&p), 0.05, epsilon = 1e-12);
        assert!(front().is_violated_by(&p));
    }

    #[test]
    fn signed_distance_inside_front_wall() {
        let p = Point3::new(0.50, 0.0, 0.6);
        assert_abs_diff_eq!(front().signed_distance(&p), -0.25, epsilon = 1e-12);
        assert!(!front().is_violated_by(&p));
    }

    #[test]
    fn point_on_threshold_is_a_violation() {
        assert!(front().is_violated_by(&Point3::new(0.75, 0.3, 0.2)));

        let widened = HalfSpace::new(Vector3::x(), Point3::new(0.75, 0.0, 0.0), 0.25).unwrap();
        assert!(widened.is_violated_by(&Point3::new(1.0, 0.0, 0.0)));
        assert!(!widened.is_violated_by(&Point3::new(0.9, 0.0, 0.0)));
    }

    #[test]
    fn negative_threshold_keeps_clearance() {
        let narrowed = HalfSpace::new(Vector3::x(), Point3::new(0.75, 0.0, 0.0), -0.05).unwrap();
        assert!(narrowed.is_violated_by(&Point3::new(0.72, 0.0, 0.0)));
        assert!(!narrowed.is_violated_by(&Point3::new(0.69, 0.0, 0.0)));
    }

    #[test]
    fn margin_tightens_a_single_point() {
        let p = Point3::new(0.72, 0.0, 0.0);
        assert!(!front().is_violated_by(&p));
        assert!(front().is_violated_with_margin(&p, 0.05));
        assert_eq!(
            Workspace::franka_default().first_violation_with_margin(&p, 0.05),
            Some(Wall::Front)
        );
    }

    #[test]
    fn normal_is_normalised() {
        let wall = HalfSpace::new(Vector3::new(0.0, 0.0, 5.0), Point3::new(0.0, 0.0, 1.0), 0.0)
            .unwrap();
        assert_abs_diff_eq!(wall.normal().norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            wall.signed_distance(&Point3::new(0.0, 0.0, 1.5)),
            0.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn zero_normal_is_rejected() {
        let result = HalfSpace::new(Vector3::zeros(), Point3::origin(), 0.0);
        assert!(matches!(result, Err(SkillError::InvalidGeometry(_))));
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let result = HalfSpace::new(Vector3::x(), Point3::origin(), f64::NAN);
        assert!(matches!(result, Err(SkillError::InvalidGeometry(_))));
    }

    #[test]
    fn non_finite_point_always_violates() {
        let p = Point3::new(f64::NAN, 0.0, 0.5);
        assert!(front().is_violated_by(&p));
        assert!(!Workspace::franka_default().contains(&p));
    }

    #[test]
    fn default_box_faces() {
        let ws = Workspace::franka_default();
        let cases = [
            (Point3::new(0.76, 0.0, 0.5), Wall::Front),
            (Point3::new(0.3, 0.48, 0.5), Wall::Left),
            (Point3::new(0.3, -0.48, 0.5), Wall::Right),
            (Point3::new(0.3, 0.0, -0.02), Wall::Bottom),
            (Point3::new(0.3, 0.0, 1.30), Wall::Top),
            (Point3::new(-0.47, 0.0, 0.5), Wall::Back),
        ];
        for (p, expected) in cases {
            assert_eq!(ws.first_violation(&p), Some(expected), "point {p:?}");
        }
        assert!(ws.contains(&Point3::new(0.3, 0.0, 0.5)));
    }

    #[test]
    fn default_spec_builds_same_box() {
        let built = WorkspaceSpec::default().build().unwrap();
        assert_eq!(built, Workspace::franka_default());
    }

    #[test]
    fn spec_reports_bad_wall() {
        let mut spec = WorkspaceSpec::default();
        spec.top.normal = [0.0, 0.0, 0.0];
        assert!(matches!(spec.build(), Err(SkillError::InvalidGeometry(_))));
    }
}
