//! Guard configuration – reads a TOML file describing the robot, its
//! safety envelope and the termination policy.
//!
//! ```toml
//! robot = "fr3"
//! control_rate_hz = 1000.0
//! point_margins = [0.0, 0.0, 0.0, 0.0, 0.0, 0.02, 0.05]
//!
//! [workspace.top]
//! normal = [0.0, 0.0, 1.0]
//! point = [0.0, 0.0, 1.0]
//!
//! [policy]
//! kind = "final_joint"
//! parameters = { buffer_time = 0.5, joint_tolerance = 0.01 }
//! ```
//!
//! Every key is optional. Walls left out keep the lab defaults; joint limits
//! left out come from the robot variant when the handler is bound.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use skillstop_hal::{FrankaModel, RobotVariant};
use skillstop_kernel::{
    HandlerContext, JointLimits, OPERATING_POINTS, PointMargins, PolicyKind, SafetyEnvelope,
    WorkspaceSpec,
};
use skillstop_types::SkillError;
use tracing::{debug, warn};

/// Policy selection plus its parameter table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    #[serde(default)]
    pub kind: PolicyKind,
    /// Forwarded to the handler as a JSON object.
    #[serde(default)]
    pub parameters: toml::Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    #[serde(default)]
    pub robot: RobotVariant,

    #[serde(default = "default_control_rate")]
    pub control_rate_hz: f64,

    /// Flange-to-tool-centre distance (m). The standard hand when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_offset: Option<f64>,

    /// Extra wall clearance per operating point, joint 3 to end effector.
    #[serde(default = "default_point_margins")]
    pub point_margins: PointMargins,

    #[serde(default)]
    pub workspace: WorkspaceSpec,

    /// Pins the limit table instead of using the variant preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint_limits: Option<JointLimits>,

    #[serde(default)]
    pub policy: PolicyConfig,
}

fn default_control_rate() -> f64 {
    1000.0
}

fn default_point_margins() -> PointMargins {
    [0.0; OPERATING_POINTS.len()]
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            robot: RobotVariant::default(),
            control_rate_hz: default_control_rate(),
            tool_offset: None,
            point_margins: default_point_margins(),
            workspace: WorkspaceSpec::default(),
            joint_limits: None,
            policy: PolicyConfig::default(),
        }
    }
}

impl GuardConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, SkillError> {
        toml::from_str(raw).map_err(|e| {
            warn!(error = %e, "failed to parse guard configuration");
            SkillError::Config(format!("Failed to parse config: {e}"))
        })
    }

    /// Load the config from `path` and apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, SkillError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            SkillError::Config(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut cfg = Self::from_toml_str(&raw)?;
        cfg.apply_env_overrides()?;
        debug!(path = %path.display(), robot = %cfg.robot, "guard configuration loaded");
        Ok(cfg)
    }

    /// Load from `SKILLSTOP_CONFIG` if set, otherwise start from defaults.
    /// Environment overrides apply either way.
    pub fn load() -> Result<Self, SkillError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut cfg = Self::default();
                cfg.apply_env_overrides()?;
                Ok(cfg)
            }
        }
    }

    /// Apply `SKILLSTOP_*` environment variable overrides.
    ///
    /// | Variable | Config field |
    /// |---|---|
    /// | `SKILLSTOP_ROBOT` | `robot` |
    pub fn apply_env_overrides(&mut self) -> Result<(), SkillError> {
        if let Ok(v) = std::env::var("SKILLSTOP_ROBOT") {
            self.override_robot(&v)?;
        }
        Ok(())
    }

    fn override_robot(&mut self, value: &str) -> Result<(), SkillError> {
        self.robot = value
            .parse()
            .map_err(|e: String| SkillError::Config(format!("SKILLSTOP_ROBOT: {e}")))?;
        Ok(())
    }

    /// Check every value and assemble the [`SafetyEnvelope`].
    pub fn envelope(&self) -> Result<SafetyEnvelope, SkillError> {
        let workspace = self.workspace.build()?;
        let mut envelope = SafetyEnvelope::new(workspace).with_point_margins(self.point_margins)?;
        if let Some(limits) = self.joint_limits {
            limits.validate()?;
            envelope = envelope.with_joint_limits(limits);
        }
        Ok(envelope)
    }

    /// Validate the whole configuration without building anything else.
    pub fn validate(&self) -> Result<(), SkillError> {
        self.control_period()?;
        self.kinematics()?;
        self.envelope()?;
        Ok(())
    }

    /// Seconds per control cycle.
    pub fn control_period(&self) -> Result<f64, SkillError> {
        if !(self.control_rate_hz.is_finite() && self.control_rate_hz > 0.0) {
            return Err(SkillError::Config(format!(
                "control_rate_hz must be finite and positive, got {}",
                self.control_rate_hz
            )));
        }
        Ok(1.0 / self.control_rate_hz)
    }

    /// Forward kinematics for the configured variant and tool.
    pub fn kinematics(&self) -> Result<FrankaModel, SkillError> {
        let model = match self.robot {
            RobotVariant::Panda => FrankaModel::panda(),
            RobotVariant::Fr3 => FrankaModel::fr3(),
        };
        match self.tool_offset {
            None => Ok(model),
            Some(offset) if offset.is_finite() => Ok(model.with_tool_offset(offset)),
            Some(offset) => Err(SkillError::Config(format!(
                "tool_offset must be finite, got {offset}"
            ))),
        }
    }

    /// The policy parameter table encoded as the handler's JSON buffer.
    pub fn policy_parameters(&self) -> Result<Vec<u8>, SkillError> {
        serde_json::to_vec(&self.policy.parameters)
            .map_err(|e| SkillError::Config(format!("Failed to encode policy parameters: {e}")))
    }

    /// Fill `ctx` with this configuration's envelope.
    pub fn handler_context(&self, ctx: HandlerContext) -> Result<HandlerContext, SkillError> {
        Ok(ctx.with_envelope(self.envelope()?))
    }
}

/// Path named by `SKILLSTOP_CONFIG`, if set.
pub fn config_path() -> Option<PathBuf> {
    std::env::var_os("SKILLSTOP_CONFIG").map(PathBuf::from)
}
