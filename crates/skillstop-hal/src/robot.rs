//! [`Robot`] – a connected arm as the termination engine sees it.
//!
//! The driver layer owns the connection. Once it is established it hands the
//! engine a `&dyn Robot` at bind time; the engine only queries the variant,
//! the kinematic model and the latest state.

use serde::{Deserialize, Serialize};
use skillstop_types::RobotState;

use crate::kinematics::KinematicsModel;

/// Supported hardware variants. Each carries its own joint-limit preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotVariant {
    /// Franka Emika Panda.
    #[default]
    Panda,
    /// Franka Research 3.
    Fr3,
}

impl std::fmt::Display for RobotVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RobotVariant::Panda => write!(f, "panda"),
            RobotVariant::Fr3 => write!(f, "fr3"),
        }
    }
}

impl std::str::FromStr for RobotVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panda" => Ok(RobotVariant::Panda),
            "fr3" => Ok(RobotVariant::Fr3),
            other => Err(format!("unknown robot variant '{other}'")),
        }
    }
}

/// A robot whose connection has already been established by a driver.
pub trait Robot {
    /// Stable identifier, e.g. the controller hostname.
    fn id(&self) -> &str;

    fn variant(&self) -> RobotVariant;

    /// `false` once the driver has lost the connection.
    fn is_connected(&self) -> bool;

    /// The kinematic model, if the driver loaded one.
    fn model(&self) -> Option<&dyn KinematicsModel>;

    /// Most recent state snapshot.
    fn read_state(&self) -> RobotState;
}
