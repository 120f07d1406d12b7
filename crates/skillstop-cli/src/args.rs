//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use skillstop_types::{JointArray, NUM_JOINTS};

/// Run one simulated skill from the ready pose and print its termination
/// report.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "skillstop", version, about)]
pub struct SimArgs {
    /// Guard configuration (default: $SKILLSTOP_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Goal joint positions in rad as Q1,...,Q7 (default: ready pose)
    #[arg(long, value_name = "Q1,...,Q7", allow_hyphen_values = true, value_parser = parse_joints)]
    pub goal: Option<JointArray>,

    /// Planned motion duration in seconds
    #[arg(long, default_value_t = 2.0)]
    pub run_time: f64,
}

fn parse_joints(raw: &str) -> Result<JointArray, String> {
    let values = raw
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("not a number: {v}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected {NUM_JOINTS} values, got {}", v.len()))
}
