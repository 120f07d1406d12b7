//! `skillstop-cli` – simulated skill runner
//!
//! Loads the guard configuration, binds the configured termination policy
//! to a simulated arm and runs one straight-line joint motion from the
//! ready pose. The termination report is printed as JSON on stdout.
//!
//! Ctrl-C raises the preemption flag, so the skill ends with cause
//! `preempt`.
//!
//! Exit status: `0` when the skill reached its goal, `2` when it was
//! terminated for any other reason, `1` on setup errors.

mod args;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tracing::warn;

use skillstop_hal::{READY_POSE, SimArm};
use skillstop_kernel::{Handler, HandlerContext, PreemptFlag, TerminationHandler};
use skillstop_middleware::SensorDataManager;
use skillstop_runtime::{GuardConfig, LinearJointTrajectory, SkillOutcome, SkillRunner};
use skillstop_types::SkillError;

use args::SimArgs;

fn main() -> ExitCode {
    skillstop_runtime::telemetry::init_tracing("skillstop");

    // Exit code 2 is reserved for a terminated skill.
    let args = match SimArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(&args) {
        Ok(outcome) => report(&outcome),
        Err(e) => {
            eprintln!("{}: {e}", "error".red());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &SimArgs) -> Result<SkillOutcome, SkillError> {
    let cfg = match &args.config {
        Some(path) => GuardConfig::load_from(path)?,
        None => GuardConfig::load()?,
    };
    cfg.validate()?;

    let preempt = PreemptFlag::new();
    let on_interrupt = preempt.clone();
    if let Err(e) = ctrlc::set_handler(move || on_interrupt.request()) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the skill cannot be preempted");
    }

    let channels = SensorDataManager::new();
    let ctx = cfg.handler_context(
        HandlerContext::new(preempt)
            .with_sensors(Arc::new(channels.clone()))
            .with_reports(Arc::new(channels.clone())),
    )?;

    let mut arm = SimArm::new(cfg.robot).with_model(cfg.kinematics()?);
    let mut handler = Handler::new(cfg.policy.kind, ctx);
    handler.parse_parameters(&cfg.policy_parameters()?)?;
    handler.initialize_handler(&arm)?;

    let goal = args.goal.unwrap_or(READY_POSE);
    let mut trajectory = LinearJointTrajectory::new(READY_POSE, goal, args.run_time)?;
    SkillRunner::from_config(&cfg)?.run(&mut handler, &mut arm, &mut trajectory)
}

fn report(outcome: &SkillOutcome) -> ExitCode {
    match serde_json::to_string_pretty(&outcome.report) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "failed to encode termination report"),
    }

    let causes = outcome.report.causes.to_string();
    if outcome.succeeded() {
        eprintln!("{} after {} cycles", "goal reached".green().bold(), outcome.cycles);
        ExitCode::SUCCESS
    } else if outcome.report.terminated {
        eprintln!(
            "{} after {} cycles ({causes})",
            "terminated".yellow().bold(),
            outcome.cycles
        );
        ExitCode::from(2)
    } else {
        eprintln!("{} after {} cycles", "still running".yellow(), outcome.cycles);
        ExitCode::from(2)
    }
}
