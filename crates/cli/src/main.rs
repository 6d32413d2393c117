mod args;
mod render;
mod settings;
mod telemetry;

use anyhow::Context;
use args::{Cli, Command, SolveOverrides};
use clap::Parser;
use sched_core::demo::demo_envelope;
use sched_core::{audit, validate, Solver};
use settings::EnvSettings;
use solver_heur::HeurSolver;
use std::path::Path;
use std::process::ExitCode;
use telemetry::LogFormat;
use types::{SolveEnvelope, SolveResult};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let env = EnvSettings::from_env()?;

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        env.log_format.unwrap_or_default()
    };
    telemetry::init(format);

    match cli.command {
        Command::Solve {
            input,
            seed,
            attempts,
            no_backtracking,
            node_limit,
            json,
        } => {
            let mut envelope = match &input {
                Some(path) => read_json::<SolveEnvelope>(path)?,
                None => demo_envelope(),
            };
            let flags = SolveOverrides {
                seed,
                attempts,
                no_backtracking,
                node_limit,
            };
            settings::apply(&mut envelope.params, &env, &flags);
            let instance = envelope.instance.clone();

            let result = HeurSolver::new()
                .solve(envelope)
                .context("solve failed")?;
            tracing::info!(
                status = ?result.status,
                unresolved = result.unresolved.len(),
                "solve finished"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&instance, &result);
            }
            Ok(exit_for(result.is_success()))
        }
        Command::Check { result, input } => {
            let envelope = read_json::<SolveEnvelope>(&input)?;
            let saved = read_json::<SolveResult>(&result)?;
            validate(&envelope.instance)?;

            let report = audit(&envelope.instance, &saved.timetables);
            if report != saved.report {
                tracing::warn!("stored report differs from a fresh validation");
            }
            println!("{}", render::render_report(&report));
            Ok(exit_for(report.is_valid()))
        }
        Command::Demo => {
            println!("{}", serde_json::to_string_pretty(&demo_envelope())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Schema => {
            let schema = schemars::schema_for!(SolveEnvelope);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn exit_for(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_result(instance: &types::Instance, result: &SolveResult) {
    println!(
        "status: {:?}  method: {}  unresolved: {}",
        result.status,
        result.stats["method"].as_str().unwrap_or("?"),
        result.unresolved.len()
    );
    for tt in &result.timetables {
        println!();
        println!("{}", render::render_timetable(tt));
    }
    println!();
    println!("{}", render::render_teachers(instance, &result.timetables));
    println!();
    println!("{}", render::render_report(&result.report));
}
