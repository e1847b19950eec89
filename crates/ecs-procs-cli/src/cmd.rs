use std::process::{Command, ExitCode};

use clap::Args;
use ecs_procs::{Controller, Options, Resolution};
use tracing::{info, warn};

use crate::error::{CliError, CliResult};

#[derive(Args)]
pub struct ResolveArgs {
    /// Print the resolution as JSON, including which limit it came from
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ExecArgs {
    /// Extra variables to set to the same value (e.g. RAYON_NUM_THREADS)
    #[arg(long = "also", value_name = "VAR")]
    pub also: Vec<String>,
    /// Command and arguments to run
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

pub fn run_detect(options: Options) -> ExitCode {
    match ecs_procs::discover(&options.metadata_uri_env) {
        Some(endpoints) => {
            println!("{}", endpoints.container);
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    }
}

pub fn run_resolve(options: Options, args: &ResolveArgs) -> CliResult<()> {
    let resolution = Controller::new(options).resolve()?;
    if args.json {
        println!("{}", serde_json::to_string(&resolution)?);
    } else {
        println!("{}", resolution.parallelism);
    }
    Ok(())
}

pub fn run_exec(options: Options, args: &ExecArgs) -> CliResult<ExitCode> {
    let Some((program, rest)) = args.command.split_first() else {
        return Ok(ExitCode::FAILURE);
    };

    let operator_set = std::env::var_os(&options.override_env).is_some();
    let resolved = if operator_set {
        info!(var = %options.override_env, "honoring operator override");
        None
    } else {
        match Controller::new(options.clone()).resolve() {
            Ok(resolution) => Some(resolution),
            Err(e) => {
                warn!(error = %e, "running with default parallelism");
                None
            }
        }
    };

    let mut command = Command::new(program);
    command.args(rest);
    for (var, value) in child_env(&options, &args.also, resolved.as_ref()) {
        command.env(var, value);
    }

    let status = command.status().map_err(|source| CliError::Spawn {
        program: program.clone(),
        source,
    })?;

    Ok(status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .map(ExitCode::from)
        .unwrap_or(ExitCode::FAILURE))
}

/// Variables to add to the child's environment.
fn child_env(
    options: &Options,
    also: &[String],
    resolved: Option<&Resolution>,
) -> Vec<(String, String)> {
    let Some(resolution) = resolved else {
        return Vec::new();
    };
    let value = resolution.parallelism.to_string();
    std::iter::once(&options.override_env)
        .chain(also)
        .map(|var| (var.clone(), value.clone()))
        .collect()
}
