mod cmd;
mod error;

use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ecs_procs::{Logger, METADATA_URI_ENV, OVERRIDE_ENV, Options};

#[derive(Parser)]
#[command(name = "ecs-procs", version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// Timeout for the whole metadata lookup, in seconds
    #[arg(long, global = true, default_value_t = 5.0, allow_negative_numbers = true)]
    timeout: f64,
    /// Variable holding the ECS metadata endpoint URI
    #[arg(long, global = true, default_value = METADATA_URI_ENV)]
    metadata_uri_env: String,
    /// Variable that pins the worker thread count
    #[arg(long, global = true, default_value = OVERRIDE_ENV)]
    override_env: String,
}

impl GlobalArgs {
    fn options(&self) -> Options {
        let timeout = Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::ZERO);
        let options = Options {
            logger: Logger::tracing(),
            ..Options::default()
        };
        options
            .with_timeout(timeout)
            .with_deadline(std::time::Instant::now() + timeout)
            .with_metadata_uri_env(&self.metadata_uri_env)
            .with_override_env(&self.override_env)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Exit 0 if an ECS metadata endpoint is configured, 1 otherwise
    Detect,
    /// Print the parallelism the ECS CPU limits allow
    Resolve(cmd::ResolveArgs),
    /// Run a command with the worker thread variable set from the CPU limits
    Exec(cmd::ExecArgs),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let options = cli.global.options();

    let result = match cli.command {
        Command::Detect => Ok(cmd::run_detect(options)),
        Command::Resolve(args) => cmd::run_resolve(options, &args).map(|()| ExitCode::SUCCESS),
        Command::Exec(args) => cmd::run_exec(options, &args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
