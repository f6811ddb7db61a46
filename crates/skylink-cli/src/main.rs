mod commands;

use clap::{Parser, Subcommand};
use commands::update::UpdateTarget;
use commands::{exit_code_for, load_provider_config, mock_registry};
use skylink_schema::LinkUpdateIntent;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "skylink",
    version,
    about = "Stage and apply changes for links between cloud resources"
)]
struct Cli {
    /// Provider config file (defaults to ./skylink.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List registered link types.
    Links,
    /// Stage changes for a link from a JSON stage input, without touching the cloud.
    Stage {
        /// Link type, e.g. "aws/lambda/function::aws/iam/role".
        link_type: String,
        /// Path to the stage input JSON file.
        input: PathBuf,
    },
    /// Run a link update hook against the in-memory mock cloud.
    Update {
        /// Link type, e.g. "aws/lambda/function::aws/iam/role".
        link_type: String,
        /// Path to the update input JSON file.
        input: PathBuf,
        /// Hook to run.
        #[arg(long, value_enum)]
        target: UpdateTarget,
        /// Override the intent in the input file (create, update, destroy).
        #[arg(long)]
        intent: Option<LinkUpdateIntent>,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SKYLINK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;
    let result = load_provider_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Links => {
            mock_registry(config).and_then(|(registry, _)| commands::links::run(&registry, json_output))
        }
        Commands::Stage { link_type, input } => mock_registry(config).and_then(|(registry, _)| {
            commands::stage::run(&registry, &link_type, &input, json_output)
        }),
        Commands::Update {
            link_type,
            input,
            target,
            intent,
        } => commands::update::run(config, &link_type, &input, target, intent, json_output),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(exit_code_for(&msg))
        }
    }
}
