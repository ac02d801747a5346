//! Switch Manager CLI - blueprint-driven smart switch configurations.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces,
//! plus a JSON-lines session speaking the command protocol.
#![forbid(unsafe_code)]

use std::io::{self, Read};

use anyhow::{Context, bail};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use swm::cli::{Cli, Commands};
use swm::command::{self, Request};
use swm::config::{SaveConfig, Settings};
use swm::error::SwmError;
use swm::logging::init_logging;
use swm::manager::SwitchManager;
use swm::output::{Output, OutputMode};
use swm::platform::{LogPlatform, PlatformEvent};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> Option<&'static str> {
        option_env!("VERGEN_GIT_SHA")
    }

    pub fn build_timestamp() -> Option<&'static str> {
        option_env!("VERGEN_BUILD_TIMESTAMP")
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let output = OutputMode::from_cli(&cli).into_output();

    if let Err(e) = run(&cli, output.as_ref()).await {
        output_error(output.as_ref(), &e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, output: &dyn Output) -> anyhow::Result<()> {
    let request = match &cli.command {
        None => {
            print_quick_start(cli);
            return Ok(());
        }
        Some(Commands::Version) => {
            output.version_info(
                build_info::VERSION,
                build_info::git_sha(),
                build_info::build_timestamp(),
            );
            return Ok(());
        }
        Some(Commands::Completions(args)) => {
            use clap::CommandFactory;
            clap_complete::generate(args.shell, &mut Cli::command(), "swm", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Settings) => {
            output.settings(&Settings::load(&cli.overrides())?);
            return Ok(());
        }
        Some(Commands::Migrate) => return cmd_migrate(cli, output).await,
        Some(Commands::Session) => return cmd_session(cli).await,

        Some(Commands::Reload) => Request::ReloadBlueprints,
        Some(Commands::Blueprints(args)) => Request::ListBlueprints {
            blueprint_id: args.id.clone(),
        },
        Some(Commands::Configs(args)) => Request::ListConfigs {
            config_id: args.id.clone(),
        },
        Some(Commands::Save(args)) => Request::SaveConfig(read_save_document(&args.file)?),
        Some(Commands::Enable(args)) => Request::SetEnabled {
            config_id: args.id.clone(),
            enabled: true,
        },
        Some(Commands::Disable(args)) => Request::SetEnabled {
            config_id: args.id.clone(),
            enabled: false,
        },
        Some(Commands::Delete(args)) => Request::DeleteConfig {
            config_id: args.id.clone(),
        },
        Some(Commands::Fire(args)) => {
            let data: Value = serde_json::from_str(&args.data).context("event data is not valid JSON")?;
            let Value::Object(data) = data else {
                bail!(SwmError::InvalidRequest("event data must be a JSON object".into()));
            };
            Request::FireEvent(PlatformEvent::new(args.event_type.clone(), data))
        }
    };

    let mut manager = start_manager(cli).await?;
    let kind = request.kind();
    let result = command::execute(&mut manager, request).await;
    manager.shutdown();

    output.response(kind, &result?);
    Ok(())
}

async fn start_manager(cli: &Cli) -> anyhow::Result<SwitchManager<LogPlatform>> {
    let settings = Settings::load(&cli.overrides())?;
    let manager = SwitchManager::start(settings, LogPlatform::new()).await?;
    Ok(manager)
}

/// Reads a save-config document (JSON or YAML) from a file or stdin.
fn read_save_document(path: &std::path::Path) -> anyhow::Result<SaveConfig> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read config from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };

    let document: Value = serde_yaml::from_str(&text).context("config is not valid JSON or YAML")?;
    Ok(SaveConfig::from_document(&document)?)
}

// === Commands ===

async fn cmd_migrate(cli: &Cli, output: &dyn Output) -> anyhow::Result<()> {
    let mut manager = start_manager(cli).await?;
    if let Some(outcome) = manager.last_migration() {
        output.migration(outcome, manager.stored_version());
    }
    manager.shutdown();
    Ok(())
}

/// JSON-lines request loop: one request per stdin line, one response per
/// stdout line. Ends on EOF or Ctrl-C.
async fn cmd_session(cli: &Cli) -> anyhow::Result<()> {
    let mut manager = start_manager(cli).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    info!("Session started");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read request")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(message) => command::dispatch(&mut manager, &message).await,
            Err(e) => {
                debug!(error = %e, "Unparseable request line");
                command::failure(
                    Value::Null,
                    &SwmError::InvalidRequest(format!("invalid JSON: {e}")),
                )
            }
        };

        stdout.write_all(response.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    manager.shutdown();
    info!("Session ended");
    Ok(())
}

// === Quick Start ===

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    commands: &'static [(&'static str, &'static str)],
    protocol: &'static [&'static str],
    output_modes: OutputModes,
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

const QUICK_START: &[(&str, &str)] = &[
    ("swm migrate", "Install or refresh bundled blueprints"),
    ("swm blueprints [ID]", "List blueprints"),
    ("swm configs [ID]", "List switches"),
    ("swm save kitchen.yaml", "Create or update a switch"),
    ("swm disable 1", "Disable switch 1"),
    ("swm delete 1", "Delete switch 1"),
    ("swm fire zha_event '{\"device_ieee\": \"sw1\"}'", "Simulate an event"),
    ("swm session", "JSON-lines protocol on stdin/stdout"),
];

fn print_quick_start(cli: &Cli) {
    if cli.use_json() {
        let help = RobotQuickStart {
            tool: "swm",
            version: build_info::VERSION,
            description: "Blueprint-driven smart switch configuration manager",
            commands: QUICK_START,
            protocol: &command::REQUEST_TYPES,
            output_modes: OutputModes {
                human: "--format=text (default)",
                robot: "--robot or --format=json",
                compact: "--format=json-compact",
            },
        };
        match serde_json::to_string_pretty(&help) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{e}"),
        }
        return;
    }

    let bold = console::Style::new().bold();
    println!(
        "{} {} - Switch Manager\n",
        console::style("swm").bold().cyan(),
        build_info::VERSION
    );
    println!("{}\n", bold.apply_to("QUICK START"));
    for (cmd, what) in QUICK_START {
        println!("  {:<52} {what}", console::style(cmd).green());
    }
    println!();
    println!("Run {} for full help", console::style("swm --help").yellow());
}

// === Error Output ===

fn output_error(output: &dyn Output, error: &anyhow::Error) {
    if let Some(e) = error.downcast_ref::<SwmError>() {
        output.error(e);
    } else {
        output.error(&SwmError::Other(format!("{error:#}")));
    }
}
