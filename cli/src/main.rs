//! `ragent` binary: run one ReAct turn (or an interactive session) and stream its events.
//!
//! Configuration comes from the process env, a project `.env`, and
//! `~/.config/ragent/config.toml` (see the `config` crate); flags override it.

mod log_format;
mod logging;
mod repl;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cli::{OutputMode, RunOptions, Session};
use ragent::AgentSettings;

#[derive(Parser, Debug)]
#[command(name = "ragent")]
#[command(about = "ragent: streaming ReAct agent with tools, from the command line")]
struct Args {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// User message (or pass as positional arguments)
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Positional args: user message when -m/--message is not used
    #[arg(trailing_var_arg = true)]
    rest: Vec<String>,

    /// Thread ID for conversation continuity within this process
    #[arg(long, value_name = "ID")]
    thread_id: Option<String>,

    /// Use the scripted offline model instead of the configured provider
    #[arg(long)]
    mock: bool,

    /// Print every event as a JSON line (wire format) instead of text
    #[arg(long)]
    json: bool,

    /// With --json, pretty-print each event
    #[arg(long)]
    pretty: bool,

    /// Interactive: keep reading messages from stdin on the same thread
    #[arg(short, long)]
    interactive: bool,

    /// Verbose logging (ragent=debug) unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Agent-step cap per turn (overrides RAGENT_MAX_ITERATIONS)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    max_iterations: Option<u32>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List or show the tools the agent can call
    Tool(ToolArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct ToolArgs {
    #[command(subcommand)]
    sub: ToolCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum ToolCommand {
    /// List tool names and descriptions
    List,
    /// Show one tool's full definition (JSON)
    Show { name: String },
}

fn write_json(value: &serde_json::Value, pretty: bool) -> Result<(), serde_json::Error> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", s);
    Ok(())
}

fn run_tool_command(
    session: &Session,
    cmd: &ToolCommand,
    json: bool,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let specs = session.tool_specs();
    match cmd {
        ToolCommand::List if json => {
            let list: Vec<_> = specs
                .iter()
                .map(|s| serde_json::json!({ "name": s.name, "description": s.description }))
                .collect();
            write_json(&serde_json::Value::Array(list), pretty)?;
        }
        ToolCommand::List => {
            for s in &specs {
                println!("{}\t{}", s.name, s.description.as_deref().unwrap_or(""));
            }
        }
        ToolCommand::Show { name } => {
            let spec = specs
                .iter()
                .find(|s| &s.name == name)
                .ok_or_else(|| format!("tool not found: {}", name))?;
            let value = serde_json::json!({
                "name": spec.name,
                "description": spec.description,
                "input_schema": spec.input_schema,
            });
            write_json(&value, true)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _log_guard = logging::init(args.verbose, args.log_file.as_deref())?;

    let layers = match config::Layers::load("ragent", None) {
        Ok(layers) => layers,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable config files");
            config::Layers::default()
        }
    };
    let settings = AgentSettings::from_lookup(|key| layers.get(key))?;
    let session = Session::new(settings, args.mock);

    if let Some(Command::Tool(t)) = &args.cmd {
        if let Err(e) = run_tool_command(&session, &t.sub, args.json, args.pretty) {
            eprintln!("ragent: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let message = args
        .message
        .clone()
        .or_else(|| {
            if args.rest.is_empty() {
                None
            } else {
                Some(args.rest.join(" "))
            }
        })
        .filter(|m| !m.trim().is_empty());
    if !args.interactive && message.is_none() {
        eprintln!("ragent: provide a message via -m/--message or positional args, or use -i");
        std::process::exit(2);
    }

    let mut opts = RunOptions {
        mock: args.mock,
        output: if args.json {
            OutputMode::Json {
                pretty: args.pretty,
            }
        } else {
            OutputMode::Text
        },
        max_iterations: args.max_iterations.map(|n| n as usize),
        ..RunOptions::default()
    };
    if let Some(id) = args.thread_id.clone() {
        opts.thread_id = id;
    }

    if let Some(msg) = message {
        let mut out = std::io::stdout();
        let mut diag = std::io::stderr();
        if let Err(e) = session.run_turn(&msg, &opts, &mut out, &mut diag).await {
            eprintln!("ragent: {}", e);
            if !args.interactive {
                std::process::exit(1);
            }
        }
    }
    if args.interactive {
        repl::run_repl_loop(&session, &opts).await?;
    }
    Ok(())
}
