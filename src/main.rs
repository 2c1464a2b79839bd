use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wasmexec::config::Config;
use wasmexec::{FsBridge, JsFunction, Module, OsFs, Value};

/// Drive the guest-facing filesystem calls against a host directory.
#[derive(Debug, Parser)]
#[command(name = "wasmexec", version)]
struct Cli {
    /// Host directory exposed as the guest's `/`
    #[arg(long, env = "WASMEXEC_ROOT")]
    root: Option<PathBuf>,

    /// Reject calls that modify the filesystem
    #[arg(long)]
    read_only: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the stat object for a path
    Stat { path: String },
    /// Print the stat object for a path without following a final symlink
    Lstat { path: String },
    /// Change a path's permission bits (octal)
    Chmod {
        path: String,
        #[arg(value_parser = parse_octal)]
        mode: u32,
    },
    /// List directory entries
    Ls { path: String },
}

fn parse_octal(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s.trim_start_matches("0o"), 8).map_err(|e| format!("invalid mode {}: {}", s, e))
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log.filter.as_str().into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("loading configuration")?;
    if let Some(root) = cli.root {
        config.fs.root = Some(root);
    }
    config.fs.read_only |= cli.read_only;
    config.log.json |= cli.json_logs;

    init_tracing(&config);

    let root = config.fs.root.clone().context("no host root configured (--root or WASMEXEC_FS__ROOT)")?;
    let host = OsFs::new(&root).read_only(config.fs.read_only);
    tracing::info!(root = %root.display(), read_only = config.fs.read_only, "exposing host directory");

    let bridge = FsBridge::new(Module::default(), Some(Arc::new(host)));
    let (name, mut args) = match cli.command {
        Command::Stat { path } => ("stat", vec![Value::from(path)]),
        Command::Lstat { path } => ("lstat", vec![Value::from(path)]),
        Command::Chmod { path, mode } => ("chmod", vec![Value::from(path), Value::from(mode)]),
        Command::Ls { path } => ("readdir", vec![Value::from(path)]),
    };

    let (tx, rx) = mpsc::channel();
    args.push(Value::from(JsFunction::new(move |result| {
        let _ = tx.send(result.to_vec());
        Value::Undefined
    })));

    let function = bridge.function(name).context("unknown fs function")?;
    function.call(&args);

    let result = rx.try_recv().context("call was rejected without a callback")?;
    let json = Value::Array(result).to_json();
    println!("{}", serde_json::to_string_pretty(&json)?);

    Ok(())
}
