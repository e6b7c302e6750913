mod panels;

use anyhow::{bail, Context, Result};
use services::{load_with, registry_json, schema_summary};
use shared::settings::RegistryConfig;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
usage: dashboard-data [--json | --dump] [DATA_DIR]

  --json   print each dashboard panel as JSON records
  --dump   print every loaded dataset as JSON
  -h, --help";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Output {
    #[default]
    Text,
    PanelJson,
    Dump,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Run {
        data_dir: Option<PathBuf>,
        output: Output,
    },
}

fn parse_args(args: impl IntoIterator<Item = OsString>) -> Result<Command> {
    let mut data_dir = None;
    let mut output = Output::default();

    for arg in args {
        match arg.to_str() {
            Some("-h" | "--help") => return Ok(Command::Help),
            Some("--json") => output = Output::PanelJson,
            Some("--dump") => output = Output::Dump,
            Some(flag) if flag.starts_with('-') => bail!("unknown option `{}`\n\n{}", flag, USAGE),
            _ if data_dir.is_some() => bail!("more than one data directory given\n\n{}", USAGE),
            _ => data_dir = Some(PathBuf::from(&arg)),
        }
    }

    Ok(Command::Run { data_dir, output })
}

fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("DASHBOARD_CONFIG") {
        return Some(PathBuf::from(path));
    }
    directories::ProjectDirs::from("com.local", "Marketing Insights", "DashboardData")
        .map(|proj| proj.config_dir().join("dashboard.json"))
        .filter(|path| path.exists())
}

/// CLI directory, then `DASHBOARD_DATA_PATH`, then the config file, then defaults.
fn resolve_config(cli_dir: Option<PathBuf>) -> Result<RegistryConfig> {
    let mut cfg = match config_path() {
        Some(path) => RegistryConfig::from_json_file(&path)?,
        None => RegistryConfig::default(),
    };

    if let Some(dir) = std::env::var_os("DASHBOARD_DATA_PATH") {
        cfg.data_dir = PathBuf::from(dir);
    }
    if let Some(dir) = cli_dir {
        cfg.data_dir = dir;
    }

    Ok(cfg)
}

fn main() -> Result<()> {
    let (data_dir, output) = match parse_args(std::env::args_os().skip(1))? {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::Run { data_dir, output } => (data_dir, output),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = resolve_config(data_dir)?;
    info!(dir = %cfg.data_dir.display(), policy = ?cfg.sheet_policy, "loading datasets");

    let (registry, report) = load_with(&cfg)
        .with_context(|| format!("loading datasets from {}", cfg.data_dir.display()))?;

    for failure in &report.failures {
        warn!("{}", failure);
    }
    if registry.is_empty() {
        warn!(dir = %cfg.data_dir.display(), "no datasets found");
    }

    match output {
        Output::Text => {
            println!("# Loaded Tables\n{}\n", schema_summary(&registry));
            for panel in panels::build_panels(&registry) {
                println!("{}", panels::render(&panel));
            }
        }
        Output::PanelJson => {
            for panel in panels::build_panels(&registry) {
                if let Some(records) = panels::records(&panel)? {
                    println!("{}\t{}", panel.title, records);
                }
            }
        }
        Output::Dump => println!("{}", registry_json(&registry)?),
    }

    Ok(())
}
