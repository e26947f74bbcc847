mod skin;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netease_playing_core::{init_logging, AppDirs, Config, FieldKind, ScopeHandle};
use netease_playing_measure::{
    MeasureApi, MeasureId, MeasureOptions, PluginHost, OPTION_HISTORY_JSON_PATH, OPTION_PARENT_NAME,
    OPTION_TYPE,
};
use skin::Skin;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

const SNAPSHOT_PARENT: &str = "Playing";
const SNAPSHOT_SCOPE: ScopeHandle = ScopeHandle(0);

#[derive(Debug, Parser)]
#[command(
    name = "netease-playing",
    version,
    about = "Expose Netease Cloud Music's now-playing history as measures"
)]
struct Cli {
    /// Log at debug level regardless of config
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every field of the latest play once
    Show(ShowCommand),
    /// Drive skins through the measure lifecycle and print their values
    Run(RunCommand),
}

#[derive(Debug, Parser)]
struct ShowCommand {
    /// History file (defaults to the client's per-user location)
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct RunCommand {
    /// Skin file; repeat for several independent scopes
    #[arg(long = "skin", required = true)]
    skins: Vec<PathBuf>,
    /// Stop after this many update rounds (runs until killed otherwise)
    #[arg(long)]
    ticks: Option<u64>,
    /// Delay between update rounds (overrides refresh_interval_ms)
    #[arg(long)]
    interval_ms: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let dirs = AppDirs::discover()?;
    let config = Config::load_or_default(&dirs)?;
    let level = cli.verbose.then_some("debug");
    let _logging = init_logging(&config.logging, &dirs, level)?;

    let mut host = PluginHost::new();
    if let Some(path) = &config.history_path {
        host = host.with_history_fallback(path.clone());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Show(show) => {
            for (kind, value) in snapshot(&mut host, show.history) {
                writeln!(out, "{:<18} {}", kind.config_name(), value)?;
            }
        }
        Command::Run(run) => {
            let skins = run
                .skins
                .iter()
                .enumerate()
                .map(|(index, path)| Skin::load(path, ScopeHandle::new(index as u64 + 1)))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to load skins")?;
            let interval = run
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.refresh_interval());
            tracing::info!(
                skins = skins.len(),
                interval_ms = interval.as_millis() as u64,
                "starting measure host"
            );
            run_skins(&mut host, &skins, run.ticks, interval, &mut out)?;
        }
    }

    Ok(())
}

/// One source plus a consumer per field, updated once.
fn snapshot(host: &mut PluginHost, history: Option<PathBuf>) -> Vec<(FieldKind, String)> {
    let mut parent = MeasureOptions::new(SNAPSHOT_SCOPE, SNAPSHOT_PARENT)
        .with(OPTION_TYPE, FieldKind::Name.config_name());
    if let Some(path) = history {
        parent.set(OPTION_HISTORY_JSON_PATH, path.to_string_lossy());
    }
    let parent_id = host.initialize(&parent);
    host.reload(parent_id, &parent);
    host.update(parent_id);

    let mut readings = Vec::with_capacity(FieldKind::ALL.len());
    let mut children = Vec::with_capacity(FieldKind::ALL.len());
    for kind in FieldKind::ALL {
        let options = MeasureOptions::new(SNAPSHOT_SCOPE, kind.config_name())
            .with(OPTION_TYPE, kind.config_name())
            .with(OPTION_PARENT_NAME, SNAPSHOT_PARENT);
        let id = host.initialize(&options);
        host.reload(id, &options);
        let number = host.update(id);
        let text = host.get_string(id).map(str::to_owned);
        readings.push((kind, render(kind, number, text.as_deref())));
        children.push(id);
    }

    for id in children.into_iter().chain([parent_id]) {
        host.finalize(id);
    }
    readings
}

fn run_skins<W: Write>(
    host: &mut PluginHost,
    skins: &[Skin],
    ticks: Option<u64>,
    interval: Duration,
    out: &mut W,
) -> io::Result<()> {
    let mut loaded: Vec<(String, Vec<(String, FieldKind, MeasureId)>)> = Vec::new();
    for skin in skins {
        let label = skin
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| skin.scope.to_string());
        let mut measures = Vec::new();
        for options in skin.options() {
            let id = host.initialize(&options);
            host.reload(id, &options);
            let field = host
                .measure(id)
                .map(|measure| measure.field())
                .unwrap_or_default();
            measures.push((options.measure_name(), field, id));
        }
        loaded.push((label, measures));
    }

    let mut tick = 0u64;
    while ticks.map_or(true, |limit| tick < limit) {
        if tick > 0 {
            std::thread::sleep(interval);
        }
        for (label, measures) in &loaded {
            for (name, field, id) in measures {
                let number = host.update(*id);
                let text = host.get_string(*id).map(str::to_owned);
                writeln!(
                    out,
                    "[{label}] {name} = {}",
                    render(*field, number, text.as_deref())
                )?;
            }
        }
        tick += 1;
    }

    for (_, measures) in loaded {
        for (_, _, id) in measures {
            host.finalize(id);
        }
    }
    Ok(())
}

/// Prefers the string value, as display hosts do, except for numeric fields.
fn render(kind: FieldKind, number: f64, text: Option<&str>) -> String {
    match text {
        Some(text) if !kind.is_numeric() => text.to_string(),
        _ => format!("{number}"),
    }
}
