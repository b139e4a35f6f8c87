#![deny(warnings)]

//! Headless CLI: set levers, print the resulting emissions report and
//! optionally save the scenario as a JSON snapshot.

use anyhow::{anyhow, bail, Context, Result};
use carbon_core::ScenarioSnapshot;
use carbon_model::{EmissionsModel, ScenarioReport};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
carbon-cli [options]
  --scenario <file.yaml>   lever settings from YAML ({ name, levers: { id: level } })
  --load <snapshot.json>   start from a saved scenario
  --lever <id>=<level>     set one lever (repeatable)
  --max-ambition           set every lever to 4 before --lever overrides
  --json                   print the report as JSON
  --save <snapshot.json>   write the final levers as a saved scenario
  --name <name>            name stored with --save
  --version                print version and exit";

#[derive(Debug, Default, PartialEq)]
struct Args {
    scenario: Option<PathBuf>,
    load: Option<PathBuf>,
    levers: Vec<String>,
    max_ambition: bool,
    json: bool,
    save: Option<PathBuf>,
    name: Option<String>,
    version: bool,
    help: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(raw: I) -> Result<Args> {
    let mut args = Args::default();
    let mut it = raw.into_iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().ok_or_else(|| anyhow!("{flag} needs a value"));
        match arg.as_str() {
            "--scenario" => args.scenario = Some(value("--scenario")?.into()),
            "--load" => args.load = Some(value("--load")?.into()),
            "--lever" => args.levers.push(value("--lever")?),
            "--save" => args.save = Some(value("--save")?.into()),
            "--name" => args.name = Some(value("--name")?),
            "--max-ambition" => args.max_ambition = true,
            "--json" => args.json = true,
            "--version" => args.version = true,
            "-h" | "--help" => args.help = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

/// YAML scenario file. Levels are plain integers so the model can clamp them.
#[derive(Debug, Deserialize)]
struct ScenarioFile {
    name: Option<String>,
    #[serde(default)]
    levers: BTreeMap<String, i64>,
}

fn parse_scenario_yaml(text: &str) -> Result<ScenarioFile> {
    serde_yaml::from_str(text).context("invalid scenario YAML")
}

fn apply_scenario(model: &mut EmissionsModel, file: &ScenarioFile) -> Result<()> {
    for (id, level) in &file.levers {
        model
            .set_lever_by_id(id, *level)
            .with_context(|| format!("scenario file lever `{id}`"))?;
    }
    Ok(())
}

fn parse_lever_arg(arg: &str) -> Result<(&str, i64)> {
    let (id, level) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected <id>=<level>, got `{arg}`"))?;
    let level: i64 = level
        .trim()
        .parse()
        .with_context(|| format!("invalid level in `{arg}`"))?;
    Ok((id.trim(), level))
}

/// Build the model in precedence order: snapshot, scenario file,
/// max ambition, then individual `--lever` overrides.
fn build_model(args: &Args) -> Result<(EmissionsModel, Option<String>)> {
    let mut model = EmissionsModel::new();
    let mut name = None;

    if let Some(path) = &args.load {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let snap = ScenarioSnapshot::from_json(&text)
            .with_context(|| format!("loading snapshot {}", path.display()))?;
        info!(name = %snap.name, saved_at = %snap.saved_at, "loaded snapshot");
        model.apply_snapshot(&snap);
        name = Some(snap.name);
    }
    if let Some(path) = &args.scenario {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let file = parse_scenario_yaml(&text)?;
        apply_scenario(&mut model, &file)?;
        info!(path = %path.display(), levers = file.levers.len(), "applied scenario file");
        name = file.name.or(name);
    }
    if args.max_ambition {
        model.set_max_ambition();
    }
    for arg in &args.levers {
        let (id, level) = parse_lever_arg(arg)?;
        model
            .set_lever_by_id(id, level)
            .with_context(|| format!("--lever {arg}"))?;
    }
    Ok((model, name))
}

fn render_text(name: &str, report: &ScenarioReport) -> String {
    let mut out = format!("Scenario: {name}\nSector emissions (MtCO2e):\n");
    for (sector, value) in report.sectors.iter() {
        out.push_str(&format!("  {:<12} {:>8.1}\n", sector.as_str(), value));
    }
    out.push_str(&format!(
        "Total: {:.1} MtCO2e | vs 1990: {:+}% reduction | net zero: {} | band: {:?}\n",
        report.total_mt,
        report.reduction_percent,
        if report.net_zero { "achieved" } else { "not achieved" },
        report.band,
    ));
    let points: Vec<String> = report
        .pathway
        .points()
        .map(|(year, mt)| format!("{year}={mt}"))
        .collect();
    out.push_str(&format!("Pathway: {}", points.join(" ")));
    out
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        println!("{USAGE}");
        return Ok(());
    }
    if args.version {
        println!(
            "carbon-cli {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(?args, "starting CLI");

    let (model, loaded_name) = build_model(&args)?;
    let name = args
        .name
        .clone()
        .or(loaded_name)
        .unwrap_or_else(|| "Untitled scenario".to_string());
    let report = model.report();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_text(&name, &report));
    }

    if let Some(path) = &args.save {
        let snap = model.snapshot(name, Utc::now());
        fs::write(path, snap.to_json_pretty()?)
            .with_context(|| format!("writing snapshot {}", path.display()))?;
        info!(path = %path.display(), "saved scenario");
    }
    Ok(())
}
