// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RoomScan CLI - batch processing of persisted capture sessions.
//!
//! # Usage
//!
//! - `roomscan <session.json> [--config scan.json] [--output report.json] [--per-face]`
//!   classifies, analyzes and simplifies one session and prints a JSON report.
//! - `roomscan align <room.json>... --labels labels.json [--config scan.json] [--output combined.json]`
//!   aligns several rooms through labeled doors, writes the combined session
//!   and prints the alignment report.
//!
//! Environment: `ROOMSCAN_LOG`, `ROOMSCAN_WORKER_THREADS`, `ROOMSCAN_MODE`,
//! `ROOMSCAN_CONFIG`, `ROOMSCAN_PRETTY`. `RUST_LOG` overrides the log filter.

use anyhow::{bail, Context};
use roomscan_core::SessionSnapshot;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod align;
mod config;
mod pipeline;

use config::CliConfig;

const USAGE: &str = "\
Usage:
  roomscan <session.json> [--config scan.json] [--output report.json] [--per-face]
  roomscan align <room.json>... --labels labels.json [--config scan.json] [--output combined.json]";

#[derive(Debug, PartialEq)]
enum Command {
    Report {
        session: PathBuf,
        config: Option<PathBuf>,
        output: Option<PathBuf>,
        per_face: bool,
    },
    Align {
        sessions: Vec<PathBuf>,
        labels: PathBuf,
        config: Option<PathBuf>,
        output: PathBuf,
    },
    Help,
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Help);
    };
    if first == "--help" || first == "-h" {
        return Ok(Command::Help);
    }
    let aligning = first == "align";
    let rest = if aligning { &args[1..] } else { args };

    let mut positional = Vec::new();
    let mut config = None;
    let mut output = None;
    let mut labels = None;
    let mut per_face = false;

    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .map(PathBuf::from)
                .with_context(|| format!("{name} needs a value"))
        };
        match arg.as_str() {
            "--config" => config = Some(value("--config")?),
            "--output" => output = Some(value("--output")?),
            "--labels" if aligning => labels = Some(value("--labels")?),
            "--per-face" if !aligning => per_face = true,
            other if other.starts_with("--") => bail!("unknown option {other}\n{USAGE}"),
            other => positional.push(PathBuf::from(other)),
        }
    }

    if aligning {
        if positional.is_empty() {
            bail!("align needs at least one session\n{USAGE}");
        }
        Ok(Command::Align {
            sessions: positional,
            labels: labels.with_context(|| format!("align needs --labels\n{USAGE}"))?,
            config,
            output: output.unwrap_or_else(|| PathBuf::from("combined.json")),
        })
    } else {
        let mut positional = positional.into_iter();
        let session = positional.next().with_context(|| USAGE.to_string())?;
        if let Some(extra) = positional.next() {
            bail!("unexpected argument {}\n{USAGE}", extra.display());
        }
        Ok(Command::Report {
            session,
            config,
            output,
            per_face,
        })
    }
}

fn write_json(value: &impl Serialize, pretty: bool, output: Option<&Path>) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args)?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.worker_threads)
        .build_global()
        .context("initializing rayon thread pool")?;

    match command {
        Command::Help => println!("{USAGE}"),
        Command::Report {
            session,
            config,
            output,
            per_face,
        } => {
            let mut scan_config = cli.scan_config(config.as_deref())?;
            scan_config.classifier.per_face |= per_face;
            tracing::info!(
                session = %session.display(),
                mode = %scan_config.mode,
                per_face = scan_config.effective_classifier().per_face,
                "Starting RoomScan"
            );

            let (report, _) = pipeline::run_report(&session, &scan_config)?;
            tracing::info!(
                walls = report.room.walls.len(),
                floor_area = report.room.floor_area,
                "Session processed"
            );
            write_json(&report, cli.pretty, output.as_deref())?;
        }
        Command::Align {
            sessions,
            labels,
            config,
            output,
        } => {
            let scan_config = cli.scan_config(config.as_deref())?;
            let labels = align::load_labels(&labels)?;
            tracing::info!(rooms = sessions.len(), labels = labels.len(), "Starting alignment");

            let (report, combined) = align::run_align(&sessions, &labels, &scan_config)?;
            SessionSnapshot::from_scan(&combined)
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            tracing::info!(
                output = %output.display(),
                fragments = combined.fragment_count(),
                aligned = report.is_aligned,
                "Combined session written"
            );
            write_json(&report, cli.pretty, None)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_report() {
        let command = parse_args(&args(&["room.json", "--per-face", "--output", "out.json"])).unwrap();
        assert_eq!(
            command,
            Command::Report {
                session: PathBuf::from("room.json"),
                config: None,
                output: Some(PathBuf::from("out.json")),
                per_face: true,
            }
        );
    }

    #[test]
    fn test_parse_align() {
        let command = parse_args(&args(&[
            "align", "hall.json", "kitchen.json", "--labels", "labels.json",
        ]))
        .unwrap();
        assert_eq!(
            command,
            Command::Align {
                sessions: vec![PathBuf::from("hall.json"), PathBuf::from("kitchen.json")],
                labels: PathBuf::from("labels.json"),
                config: None,
                output: PathBuf::from("combined.json"),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_args(&[]).unwrap(), Command::Help);
        assert!(parse_args(&args(&["align", "hall.json"])).is_err());
        assert!(parse_args(&args(&["room.json", "--output"])).is_err());
        assert!(parse_args(&args(&["room.json", "--bogus"])).is_err());
        assert!(parse_args(&args(&["a.json", "b.json"])).is_err());
        assert!(parse_args(&args(&["align", "a.json", "--per-face", "--labels", "l.json"])).is_err());
    }
}
