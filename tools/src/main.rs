use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use horde_tools::{decode_envelopes_json, format_inspect_pretty, inspect_frames};
use wire::{Limits, MaskPolicy};

#[derive(Parser)]
#[command(
    name = "horde-tools",
    version,
    about = "horde frame capture inspection tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect frame layout in a capture.
    Inspect {
        /// Capture file, or a directory of captures.
        capture_path: PathBuf,
        /// How mask keys are read.
        #[arg(long, value_enum, default_value_t = Policy::Always)]
        policy: Policy,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected captures.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected captures (after sorting).
        #[arg(long)]
        limit: Option<usize>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Decode frame payloads into envelope JSON.
    Decode {
        /// Capture file.
        capture_file: PathBuf,
        /// How mask keys are read.
        #[arg(long, value_enum, default_value_t = Policy::Always)]
        policy: Policy,
    },
}

/// Mask handling, named after who reads the stream.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    /// Always consume a mask key (client reading relay frames).
    Always,
    /// Consume a key only when the mask bit is set (relay reading client frames).
    FromHeader,
}

impl From<Policy> for MaskPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Always => Self::Always,
            Policy::FromHeader => Self::FromHeader,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let limits = Limits::unlimited();
    match cli.command {
        Command::Inspect {
            capture_path,
            policy,
            glob,
            sort,
            limit,
            json,
        } => {
            let paths = if capture_path.is_dir() {
                let entries = collect_capture_entries(&capture_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                entries.into_iter().map(|entry| entry.path).collect()
            } else {
                vec![capture_path]
            };
            let multiple = paths.len() > 1;
            for path in paths {
                let bytes = read_capture(&path)?;
                let report = inspect_frames(&bytes, policy.into(), &limits)
                    .with_context(|| format!("inspect {}", path.display()))?;
                if multiple {
                    println!("== {} ==", path.display());
                }
                if json {
                    let json = serde_json::to_string_pretty(&report).context("serialize json")?;
                    println!("{json}");
                } else {
                    print!("{}", format_inspect_pretty(&report));
                }
            }
        }
        Command::Decode {
            capture_file,
            policy,
        } => {
            let bytes = read_capture(&capture_file)?;
            let output = decode_envelopes_json(&bytes, policy.into(), &limits)?;
            let json = serde_json::to_string_pretty(&output).context("serialize json")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn read_capture(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("read capture {}", path.display()))
}

struct CaptureEntry {
    path: PathBuf,
    size: u64,
}

fn collect_capture_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<CaptureEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(CaptureEntry { path, size });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn maybe_sort_entries(
    mut entries: Vec<CaptureEntry>,
    sort: Option<InspectSort>,
) -> Vec<CaptureEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => {}
    }
    entries
}
