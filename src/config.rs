use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::horizon::parse_horizons;
use crate::pipeline::RunOptions;

pub const DEFAULT_HORIZONS: [&str; 3] = ["Next GW", "Next 5 GWs", "GWs To End"];
pub const DEFAULT_FAKE_SEED: u64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub snapshot: Option<PathBuf>,
    /// Report destination; stdout when unset.
    pub output: Option<PathBuf>,
    pub horizons: Vec<String>,
    pub next_gw: Option<u32>,
    pub total_gws: Option<u32>,
    /// Run over a generated season instead of a snapshot file.
    pub fake: bool,
    pub fake_seed: u64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            output: None,
            horizons: DEFAULT_HORIZONS.iter().map(|h| h.to_string()).collect(),
            next_gw: None,
            total_gws: None,
            fake: false,
            fake_seed: DEFAULT_FAKE_SEED,
        }
    }
}

impl ProjectionConfig {
    /// Environment first, then command-line flags. A `--config <file>` JSON
    /// document, when given, replaces the defaults underneath both.
    pub fn load(args: &[String]) -> Result<Self> {
        let mut config = match arg_value(args, "config") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_args(args)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(path) = get("FPL_SNAPSHOT") {
            self.snapshot = Some(PathBuf::from(path.trim()));
        }
        if let Some(path) = get("FPL_OUTPUT") {
            self.output = Some(PathBuf::from(path.trim()));
        }
        if let Some(list) = get("FPL_HORIZONS") {
            self.horizons = split_list(&list);
        }
        if let Some(v) = get("FPL_NEXT_GW") {
            self.next_gw = Some(parse_gw("FPL_NEXT_GW", &v)?);
        }
        if let Some(v) = get("FPL_TOTAL_GWS") {
            self.total_gws = Some(parse_gw("FPL_TOTAL_GWS", &v)?);
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(path) = arg_value(args, "snapshot") {
            self.snapshot = Some(PathBuf::from(path));
        }
        if let Some(path) = arg_value(args, "output") {
            self.output = Some(PathBuf::from(path));
        }
        if let Some(list) = arg_value(args, "horizons") {
            self.horizons = split_list(&list);
        }
        if let Some(v) = arg_value(args, "next-gw") {
            self.next_gw = Some(parse_gw("--next-gw", &v)?);
        }
        if let Some(v) = arg_value(args, "total-gws") {
            self.total_gws = Some(parse_gw("--total-gws", &v)?);
        }
        if let Some(v) = arg_value(args, "seed") {
            self.fake_seed = v
                .parse()
                .map_err(|_| anyhow!("--seed expects an integer, got `{v}`"))?;
        }
        if args.iter().any(|a| a == "--fake") {
            self.fake = true;
        }
        Ok(())
    }

    pub fn run_options(&self) -> Result<RunOptions> {
        let horizons = parse_horizons(&self.horizons).context("invalid horizon list")?;
        Ok(RunOptions {
            horizons,
            next_gw: self.next_gw,
            total_gws: self.total_gws,
        })
    }
}

/// Value of `--name=value` or `--name value`; blank values are ignored.
fn arg_value(args: &[String], name: &str) -> Option<String> {
    let flag = format!("--{name}");
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_gw(source: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| anyhow!("{source} expects a game week number, got `{raw}`"))
}
