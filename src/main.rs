use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fpl_projections::columns::Column;
use fpl_projections::config::ProjectionConfig;
use fpl_projections::fake_season::{FakeSeasonConfig, fake_season};
use fpl_projections::horizon::Horizon;
use fpl_projections::pipeline::{ProjectionReport, run};
use fpl_projections::schema::FplCatalog;
use fpl_projections::snapshot::load_snapshot;

fn main() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = ProjectionConfig::load(&args)?;
    let opts = config.run_options()?;

    let snapshot = if config.fake {
        info!(seed = config.fake_seed, "generating synthetic season");
        fake_season(config.fake_seed, FakeSeasonConfig::default())
    } else {
        let path = config
            .snapshot
            .as_deref()
            .context("no snapshot given; set FPL_SNAPSHOT, pass --snapshot <file>, or use --fake")?;
        load_snapshot(path).with_context(|| format!("loading snapshot {}", path.display()))?
    };

    let report = run(&snapshot, FplCatalog::global(), &opts)?;
    let body = serde_json::to_string_pretty(&report).context("serializing report")?;
    match &config.output {
        Some(path) => {
            fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
            print_summary(&report, &opts.horizons);
            println!("Report: {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(body.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn print_summary(report: &ProjectionReport, horizons: &[Horizon]) {
    println!("Projection complete");
    println!("Game week: {}/{}", report.next_gw, report.total_gws);
    println!("Players: {}", report.players.len());
    println!("Player fixtures: {}", report.player_fixtures.len());

    let Some(first) = horizons.first().copied() else {
        return;
    };
    let mut ranked: Vec<(&str, f64)> = report
        .horizons
        .iter()
        .filter_map(|row| {
            let name = row.current.text(Column::NameAndShortTeam)?;
            let ep = row.get(first)?.expected_points;
            ep.is_finite().then_some((name, ep))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    println!("Top by Expected Points {first}:");
    for (name, ep) in ranked.iter().take(10) {
        println!(" - {name}: {ep:.2}");
    }
}
