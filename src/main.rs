// Copyright (c) 2026, Chad Hogan
// All rights reserved.
//
// This source code is licensed under the BSD-3-Clause license found in the
// LICENSE file in the root directory of this source tree.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use eikonal_fmm::io;
use eikonal_fmm::{FastMarching, Mesh, ProgressInfo};

#[derive(Parser)]
#[command(
    name = "eikonal-fmm",
    about = "Fast Marching Method level-set reinitialisation"
)]
struct Cli {
    /// Number of elements along x
    #[arg(long)]
    width: usize,

    /// Number of elements along y
    #[arg(long)]
    height: usize,

    /// Circular hole "x,y,r" (repeatable); the initial field is the distance
    /// to the union of holes, negative inside
    #[arg(long, num_args = 1)]
    hole: Vec<String>,

    /// Initial level-set field file (.npy), instead of --hole
    #[arg(long)]
    field: Option<PathBuf>,

    /// Multiply the initial field by this factor before marching
    #[arg(long, default_value = "1.0")]
    distort: f64,

    /// Velocity to extend: "uniform:<v>", "radial", or a .npy file path
    #[arg(long)]
    velocity: Option<String>,

    /// Circular region "x,y,r" to mask out of the march (repeatable)
    #[arg(long, num_args = 1)]
    mask_hole: Vec<String>,

    /// Output file for the signed distance (.npy or .txt)
    #[arg(short = 'o', long, default_value = "distance.npy")]
    output: PathBuf,

    /// Output file for the extended velocity (.npy or .txt)
    #[arg(long, default_value = "velocity.npy")]
    velocity_output: PathBuf,

    /// Log wavefront progress (see --progress-every)
    #[arg(long)]
    progress: bool,

    /// Log every N rounds (used with --progress)
    #[arg(long, default_value = "100")]
    progress_every: u64,
}

fn parse_circle(s: &str, flag: &str) -> Result<[f64; 3]> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("invalid --{}: expected comma-separated floats", flag))?;
    if parts.len() != 3 {
        bail!("--{} expects 'x,y,r', got '{}'", flag, s);
    }
    if !parts[2].is_finite() || parts[2] <= 0.0 {
        bail!("--{} radius must be positive and finite, got {}", flag, parts[2]);
    }
    Ok([parts[0], parts[1], parts[2]])
}

fn build_initial_field(cli: &Cli, mesh: &Mesh) -> Result<Vec<f64>> {
    let field = if let Some(path) = &cli.field {
        if !cli.hole.is_empty() {
            bail!("--field and --hole are mutually exclusive");
        }
        io::load_field(path, mesh).map_err(|e| anyhow::anyhow!("{}", e))?
    } else {
        if cli.hole.is_empty() {
            bail!("at least one --hole or a --field must be specified");
        }
        let holes = cli
            .hole
            .iter()
            .map(|h| parse_circle(h, "hole"))
            .collect::<Result<Vec<_>>>()?;
        mesh.nodes
            .iter()
            .map(|n| {
                holes
                    .iter()
                    .map(|[x, y, r]| (n.coord.x - x).hypot(n.coord.y - y) - r)
                    .fold(f64::INFINITY, f64::min)
            })
            .collect()
    };

    if !cli.distort.is_finite() || cli.distort <= 0.0 {
        bail!("--distort must be positive and finite, got {}", cli.distort);
    }
    Ok(field.into_iter().map(|v| v * cli.distort).collect())
}

fn build_velocity_field(mode: &str, mesh: &Mesh) -> Result<Vec<f64>> {
    if let Some(val_str) = mode.strip_prefix("uniform:") {
        let val: f64 = val_str.parse().context("invalid uniform velocity value")?;
        return Ok(vec![val; mesh.n_nodes()]);
    }

    if mode == "radial" {
        // Distance from the domain centre: varies along any closed front.
        let cx = mesh.width() as f64 / 2.0;
        let cy = mesh.height() as f64 / 2.0;
        return Ok(mesh
            .nodes
            .iter()
            .map(|n| (n.coord.x - cx).hypot(n.coord.y - cy))
            .collect());
    }

    io::load_field(Path::new(mode), mesh).map_err(|e| anyhow::anyhow!("{}", e))
}

fn apply_masks(cli: &Cli, mesh: &mut Mesh) -> Result<()> {
    for spec in &cli.mask_hole {
        let [x, y, r] = parse_circle(spec, "mask-hole")?;
        for i in 0..mesh.n_nodes() {
            let c = mesh.nodes[i].coord;
            if (c.x - x).hypot(c.y - y) < r {
                mesh.set_masked(i, true);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut mesh = Mesh::new(cli.width, cli.height).map_err(|e| anyhow::anyhow!("{}", e))?;
    apply_masks(&cli, &mut mesh)?;
    tracing::info!(
        width = mesh.width(),
        height = mesh.height(),
        nodes = mesh.n_nodes(),
        masked = mesh.masked_count(),
        "mesh"
    );

    let mut distance = build_initial_field(&cli, &mesh)?;
    let mut velocity = cli
        .velocity
        .as_deref()
        .map(|mode| build_velocity_field(mode, &mesh))
        .transpose()?;

    let mut solver = FastMarching::new(&mesh);
    if cli.progress {
        let every = cli.progress_every.max(1);
        solver = solver.with_progress(Box::new(move |info: ProgressInfo| {
            if info.round % every == 0 {
                tracing::info!(
                    round = info.round,
                    distance = info.key,
                    frozen = info.frozen_total,
                    trial = info.trial,
                    elapsed_s = info.elapsed.as_secs_f64(),
                    "progress"
                );
            }
        }));
    }

    let stats = match velocity.as_deref_mut() {
        Some(v) => solver.march_with_velocity(&mut distance, v),
        None => solver.march(&mut distance),
    }
    .map_err(|e| anyhow::anyhow!("{}", e))?;

    tracing::info!(
        initially_frozen = stats.initially_frozen,
        frozen = stats.frozen,
        rounds = stats.rounds,
        unreached = stats.unreached,
        "solved"
    );

    io::save_field(solver.mesh(), &distance, &cli.output)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::info!(path = %cli.output.display(), "wrote distance");

    if let Some(v) = &velocity {
        io::save_field(solver.mesh(), v, &cli.velocity_output)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        tracing::info!(path = %cli.velocity_output.display(), "wrote velocity");
    }

    Ok(())
}
