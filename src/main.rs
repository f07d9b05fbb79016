//! Headless streaming driver: walks a viewpoint across the world and lets the
//! controller load, mesh and evict chunks around it.
#![forbid(unsafe_code)]

mod renderer;

use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use voxstream_geom::Vec3;
use voxstream_runtime::StreamingController;
use voxstream_world::WorldGenConfig;

use crate::renderer::LoggingRenderer;

#[derive(Parser, Debug)]
#[command(name = "voxstream", about = "Stream a procedural voxel world around a moving viewpoint")]
struct Args {
    /// World config (TOML). Missing file falls back to built-in defaults.
    #[arg(long, default_value = "assets/voxstream.toml")]
    config: PathBuf,
    #[arg(long)]
    seed: Option<i32>,
    /// Overrides `streaming.retention_radius`.
    #[arg(long)]
    radius: Option<i32>,
    #[arg(long)]
    workers: Option<usize>,
    #[arg(long, default_value_t = 1200)]
    ticks: u32,
    /// Simulated seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Viewpoint speed in voxels per second.
    #[arg(long, default_value_t = 12.0)]
    speed: f32,
    /// Walk direction in degrees, 0 = +X.
    #[arg(long, default_value_t = 0.0)]
    heading: f32,
    /// Sleep `dt` between ticks instead of running flat out.
    #[arg(long)]
    realtime: bool,
    /// Ticks between stats lines.
    #[arg(long, default_value_t = 120)]
    stats_every: u32,
}

fn load_config(args: &Args) -> Result<WorldGenConfig, Box<dyn Error>> {
    let mut cfg = if args.config.exists() {
        log::info!("loading world config from {}", args.config.display());
        WorldGenConfig::load_from_path(&args.config)?
    } else {
        log::warn!("{} not found; using defaults", args.config.display());
        WorldGenConfig::default()
    };
    if let Some(s) = args.seed {
        cfg.seed = s;
    }
    if let Some(r) = args.radius {
        cfg.streaming.retention_radius = r;
    }
    if args.workers.is_some() {
        cfg.streaming.workers = args.workers;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    let args = Args::parse();
    let cfg = load_config(&args)?;

    let mut ctl = StreamingController::init(&cfg)?;
    let mut renderer = LoggingRenderer::new();
    let heading = args.heading.to_radians();
    let dir = Vec3::new(heading.cos(), 0.0, heading.sin());
    let mut view = Vec3::new(0.0, cfg.chunk.height as f32 * 0.75, 0.0);

    let t0 = Instant::now();
    ctl.bootstrap(view, &mut renderer);
    for tick in 1..=args.ticks {
        view += dir * (args.speed * args.dt);
        ctl.tick(args.dt, view, &mut renderer);
        if args.stats_every > 0 && tick % args.stats_every == 0 {
            let s = ctl.stats();
            log::info!(
                "tick {tick} view=({:.1}, {:.1}) loaded={} generating={} queued={} live={} pooled={}",
                view.x,
                view.z,
                s.loaded,
                s.generating,
                s.queued_meshes,
                s.live_objects,
                s.pooled_objects
            );
        }
        if args.realtime {
            std::thread::sleep(Duration::from_secs_f32(args.dt.max(0.0)));
        }
    }

    ctl.shutdown();
    ctl.wait_for_batch(Duration::from_secs(10));
    let s = ctl.stats();
    log::info!(
        "done in {:.2}s: batches ok={} failed={} uploads={} faces={} objects={} loaded={}",
        t0.elapsed().as_secs_f32(),
        s.batches_completed,
        s.batches_failed,
        renderer.uploads,
        renderer.faces,
        renderer.objects(),
        s.loaded
    );
    Ok(())
}
