use clap::{Parser, Subcommand};
use std::f32::consts::{PI, TAU};
use std::path::PathBuf;
use terrain_drive::{
    config::{WorldConfig, DEFAULT_CONFIG_PATH},
    export::export_world,
    procgen::World,
    sim::{ChaseCamera, DriveInput, VehicleState},
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to world configuration file (.toml, .yaml or .json);
    /// defaults to ./world.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override log level (trace|debug|info|warn|error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the world and print a summary
    Generate {
        /// Write terrain.obj, road.obj and trees.json into this directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Generate the world and drive a scripted lap down the road
    Drive {
        /// Number of simulation frames
        #[arg(short, long, default_value_t = 600)]
        frames: u32,

        /// Frame time in seconds
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let (config, source) = WorldConfig::resolve(args.config.as_deref())?;

    // Initialize tracing
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    match &source {
        Some(path) => info!("Configuration loaded from: {}", path.display()),
        None => info!("No {} found, using defaults", DEFAULT_CONFIG_PATH),
    }

    config.validate()?;

    info!(
        "Terrain {}x{} samples over {:.0}m x {:.0}m, seed {}",
        config.terrain.resolution,
        config.terrain.resolution,
        config.terrain.width,
        config.terrain.depth,
        config.terrain.seed
    );

    let world = World::generate(&config);

    match args.command {
        Command::Generate { out_dir } => {
            let (lo, hi) = world.grid.height_range();
            info!("Height range: {:.2}..{:.2}", lo, hi);
            info!("Height at origin: {:.4}", world.height(0.0, 0.0));
            info!(
                "Road mesh: {} vertices, {} triangles",
                world.road.mesh.mesh.vertices.len(),
                world.road.mesh.mesh.triangle_count()
            );

            if let Some(out_dir) = out_dir {
                for path in export_world(&world, &out_dir)? {
                    info!("  wrote {}", path.display());
                }
            }
        }
        Command::Drive { frames, dt } => drive(&world, &config, frames, dt),
    }

    Ok(())
}

/// Drives from the start of the road, steering toward the centerline ahead.
fn drive(world: &World, config: &WorldConfig, frames: u32, dt: f32) {
    let settings = &config.vehicle;
    let start = world.road.curve.point(0.0);
    let mut vehicle = VehicleState::spawn(start.x, start.z, &world.grid, settings);
    let mut camera = ChaseCamera::behind(&vehicle, settings);
    let road_length = world.road.curve.length().max(1.0);

    for frame in 0..frames {
        // Aim a few car lengths down the road
        let (_, progress) = nearest_fraction(world, vehicle.x, vehicle.z);
        let ahead = world.road.curve.point_at((progress + 20.0 / road_length).min(1.0));
        let desired = (ahead.x - vehicle.x).atan2(ahead.z - vehicle.z);
        let error = (desired - vehicle.heading_rad + PI).rem_euclid(TAU) - PI;

        let input = DriveInput {
            throttle: if vehicle.speed < settings.max_speed * 0.6 { 1.0 } else { 0.0 },
            brake: 0.0,
            steer: (error * 2.0).clamp(-1.0, 1.0),
        };

        vehicle.step(&input, &world.grid, settings, dt);
        camera.follow(&vehicle, dt);

        if frame % 60 == 0 {
            debug!(
                "frame {}: car ({:.1}, {:.1}, {:.1}) {:.1} m/s, camera ({:.1}, {:.1}, {:.1})",
                frame,
                vehicle.x,
                vehicle.y,
                vehicle.z,
                vehicle.speed,
                camera.position.x,
                camera.position.y,
                camera.position.z
            );
        }
    }

    info!(
        "Drove {} frames: car at ({:.1}, {:.1}, {:.1}), {:.1} m/s",
        frames, vehicle.x, vehicle.y, vehicle.z, vehicle.speed
    );
}

/// Distance to the sampled road centerline and the arc-length fraction there.
fn nearest_fraction(world: &World, x: f32, z: f32) -> (f32, f32) {
    const SAMPLES: usize = 400;
    (0..=SAMPLES)
        .map(|k| {
            let u = k as f32 / SAMPLES as f32;
            let p = world.road.curve.point_at(u);
            (((p.x - x).powi(2) + (p.z - z).powi(2)).sqrt(), u)
        })
        .fold((f32::MAX, 0.0), |best, candidate| if candidate.0 < best.0 { candidate } else { best })
}
