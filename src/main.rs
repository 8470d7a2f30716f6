//! Swarm Stage - headless runner
//!
//! Builds a seeded random world of sensor-laden robots among moving
//! obstacles, runs it for a number of ticks and prints what the sensors saw.

use std::f64::consts::{PI, TAU};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use swarm_stage::core::error::Result;
use swarm_stage::render::colors;
use swarm_stage::sensor::{SensorKind, TransducerArray, TransducerArrayConfig};
use swarm_stage::simulation::{CallbackControl, PowerLog, TickSummary};
use swarm_stage::{Flag, ModelId, ModelSpec, Pose, SimulationConfig, Size, Velocity, Visibility, World};

/// Headless multi-robot simulation
#[derive(Parser, Debug)]
#[command(name = "swarm-stage")]
#[command(about = "Run a seeded robot swarm and report sensor activity")]
struct Args {
    /// Number of robots
    #[arg(long, default_value_t = 16)]
    robots: usize,

    /// Number of static and moving obstacles
    #[arg(long, default_value_t = 32)]
    obstacles: usize,

    /// Ticks to simulate
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Worker threads (overrides the config file)
    #[arg(long)]
    workers: Option<usize>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side of the square arena in meters
    #[arg(long, default_value_t = 20.0)]
    arena: f64,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// In text mode, print a tick summary every N ticks (0 = never)
    #[arg(long, default_value_t = 10)]
    report_every: u64,
}

const BUMPER_SEGMENTS: i64 = 8;

/// Sensors carried by one robot
struct Robot {
    body: ModelId,
    bumper: ModelId,
    sonar: ModelId,
    laser: ModelId,
}

#[derive(Serialize)]
struct RobotReport {
    body: ModelId,
    pose: Pose,
    bumper_hits: usize,
    sonar_hits: usize,
    laser_hits: usize,
    flags: usize,
}

#[derive(Serialize)]
struct RunReport {
    seed: u64,
    workers: usize,
    ticks: u64,
    models: usize,
    failures: usize,
    power_watts: f64,
    last_tick: Option<TickSummary>,
    robots: Vec<RobotReport>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swarm_stage=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(workers) = args.workers {
        config.worker_threads = workers;
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let power = Arc::new(PowerLog::new());
    let mut world = World::new(config)?.with_power_sink(power.clone());

    let robots = (0..args.robots)
        .map(|i| spawn_robot(&mut world, &mut rng, i, args.arena))
        .collect::<Result<Vec<_>>>()?;
    for i in 0..args.obstacles {
        spawn_obstacle(&mut world, &mut rng, i, args.arena)?;
    }
    world.startup_all();

    tracing::info!(
        seed,
        robots = robots.len(),
        models = world.scene().len(),
        workers = world.workers(),
        "world ready"
    );

    let mut failures = 0;
    let mut last_tick = None;
    for _ in 0..args.ticks {
        let report = world.step();
        failures += report.failures.len();
        let summary = report.summary();
        if !args.json && args.report_every > 0 && summary.tick % args.report_every == 0 {
            println!(
                "tick {:>5}: {} parallel, {} serial, {} failed",
                summary.tick, summary.parallel, summary.serial, summary.failures
            );
        }
        last_tick = Some(summary);
    }

    let report = RunReport {
        seed,
        workers: world.workers(),
        ticks: world.tick(),
        models: world.scene().len(),
        failures,
        power_watts: power.total(),
        last_tick,
        robots: robots
            .iter()
            .map(|robot| robot_report(&world, robot))
            .collect::<Result<Vec<_>>>()?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&world, &robots, &report);
    }

    world.shutdown_all();
    world.teardown();
    tracing::info!(ticks = report.ticks, failures, "run complete");
    Ok(())
}

fn spawn_robot(world: &mut World, rng: &mut ChaCha8Rng, i: usize, arena: f64) -> Result<Robot> {
    let half = arena / 2.0;
    let pose = Pose::new(
        rng.gen_range(-half..half),
        rng.gen_range(-half..half),
        0.0,
        rng.gen_range(-PI..PI),
    );
    let velocity = Velocity::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5), 0.0);

    let body = world.add_model(
        ModelSpec::new(format!("robot{i}"))
            .pose(pose)
            .size(Size::new(0.44, 0.38, 0.22))
            .velocity(velocity),
    )?;

    // sensor mounts have no footprint of their own
    let mount = |name: String| {
        ModelSpec::new(name)
            .parent(body)
            .size(Size::default())
            .visibility(Visibility::invisible())
    };

    let bumper = world.add_sensor(
        mount(format!("robot{i}.bumper")),
        SensorKind::Bumper,
        &bumper_ring(BUMPER_SEGMENTS, 0.25, 0.18),
    )?;
    let sonar = world.add_sensor_array(
        mount(format!("robot{i}.sonar")),
        SensorKind::Sonar,
        TransducerArray::ring(16, 0.2, 5.0),
    )?;
    let laser = world.add_sensor_array(
        mount(format!("robot{i}.laser")),
        SensorKind::Laser,
        TransducerArray::fan(181, PI, 8.0),
    )?;

    // mark the robot's trail every few seconds of sim time
    world.add_update_callback(body, |args| {
        if args.tick() % 50 == 0 {
            args.push_flag(Flag::new(colors::YELLOW, 0.4));
        }
        if args.flag_count() > 8 {
            args.pop_flag();
        }
        CallbackControl::Continue
    })?;

    Ok(Robot {
        body,
        bumper,
        sonar,
        laser,
    })
}

/// Outward-facing contact strips evenly spaced around the body
fn bumper_ring(segments: i64, radius: f64, length: f64) -> TransducerArrayConfig {
    (0..segments).fold(TransducerArrayConfig::new(segments, length), |config, i| {
        let heading = 360.0 * i as f64 / segments as f64;
        let (sin, cos) = heading.to_radians().sin_cos();
        config.pose(i as usize, [radius * cos, radius * sin, 0.0, heading])
    })
}

fn spawn_obstacle(world: &mut World, rng: &mut ChaCha8Rng, i: usize, arena: f64) -> Result<ModelId> {
    let half = arena / 2.0;
    let moving = rng.gen_bool(0.25);
    let velocity = if moving {
        Velocity::new(rng.gen_range(-0.3..0.3), rng.gen_range(-0.3..0.3), rng.gen_range(-0.2..0.2))
    } else {
        Velocity::default()
    };
    world.add_model(
        ModelSpec::new(format!("obstacle{i}"))
            .pose(Pose::new(
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
                0.0,
                rng.gen_range(0.0..TAU),
            ))
            .size(Size::new(rng.gen_range(0.2..2.0), rng.gen_range(0.2..2.0), 1.0))
            .velocity(velocity),
    )
}

fn robot_report(world: &World, robot: &Robot) -> Result<RobotReport> {
    let hits = |id| world.sensor(id).map_or(0, |s| s.hit_count());
    Ok(RobotReport {
        body: robot.body,
        pose: world.global_pose(robot.body)?,
        bumper_hits: hits(robot.bumper),
        sonar_hits: hits(robot.sonar),
        laser_hits: hits(robot.laser),
        flags: world.flags(robot.body)?.len(),
    })
}

fn print_text(world: &World, robots: &[Robot], report: &RunReport) {
    println!("\n=== SWARM STAGE ===");
    println!(
        "seed {}  workers {}  ticks {}  models {}",
        report.seed, report.workers, report.ticks, report.models
    );
    println!(
        "power {:.1} W  update failures {}",
        report.power_watts, report.failures
    );
    println!();

    for (robot, summary) in robots.iter().zip(&report.robots) {
        println!(
            "{:>8} at ({:6.2}, {:6.2})  flags {}",
            robot.body.to_string(),
            summary.pose.x,
            summary.pose.y,
            summary.flags
        );
        for sensor in [robot.bumper, robot.sonar, robot.laser] {
            if let Some(sensor) = world.sensor(sensor) {
                if sensor.kind() == SensorKind::Bumper {
                    println!("    {sensor}");
                } else {
                    println!(
                        "    {}[{}]: {} hits",
                        sensor.kind().name(),
                        sensor.transducers().len(),
                        sensor.hit_count()
                    );
                }
            }
        }
    }
}
