//! geomsim CLI - Laplacians, spectral compression, skeletons and soft-body simulation.
//!
//! Usage: geomsim <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `geomsim --help` for available commands. Set `RUST_LOG=debug` for solver details.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use geomsim::algo::skeleton::skeletonize;
use geomsim::algo::spectral::{DenseEigenSolver, SpectralOperatorClient};
use geomsim::algo::{LaplacianBuilder, LaplacianKind, MeshTopology};
use geomsim::config::Config;
use geomsim::io;
use geomsim::mesh::{primitives, HalfEdgeMesh};
use geomsim::scene::{Model, Scene};
use geomsim::sim::{FrameRate, PhysicsModel, Simulator};

#[derive(Parser)]
#[command(name = "geomsim")]
#[command(author, version, about = "Discrete geometry and soft-body simulation CLI", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Assemble a Laplacian and write it as 1-based (row, col, value) triples
    Laplacian {
        /// Input mesh file
        input: PathBuf,

        /// Output triples file (default: only print statistics)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Operator variant
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Compress a mesh onto its lowest spectral modes
    Compress {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Number of eigenvectors to keep
        #[arg(short, long)]
        precision: Option<usize>,

        /// Operator variant
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
    },

    /// Contract a genus-0 mesh towards its skeleton
    Skeleton {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Number of contraction passes
        #[arg(short, long)]
        iterations: Option<usize>,
    },

    /// Write TetGen input files (.node, .poly) for a closed surface
    TetgenInput {
        /// Input mesh file
        input: PathBuf,

        /// Output prefix
        prefix: PathBuf,
    },

    /// Simulate a tetrahedralized surface falling onto the ground
    Simulate {
        /// Surface mesh whose vertices are the body's boundary vertices
        input: PathBuf,

        /// TetGen output prefix (prefix.node, prefix.ele, optional prefix.face)
        tetgen: PathBuf,

        /// Output mesh file for the final surface
        output: PathBuf,

        /// Physics model
        #[arg(short, long, value_enum)]
        model: Option<ModelArg>,

        /// Number of ticks
        #[arg(short, long, default_value = "1000")]
        ticks: usize,

        /// Time step in seconds
        #[arg(long, default_value = "0.0002")]
        dt: f64,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Signed cotangent weights
    Cotangent,
    /// Cotangent weights clamped to be non-negative
    CotangentClamped,
    /// Graph Laplacian D - A
    Combinatorial,
    /// Random-walk normalized graph Laplacian
    Normalized,
}

impl From<KindArg> for LaplacianKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Cotangent => LaplacianKind::Cotangent,
            KindArg::CotangentClamped => LaplacianKind::CotangentClamped,
            KindArg::Combinatorial => LaplacianKind::Combinatorial,
            KindArg::Normalized => LaplacianKind::Normalized,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ModelArg {
    /// Strain-based elasticity
    Fed,
    /// Edge springs, Euler integration
    Spring,
    /// Edge springs, midpoint integration
    MidpointSpring,
}

impl From<ModelArg> for PhysicsModel {
    fn from(model: ModelArg) -> Self {
        match model {
            ModelArg::Fed => PhysicsModel::Fed,
            ModelArg::Spring => PhysicsModel::Spring,
            ModelArg::MidpointSpring => PhysicsModel::MidpointSpring,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,

        Commands::Laplacian {
            input,
            output,
            kind,
            sequential,
        } => cmd_laplacian(&input, output.as_deref(), kind, sequential, config)?,

        Commands::Compress {
            input,
            output,
            precision,
            kind,
        } => cmd_compress(&input, &output, precision, kind, config)?,

        Commands::Skeleton {
            input,
            output,
            iterations,
        } => cmd_skeleton(&input, &output, iterations, config)?,

        Commands::TetgenInput { input, prefix } => {
            let mesh = io::load(&input)?;
            io::tetgen::save_input(&mesh, &prefix)?;
            println!(
                "Wrote {} and {}",
                io::tetgen::with_suffix(&prefix, ".node").display(),
                io::tetgen::with_suffix(&prefix, ".poly").display()
            );
        }

        Commands::Simulate {
            input,
            tetgen,
            output,
            model,
            ticks,
            dt,
        } => cmd_simulate(&input, &tetgen, &output, model, ticks, dt, config)?,
    }

    Ok(())
}

fn load(input: &Path) -> Result<HalfEdgeMesh, Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    Ok(mesh)
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Edges: {}", mesh.num_edges());
    println!("Faces: {}", mesh.num_faces());
    println!("Euler characteristic: {}", mesh.euler_characteristic());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x,
            min.y,
            min.z,
            max.x,
            max.y,
            max.z
        );
    }

    match MeshTopology::from_mesh(&mesh) {
        Ok(topology) => {
            let (min, max) = topology.degree_range();
            println!("Degree range: [{}, {}]", min, max);
            match topology.first_open() {
                None => println!("Topology: Closed (every one-ring is a full fan)"),
                Some(v) => println!("Topology: Open (first open one-ring at vertex {})", v),
            }
        }
        Err(e) => println!("Topology: unusable ({})", e),
    }

    Ok(())
}

fn cmd_laplacian(
    input: &Path,
    output: Option<&Path>,
    kind: Option<KindArg>,
    sequential: bool,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(input)?;
    let topology = MeshTopology::from_mesh(&mesh)?;

    let mut options = config.laplacian;
    if let Some(kind) = kind {
        options.kind = kind.into();
    }
    if sequential {
        options = options.sequential();
    }
    let mode = if options.parallel { "parallel" } else { "sequential" };

    println!("Assembling {} Laplacian ({})...", options.kind, mode);
    let start = Instant::now();
    let laplacian = LaplacianBuilder::new(&topology, &options).build()?;
    let elapsed = start.elapsed();

    let max_row_sum = laplacian
        .row_sums()
        .iter()
        .fold(0.0_f64, |acc, s| acc.max(s.abs()));
    println!("Triples: {} ({:.2?})", laplacian.triples().len(), elapsed);
    println!("Max |row sum|: {:.3e}", max_row_sum);

    if let Some(output) = output {
        let mut writer = BufWriter::new(File::create(output)?);
        for t in laplacian.triples() {
            writeln!(writer, "{} {} {:.17e}", t.row + 1, t.col + 1, t.value)?;
        }
        writer.flush()?;
        println!("Saved: {}", output.display());
    }

    Ok(())
}

fn cmd_compress(
    input: &Path,
    output: &Path,
    precision: Option<usize>,
    kind: Option<KindArg>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = load(input)?;
    let topology = MeshTopology::from_mesh(&mesh)?;

    let precision = precision
        .or(config.compression.precision)
        .ok_or("no precision given (use --precision or [compression] precision)")?;
    let mut options = config.compression.laplacian;
    if let Some(kind) = kind {
        options.kind = kind.into();
    }

    println!("Compressing to {} modes ({} Laplacian)...", precision, options.kind);
    let start = Instant::now();
    let laplacian = LaplacianBuilder::new(&topology, &options).build()?;
    let result = SpectralOperatorClient::new(&topology).compress(
        &laplacian,
        precision,
        &DenseEigenSolver::default(),
    )?;
    let elapsed = start.elapsed();

    println!("Max difference: {:.6e}", result.max_difference);
    println!("Min difference: {:.6e}", result.min_difference);

    result.apply_to(&mut mesh)?;
    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_skeleton(
    input: &Path,
    output: &Path,
    iterations: Option<usize>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(input)?;

    let mut options = config.skeleton;
    if let Some(iterations) = iterations {
        options = options.with_iterations(iterations);
    }

    println!(
        "Contracting ({} passes, W_L={}, W_P={})...",
        options.iterations,
        options.weight_laplacian,
        options.weight_preserve
    );
    let start = Instant::now();
    let skeleton = skeletonize(&mesh, &options)?;
    let elapsed = start.elapsed();

    let contracted = skeleton.to_mesh(&mesh)?;
    println!("Surface area: {:.6} -> {:.6}", mesh.surface_area(), contracted.surface_area());
    io::save(&contracted, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn cmd_simulate(
    input: &Path,
    tetgen: &Path,
    output: &Path,
    model: Option<ModelArg>,
    ticks: usize,
    dt: f64,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = load(input)?;
    let body = io::tetgen::load(tetgen, mesh.num_vertices())?;
    body.check_boundary_matches(&mesh, 1e-6)?;
    println!(
        "Body: {} vertices, {} tetrahedra, volume {:.6}",
        body.num_vertices(),
        body.num_tetras(),
        body.total_volume()
    );

    let mut params = config.simulation;
    if let Some(model) = model {
        params.model = model.into();
    }

    let mut scene = Scene::new();
    let ground_size = mesh
        .bounding_box()
        .map(|(min, max)| 4.0 * (max - min).norm())
        .unwrap_or(1.0);
    scene.insert(Model::new(params.body.clone(), mesh).with_tetra(body));
    if let Some(name) = &params.ground_model {
        scene.insert(Model::new(
            name.clone(),
            primitives::ground_plane(ground_size, params.ground.height),
        ));
    }

    println!("Simulating {} ticks of {} s ({})...", ticks, dt, params.model);
    let mut simulator = Simulator::new(params);
    simulator.init(&scene, 0.0)?;

    let mut frames = FrameRate::default();
    let report_every = (ticks / 10).max(1);
    let start = Instant::now();
    for tick in 1..=ticks {
        let frame = Instant::now();
        simulator.simulate(&mut scene, tick as f64 * dt)?;
        frames.push(frame.elapsed());

        if tick % report_every == 0 {
            let kinetic = simulator.state().map_or(0.0, |s| s.kinetic_energy());
            println!(
                "  t = {:.4} s, kinetic energy {:.6e}, {:.0} ticks/s",
                simulator.elapsed(),
                kinetic,
                frames.fps()
            );
        }
    }
    let elapsed = start.elapsed();

    let ball = scene
        .get(&simulator.params().body)
        .ok_or("simulated body vanished from the scene")?;
    io::save(ball.mesh(), output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
