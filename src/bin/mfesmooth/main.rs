//! mfesmooth CLI - moving finite element smoothing of surface meshes.
//!
//! Usage: mfesmooth <COMMAND> [OPTIONS]
//!
//! Run `mfesmooth --help` for available commands. Set `RUST_LOG=info` to see
//! per-iteration quality statistics.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};

use mfesmooth::algo::mfe::{self, IterationDiagnostics, MfeSmoother, QualityStats, SmoothOptions};
use mfesmooth::algo::{CancelFlag, Progress};
use mfesmooth::io;
use mfesmooth::mesh::{NodeKind, SurfaceMesh};

#[derive(Parser)]
#[command(name = "mfesmooth")]
#[command(author, version, about = "Moving finite element surface mesh smoothing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh and triangle quality information
    Info {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Smooth a mesh
    Smooth {
        #[command(flatten)]
        input: InputArgs,

        /// Output mesh file (.stl or .inp)
        #[arg(short, long, required_unless_present = "output_nodes")]
        output: Option<PathBuf>,

        /// Also write the smoothed node table
        #[arg(long)]
        output_nodes: Option<PathBuf>,

        /// Number of iterations
        #[arg(short, long, default_value = "1")]
        iterations: usize,

        /// Resume the schedule at this iteration
        #[arg(long, default_value = "1")]
        start_iteration: usize,

        /// Fixed time step (default: derived from the model's largest Y)
        #[arg(long)]
        time_step: Option<f64>,

        /// Do not lock nodes on the bounding box
        #[arg(long)]
        no_node_constraints: bool,

        /// Lock only the touching axes of bounding-box nodes instead of all three
        #[arg(long)]
        no_surface_constraints: bool,

        /// Do not lock quad points
        #[arg(long)]
        no_quad_points: bool,

        /// Add the experimental triple-line term (needs --nodes and --edges)
        #[arg(long)]
        triple_lines: bool,

        /// Write a UCD snapshot every N iterations
        #[arg(long, value_name = "N")]
        snapshot_every: Option<usize>,

        /// Directory for snapshots
        #[arg(long, default_value = ".")]
        snapshot_dir: PathBuf,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input mesh file (.stl)
    #[arg(required_unless_present = "nodes", conflicts_with = "nodes")]
    input: Option<PathBuf>,

    /// Node table (`id kind x y z` rows)
    #[arg(long, requires = "triangles")]
    nodes: Option<PathBuf>,

    /// Triangle table (`id n0 n1 n2 ...` rows)
    #[arg(long, requires = "nodes")]
    triangles: Option<PathBuf>,

    /// Edge table (`id n0 n1 kind ...` rows)
    #[arg(long, requires = "nodes")]
    edges: Option<PathBuf>,
}

impl InputArgs {
    fn load(&self) -> Result<SurfaceMesh, Box<dyn std::error::Error>> {
        let mesh = match (&self.input, &self.nodes, &self.triangles) {
            (Some(input), _, _) => io::load(input)?,
            (None, Some(nodes), Some(triangles)) => {
                io::tables::load(nodes, triangles, self.edges.as_deref())?
            }
            _ => return Err("either an input file or --nodes and --triangles is required".into()),
        };
        Ok(mesh)
    }

    fn describe(&self) -> String {
        match (&self.input, &self.nodes) {
            (Some(input), _) => input.display().to_string(),
            (None, Some(nodes)) => nodes.display().to_string(),
            _ => "(none)".to_string(),
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
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }
        Commands::Smooth {
            input,
            output,
            output_nodes,
            iterations,
            start_iteration,
            time_step,
            no_node_constraints,
            no_surface_constraints,
            no_quad_points,
            triple_lines,
            snapshot_every,
            snapshot_dir,
            sequential,
        } => {
            let options = SmoothOptions {
                iterations,
                apply_node_constraints: !no_node_constraints,
                constrain_surface_nodes: !no_surface_constraints,
                constrain_quad_points: !no_quad_points,
                smooth_triple_lines: triple_lines,
                start_iteration,
                time_step,
                parallel: !sequential,
            };
            let snapshots = snapshot_every
                .filter(|&n| n > 0)
                .map(|every| Snapshots { every, dir: snapshot_dir });
            cmd_smooth(&input, output.as_deref(), output_nodes.as_deref(), options, snapshots)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0)); // Track highest percent seen (monotonic)

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        let percent = previous.max(raw_percent);
        if percent == previous && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {:<16}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn print_quality(stats: &QualityStats) {
    println!(
        "Circularity: max={:.4}, avg={:.4} (2 is equilateral, high is bad)",
        stats.q_max, stats.q_ave
    );
    println!(
        "Min angle (deg): smallest={:.2}, avg={:.2}, largest={:.2}",
        stats.min_angle_min.to_degrees(),
        stats.min_angle_ave.to_degrees(),
        stats.min_angle_max.to_degrees()
    );
    if stats.poor > 0 {
        println!("Poor triangles (Q > {}): {}", mfe::POOR_QUALITY, stats.poor);
    }
    if stats.non_finite > 0 {
        println!("Degenerate triangles: {}", stats.non_finite);
    }
}

fn cmd_info(input: &InputArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = input.load()?;

    println!("File: {}", input.describe());
    println!("Nodes: {}", mesh.num_vertices());
    println!("Triangles: {}", mesh.num_faces());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        if max.y > 0.0 {
            println!("Derived time step: {:e}", mfe::derived_time_step(max.y));
        } else {
            println!("Derived time step: unavailable (largest Y is not positive)");
        }
    }

    if let Some(kinds) = mesh.node_kinds() {
        let mut histogram: BTreeMap<i8, usize> = BTreeMap::new();
        for kind in kinds {
            *histogram.entry(kind.0).or_default() += 1;
        }
        let summary: Vec<String> = histogram
            .iter()
            .map(|(kind, count)| format!("{kind}: {count}"))
            .collect();
        println!("Node kinds: {}", summary.join(", "));
    }

    if let Some(edges) = mesh.edges() {
        let triple = edges.iter().filter(|e| e.kind.is_triple_line()).count();
        println!("Edges: {} ({} on triple lines)", edges.len(), triple);
    }

    let stats = QualityStats::measure(&mesh.positions_f64(), mesh.faces());
    print_quality(&stats);

    Ok(())
}

struct Snapshots {
    every: usize,
    dir: PathBuf,
}

impl Snapshots {
    fn write(
        &self,
        stem: &str,
        step: usize,
        kinds: Option<&[NodeKind]>,
        smoother: &MfeSmoother,
    ) -> mfesmooth::Result<()> {
        let path = self.dir.join(format!("{stem}_{step:02}.inp"));
        io::ucd::save_snapshot(
            &path,
            smoother.positions(),
            smoother.faces(),
            kinds,
            Some(smoother.constraints()),
        )?;
        log::debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}

fn cmd_smooth(
    input: &InputArgs,
    output: Option<&Path>,
    output_nodes: Option<&Path>,
    mut options: SmoothOptions,
    snapshots: Option<Snapshots>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh = input.load()?;
    println!("Loaded: {} nodes, {} triangles", mesh.num_vertices(), mesh.num_faces());

    if mesh.node_kinds().is_none() && options.constrain_quad_points {
        log::warn!("Input has no node kinds; quad-point constraints disabled");
        options.constrain_quad_points = false;
    }

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!(
        "Applying MFE smoothing ({} iterations, {})...",
        options.scheduled_iterations(),
        mode
    );

    let progress = create_progress();
    let start = Instant::now();

    let cancel = CancelFlag::new();
    let report = match &snapshots {
        Some(snapshots) => {
            let stem = output
                .or(output_nodes)
                .and_then(|p| p.file_stem())
                .and_then(|s| s.to_str())
                .unwrap_or("mfe")
                .to_string();
            let kinds = mesh.node_kinds().map(<[NodeKind]>::to_vec);
            let write_snapshot = |smoother: &MfeSmoother, diagnostics: &IterationDiagnostics| -> mfesmooth::Result<()> {
                if diagnostics.step % snapshots.every == 0 {
                    snapshots.write(&stem, diagnostics.step, kinds.as_deref(), smoother)?;
                }
                Ok(())
            };
            mfe::mfe_smooth_with_observer(&mut mesh, &options, &progress, &cancel, write_snapshot)?
        }
        None => mfe::mfe_smooth_with_progress(&mut mesh, &options, &progress, &cancel)?,
    };

    let elapsed = start.elapsed();

    println!(
        "Ran {} iterations, dt = {:e}, {} constrained nodes",
        report.iterations_run, report.time_step, report.constrained_nodes
    );
    if let Some(stats) = report.final_quality() {
        print_quality(stats);
    }
    let skipped = report.skipped_updates();
    if skipped > 0 {
        println!("Skipped updates (|dt * x| > 1): {}", skipped);
    }
    let unconverged = report.unconverged_solves();
    if unconverged > 0 {
        println!("Unconverged velocity solves: {}", unconverged);
    }

    if let Some(path) = output {
        io::save(&mesh, path)?;
        println!("Saved: {} ({:.2?})", path.display(), elapsed);
    }
    if let Some(path) = output_nodes {
        io::tables::save_nodes(&mesh, path)?;
        println!("Saved nodes: {}", path.display());
    }

    Ok(())
}
