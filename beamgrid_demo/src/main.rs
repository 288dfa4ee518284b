//! Beamgrid demo CLI
//!
//! Generates a city from a seed, resolves the scene for a siting offset
//! factor, computes the link assignment, and reports summary statistics.
//! Optionally exports the scene as JSON for external renderers or streams it
//! to a spawned Rerun viewer (with the `visualization` feature).

mod exporter;

use beamgrid_core::{
    compute_links, CityLayout, LayoutConfig, LinkClass, LinkParams, SceneView, MAX_DIRECT_RANKS,
};
use clap::Parser;
use exporter::SceneExport;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Beamgrid topology demo
#[derive(Parser, Debug)]
#[command(name = "beamgrid-demo")]
#[command(about = "Generate and inspect a wireless topology scene", long_about = None)]
struct Args {
    /// Seed for the procedural city (0 = seed from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of mobile users to scatter
    #[arg(short, long, default_value = "15")]
    users: usize,

    /// Connectivity radius for panel-to-user assignment (reference UI: 2-40)
    #[arg(short, long, default_value = "15.0")]
    radius: f64,

    /// Access-point siting offset factor (reference UI: 0-0.7)
    #[arg(short = 'f', long, default_value = "0.0")]
    ap_factor: f64,

    /// Show links for a single user id only
    #[arg(long)]
    user: Option<usize>,

    /// Show links for a single AP rank only (0-3)
    #[arg(long)]
    rank: Option<usize>,

    /// Sweep the radius over the UI range and report served-user counts
    #[arg(long)]
    sweep: bool,

    /// Export the scene as JSON to this path
    #[arg(long)]
    export: Option<String>,

    /// Spawn the Rerun viewer with the generated scene
    #[arg(long)]
    viewer: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if let Some(rank) = args.rank {
        if rank >= MAX_DIRECT_RANKS {
            eprintln!("Error: --rank must be 0-{}", MAX_DIRECT_RANKS - 1);
            std::process::exit(1);
        }
    }

    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64
    } else {
        args.seed
    };

    if let Some(user) = args.user {
        if user >= args.users {
            eprintln!("Error: --user must be below the user count {}", args.users);
            std::process::exit(1);
        }
    }

    let config = LayoutConfig {
        num_users: args.users,
        ..Default::default()
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let layout = CityLayout::generate(config, &mut rng);
    let view = SceneView::resolve(&layout, args.ap_factor);

    let params = LinkParams {
        radius: args.radius,
        user_filter: args.user,
        rank_filter: args.rank,
    };
    let report = compute_links(&layout.users, &view.access_points, &layout.panels, &params);

    let stats = view.stats(&layout);
    let direct = report
        .segments
        .iter()
        .filter(|s| s.class == LinkClass::Direct)
        .count();
    let reflected = report.segments.len() - direct;

    info!("Beamgrid scene (seed={})", seed);
    info!(
        "  buildings={} | access points={} | panels={} | users={}",
        view.buildings.len(),
        stats.access_points,
        stats.panels,
        stats.users
    );
    info!(
        "  radius={:.1} factor={:.2} -> {} direct + {} reflected segments | served users={}",
        args.radius, args.ap_factor, direct, reflected, report.served_users
    );

    if args.sweep {
        run_sweep(&layout, &view);
    }

    if let Some(path) = &args.export {
        let export = SceneExport::build(seed, args.radius, args.ap_factor, &layout, &view, &report);
        match export.write_to_file(path) {
            Ok(()) => info!("Exported scene to {}", path),
            Err(e) => {
                error!("Failed to write export: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.viewer {
        spawn_viewer(&layout, &view, &report);
    }
}

/// Served-user counts across the reference radius range. Counts are weakly
/// increasing in the radius; a decreasing step would be an engine bug.
fn run_sweep(layout: &CityLayout, view: &SceneView) {
    info!("Radius sweep:");

    for radius in (2..=40).step_by(2) {
        let report = compute_links(
            &layout.users,
            &view.access_points,
            &layout.panels,
            &LinkParams {
                radius: radius as f64,
                ..Default::default()
            },
        );
        info!(
            "  radius={:>2} served={:>2} segments={:>3}",
            radius,
            report.served_users,
            report.segments.len()
        );
    }
}

#[cfg(feature = "visualization")]
fn spawn_viewer(layout: &CityLayout, view: &SceneView, report: &beamgrid_core::LinkReport) {
    use beamgrid_core::visualization::RerunVisualizer;

    let result = RerunVisualizer::new("beamgrid")
        .and_then(|viz| {
            viz.log_scene(layout, view)?;
            viz.log_links(&report.segments)
        });

    match result {
        Ok(()) => info!("Scene streamed to Rerun viewer"),
        Err(e) => {
            error!("Viewer failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "visualization"))]
fn spawn_viewer(_layout: &CityLayout, _view: &SceneView, _report: &beamgrid_core::LinkReport) {
    error!("Built without the `visualization` feature; --viewer is unavailable");
    std::process::exit(1);
}
