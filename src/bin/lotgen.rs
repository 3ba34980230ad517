//! Export a world's cells to lotheader/lotpack/chunkdata files
//!
//! Run with: cargo run --bin lotgen -- --world world.json [--out lots] [--cell 3,4]

use std::path::PathBuf;

use clap::Parser;
use lotgen::{CellPosition, GenerationConfig, LotFilesManager};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lotgen")]
#[command(about = "Compile a world's tile maps into lot files")]
struct Args {
    /// World description (JSON)
    #[arg(long)]
    world: PathBuf,

    /// Config file; defaults to <config dir>/lotgen/config.json when present
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    tiles: Option<PathBuf>,

    #[arg(long)]
    density_map: Option<PathBuf>,

    /// Seed for jumbo tree placement
    #[arg(long)]
    seed: Option<u64>,

    /// Also write worldmap_<x>_<y>.json outlines
    #[arg(long)]
    features: bool,

    /// Only generate these output cells, as `x,y`
    #[arg(long = "cell", value_parser = parse_cell)]
    cells: Vec<CellPosition>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_cell(s: &str) -> Result<CellPosition, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected x,y, got {:?}", s))?;
    let x: i32 = x.trim().parse().map_err(|e| format!("{}: {}", x, e))?;
    let y: i32 = y.trim().parse().map_err(|e| format!("{}: {}", y, e))?;
    Ok(CellPosition::new(x, y))
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "lotgen=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = GenerationConfig::load_or_default(args.config.as_deref())?;
    if let Some(out) = args.out {
        config.output_dir = out;
    }
    if let Some(tiles) = args.tiles {
        config.tiles_dir = tiles;
    }
    if args.density_map.is_some() {
        config.density_map = args.density_map;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.write_map_features |= args.features;

    let mut manager = LotFilesManager::open(config, &args.world)?;

    if !args.cells.is_empty() {
        let mut failed = 0;
        for cell in args.cells {
            match manager.generate_cell(cell) {
                Ok(stats) => eprintln!("{}: {} rooms, {} buildings, {} tiles", cell, stats.rooms, stats.buildings, stats.used_tiles),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    eprintln!("{}: {}", cell, e);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            std::process::exit(1);
        }
        return Ok(());
    }

    let report = manager.generate_world();
    eprintln!(
        "Wrote {} cells to {} ({} rooms, {} buildings, {} jumbo trees)",
        report.written.len(),
        manager.config().output_dir.display(),
        report.stats.rooms,
        report.stats.buildings,
        report.stats.jumbo_trees,
    );
    for (cell, reason) in &report.failures {
        eprintln!("  failed {}: {}", cell, reason);
    }
    if let Some(reason) = report.aborted {
        return Err(reason.into());
    }
    if !report.failures.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
