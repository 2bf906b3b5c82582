//! Headless world driver: streams chunks around a scripted viewer.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   World config JSON (default: built-in defaults)
//!   --blocks <PATH>   Block definitions JSON (default: assets/blocks.json)
//!   --ticks <N>       Number of ticks to run (default: 600)
//!   --speed <B>       Viewer speed in blocks per tick (default: 0.5)

use std::path::PathBuf;
use std::time::Instant;

use blockworld::core::{Result, Vec3, WorldConfig, logging};
use blockworld::render::HeadlessBackend;
use blockworld::streaming::ChunkManager;
use blockworld::voxel::{BlockDefinition, BlockRegistry, TextureAtlas, pick_block};

/// Reach used for the periodic block pick
const PICK_REACH: f32 = 8.0;

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_str_arg(&args, "--config").map(PathBuf::from);
    let blocks_path = parse_str_arg(&args, "--blocks").map(PathBuf::from);
    let ticks = parse_usize_arg(&args, "--ticks").unwrap_or(600);
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(0.5);

    if let Err(e) = run(config_path, blocks_path, ticks, speed) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(
    config_path: Option<PathBuf>,
    blocks_path: Option<PathBuf>,
    ticks: usize,
    speed: f32,
) -> Result<()> {
    let config = match config_path {
        Some(path) => WorldConfig::load(&path)?,
        None => WorldConfig::default(),
    };
    let definitions = match blocks_path {
        Some(path) => BlockDefinition::load_list(&path)?,
        None => BlockDefinition::builtin()?,
    };

    let atlas = TextureAtlas::for_definitions(&definitions);
    let registry = BlockRegistry::from_definitions(&definitions, &atlas)?;
    log::info!(
        "{} blocks, {} textures in a {}x{} atlas",
        registry.len(),
        atlas.len(),
        atlas.grid_size(),
        atlas.grid_size()
    );

    let mut manager = ChunkManager::new(&config, registry, HeadlessBackend::new())?;

    let start = Instant::now();
    let mut viewer = Vec3::new(0.5, 0.0, 0.5);
    let mut loaded = 0usize;
    let mut evicted = 0usize;

    for tick in 0..ticks {
        // Walk along +x, standing just above the terrain
        viewer.x += speed;
        let ground = manager.generator().height_at(viewer.x.floor() as i32, viewer.z.floor() as i32);
        viewer.y = ground as f32 + 2.5;

        let report = manager.tick(viewer)?;
        loaded += usize::from(report.loaded.is_some());
        evicted += report.evicted.len();

        if tick % 60 == 0 {
            let look = Vec3::new(1.0, -1.0, 0.0);
            match pick_block(&manager, viewer, look, PICK_REACH)? {
                Some(target) => {
                    let name = manager
                        .block_at(target.hit.x, target.hit.y, target.hit.z)
                        .map_or("?", |block| block.name.as_str());
                    log::info!("Tick {}: looking at {} at {}", tick, name, target.hit);
                }
                None => log::info!("Tick {}: nothing in reach", tick),
            }
        }
    }

    let stats = manager.backend().stats();
    println!("=== Blockworld ===");
    println!("Ticks:     {} in {:.2?}", ticks, start.elapsed());
    println!("Loaded:    {}", loaded);
    println!("Evicted:   {}", evicted);
    println!("Resident:  {} ({} pending)", manager.resident_count(), manager.pending_count());
    println!("Cached:    {}", manager.cached_count());
    println!(
        "Meshes:    {} live, {} triangles, {} KB",
        manager.backend().live_meshes(),
        manager.backend().triangle_count(),
        stats.resident_bytes / 1024
    );

    Ok(())
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
