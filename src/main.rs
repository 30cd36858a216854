// ============================================
// Terrain Demo - Превью чанка и прогулка зрителя
// ============================================
// Использование: endless_terrain [config.json]

use std::time::Duration;

use ultraviolet::Vec2;

use endless_terrain::terrain::{ChunkEvent, TerrainConfig, TerrainStreamer};
use endless_terrain::generate_preview;

/// Шаг зрителя за тик в мировых единицах
const WALK_STEP: f32 = 400.0;
const WALK_TICKS: usize = 40;

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match TerrainConfig::load_from_file(&path) {
            Ok(config) => {
                log::info!("Loaded terrain config from {}", path);
                config
            }
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => TerrainConfig::default(),
    };

    match generate_preview(&config, config.draw_mode) {
        Ok(preview) => {
            let (lo, hi) = preview.data.height_map.min_max();
            println!("=== Preview ({:?}) ===", preview.mode);
            println!("Texture: {}x{}", preview.texture.width, preview.texture.height);
            println!("Height range: {:.3} .. {:.3}", lo, hi);
            if let Some(mesh) = &preview.mesh {
                println!("Mesh: {} vertices, {} triangles", mesh.vertex_count(), mesh.triangle_count());
            }
        }
        Err(e) => {
            eprintln!("Invalid terrain config: {}", e);
            std::process::exit(1);
        }
    }

    let mut streamer = match TerrainStreamer::new(config) {
        Ok(streamer) => streamer,
        Err(e) => {
            eprintln!("Failed to start terrain streamer: {}", e);
            std::process::exit(1);
        }
    };

    for level in streamer.lod_levels().iter() {
        log::info!("LOD {} (step {}) up to distance {}", level.lod, level.step(), level.visible_distance);
    }

    let mut meshes_swapped = 0;
    for tick in 0..WALK_TICKS {
        let viewer = Vec2::new(tick as f32 * WALK_STEP, 0.0);
        streamer.tick(viewer);
        meshes_swapped += count_mesh_swaps(&streamer.take_events());

        let stats = streamer.stats();
        log::info!(
            "tick {}: viewer chunk {:?}, {} chunks, {} visible, {} jobs in flight",
            tick,
            streamer.viewer_chunk(),
            stats.chunks,
            stats.visible,
            stats.jobs_in_flight
        );
        std::thread::sleep(Duration::from_millis(50));
    }

    if !streamer.wait_idle(Duration::from_secs(30)) {
        log::warn!("Background jobs still running after timeout");
    }
    streamer.process_completed();
    meshes_swapped += count_mesh_swaps(&streamer.take_events());

    let stats = streamer.stats();
    println!("=== Streaming ===");
    println!("Chunks: {} ({} visible)", stats.chunks, stats.visible);
    println!("Window updates: {}", stats.window_updates);
    println!("Mesh swaps: {}", meshes_swapped);
    println!("Failed jobs: {}", stats.jobs_failed);
}

fn count_mesh_swaps(events: &[ChunkEvent]) -> usize {
    events.iter().filter(|e| matches!(e, ChunkEvent::MeshChanged { .. })).count()
}
