// ============================================
// Terrain Module - Бесконечный процедурный terrain
// ============================================

pub mod config;
pub mod generation;
pub mod mesh;
pub mod cache;
pub mod lod;
pub mod jobs;
pub mod manager;
pub mod preview;

// Re-exports
pub use config::{ConfigError, TerrainConfig};
pub use cache::ChunkCoord;
pub use generation::{ChunkData, ColorMode, HeightGrid, ColorGrid, MapGenerator, NoiseSettings, NormalizeMode, TerrainRegion, TextureData, MAP_CHUNK_SIZE};
pub use mesh::{build_terrain_mesh, HeightCurve, TerrainMesh, TerrainVertex};
pub use lod::{LodInfo, LodLevels};
pub use jobs::{JobError, JobScheduler};
pub use manager::{ChunkEvent, StreamerError, StreamerStats, TerrainChunk, TerrainStreamer};
pub use preview::{generate_preview, DrawMode, Preview};
