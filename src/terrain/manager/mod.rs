mod chunk;
mod streamer;
mod types;

pub use chunk::{ChunkBounds, HeightDataState, LodMeshState, TerrainChunk};
pub use streamer::{TerrainStreamer, CHUNK_SIZE};
pub use types::{ChunkEvent, StreamerError, StreamerStats};
